//! QRZCQ.com XML service.

use serde::Serialize;

use super::{embedded_error, profile_url, Fields, LoginProvider, Provider, RawData};
use crate::error::{CallsignLookupError, Result};
use crate::grid::{Grid, LatLong};
use crate::session::AuthScheme;
use crate::types::{
    non_empty, Address, CallsignRecord, Continent, DataSource, Dxcc, Image, LicenseClassValue,
    Name, Qsl, QslStatus, SocialMedia,
};
use crate::xml::{decode, XmlMap};

const QRZCQ_AUTH: AuthScheme = AuthScheme {
    session_param: "s",
    username_param: "username",
    password_param: "password",
    agent_param: "agent",
    agent_on_queries: true,
    token_field: "key",
};

/// QRZCQ.com
#[derive(Debug, Clone, Copy)]
pub struct QrzCq;

impl Provider for QrzCq {
    const NAME: &'static str = "QRZCQ";
    const DATA_SOURCE: DataSource = DataSource::QrzCq;
    const BASE_URL: &'static str = "https://ssl.qrzcq.com/xml";

    fn process_search(query: &str, body: &[u8]) -> Result<CallsignRecord> {
        let data = decode(body, false)?;

        if let Some(error) = embedded_error(&data, "Session", "Error") {
            return Err(CallsignLookupError::provider(error));
        }
        let callsign = data
            .get_map("Callsign")
            .ok_or_else(|| CallsignLookupError::not_found(query))?;

        Ok(normalize(&QrzCqRecord::parse(callsign)?, query))
    }
}

impl LoginProvider for QrzCq {
    const AUTH: &'static AuthScheme = &QRZCQ_AUTH;
}

/// A `<Callsign>` record from QRZCQ
#[derive(Debug, Clone, Serialize)]
pub struct QrzCqRecord {
    pub call: Option<String>,
    pub name: Option<String>,
    pub qth: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub license: Option<String>,
    pub continent: Option<Continent>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    /// Bureau manager
    pub bmanager: Option<String>,
    pub manager: Option<String>,
    pub locator: Option<Grid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website: Option<String>,
    pub dxcc: Option<u32>,
    pub itu: Option<u32>,
    pub cq: Option<u32>,
    pub iota: Option<String>,
    pub plot: Option<String>,
    pub dok: Option<String>,
    pub sondok: Option<bool>,
    pub eqsl: QslStatus,
    pub lotw: QslStatus,
    pub bqsl: QslStatus,
    pub mqsl: QslStatus,
    pub utf8: Option<bool>,
    pub qslpic: Option<String>,
    pub prefix: Option<String>,
}

impl QrzCqRecord {
    pub fn parse(map: &XmlMap) -> Result<Self> {
        let f = Fields::new(map);
        Ok(Self {
            call: f.text("call"),
            name: f.text("name"),
            qth: f.text("qth"),
            address: f.text("address"),
            city: f.text("city"),
            zip: f.text("zip"),
            license: f.text("license"),
            continent: f.token("continent"),
            country: f.text("country"),
            state: f.text("state"),
            county: f.text("county"),
            bmanager: f.text("bmanager"),
            manager: f.text("manager"),
            locator: f.grid("locator")?,
            latitude: f.number("latitude"),
            longitude: f.number("longitude"),
            website: f.text("website"),
            dxcc: f.number("dxcc"),
            itu: f.number("itu"),
            cq: f.number("cq"),
            iota: f.text("iota"),
            plot: f.text("plot"),
            dok: f.text("dok"),
            sondok: f.boolean("sondok", "1", "0"),
            eqsl: f.flag("eqsl", "1", "0"),
            lotw: f.flag("lotw", "1", "0"),
            bqsl: f.flag("bqsl", "1", "0"),
            mqsl: f.flag("mqsl", "1", "0"),
            utf8: f.boolean("utf8", "1", "0"),
            qslpic: f.text("qslpic"),
            prefix: f.text("prefix"),
        })
    }
}

/// Map a QRZCQ record onto the shared record
pub fn normalize(data: &QrzCqRecord, query: &str) -> CallsignRecord {
    let mut record = CallsignRecord::new(query, RawData::QrzCq(data.clone()));

    record.callsign = data.call.clone();
    record.name = data.name.clone().map(|name| Name {
        name: Some(name),
        ..Default::default()
    });
    record.qth = data.qth.clone();
    record.address = non_empty(Address {
        line1: data.address.clone(),
        city: data.city.clone(),
        state: data.state.clone(),
        zip: data.zip.clone(),
        country: data.country.clone(),
        country_code: data.dxcc,
        ..Default::default()
    });
    record.lic_class = data.license.clone().map(LicenseClassValue::Text);
    record.continent = data.continent;
    record.dxcc = non_empty(Dxcc {
        id: data.dxcc,
        name: data.country.clone(),
    });
    record.county = data.county.clone();
    record.qsl = Some(Qsl {
        info: data.manager.clone(),
        bureau_info: data.bmanager.clone(),
        eqsl: data.eqsl,
        lotw: data.lotw,
        bureau: data.bqsl,
        mail: data.mqsl,
    });
    record.grid = data.locator.clone();
    if let (Some(lat), Some(long)) = (data.latitude, data.longitude) {
        record.latlong = Some(LatLong::new(lat, long));
    }
    record.social_media = data.website.clone().map(|website| SocialMedia {
        website: Some(website),
        ..Default::default()
    });
    record.itu_zone = data.itu;
    record.cq_zone = data.cq;
    record.iota = data.iota.clone();
    record.plot = data.plot.clone();
    record.dok = data.dok.clone();
    record.sondok = data.sondok;
    record.image = data.qslpic.clone().map(|url| Image {
        url: Some(url),
        ..Default::default()
    });
    record.dxcc_prefix = data.prefix.clone();
    record.url = profile_url("https://www.qrzcq.com/call/", data.call.as_deref());

    record
}
