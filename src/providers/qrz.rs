//! QRZ.com XML data service.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::{embedded_error, Fields, LoginProvider, Provider, RawData};
use crate::error::{CallsignLookupError, Result};
use crate::grid::{Grid, LatLong};
use crate::session::AuthScheme;
use crate::types::{
    non_empty, Address, Bio, CallsignRecord, DataSource, Dxcc, GeoLocSource, Image,
    LicenseClassValue, Name, Qsl, QslStatus, Timezone, Trustee,
};
use crate::xml::{decode, XmlMap};

const QRZ_AUTH: AuthScheme = AuthScheme {
    session_param: "s",
    username_param: "username",
    password_param: "password",
    agent_param: "agent",
    agent_on_queries: false,
    token_field: "key",
};

/// QRZ.com
#[derive(Debug, Clone, Copy)]
pub struct Qrz;

impl Provider for Qrz {
    const NAME: &'static str = "QRZ";
    const DATA_SOURCE: DataSource = DataSource::Qrz;
    const BASE_URL: &'static str = "https://xmldata.qrz.com/xml/current/";

    fn process_search(query: &str, body: &[u8]) -> Result<CallsignRecord> {
        let data = decode(body, false)?;

        if let Some(error) = embedded_error(&data, "Session", "Error") {
            return Err(CallsignLookupError::provider(error));
        }
        let callsign = data
            .get_map("Callsign")
            .ok_or_else(|| CallsignLookupError::not_found(query))?;

        Ok(normalize(&QrzRecord::parse(callsign)?, query))
    }
}

impl LoginProvider for Qrz {
    const AUTH: &'static AuthScheme = &QRZ_AUTH;
}

/// Image dimensions reported as `height:width:size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub height: u32,
    pub width: u32,
    /// Size in bytes
    pub size: u64,
}

impl ImageInfo {
    fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split(':').map(str::trim);
        let info = Self {
            height: parts.next()?.parse().ok()?,
            width: parts.next()?.parse().ok()?,
            size: parts.next()?.parse().ok()?,
        };
        match parts.next() {
            Some(_) => None,
            None => Some(info),
        }
    }
}

/// A `<Callsign>` record from QRZ
#[derive(Debug, Clone, Serialize)]
pub struct QrzRecord {
    pub call: Option<String>,
    /// The query callsign that returned this record
    pub xref: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub trustee: Option<String>,
    pub dxcc: Option<u32>,
    pub fname: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub name_fmt: Option<String>,
    pub attn: Option<String>,
    pub addr1: Option<String>,
    pub addr2: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub ccode: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub grid: Option<Grid>,
    pub county: Option<String>,
    pub fips: Option<String>,
    pub land: Option<String>,
    pub efdate: Option<NaiveDate>,
    pub expdate: Option<NaiveDate>,
    pub p_call: Option<String>,
    pub class: Option<String>,
    pub codes: Option<String>,
    pub qslmgr: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub u_views: Option<u64>,
    pub bio: Option<u64>,
    pub biodate: Option<NaiveDateTime>,
    pub image: Option<String>,
    pub imageinfo: Option<ImageInfo>,
    pub serial: Option<u64>,
    pub moddate: Option<NaiveDateTime>,
    pub msa: Option<String>,
    pub area_code: Option<String>,
    pub time_zone: Option<String>,
    pub gmt_offset: Option<String>,
    pub dst: Option<bool>,
    pub eqsl: QslStatus,
    pub mqsl: QslStatus,
    pub cqzone: Option<u32>,
    pub ituzone: Option<u32>,
    pub born: Option<u32>,
    pub user: Option<String>,
    pub lotw: QslStatus,
    pub iota: Option<String>,
    pub geoloc: Option<GeoLocSource>,
}

impl QrzRecord {
    /// Validate and coerce a decoded `<Callsign>` element
    pub fn parse(map: &XmlMap) -> Result<Self> {
        let f = Fields::new(map);
        Ok(Self {
            call: f.text("call"),
            xref: f.text("xref"),
            aliases: f.list("aliases"),
            trustee: f.text("trustee"),
            dxcc: f.number("dxcc"),
            fname: f.text("fname"),
            name: f.text("name"),
            nickname: f.text("nickname"),
            name_fmt: f.text("name_fmt"),
            attn: f.text("attn"),
            addr1: f.text("addr1"),
            addr2: f.text("addr2"),
            state: f.text("state"),
            zip: f.text("zip"),
            country: f.text("country"),
            ccode: f.number("ccode"),
            lat: f.number("lat"),
            lon: f.number("lon"),
            grid: f.grid("grid")?,
            county: f.text("county"),
            fips: f.text("fips"),
            land: f.text("land"),
            efdate: f.date("efdate", "%Y-%m-%d"),
            expdate: f.date("expdate", "%Y-%m-%d"),
            p_call: f.text("p_call"),
            class: f.text("class"),
            codes: f.text("codes"),
            qslmgr: f.text("qslmgr"),
            email: f.text("email"),
            url: f.text("url"),
            u_views: f.number("u_views"),
            bio: f.number("bio"),
            biodate: f.datetime("biodate"),
            image: f.text("image"),
            imageinfo: f.text("imageinfo").as_deref().and_then(ImageInfo::parse),
            serial: f.number("serial"),
            moddate: f.datetime("moddate"),
            msa: f.text("MSA"),
            area_code: f.text("AreaCode"),
            time_zone: f.text("TimeZone"),
            gmt_offset: f.text("GMTOffset"),
            dst: f.boolean("DST", "Y", "N"),
            eqsl: f.flag("eqsl", "1", "0"),
            mqsl: f.flag("mqsl", "1", "0"),
            cqzone: f.number("cqzone"),
            ituzone: f.number("ituzone"),
            born: f.number("born"),
            user: f.text("user"),
            lotw: f.flag("lotw", "1", "0"),
            iota: f.text("iota"),
            geoloc: f.token("geoloc"),
        })
    }
}

/// Map a QRZ record onto the shared record
pub fn normalize(data: &QrzRecord, query: &str) -> CallsignRecord {
    let mut record = CallsignRecord::new(query, RawData::Qrz(data.clone()));

    record.callsign = data.call.clone();
    record.aliases = data.aliases.clone();
    record.trustee = data.trustee.clone().map(|callsign| Trustee {
        callsign: Some(callsign),
        name: None,
    });
    record.lic_class = data.class.clone().map(LicenseClassValue::Text);
    record.lic_codes = data.codes.clone();
    record.effective_date = data.efdate;
    record.expire_date = data.expdate;
    record.prev_call = data.p_call.clone();
    record.modified_date = data.moddate;
    record.name = non_empty(Name {
        first: data.fname.clone(),
        name: data.name.clone(),
        nickname: data.nickname.clone(),
        formatted_name: data.name_fmt.clone(),
    });
    record.address = non_empty(Address {
        attn: data.attn.clone(),
        line1: data.addr1.clone(),
        city: data.addr2.clone(),
        state: data.state.clone(),
        zip: data.zip.clone(),
        country: data.country.clone(),
        country_code: data.ccode,
        ..Default::default()
    });
    record.dxcc = non_empty(Dxcc {
        id: data.dxcc,
        name: data.land.clone(),
    });
    if let (Some(lat), Some(lon)) = (data.lat, data.lon) {
        record.latlong = Some(LatLong::new(lat, lon));
    }
    record.grid = data.grid.clone();
    record.county = data.county.clone();
    record.fips = data.fips.clone();
    record.msa = data.msa.clone();
    record.area_code = data.area_code.clone();
    record.cq_zone = data.cqzone;
    record.itu_zone = data.ituzone;
    record.iota = data.iota.clone();
    record.geoloc_src = data.geoloc;
    record.timezone = non_empty(Timezone {
        utc_offset: data.gmt_offset.clone(),
        us_timezone: data.time_zone.clone(),
        observes_dst: data.dst,
    });
    record.qsl = Some(Qsl {
        info: data.qslmgr.clone(),
        eqsl: data.eqsl,
        lotw: data.lotw,
        mail: data.mqsl,
        ..Default::default()
    });
    record.born = data.born;
    record.email = data.email.clone();
    record.username = data.user.clone();
    record.url = data
        .url
        .clone()
        .or_else(|| super::profile_url("https://www.qrz.com/db/", data.call.as_deref()));
    record.page_views = data.u_views;
    record.db_serial = data.serial;
    record.bio = non_empty(Bio {
        size: data.bio,
        updated: data.biodate,
    });
    record.image = data.image.clone().map(|url| match data.imageinfo {
        Some(info) => Image {
            url: Some(url),
            size: Some(info.size),
            height: Some(info.height),
            width: Some(info.width),
        },
        None => Image {
            url: Some(url),
            ..Default::default()
        },
    });

    record
}
