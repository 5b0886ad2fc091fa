//! HamQTH.com XML service.

use serde::Serialize;

use super::{embedded_error, profile_url, Fields, LoginProvider, Provider, RawData};
use crate::error::{CallsignLookupError, Result};
use crate::grid::{Grid, LatLong};
use crate::session::AuthScheme;
use crate::types::{
    non_empty, Address, CallsignRecord, Continent, DataSource, Dxcc, Image, Name, Qsl, QslStatus,
    SocialMedia, Timezone,
};
use crate::xml::{decode, XmlMap};

const HAMQTH_AUTH: AuthScheme = AuthScheme {
    session_param: "id",
    username_param: "u",
    password_param: "p",
    agent_param: "prg",
    agent_on_queries: true,
    token_field: "session_id",
};

/// HamQTH.com
#[derive(Debug, Clone, Copy)]
pub struct HamQth;

impl Provider for HamQth {
    const NAME: &'static str = "HamQTH";
    const DATA_SOURCE: DataSource = DataSource::HamQth;
    const BASE_URL: &'static str = "https://www.hamqth.com/xml.php";

    fn process_search(query: &str, body: &[u8]) -> Result<CallsignRecord> {
        let data = decode(body, false)?;

        if let Some(error) = embedded_error(&data, "session", "error") {
            return Err(CallsignLookupError::provider(error));
        }
        let search = data
            .get_map("search")
            .ok_or_else(|| CallsignLookupError::not_found(query))?;

        Ok(normalize(&HamQthRecord::parse(search)?, query))
    }
}

impl LoginProvider for HamQth {
    const AUTH: &'static AuthScheme = &HAMQTH_AUTH;
}

/// A `<search>` record from HamQTH
#[derive(Debug, Clone, Serialize)]
pub struct HamQthRecord {
    pub callsign: Option<String>,
    pub nick: Option<String>,
    pub qth: Option<String>,
    pub country: Option<String>,
    pub adif: Option<u32>,
    pub itu: Option<u32>,
    pub cq: Option<u32>,
    pub grid: Option<Grid>,
    pub adr_name: Option<String>,
    pub adr_street1: Option<String>,
    pub adr_street2: Option<String>,
    pub adr_street3: Option<String>,
    pub adr_city: Option<String>,
    pub adr_zip: Option<String>,
    pub adr_country: Option<String>,
    pub adr_adif: Option<u32>,
    pub district: Option<String>,
    pub us_state: Option<String>,
    pub us_county: Option<String>,
    pub oblast: Option<String>,
    pub dok: Option<String>,
    pub iota: Option<String>,
    pub qsl_via: Option<String>,
    pub lotw: QslStatus,
    pub eqsl: QslStatus,
    /// Bureau
    pub qsl: QslStatus,
    pub qsldirect: QslStatus,
    pub email: Option<String>,
    pub jabber: Option<String>,
    pub icq: Option<String>,
    pub msn: Option<String>,
    pub skype: Option<String>,
    pub birth_year: Option<u32>,
    pub lic_year: Option<u32>,
    pub picture: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub continent: Option<Continent>,
    pub utc_offset: Option<String>,
    pub web: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub gplus: Option<String>,
    pub youtube: Option<String>,
    pub linkedin: Option<String>,
    /// Flickr, spelled the way HamQTH spells it
    pub flicker: Option<String>,
    pub vimeo: Option<String>,
}

impl HamQthRecord {
    pub fn parse(map: &XmlMap) -> Result<Self> {
        let f = Fields::new(map);
        Ok(Self {
            callsign: f.text("callsign"),
            nick: f.text("nick"),
            qth: f.text("qth"),
            country: f.text("country"),
            adif: f.number("adif"),
            itu: f.number("itu"),
            cq: f.number("cq"),
            grid: f.grid("grid")?,
            adr_name: f.text("adr_name"),
            adr_street1: f.text("adr_street1"),
            adr_street2: f.text("adr_street2"),
            adr_street3: f.text("adr_street3"),
            adr_city: f.text("adr_city"),
            adr_zip: f.text("adr_zip"),
            adr_country: f.text("adr_country"),
            adr_adif: f.number("adr_adif"),
            district: f.text("district"),
            us_state: f.text("us_state"),
            us_county: f.text("us_county"),
            oblast: f.text("oblast"),
            dok: f.text("dok"),
            iota: f.text("iota"),
            qsl_via: f.text("qsl_via"),
            lotw: f.flag("lotw", "Y", "N"),
            eqsl: f.flag("eqsl", "Y", "N"),
            qsl: f.flag("qsl", "Y", "N"),
            qsldirect: f.flag("qsldirect", "Y", "N"),
            email: f.text("email"),
            jabber: f.text("jabber"),
            icq: f.text("icq"),
            msn: f.text("msn"),
            skype: f.text("skype"),
            birth_year: f.number("birth_year"),
            lic_year: f.number("lic_year"),
            picture: f.text("picture"),
            latitude: f.number("latitude"),
            longitude: f.number("longitude"),
            continent: f.token("continent"),
            utc_offset: f.text("utc_offset"),
            web: f.text("web"),
            facebook: f.text("facebook"),
            twitter: f.text("twitter"),
            gplus: f.text("gplus"),
            youtube: f.text("youtube"),
            linkedin: f.text("linkedin"),
            flicker: f.text("flicker"),
            vimeo: f.text("vimeo"),
        })
    }
}

/// Map a HamQTH record onto the shared record
pub fn normalize(data: &HamQthRecord, query: &str) -> CallsignRecord {
    let mut record = CallsignRecord::new(query, RawData::HamQth(data.clone()));

    record.callsign = data.callsign.clone();
    record.name = non_empty(Name {
        nickname: data.nick.clone(),
        name: data.adr_name.clone(),
        ..Default::default()
    });
    record.qth = data.qth.clone();
    record.dxcc = non_empty(Dxcc {
        id: data.adif,
        name: data.country.clone(),
    });
    record.itu_zone = data.itu;
    record.cq_zone = data.cq;
    record.grid = data.grid.clone();
    record.address = non_empty(Address {
        line1: data.adr_street1.clone(),
        line2: data.adr_street2.clone(),
        line3: data.adr_street3.clone(),
        city: data.adr_city.clone(),
        state: data.us_state.clone(),
        zip: data.adr_zip.clone(),
        country: data.adr_country.clone(),
        country_code: data.adr_adif,
        ..Default::default()
    });
    record.county = data.us_county.clone();
    record.district = data.district.clone();
    record.oblast = data.oblast.clone();
    record.dok = data.dok.clone();
    record.iota = data.iota.clone();
    record.qsl = Some(Qsl {
        info: data.qsl_via.clone(),
        lotw: data.lotw,
        eqsl: data.eqsl,
        mail: data.qsldirect,
        bureau: data.qsl,
        ..Default::default()
    });
    record.email = data.email.clone();
    record.social_media = non_empty(SocialMedia {
        website: data.web.clone(),
        jabber: data.jabber.clone(),
        icq: data.icq.clone(),
        msn: data.msn.clone(),
        skype: data.skype.clone(),
        facebook: data.facebook.clone(),
        twitter: data.twitter.clone(),
        google_plus: data.gplus.clone(),
        youtube: data.youtube.clone(),
        linkedin: data.linkedin.clone(),
        flickr: data.flicker.clone(),
        vimeo: data.vimeo.clone(),
    });
    record.born = data.birth_year;
    record.licensed = data.lic_year;
    record.image = data.picture.clone().map(|url| Image {
        url: Some(url),
        ..Default::default()
    });
    if let (Some(lat), Some(long)) = (data.latitude, data.longitude) {
        record.latlong = Some(LatLong::new(lat, long));
    }
    record.continent = data.continent;
    record.timezone = data.utc_offset.clone().map(|offset| Timezone {
        utc_offset: Some(offset),
        ..Default::default()
    });
    record.url = profile_url("https://www.hamqth.com/", data.callsign.as_deref());

    record
}
