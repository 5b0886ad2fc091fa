//! The unified callsign record and the types that make it up.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

use crate::grid::{Grid, LatLong};
use crate::providers::RawData;

/// Enums whose provider tokens are matched case-insensitively by name.
///
/// Tokens that match no name map to [`FromToken::NONE`] instead of failing.
pub trait FromToken: Sized + Copy + 'static {
    /// Accepted tokens and the member each one maps to
    const TOKENS: &'static [(&'static str, Self)];
    /// The member used for absent or unrecognized tokens
    const NONE: Self;

    fn from_token(token: &str) -> Self {
        let token = token.trim();
        Self::TOKENS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, value)| *value)
            .unwrap_or(Self::NONE)
    }
}

/// Which lookup service produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Callook,
    HamQth,
    Qrz,
    QrzCq,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataSource::Callook => "callook.info",
            DataSource::HamQth => "hamqth.com",
            DataSource::Qrz => "qrz.com",
            DataSource::QrzCq => "qrzcq.com",
        })
    }
}

/// Continent designators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Continent {
    #[serde(rename = "AF")]
    Af,
    #[serde(rename = "AN")]
    An,
    #[serde(rename = "AS")]
    As,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "NA")]
    Na,
    #[serde(rename = "OC")]
    Oc,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "NONE")]
    None,
}

impl FromToken for Continent {
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("AF", Continent::Af),
        ("AN", Continent::An),
        ("AS", Continent::As),
        ("EU", Continent::Eu),
        ("NA", Continent::Na),
        ("OC", Continent::Oc),
        ("SA", Continent::Sa),
    ];
    const NONE: Self = Continent::None;
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Continent::Af => "Africa",
            Continent::An => "Antarctica",
            Continent::As => "Asia",
            Continent::Eu => "Europe",
            Continent::Na => "North America",
            Continent::Oc => "Oceania",
            Continent::Sa => "South America",
            Continent::None => "None",
        })
    }
}

/// What kind of license the holder has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallsignType {
    Club,
    Military,
    Races,
    Recreation,
    Person,
    #[default]
    None,
}

impl FromToken for CallsignType {
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("CLUB", CallsignType::Club),
        ("MILITARY", CallsignType::Military),
        ("RACES", CallsignType::Races),
        ("RECREATION", CallsignType::Recreation),
        ("PERSON", CallsignType::Person),
    ];
    const NONE: Self = CallsignType::None;
}

impl fmt::Display for CallsignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallsignType::Club => "Club",
            CallsignType::Military => "Military",
            CallsignType::Races => "RACES",
            CallsignType::Recreation => "Military Recreation",
            CallsignType::Person => "Individual",
            CallsignType::None => "None",
        })
    }
}

/// US license classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseClass {
    Novice,
    Technician,
    TechnicianPlus,
    General,
    Advanced,
    Extra,
    #[default]
    None,
}

impl FromToken for LicenseClass {
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("NOVICE", LicenseClass::Novice),
        ("TECHNICIAN", LicenseClass::Technician),
        ("TECHNICIAN_PLUS", LicenseClass::TechnicianPlus),
        ("TECHNICIAN PLUS", LicenseClass::TechnicianPlus),
        ("GENERAL", LicenseClass::General),
        ("ADVANCED", LicenseClass::Advanced),
        ("EXTRA", LicenseClass::Extra),
        ("AMATEUR EXTRA", LicenseClass::Extra),
    ];
    const NONE: Self = LicenseClass::None;
}

impl fmt::Display for LicenseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LicenseClass::Novice => "Novice",
            LicenseClass::Technician => "Technician",
            LicenseClass::TechnicianPlus => "Technician Plus",
            LicenseClass::General => "General",
            LicenseClass::Advanced => "Advanced",
            LicenseClass::Extra => "Amateur Extra",
            LicenseClass::None => "None",
        })
    }
}

/// A license class as reported by a provider.
///
/// Callook reports US classes, the others report free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LicenseClassValue {
    Class(LicenseClass),
    Text(String),
}

impl fmt::Display for LicenseClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseClassValue::Class(class) => class.fmt(f),
            LicenseClassValue::Text(text) => f.write_str(text),
        }
    }
}

/// Where the lat/long of a record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeoLocSource {
    User,
    Geocode,
    Grid,
    Zip,
    State,
    Dxcc,
    None,
}

impl FromToken for GeoLocSource {
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("USER", GeoLocSource::User),
        ("GEOCODE", GeoLocSource::Geocode),
        ("GRID", GeoLocSource::Grid),
        ("ZIP", GeoLocSource::Zip),
        ("STATE", GeoLocSource::State),
        ("DXCC", GeoLocSource::Dxcc),
    ];
    const NONE: Self = GeoLocSource::None;
}

impl fmt::Display for GeoLocSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeoLocSource::User => "User",
            GeoLocSource::Geocode => "Geocode",
            GeoLocSource::Grid => "Grid",
            GeoLocSource::Zip => "Zip Code",
            GeoLocSource::State => "State",
            GeoLocSource::Dxcc => "DXCC",
            GeoLocSource::None => "None",
        })
    }
}

/// Tri-state QSL preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QslStatus {
    Yes,
    No,
    #[default]
    Unknown,
}

impl QslStatus {
    /// Map a provider token to a status given the provider's yes/no tokens
    pub fn from_flag(token: &str, yes: &str, no: &str) -> Self {
        let token = token.trim();
        if token == yes {
            QslStatus::Yes
        } else if token == no {
            QslStatus::No
        } else {
            QslStatus::Unknown
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            QslStatus::Yes => Some(true),
            QslStatus::No => Some(false),
            QslStatus::Unknown => None,
        }
    }
}

impl fmt::Display for QslStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QslStatus::Yes => "Yes",
            QslStatus::No => "No",
            QslStatus::Unknown => "Unknown",
        })
    }
}

/// A DXCC entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dxcc {
    /// Entity number
    pub id: Option<u32>,
    /// Entity name
    pub name: Option<String>,
}

impl fmt::Display for Dxcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.id) {
            (Some(name), Some(id)) => write!(f, "{} ({})", name, id),
            (Some(name), None) => f.write_str(name),
            (None, Some(id)) => write!(f, "{}", id),
            (None, None) => Ok(()),
        }
    }
}

/// A mailing address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    /// Attention line, printed before the rest of the address
    pub attn: Option<String>,
    /// House number and street
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    /// Country name for the QSL mailing address
    pub country: Option<String>,
    /// DXCC entity code of the mailing address country
    pub country_code: Option<u32>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_zip = [self.state.as_deref(), self.zip.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let locality = match (self.city.as_deref(), state_zip.is_empty()) {
            (Some(city), false) => Some(format!("{}, {}", city, state_zip)),
            (Some(city), true) => Some(city.to_string()),
            (None, false) => Some(state_zip),
            (None, true) => None,
        };

        let lines: Vec<&str> = [
            self.attn.as_deref(),
            self.line1.as_deref(),
            self.line2.as_deref(),
            self.line3.as_deref(),
            locality.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        f.write_str(&lines.join("\n"))
    }
}

/// An operator's name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Name {
    /// First name(s)
    pub first: Option<String>,
    /// Last name or full name
    pub name: Option<String>,
    /// Name used on the air
    pub nickname: Option<String>,
    /// Provider-formatted full name and nickname
    pub formatted_name: Option<String>,
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(formatted) = &self.formatted_name {
            return f.write_str(formatted);
        }
        let nickname = self.nickname.as_ref().map(|n| match (&self.first, &self.name) {
            (None, None) => n.clone(),
            _ => format!("\"{}\"", n),
        });
        let parts: Vec<&str> = [
            self.first.as_deref(),
            nickname.as_deref(),
            self.name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Trustee of a club callsign
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trustee {
    pub callsign: Option<String>,
    pub name: Option<String>,
}

impl fmt::Display for Trustee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.callsign) {
            (Some(name), Some(call)) => write!(f, "{} ({})", name, call),
            (Some(name), None) => f.write_str(name),
            (None, Some(call)) => f.write_str(call),
            (None, None) => Ok(()),
        }
    }
}

/// QSL preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Qsl {
    /// Freeform QSL or manager information
    pub info: Option<String>,
    /// Bureau information
    pub bureau_info: Option<String>,
    pub eqsl: QslStatus,
    pub lotw: QslStatus,
    /// Direct mail
    pub mail: QslStatus,
    pub bureau: QslStatus,
}

impl fmt::Display for Qsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in [&self.info, &self.bureau_info].into_iter().flatten() {
            writeln!(f, "{}", line)?;
        }
        write!(
            f,
            "Mail: {}\nBureau: {}\nLotW: {}\neQSL: {}",
            self.mail, self.bureau, self.lotw, self.eqsl
        )
    }
}

/// Biography metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bio {
    /// Size in bytes
    pub size: Option<u64>,
    pub updated: Option<NaiveDateTime>,
}

/// Profile image metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Image {
    pub url: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// Social media and messaging handles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocialMedia {
    pub website: Option<String>,
    pub jabber: Option<String>,
    pub icq: Option<String>,
    pub msn: Option<String>,
    pub skype: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub google_plus: Option<String>,
    pub youtube: Option<String>,
    pub linkedin: Option<String>,
    pub flickr: Option<String>,
    pub vimeo: Option<String>,
}

/// Time zone information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timezone {
    pub utc_offset: Option<String>,
    /// US time zone name
    pub us_timezone: Option<String>,
    pub observes_dst: Option<bool>,
}

/// Drop a composite whose members are all absent
pub(crate) fn non_empty<T: Default + PartialEq>(value: T) -> Option<T> {
    if value == T::default() {
        None
    } else {
        Some(value)
    }
}

/// The result of a callsign lookup, normalized across providers.
///
/// Every field except `query`, `data_source` and `raw_data` is optional;
/// a field the provider did not report is `None`, never an empty string
/// or zero.
#[derive(Debug, Clone, Serialize)]
pub struct CallsignRecord {
    /// The requested callsign, uppercased
    pub query: String,
    /// The provider that produced this record
    pub data_source: DataSource,
    /// The callsign as returned by the provider
    pub callsign: Option<String>,
    pub license_type: Option<CallsignType>,
    pub lic_class: Option<LicenseClassValue>,
    pub lic_codes: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expire_date: Option<NaiveDate>,
    pub last_action_date: Option<NaiveDate>,
    pub prev_call: Option<String>,
    pub prev_lic_class: Option<LicenseClass>,
    pub modified_date: Option<NaiveDateTime>,
    pub name: Option<Name>,
    pub trustee: Option<Trustee>,
    pub email: Option<String>,
    /// Account that manages this callsign at the provider
    pub username: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub address: Option<Address>,
    pub dxcc: Option<Dxcc>,
    pub dxcc_prefix: Option<String>,
    /// Freeform location
    pub qth: Option<String>,
    /// `Some(Continent::None)` when the provider sent a token it does not recognise
    pub continent: Option<Continent>,
    pub latlong: Option<LatLong>,
    pub grid: Option<Grid>,
    pub county: Option<String>,
    pub district: Option<String>,
    pub oblast: Option<String>,
    /// German DOK
    pub dok: Option<String>,
    /// Whether the DOK is a special (Sonder) DOK
    pub sondok: Option<bool>,
    /// Polish OT number
    pub plot: Option<String>,
    pub fips: Option<String>,
    pub msa: Option<String>,
    pub area_code: Option<String>,
    pub cq_zone: Option<u32>,
    pub itu_zone: Option<u32>,
    pub iota: Option<String>,
    /// Provenance of `latlong`; `Some(GeoLocSource::None)` for an unrecognised token
    pub geoloc_src: Option<GeoLocSource>,
    pub timezone: Option<Timezone>,
    pub qsl: Option<Qsl>,
    /// Year of birth
    pub born: Option<u32>,
    /// Year first licensed
    pub licensed: Option<u32>,
    pub url: Option<String>,
    pub page_views: Option<u64>,
    pub db_serial: Option<u64>,
    pub bio: Option<Bio>,
    pub image: Option<Image>,
    pub social_media: Option<SocialMedia>,
    pub uls_url: Option<String>,
    /// FCC registration number
    pub frn: Option<String>,
    /// The validated provider record this was built from
    pub raw_data: RawData,
}

impl CallsignRecord {
    /// Start a record with every optional field absent
    pub(crate) fn new(query: impl Into<String>, raw_data: RawData) -> Self {
        Self {
            query: query.into(),
            data_source: raw_data.data_source(),
            callsign: None,
            license_type: None,
            lic_class: None,
            lic_codes: None,
            effective_date: None,
            expire_date: None,
            last_action_date: None,
            prev_call: None,
            prev_lic_class: None,
            modified_date: None,
            name: None,
            trustee: None,
            email: None,
            username: None,
            aliases: None,
            address: None,
            dxcc: None,
            dxcc_prefix: None,
            qth: None,
            continent: None,
            latlong: None,
            grid: None,
            county: None,
            district: None,
            oblast: None,
            dok: None,
            sondok: None,
            plot: None,
            fips: None,
            msa: None,
            area_code: None,
            cq_zone: None,
            itu_zone: None,
            iota: None,
            geoloc_src: None,
            timezone: None,
            qsl: None,
            born: None,
            licensed: None,
            url: None,
            page_views: None,
            db_serial: None,
            bio: None,
            image: None,
            social_media: None,
            uls_url: None,
            frn: None,
            raw_data,
        }
    }
}
