//! Lookup providers: their endpoints, response schemas and normalizers.
//!
//! Each provider module defines a validated view over the provider's
//! response (`parse`) and a pure mapping from that view onto the shared
//! [`CallsignRecord`] (`normalize`).

pub mod callook;
pub mod hamqth;
pub mod qrz;
pub mod qrzcq;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::str::FromStr;
use url::Url;

use crate::error::Result;
use crate::grid::Grid;
use crate::session::AuthScheme;
use crate::types::{CallsignRecord, DataSource, FromToken, QslStatus};
use crate::xml::{XmlMap, XmlNode};

pub use callook::{Callook, CallookRecord};
pub use hamqth::{HamQth, HamQthRecord};
pub use qrz::{Qrz, QrzRecord};
pub use qrzcq::{QrzCq, QrzCqRecord};

/// A callsign lookup service
pub trait Provider: Send + Sync + 'static {
    /// Display name used in messages
    const NAME: &'static str;
    const DATA_SOURCE: DataSource;
    /// Default endpoint
    const BASE_URL: &'static str;

    /// Build the data query URL
    fn search_url(base_url: &str, callsign: &str, auth_params: &[(&str, &str)]) -> Result<Url> {
        let mut params = auth_params.to_vec();
        params.push(("callsign", callsign));
        Ok(Url::parse_with_params(base_url, params)?)
    }

    /// Turn a data query response into a record, or the lookup failure
    /// the response describes
    fn process_search(query: &str, body: &[u8]) -> Result<CallsignRecord>;
}

/// A provider whose queries need a session obtained by logging in
pub trait LoginProvider: Provider {
    /// Login and session parameters
    const AUTH: &'static AuthScheme;
}

/// The validated provider record a [`CallsignRecord`] was built from
#[derive(Debug, Clone, Serialize)]
pub enum RawData {
    Callook(CallookRecord),
    HamQth(HamQthRecord),
    Qrz(QrzRecord),
    QrzCq(QrzCqRecord),
}

impl RawData {
    pub fn data_source(&self) -> DataSource {
        match self {
            RawData::Callook(_) => DataSource::Callook,
            RawData::HamQth(_) => DataSource::HamQth,
            RawData::Qrz(_) => DataSource::Qrz,
            RawData::QrzCq(_) => DataSource::QrzCq,
        }
    }
}

/// Read a session error embedded in a data response, if any
pub(crate) fn embedded_error(data: &XmlMap, session_key: &str, error_key: &str) -> Option<String> {
    Fields::new(data.get_map(session_key)?).text(error_key)
}

/// Typed, best-effort accessors over a decoded XML record
pub(crate) struct Fields<'a> {
    map: &'a XmlMap,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a XmlMap) -> Self {
        Self { map }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        match self.map.get(key)? {
            XmlNode::Text(text) => Some(text),
            XmlNode::List(items) => items.iter().find_map(XmlNode::as_text),
            XmlNode::Map(_) => None,
        }
    }

    /// Trimmed text; empty text is absent
    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Parsed number; unparsable values are absent
    pub fn number<T: FromStr>(&self, key: &str) -> Option<T> {
        self.raw(key).and_then(|s| s.trim().parse().ok())
    }

    pub fn date(&self, key: &str, format: &str) -> Option<NaiveDate> {
        self.raw(key).and_then(|s| parse_date(s, format))
    }

    pub fn datetime(&self, key: &str) -> Option<NaiveDateTime> {
        self.raw(key).and_then(parse_datetime)
    }

    /// Tri-state flag from the provider's yes/no tokens
    pub fn flag(&self, key: &str, yes: &str, no: &str) -> QslStatus {
        self.raw(key)
            .map(|s| QslStatus::from_flag(s, yes, no))
            .unwrap_or_default()
    }

    pub fn boolean(&self, key: &str, yes: &str, no: &str) -> Option<bool> {
        self.flag(key, yes, no).as_bool()
    }

    /// Grid locator; a present but malformed locator is an error
    pub fn grid(&self, key: &str) -> Result<Option<Grid>> {
        match self.text(key) {
            Some(locator) => Ok(Some(locator.parse()?)),
            None => Ok(None),
        }
    }

    /// Comma-separated list, or repeated elements taken as they are
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.map.get(key)? {
            XmlNode::Text(text) => split_list(text),
            XmlNode::List(items) => items
                .iter()
                .filter_map(XmlNode::as_text)
                .map(|s| s.trim().to_string())
                .collect(),
            XmlNode::Map(_) => Vec::new(),
        };
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    /// Enum member by case-insensitive name. An absent element is absent;
    /// an unknown token maps to the enum's none member
    pub fn token<E: FromToken>(&self, key: &str) -> Option<E> {
        self.raw(key).map(E::from_token)
    }
}

pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).ok()
}

/// Provider timestamps are `YYYY-MM-DD HH:MM:SS`, sometimes date-only
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Canonical profile URL for providers that don't report one
pub(crate) fn profile_url(template_base: &str, callsign: Option<&str>) -> Option<String> {
    callsign.map(|call| format!("{}{}", template_base, call))
}
