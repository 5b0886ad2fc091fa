//! callook.info JSON service (US licenses from the FCC ULS).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{profile_url, Provider, RawData};
use crate::error::{CallsignLookupError, Result};
use crate::grid::{Grid, LatLong};
use crate::types::{
    non_empty, Address, CallsignRecord, CallsignType, DataSource, FromToken, LicenseClass,
    LicenseClassValue, Name, Trustee,
};

/// callook.info
#[derive(Debug, Clone, Copy)]
pub struct Callook;

impl Provider for Callook {
    const NAME: &'static str = "Callook";
    const DATA_SOURCE: DataSource = DataSource::Callook;
    const BASE_URL: &'static str = "https://callook.info";

    fn search_url(base_url: &str, callsign: &str, _auth_params: &[(&str, &str)]) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/{}/json",
            base_url.trim_end_matches('/'),
            callsign
        ))?)
    }

    fn process_search(query: &str, body: &[u8]) -> Result<CallsignRecord> {
        let data: CallookRecord = serde_json::from_slice(body)?;

        let valid = matches!(data.status, None | Some(CallookStatus::Valid));
        if !valid || data.current.callsign.is_none() {
            return Err(CallsignLookupError::not_found(query));
        }
        Ok(normalize(&data, query))
    }
}

/// Record status reported by Callook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallookStatus {
    Valid,
    Invalid,
    Updating,
    None,
}

impl FromToken for CallookStatus {
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("VALID", CallookStatus::Valid),
        ("INVALID", CallookStatus::Invalid),
        ("UPDATING", CallookStatus::Updating),
    ];
    const NONE: Self = CallookStatus::None;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookCallsign {
    #[serde(deserialize_with = "de::string")]
    pub callsign: Option<String>,
    #[serde(rename = "operClass", deserialize_with = "de::license_class")]
    pub oper_class: LicenseClass,
    #[serde(rename = "class", deserialize_with = "de::license_class")]
    pub class: LicenseClass,
}

impl CallookCallsign {
    /// Operator class, falling back to the generic class
    fn license_class(&self) -> Option<LicenseClass> {
        [self.oper_class, self.class]
            .into_iter()
            .find(|c| *c != LicenseClass::None)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookTrustee {
    #[serde(deserialize_with = "de::string")]
    pub callsign: Option<String>,
    #[serde(deserialize_with = "de::string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookAddress {
    #[serde(deserialize_with = "de::string")]
    pub line1: Option<String>,
    /// `CITY, ST ZIP`
    #[serde(deserialize_with = "de::string")]
    pub line2: Option<String>,
    #[serde(deserialize_with = "de::string")]
    pub attn: Option<String>,
}

impl CallookAddress {
    /// Split line two into city, state and zip.
    ///
    /// Only the three-token form is understood; anything else yields nothing.
    fn locality(&self) -> (Option<String>, Option<String>, Option<String>) {
        let Some(line2) = &self.line2 else {
            return (None, None, None);
        };
        let cleaned = line2.replace(',', "");
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        match tokens.as_slice() {
            [city, state, zip] => (
                Some(city.to_string()),
                Some(state.to_string()),
                Some(zip.to_string()),
            ),
            _ => (None, None, None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookLocation {
    #[serde(deserialize_with = "de::float")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "de::float")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "de::grid")]
    pub gridsquare: Option<Grid>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookOtherInfo {
    #[serde(rename = "grantDate", deserialize_with = "de::date")]
    pub grant_date: Option<NaiveDate>,
    #[serde(rename = "expiryDate", deserialize_with = "de::date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "lastActionDate", deserialize_with = "de::date")]
    pub last_action_date: Option<NaiveDate>,
    #[serde(deserialize_with = "de::string")]
    pub frn: Option<String>,
    #[serde(rename = "ulsUrl", deserialize_with = "de::string")]
    pub uls_url: Option<String>,
}

/// A Callook JSON response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallookRecord {
    #[serde(deserialize_with = "de::status")]
    pub status: Option<CallookStatus>,
    #[serde(rename = "type", deserialize_with = "de::callsign_type")]
    pub kind: Option<CallsignType>,
    #[serde(deserialize_with = "de::or_default")]
    pub current: CallookCallsign,
    #[serde(deserialize_with = "de::or_default")]
    pub previous: CallookCallsign,
    #[serde(deserialize_with = "de::or_default")]
    pub trustee: CallookTrustee,
    #[serde(deserialize_with = "de::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "de::or_default")]
    pub address: CallookAddress,
    #[serde(deserialize_with = "de::or_default")]
    pub location: CallookLocation,
    #[serde(rename = "otherInfo", deserialize_with = "de::or_default")]
    pub other_info: CallookOtherInfo,
}

/// Map a Callook record onto the shared record
pub fn normalize(data: &CallookRecord, query: &str) -> CallsignRecord {
    let mut record = CallsignRecord::new(query, RawData::Callook(data.clone()));

    record.license_type = data.kind;
    record.callsign = data.current.callsign.clone();
    record.lic_class = data.current.license_class().map(LicenseClassValue::Class);
    record.prev_call = data.previous.callsign.clone();
    record.prev_lic_class = data.previous.license_class();
    record.trustee = non_empty(Trustee {
        callsign: data.trustee.callsign.clone(),
        name: data.trustee.name.clone(),
    });
    record.name = data.name.clone().map(|name| Name {
        name: Some(name),
        ..Default::default()
    });

    let (city, state, zip) = data.address.locality();
    record.address = non_empty(Address {
        attn: data.address.attn.clone(),
        line1: data.address.line1.clone(),
        city,
        state,
        zip,
        ..Default::default()
    });
    if let (Some(lat), Some(long)) = (data.location.latitude, data.location.longitude) {
        record.latlong = Some(LatLong::new(lat, long));
    }
    record.grid = data.location.gridsquare.clone();
    record.effective_date = data.other_info.grant_date;
    record.expire_date = data.other_info.expiry_date;
    record.last_action_date = data.other_info.last_action_date;
    record.frn = data.other_info.frn.clone();
    record.uls_url = data.other_info.uls_url.clone();
    record.url = profile_url("https://callook.info/", data.current.callsign.as_deref());

    record
}

/// Lenient field deserializers for Callook's JSON, where absent values
/// show up as `null` or `""`
mod de {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::CallookStatus;
    use crate::grid::Grid;
    use crate::types::{CallsignType, FromToken, LicenseClass};

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.and_then(|s| crate::providers::parse_date(&s, "%m/%d/%Y")))
    }

    pub fn grid<'de, D>(deserializer: D) -> Result<Option<Grid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match string(deserializer)? {
            Some(locator) => locator.parse().map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }

    fn token<'de, D, E>(deserializer: D) -> Result<E, D::Error>
    where
        D: Deserializer<'de>,
        E: FromToken,
    {
        Ok(string(deserializer)?
            .map(|s| E::from_token(&s))
            .unwrap_or(E::NONE))
    }

    pub fn status<'de, D>(deserializer: D) -> Result<Option<CallookStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.map(|s| CallookStatus::from_token(&s)))
    }

    pub fn callsign_type<'de, D>(deserializer: D) -> Result<Option<CallsignType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.map(|s| CallsignType::from_token(&s)))
    }

    pub fn license_class<'de, D>(deserializer: D) -> Result<LicenseClass, D::Error>
    where
        D: Deserializer<'de>,
    {
        token(deserializer)
    }

    /// Nested objects that may be `null`
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
