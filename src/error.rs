//! Error type for the callsign lookup library.

use thiserror::Error;

use crate::grid::GridError;
use crate::xml::DecodeError;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CallsignLookupError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single error raised when a lookup cannot produce a record.
///
/// Every failure mode (bad input, transport failure, provider-reported
/// errors, undecodable responses) is folded into this type. The underlying
/// cause, if any, is reachable through [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{message}")]
pub struct CallsignLookupError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CallsignLookupError {
    /// Create an error carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error that wraps an underlying cause
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The callsign failed the syntax check
    pub fn invalid_callsign() -> Self {
        Self::new("Invalid Callsign")
    }

    /// The provider answered with a non-200 HTTP status
    pub fn http_status(provider: &str, status: u16) -> Self {
        Self::new(format!(
            "Unable to connect to {} (HTTP Error {})",
            provider, status
        ))
    }

    /// The provider returned no record for the query
    pub fn not_found(query: &str) -> Self {
        Self::new(format!("No data found for query {}", query))
    }

    /// The provider reported an error of its own
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    /// Login did not yield a session
    pub fn login_failed(reason: Option<&str>) -> Self {
        match reason {
            Some(reason) => Self::new(format!("Login Failed: {}", reason)),
            None => Self::new("Login Failed"),
        }
    }

    /// A session check response carried no session data
    pub fn invalid_session() -> Self {
        Self::new("Invalid Session")
    }

    /// An async client was used before its HTTP session was started
    pub fn not_started(provider: &str) -> Self {
        Self::new(format!(
            "{} HTTP session not initialised. Hint: call `start()` first or supply a transport",
            provider
        ))
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for CallsignLookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::with_source(format!("Network error: {}", err), err)
    }
}

impl From<DecodeError> for CallsignLookupError {
    fn from(err: DecodeError) -> Self {
        Self::with_source(format!("Unable to decode response: {}", err), err)
    }
}

impl From<serde_json::Error> for CallsignLookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(format!("Unable to decode response: {}", err), err)
    }
}

impl From<url::ParseError> for CallsignLookupError {
    fn from(err: url::ParseError) -> Self {
        Self::with_source(format!("URL parsing error: {}", err), err)
    }
}

impl From<GridError> for CallsignLookupError {
    fn from(err: GridError) -> Self {
        Self::with_source(format!("Invalid grid locator: {}", err), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_construction() {
        let error = CallsignLookupError::not_found("W1AW");
        assert_eq!(error.to_string(), "No data found for query W1AW");

        let error = CallsignLookupError::http_status("QRZ", 503);
        assert!(error.to_string().contains("503"));
        assert!(error.to_string().contains("QRZ"));

        assert_eq!(CallsignLookupError::login_failed(None).message(), "Login Failed");
        assert_eq!(
            CallsignLookupError::login_failed(Some("Bad password")).message(),
            "Login Failed: Bad password"
        );
    }

    #[test]
    fn test_source_is_kept() {
        let error = CallsignLookupError::from(GridError::Length(3));
        assert!(error.source().is_some());
        assert!(CallsignLookupError::invalid_callsign().source().is_none());
    }
}
