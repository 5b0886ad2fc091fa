//! # Callsign Lookup
//!
//! Look up amateur radio callsigns on QRZ.com, callook.info, HamQTH.com and
//! QRZCQ.com, and get the answer back as one [`CallsignRecord`] shape no
//! matter which service produced it.
//!
//! ## Features
//!
//! - **Normalized records**: every provider's response is mapped onto the
//!   same typed record. Fields a provider did not report are `None`
//! - **Blocking and async**: [`SyncClient`] and [`AsyncClient`] share one
//!   contract over pluggable transports
//! - **Session management**: providers that need a login are logged in on
//!   demand, and a rejected session token is replaced transparently
//! - **One error type**: every failure surfaces as [`CallsignLookupError`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use callsign_lookup::{CallookSyncClient, QrzAsyncClient};
//!
//! # async fn run() -> Result<(), callsign_lookup::CallsignLookupError> {
//! // Callook needs no account
//! let mut callook = CallookSyncClient::new()?;
//! let record = callook.search("W1AW")?;
//! println!("{:?} is a {:?} license", record.callsign, record.license_type);
//!
//! // QRZ logs in on the first search
//! let mut qrz = QrzAsyncClient::new("your_username", "your_password");
//! qrz.start()?;
//! let record = qrz.search("W1AW").await?;
//! if let Some(address) = &record.address {
//!     println!("{}", address);
//! }
//! qrz.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! `search` takes `&mut self`: one client runs one lookup at a time. Share a
//! client between tasks behind a mutex, or give each task its own client.

pub mod client;
pub mod error;
pub mod grid;
pub mod providers;
pub mod session;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{
    AsyncClient, CallookAsyncClient, CallookSyncClient, ClientConfig, HamQthAsyncClient,
    HamQthSyncClient, QrzAsyncClient, QrzCqAsyncClient, QrzCqSyncClient, QrzSyncClient,
    SyncClient,
};
pub use error::{CallsignLookupError, Result};
pub use grid::{Grid, LatLong};
pub use providers::{Callook, HamQth, LoginProvider, Provider, Qrz, QrzCq, RawData};
pub use transport::{AsyncTransport, BlockingTransport, HttpResponse};
pub use types::{
    Address, Bio, CallsignRecord, CallsignType, Continent, DataSource, Dxcc, GeoLocSource, Image,
    LicenseClass, LicenseClassValue, Name, Qsl, QslStatus, SocialMedia, Timezone, Trustee,
};

/// Default user agent string for requests
pub const DEFAULT_USER_AGENT: &str = concat!("callsign-lookup-rs/", env!("CARGO_PKG_VERSION"));

/// Whether `callsign` is syntactically a callsign: ASCII letters, digits
/// and `/` only, and not empty
pub fn is_callsign(callsign: &str) -> bool {
    !callsign.is_empty()
        && callsign
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '/')
}

#[allow(clippy::const_is_empty)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!DEFAULT_USER_AGENT.is_empty());
        assert!(DEFAULT_USER_AGENT.contains("callsign-lookup-rs"));
    }

    #[test]
    fn test_is_callsign() {
        assert!(is_callsign("W1AW"));
        assert!(is_callsign("w1aw"));
        assert!(is_callsign("VE3/W1AW/P"));
        assert!(!is_callsign(""));
        assert!(!is_callsign("W1AW "));
        assert!(!is_callsign("W1-AW"));
        assert!(!is_callsign("W1ÅW"));
    }
}
