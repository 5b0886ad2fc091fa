//! Lookup clients.
//!
//! [`SyncClient`] and [`AsyncClient`] implement the same lookup contract
//! over a blocking and an async transport respectively. Both are generic
//! over the [`Provider`] they query; the aliases at the bottom of this
//! module name the concrete clients.

use std::marker::PhantomData;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::error::{CallsignLookupError, Result};
use crate::providers::{Callook, HamQth, LoginProvider, Provider, Qrz, QrzCq};
use crate::session::{Session, SessionStep};
use crate::transport::{
    AsyncTransport, BlockingTransport, HttpResponse, ReqwestBlockingTransport, ReqwestTransport,
};
use crate::types::CallsignRecord;
use crate::{is_callsign, DEFAULT_USER_AGENT};

/// Configuration shared by all clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint override; `None` uses the provider's endpoint
    pub base_url: Option<String>,
    /// Sent as the HTTP user agent and the provider's agent parameter
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn base_url<P: Provider>(&self) -> &str {
        self.base_url.as_deref().unwrap_or(P::BASE_URL)
    }
}

fn new_session<P: LoginProvider>(
    username: impl Into<String>,
    password: impl Into<String>,
    config: &ClientConfig,
) -> Session {
    Session::new(P::AUTH, username, password, config.user_agent.as_str())
}

/// Uppercased query for a syntactically valid callsign
fn validate(callsign: &str) -> Result<String> {
    if !is_callsign(callsign) {
        return Err(CallsignLookupError::invalid_callsign());
    }
    Ok(callsign.to_uppercase())
}

fn body_of<P: Provider>(response: HttpResponse) -> Result<Vec<u8>> {
    if response.status != 200 {
        return Err(CallsignLookupError::http_status(P::NAME, response.status));
    }
    Ok(response.body)
}

fn log_step<P: Provider>(session: &Session, step: &SessionStep) {
    match step {
        SessionStep::Check(url) => debug!("Checking {} session: {}", P::NAME, url),
        SessionStep::Login(url) => debug!("Logging in to {}: {}", P::NAME, session.redact(url)),
        SessionStep::Ready => {}
    }
}

/// Data query URL, authenticated by the session if there is one
fn search_url<P: Provider>(
    config: &ClientConfig,
    session: Option<&Session>,
    query: &str,
) -> Result<Url> {
    let params = session.map(Session::query_params).unwrap_or_default();
    P::search_url(config.base_url::<P>(), query, &params)
}

fn finish<P: Provider>(query: &str, body: &[u8]) -> Result<CallsignRecord> {
    let record = P::process_search(query, body)?;
    info!("Successfully looked up {} on {}", query, P::NAME);
    Ok(record)
}

/// Blocking lookup client
pub struct SyncClient<P: Provider> {
    transport: Box<dyn BlockingTransport>,
    config: ClientConfig,
    session: Option<Session>,
    _provider: PhantomData<P>,
}

impl<P: Provider> std::fmt::Debug for SyncClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("provider", &P::NAME)
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}

impl<P: Provider> SyncClient<P> {
    fn build(
        config: ClientConfig,
        transport: Box<dyn BlockingTransport>,
        session: Option<Session>,
    ) -> Self {
        Self {
            transport,
            config,
            session,
            _provider: PhantomData,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn fetch(transport: &dyn BlockingTransport, url: &Url) -> Result<Vec<u8>> {
        body_of::<P>(transport.get(url)?)
    }

    /// Look up a callsign.
    ///
    /// Providers that need a session log in first, or re-check a held
    /// token and log in again if the provider rejects it.
    pub fn search(&mut self, callsign: &str) -> Result<CallsignRecord> {
        let query = validate(callsign)?;
        let base_url = self.config.base_url::<P>();
        let transport = self.transport.as_ref();

        if let Some(session) = self.session.as_mut() {
            session.begin_lookup();
            loop {
                let step = session.next_step(base_url)?;
                log_step::<P>(session, &step);
                match step {
                    SessionStep::Ready => break,
                    SessionStep::Check(url) => {
                        session.process_check(&Self::fetch(transport, &url)?)?
                    }
                    SessionStep::Login(url) => {
                        session.process_login(&Self::fetch(transport, &url)?)?
                    }
                }
            }
        }

        let url = search_url::<P>(&self.config, self.session.as_ref(), &query)?;
        debug!("Looking up {} on {}", query, P::NAME);
        let body = Self::fetch(transport, &url)?;
        finish::<P>(&query, &body)
    }
}

impl<P: LoginProvider> SyncClient<P> {
    /// Client over a pooled reqwest blocking client, with default settings
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_config(username, password, ClientConfig::default())
    }

    pub fn with_config(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let transport = ReqwestBlockingTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::with_transport(username, password, config, transport))
    }

    /// Client over a caller-supplied transport
    pub fn with_transport(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
        transport: impl BlockingTransport + 'static,
    ) -> Self {
        let session = new_session::<P>(username, password, &config);
        Self::build(config, Box::new(transport), Some(session))
    }

    /// Seed a previously obtained session token
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        if let Some(session) = self.session.as_mut() {
            session.set_key(key);
        }
        self
    }

    /// The session token currently held
    pub fn session_key(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::key)
    }
}

impl SyncClient<Callook> {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestBlockingTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: impl BlockingTransport + 'static,
    ) -> Self {
        Self::build(config, Box::new(transport), None)
    }
}

/// Connection resource of an async client
enum Connection {
    /// Built by `start()` and dropped by `close()`
    Owned(Option<ReqwestTransport>),
    /// Supplied by the caller, who owns its lifecycle
    Supplied(Box<dyn AsyncTransport>),
}

/// Async lookup client.
///
/// A client built without a transport must be started before use.
pub struct AsyncClient<P: Provider> {
    connection: Connection,
    config: ClientConfig,
    session: Option<Session>,
    _provider: PhantomData<P>,
}

impl<P: Provider> std::fmt::Debug for AsyncClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClient")
            .field("provider", &P::NAME)
            .field("config", &self.config)
            .field("session", &self.session)
            .field("started", &self.is_started())
            .finish()
    }
}

impl<P: Provider> AsyncClient<P> {
    fn build(config: ClientConfig, connection: Connection, session: Option<Session>) -> Self {
        Self {
            connection,
            config,
            session,
            _provider: PhantomData,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a transport is available for lookups
    pub fn is_started(&self) -> bool {
        !matches!(self.connection, Connection::Owned(None))
    }

    /// Build the client's own HTTP session. A caller-supplied transport is
    /// left as it is.
    pub fn start(&mut self) -> Result<()> {
        if matches!(self.connection, Connection::Owned(None)) {
            let transport = ReqwestTransport::new(&self.config.user_agent, self.config.timeout())?;
            self.connection = Connection::Owned(Some(transport));
            debug!("Started {} HTTP session", P::NAME);
        }
        Ok(())
    }

    /// Tear down the client's own HTTP session. A caller-supplied
    /// transport is never closed by the client.
    pub fn close(&mut self) {
        if matches!(self.connection, Connection::Owned(Some(_))) {
            self.connection = Connection::Owned(None);
            debug!("Closed {} HTTP session", P::NAME);
        }
    }

    async fn fetch(transport: &dyn AsyncTransport, url: &Url) -> Result<Vec<u8>> {
        body_of::<P>(transport.get(url).await?)
    }

    /// Look up a callsign.
    ///
    /// Providers that need a session log in first, or re-check a held
    /// token and log in again if the provider rejects it.
    pub async fn search(&mut self, callsign: &str) -> Result<CallsignRecord> {
        let query = validate(callsign)?;
        let transport: &dyn AsyncTransport = match &self.connection {
            Connection::Owned(Some(transport)) => transport,
            Connection::Owned(None) => return Err(CallsignLookupError::not_started(P::NAME)),
            Connection::Supplied(transport) => transport.as_ref(),
        };
        let base_url = self.config.base_url::<P>();

        if let Some(session) = self.session.as_mut() {
            session.begin_lookup();
            loop {
                let step = session.next_step(base_url)?;
                log_step::<P>(session, &step);
                match step {
                    SessionStep::Ready => break,
                    SessionStep::Check(url) => {
                        session.process_check(&Self::fetch(transport, &url).await?)?
                    }
                    SessionStep::Login(url) => {
                        session.process_login(&Self::fetch(transport, &url).await?)?
                    }
                }
            }
        }

        let url = search_url::<P>(&self.config, self.session.as_ref(), &query)?;
        debug!("Looking up {} on {}", query, P::NAME);
        let body = Self::fetch(transport, &url).await?;
        finish::<P>(&query, &body)
    }
}

impl<P: LoginProvider> AsyncClient<P> {
    /// Client that builds its own HTTP session on `start()`
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_config(username, password, ClientConfig::default())
    }

    pub fn with_config(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        let session = new_session::<P>(username, password, &config);
        Self::build(config, Connection::Owned(None), Some(session))
    }

    /// Client over a caller-supplied transport; no `start()` needed
    pub fn with_transport(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
        transport: impl AsyncTransport + 'static,
    ) -> Self {
        let session = new_session::<P>(username, password, &config);
        Self::build(
            config,
            Connection::Supplied(Box::new(transport)),
            Some(session),
        )
    }

    /// Seed a previously obtained session token
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        if let Some(session) = self.session.as_mut() {
            session.set_key(key);
        }
        self
    }

    /// The session token currently held
    pub fn session_key(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::key)
    }
}

impl AsyncClient<Callook> {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::build(config, Connection::Owned(None), None)
    }

    pub fn with_transport(config: ClientConfig, transport: impl AsyncTransport + 'static) -> Self {
        Self::build(config, Connection::Supplied(Box::new(transport)), None)
    }
}

impl Default for AsyncClient<Callook> {
    fn default() -> Self {
        Self::new()
    }
}

pub type QrzSyncClient = SyncClient<Qrz>;
pub type QrzAsyncClient = AsyncClient<Qrz>;
pub type CallookSyncClient = SyncClient<Callook>;
pub type CallookAsyncClient = AsyncClient<Callook>;
pub type HamQthSyncClient = SyncClient<HamQth>;
pub type HamQthAsyncClient = AsyncClient<HamQth>;
pub type QrzCqSyncClient = SyncClient<QrzCq>;
pub type QrzCqAsyncClient = AsyncClient<QrzCq>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses and records the URLs it was asked for
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<Url>>,
    }

    impl Scripted {
        fn new(responses: &[(u16, &str)]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .iter()
                        .map(|(status, body)| HttpResponse::new(*status, *body))
                        .collect(),
                ),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<Url> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl BlockingTransport for Scripted {
        fn get(&self, url: &Url) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(url.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CallsignLookupError::new("script exhausted"))
        }
    }

    const LOGIN_OK: &str = "<QRZDatabase><Session><Key>fresh</Key></Session></QRZDatabase>";
    const RECORD: &str =
        "<QRZDatabase><Session><Key>fresh</Key></Session><Callsign><call>W1AW</call></Callsign></QRZDatabase>";

    fn config() -> ClientConfig {
        ClientConfig::default()
            .with_base_url("http://example.test/xml/")
            .with_user_agent("test-agent")
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url::<Qrz>(), Qrz::BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_callsign_issues_no_query() {
        let transport = Scripted::new(&[]);
        let mut client = QrzSyncClient::with_transport("user", "pass", config(), transport.clone());

        let err = client.search("W1AW!").unwrap_err();
        assert_eq!(err.message(), "Invalid Callsign");
        assert!(client.search("").is_err());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_first_search_logs_in() {
        let transport = Scripted::new(&[(200, LOGIN_OK), (200, RECORD)]);
        let mut client = QrzSyncClient::with_transport("user", "pass", config(), transport.clone());

        let record = client.search("w1aw").unwrap();
        assert_eq!(record.query, "W1AW");
        assert_eq!(client.session_key(), Some("fresh"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].query().unwrap().contains("username=user"));
        assert_eq!(requests[1].query(), Some("s=fresh&callsign=W1AW"));
    }

    #[test]
    fn test_held_token_is_checked() {
        let transport = Scripted::new(&[(200, LOGIN_OK), (200, RECORD)]);
        let mut client = QrzSyncClient::with_transport("user", "pass", config(), transport.clone())
            .with_session_key("fresh");

        client.search("W1AW").unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].query(), Some("s=fresh"));
        assert_eq!(requests[1].query(), Some("s=fresh&callsign=W1AW"));
    }

    #[test]
    fn test_http_status_is_an_error() {
        let transport = Scripted::new(&[(503, "")]);
        let mut client = CallookSyncClient::with_transport(config(), transport);

        let err = client.search("W1AW").unwrap_err();
        assert_eq!(err.message(), "Unable to connect to Callook (HTTP Error 503)");
    }

    #[test]
    fn test_login_failure_stops_the_lookup() {
        let body = "<QRZDatabase><Session><Error>Username/password incorrect</Error></Session></QRZDatabase>";
        let transport = Scripted::new(&[(200, body)]);
        let mut client = QrzSyncClient::with_transport("user", "bad", config(), transport.clone());

        let err = client.search("W1AW").unwrap_err();
        assert_eq!(err.message(), "Login Failed: Username/password incorrect");
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(client.session_key(), None);
    }

    #[tokio::test]
    async fn test_async_client_requires_start() {
        let mut client = QrzAsyncClient::with_config("user", "pass", config());
        assert!(!client.is_started());

        let err = client.search("W1AW").await.unwrap_err();
        assert!(err.message().contains("not initialised"));

        client.start().unwrap();
        assert!(client.is_started());
        client.close();
        assert!(!client.is_started());
    }
}
