//! Session handling for providers that require a login.
//!
//! The state machine here performs no I/O. A client asks it for the next
//! [`SessionStep`], issues the query the step describes, and feeds the
//! response back in until the session reports [`SessionStep::Ready`].

use tracing::{info, warn};
use url::Url;

use crate::error::{CallsignLookupError, Result};
use crate::providers::Fields;
use crate::xml::decode;

/// Query parameter names a provider uses for login and session checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthScheme {
    /// Parameter carrying the session token
    pub session_param: &'static str,
    pub username_param: &'static str,
    pub password_param: &'static str,
    /// Parameter carrying the user agent
    pub agent_param: &'static str,
    /// Whether the agent is also sent with session checks and data queries
    pub agent_on_queries: bool,
    /// Element holding the token in a login response
    pub token_field: &'static str,
}

/// Where the session stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token held
    NoSession,
    /// A token is held but has not been checked during this lookup
    Pending(String),
    /// The token was accepted during this lookup
    Authenticated(String),
}

/// What a client must do next to authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    /// Issue a session check query and pass its response to
    /// [`Session::process_check`]
    Check(Url),
    /// Issue a login query and pass its response to [`Session::process_login`]
    Login(Url),
    /// The session is ready for a data query
    Ready,
}

/// Credentials and session token for one client
#[derive(Clone)]
pub struct Session {
    scheme: &'static AuthScheme,
    username: String,
    password: String,
    user_agent: String,
    state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("state", &self.state)
            .finish()
    }
}

impl Session {
    pub fn new(
        scheme: &'static AuthScheme,
        username: impl Into<String>,
        password: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            scheme,
            username: username.into(),
            password: password.into(),
            user_agent: user_agent.into(),
            state: SessionState::NoSession,
        }
    }

    /// Seed a previously obtained token; an empty key means no token
    pub fn set_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.state = if key.is_empty() {
            SessionState::NoSession
        } else {
            SessionState::Pending(key)
        };
    }

    /// The token currently held, if any
    pub fn key(&self) -> Option<&str> {
        match &self.state {
            SessionState::NoSession => None,
            SessionState::Pending(key) | SessionState::Authenticated(key) => Some(key),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Mark the start of a lookup: a held token must be checked again
    pub fn begin_lookup(&mut self) {
        self.state = match std::mem::replace(&mut self.state, SessionState::NoSession) {
            SessionState::Authenticated(key) => SessionState::Pending(key),
            state => state,
        };
    }

    /// The next query needed before a data query can be issued
    pub fn next_step(&self, base_url: &str) -> Result<SessionStep> {
        match &self.state {
            SessionState::Authenticated(_) => Ok(SessionStep::Ready),
            SessionState::Pending(_) => Ok(SessionStep::Check(Url::parse_with_params(
                base_url,
                self.query_params(),
            )?)),
            SessionState::NoSession => {
                let params = [
                    (self.scheme.username_param, self.username.as_str()),
                    (self.scheme.password_param, self.password.as_str()),
                    (self.scheme.agent_param, self.user_agent.as_str()),
                ];
                Ok(SessionStep::Login(Url::parse_with_params(base_url, params)?))
            }
        }
    }

    /// Parameters authenticating a check or data query
    pub fn query_params(&self) -> Vec<(&str, &str)> {
        let mut params = Vec::with_capacity(2);
        if let Some(key) = self.key() {
            params.push((self.scheme.session_param, key));
        }
        if self.scheme.agent_on_queries {
            params.push((self.scheme.agent_param, self.user_agent.as_str()));
        }
        params
    }

    /// A copy of `url` fit for logging, with the password masked
    pub fn redact(&self, url: &Url) -> Url {
        if url.query().is_none() {
            return url.clone();
        }
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == self.scheme.password_param {
                    "<redacted>".to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();

        let mut clean = url.clone();
        clean.query_pairs_mut().clear().extend_pairs(pairs);
        clean
    }

    /// Apply a session check response.
    ///
    /// A response reporting an invalid session drops the token so that the
    /// next step is a fresh login. Undecodable responses are errors.
    pub fn process_check(&mut self, body: &[u8]) -> Result<()> {
        let data = decode(body, true)?;
        let rejection = match data.get_map("session") {
            None => Some(CallsignLookupError::invalid_session().to_string()),
            Some(session) => Fields::new(session).text("error"),
        };

        let key = self.key().map(str::to_string);
        self.state = match (rejection, key) {
            (Some(reason), _) => {
                warn!("Session rejected ({}), logging in again", reason);
                SessionState::NoSession
            }
            (None, Some(key)) => SessionState::Authenticated(key),
            (None, None) => SessionState::NoSession,
        };
        Ok(())
    }

    /// Apply a login response, storing the new token
    pub fn process_login(&mut self, body: &[u8]) -> Result<()> {
        self.state = SessionState::NoSession;

        let data = decode(body, true)?;
        let session = data
            .get_map("session")
            .ok_or_else(|| CallsignLookupError::login_failed(None))?;
        let fields = Fields::new(session);

        if let Some(error) = fields.text("error") {
            return Err(CallsignLookupError::login_failed(Some(&error)));
        }
        let key = fields
            .text(self.scheme.token_field)
            .ok_or_else(|| CallsignLookupError::login_failed(None))?;

        info!("Logged in as {}", self.username);
        self.state = SessionState::Authenticated(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SCHEME: AuthScheme = AuthScheme {
        session_param: "s",
        username_param: "username",
        password_param: "password",
        agent_param: "agent",
        agent_on_queries: false,
        token_field: "key",
    };

    const BASE: &str = "https://example.com/xml/";

    const LOGIN_OK: &[u8] =
        b"<QRZDatabase><Session><Key>new_key</Key><Count>1</Count></Session></QRZDatabase>";
    const LOGIN_ERROR: &[u8] =
        b"<QRZDatabase><Session><Error>Username/password incorrect</Error></Session></QRZDatabase>";
    const CHECK_ERROR: &[u8] =
        b"<QRZDatabase><Session><Error>Session Timeout</Error></Session></QRZDatabase>";

    fn session() -> Session {
        Session::new(&SCHEME, "user", "pass", "agent/1.0")
    }

    #[test]
    fn test_no_token_goes_straight_to_login() {
        let session = session();
        match session.next_step(BASE).unwrap() {
            SessionStep::Login(url) => {
                let query = url.query().unwrap();
                assert!(query.contains("username=user"));
                assert!(query.contains("password=pass"));
                assert!(query.contains("agent=agent%2F1.0"));
            }
            step => panic!("Expected login, got {:?}", step),
        }
    }

    #[test]
    fn test_login_then_ready() {
        let mut session = session();
        session.process_login(LOGIN_OK).unwrap();
        assert_eq!(session.key(), Some("new_key"));
        assert_eq!(session.next_step(BASE).unwrap(), SessionStep::Ready);

        // the next lookup re-checks the held token
        session.begin_lookup();
        assert!(matches!(session.next_step(BASE).unwrap(), SessionStep::Check(_)));
    }

    #[test]
    fn test_check_rejection_drops_token() {
        let mut session = session();
        session.set_key("old_key");
        match session.next_step(BASE).unwrap() {
            SessionStep::Check(url) => assert_eq!(url.query(), Some("s=old_key")),
            step => panic!("Expected check, got {:?}", step),
        }

        session.process_check(CHECK_ERROR).unwrap();
        assert_eq!(session.state(), &SessionState::NoSession);
        assert!(matches!(session.next_step(BASE).unwrap(), SessionStep::Login(_)));
    }

    #[test]
    fn test_check_acceptance() {
        let mut session = session();
        session.set_key("old_key");
        session.process_check(LOGIN_OK).unwrap();
        assert_eq!(
            session.state(),
            &SessionState::Authenticated("old_key".to_string())
        );

        // a response without session data is a rejection
        session.begin_lookup();
        session.process_check(b"<QRZDatabase/>").unwrap();
        assert_eq!(session.state(), &SessionState::NoSession);
    }

    #[test]
    fn test_login_failures() {
        let mut session = session();
        let err = session.process_login(LOGIN_ERROR).unwrap_err();
        assert_eq!(err.message(), "Login Failed: Username/password incorrect");

        let err = session.process_login(b"<QRZDatabase></QRZDatabase>").unwrap_err();
        assert_eq!(err.message(), "Login Failed");
        assert_eq!(session.key(), None);

        assert!(session.process_login(b"<QRZDatabase><Session>").is_err());
    }

    #[test]
    fn test_empty_key_means_no_session() {
        let mut session = session();
        session.set_key("");
        assert_eq!(session.state(), &SessionState::NoSession);
    }

    #[test]
    fn test_login_url_redaction() {
        let session = session();
        let SessionStep::Login(url) = session.next_step(BASE).unwrap() else {
            panic!("Expected login");
        };
        let logged = session.redact(&url).to_string();
        assert!(logged.contains("username=user"));
        assert!(!logged.contains("password=pass"));
        assert!(logged.contains("password=%3Credacted%3E"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", session());
        assert!(!debug.contains("pass\""));
        assert!(debug.contains("<redacted>"));
    }
}
