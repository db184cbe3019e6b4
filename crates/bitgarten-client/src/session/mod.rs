//! Session record and authorization header derivation.
//!
//! The persisted session is the single source of truth for request
//! credentials. It is re-read from its [`SessionStore`] every time a header is
//! derived, so a teardown anywhere is visible to the very next request.

mod store;

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub use store::{
    CachedSessionStore, KeyringSessionStore, MemorySessionStore, SESSION_KEY, SessionStore,
    SessionStoreError, SessionStoreResult,
};

/// Persisted credential record.
///
/// Serialized as `{ "token"?, "authdata"?, "username"?, ... }`. Fields the
/// login endpoint returns beyond these are kept in [`Session::extra`].
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token issued by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Base64 `username:password`.
    #[serde(rename = "authdata", default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_data: Option<String>,
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Any other fields of the login response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    /// Creates a session holding only a bearer token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Creates a session holding only basic-auth credentials.
    #[must_use]
    pub fn with_basic_auth(username: &str, password: &str) -> Self {
        Self {
            basic_auth_data: Some(basic_auth_blob(username, password)),
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    /// Builds the session to persist from a successful login response.
    ///
    /// Returns `None` when the payload is empty or not an object.
    #[must_use]
    pub fn from_login_payload(payload: Value, username: &str, password: &str) -> Option<Self> {
        let Value::Object(fields) = payload else {
            return None;
        };
        let mut session: Self = match serde_json::from_value(Value::Object(fields)) {
            Ok(session) => session,
            Err(e) => {
                warn!("Login payload has unexpected field types: {e}");
                return None;
            }
        };
        session.basic_auth_data = Some(basic_auth_blob(username, password));
        session.username = Some(username.to_string());
        Some(session)
    }

    /// Bearer token, if present and non-empty.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Basic-auth blob, if present and non-empty.
    #[must_use]
    pub fn basic_auth(&self) -> Option<&str> {
        self.basic_auth_data.as_deref().filter(|d| !d.is_empty())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.bearer_token().map(|_| "<redacted>"))
            .field("basic_auth_data", &self.basic_auth().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Encodes `username:password` for a `Basic` authorization header.
#[must_use]
pub fn basic_auth_blob(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// Requested response representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptKind {
    /// No Accept preference (binary endpoints).
    #[default]
    Empty,
    /// `application/json`.
    Json,
    /// `video/mp4`.
    VideoMp4,
}

impl AcceptKind {
    /// Header value for this kind; empty for [`AcceptKind::Empty`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Json => "application/json",
            Self::VideoMp4 => "video/mp4",
        }
    }
}

/// The `Authorization` / `Accept` pair attached to a request.
///
/// Empty values mean "do not send".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthHeader {
    /// `Authorization` value.
    pub authorization: String,
    /// `Accept` value.
    pub accept: String,
}

impl AuthHeader {
    /// Header without credentials.
    #[must_use]
    pub fn anonymous(accept: AcceptKind) -> Self {
        Self {
            authorization: String::new(),
            accept: accept.as_str().to_string(),
        }
    }

    /// Header carrying basic-auth built from raw credentials.
    #[must_use]
    pub fn basic(username: &str, password: &str, accept: AcceptKind) -> Self {
        Self {
            authorization: format!("Basic {}", basic_auth_blob(username, password)),
            accept: accept.as_str().to_string(),
        }
    }

    /// Returns true if no credentials are attached.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.authorization.is_empty()
    }
}

/// Reads the persisted session and turns it into request headers.
#[derive(Debug, Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    /// Creates a context over the given store.
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Creates a context over a shared store.
    #[must_use]
    pub fn from_shared(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Creates a context with an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// Returns the persisted session, if any.
    ///
    /// An unreadable or corrupt record counts as no session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        let raw = match self.store.load() {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read session: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring corrupt session record: {e}");
                None
            }
        }
    }

    /// Returns true if a session is persisted.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }

    /// Derives the request header for the requested representation.
    ///
    /// A bearer token wins over basic-auth data; with neither the header is
    /// anonymous.
    #[must_use]
    pub fn derive_header(&self, accept: AcceptKind) -> AuthHeader {
        let mut header = AuthHeader::anonymous(accept);
        let Some(session) = self.current() else {
            return header;
        };

        if let Some(token) = session.bearer_token() {
            header.authorization = format!("Bearer {token}");
        } else if let Some(data) = session.basic_auth() {
            header.authorization = format!("Basic {data}");
        }
        header
    }

    /// Persists a session, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store fails.
    pub fn persist(&self, session: &Session) -> SessionStoreResult<()> {
        let raw = serde_json::to_string(session)?;
        self.store.save(&raw)?;
        debug!(username = ?session.username, "Persisted session");
        Ok(())
    }

    /// Removes the persisted session. Safe to call when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails for a reason other than a
    /// missing entry.
    pub fn teardown(&self) -> SessionStoreResult<()> {
        self.store.remove()?;
        info!("Session torn down");
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_header_without_session() {
        let ctx = SessionContext::in_memory();
        let header = ctx.derive_header(AcceptKind::Json);
        assert!(header.is_anonymous());
        assert_eq!(header.accept, "application/json");

        let header = ctx.derive_header(AcceptKind::Empty);
        assert_eq!(header, AuthHeader::default());
    }

    #[test]
    fn test_bearer_header() {
        let ctx = SessionContext::in_memory();
        ctx.persist(&Session::with_token("abc")).unwrap();
        let header = ctx.derive_header(AcceptKind::VideoMp4);
        assert_eq!(header.authorization, "Bearer abc");
        assert_eq!(header.accept, "video/mp4");
    }

    #[test]
    fn test_basic_header() {
        let ctx = SessionContext::in_memory();
        ctx.persist(&Session::with_basic_auth("alice", "secret"))
            .unwrap();
        let header = ctx.derive_header(AcceptKind::Json);
        assert_eq!(header.authorization, "Basic YWxpY2U6c2VjcmV0");
    }

    #[test]
    fn test_bearer_takes_precedence_over_basic() {
        let ctx = SessionContext::in_memory();
        let mut session = Session::with_basic_auth("alice", "secret");
        session.token = Some("tok".to_string());
        ctx.persist(&session).unwrap();
        assert_eq!(ctx.derive_header(AcceptKind::Json).authorization, "Bearer tok");
    }

    #[test]
    fn test_empty_token_falls_back_to_basic() {
        let ctx = SessionContext::in_memory();
        let mut session = Session::with_basic_auth("alice", "secret");
        session.token = Some(String::new());
        ctx.persist(&session).unwrap();
        assert!(
            ctx.derive_header(AcceptKind::Json)
                .authorization
                .starts_with("Basic ")
        );
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let ctx = SessionContext::in_memory();
        ctx.persist(&Session::with_token("abc")).unwrap();
        ctx.teardown().unwrap();
        ctx.teardown().unwrap();
        assert!(!ctx.is_logged_in());
        assert!(ctx.derive_header(AcceptKind::Json).is_anonymous());
    }

    #[test]
    fn test_corrupt_record_is_anonymous() {
        let store = MemorySessionStore::new();
        store.save("{not json").unwrap();
        let ctx = SessionContext::new(store);
        assert!(ctx.current().is_none());
        assert!(ctx.derive_header(AcceptKind::Json).is_anonymous());
    }

    #[test]
    fn test_session_from_login_payload_keeps_extra_fields() {
        let payload = json!({ "token": "jwt", "roles": ["admin"] });
        let session = Session::from_login_payload(payload, "bob", "pw").unwrap();
        assert_eq!(session.bearer_token(), Some("jwt"));
        assert_eq!(session.username.as_deref(), Some("bob"));
        assert_eq!(session.basic_auth(), Some(basic_auth_blob("bob", "pw").as_str()));
        assert_eq!(session.extra.get("roles"), Some(&json!(["admin"])));

        let raw = serde_json::to_value(&session).unwrap();
        assert_eq!(raw["authdata"], json!("Ym9iOnB3"));
        assert_eq!(raw["roles"], json!(["admin"]));
    }

    #[test]
    fn test_session_from_empty_payload() {
        assert!(Session::from_login_payload(Value::Null, "bob", "pw").is_none());
        assert!(Session::from_login_payload(json!("ok"), "bob", "pw").is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = Session::with_token("very-secret");
        let debug = format!("{session:?}");
        assert!(!debug.contains("very-secret"));
    }
}
