//! Authenticated fetch gateway.
//!
//! Every outbound call goes through [`Gateway`]: headers come from the
//! session, and a 401 or 404 answer tears the session down and forces a full
//! application reload. There is no retry.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::{Error, Result};
use crate::session::{AcceptKind, AuthHeader, Session, SessionContext};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Restarts the application shell after the session was invalidated.
pub trait ReloadHandler: Send + Sync {
    /// Discards all in-process state and starts over.
    fn force_reload(&self);
}

impl<F> ReloadHandler for F
where
    F: Fn() + Send + Sync,
{
    fn force_reload(&self) {
        self();
    }
}

/// Reload requests published on a watch channel.
///
/// The value is the number of reloads requested so far; a shell awaits
/// `changed()` on a subscription and rebuilds itself.
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for ReloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadSignal {
    /// Creates a signal with no reloads requested.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribes to reload requests.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Number of reloads requested so far.
    #[must_use]
    pub fn reload_count(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl ReloadHandler for ReloadSignal {
    fn force_reload(&self) {
        self.tx.send_modify(|n| *n += 1);
    }
}

/// Wraps a [`Transport`] with session headers and the shared status policy.
pub struct Gateway<T> {
    transport: T,
    config: ClientConfig,
    session: SessionContext,
    reload: Arc<dyn ReloadHandler>,
}

impl<T> fmt::Debug for Gateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.config.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Gateway<T> {
    /// Creates a gateway. Reloads go to a fresh [`ReloadSignal`] until
    /// [`Gateway::with_reload_handler`] installs a real one.
    pub fn new(transport: T, config: ClientConfig, session: SessionContext) -> Self {
        Self {
            transport,
            config,
            session,
            reload: Arc::new(ReloadSignal::new()),
        }
    }

    /// Installs the handler invoked after an authentication failure.
    #[must_use]
    pub fn with_reload_handler(mut self, handler: impl ReloadHandler + 'static) -> Self {
        self.reload = Arc::new(handler);
        self
    }

    /// Client configuration.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session context headers are derived from.
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request and returns the parsed JSON payload unmodified.
    ///
    /// An empty body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] if no response arrived
    /// - [`Error::AuthFailure`] on 401/404 (after teardown and reload)
    /// - [`Error::Api`] on any other non-2xx status
    /// - [`Error::Json`] if a 2xx body is not JSON
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        accept: AcceptKind,
    ) -> Result<Value> {
        let header = self.session.derive_header(accept);
        let response = self.send(method, path, body, header).await?;
        parse_payload(&response.body)
    }

    /// `GET` returning JSON.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`].
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None, AcceptKind::Json).await
    }

    /// `GET` returning raw bytes, under the same header and status policy.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`]; the body is never parsed.
    pub async fn request_binary(&self, path: &str, accept: AcceptKind) -> Result<Bytes> {
        let header = self.session.derive_header(accept);
        let response = self.send(Method::GET, path, None, header).await?;
        Ok(response.body)
    }

    /// Logs in with raw credentials and persists the resulting session.
    ///
    /// The persisted record carries the server's fields (token included)
    /// plus a recomputed basic-auth blob and the username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Login`] if the credentials are rejected or the
    /// server returns no user record, and other variants for transport,
    /// payload or persistence failures.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let header = AuthHeader::basic(username, password, AcceptKind::Json);
        let response = self
            .send(Method::POST, endpoints::LOGIN, None, header)
            .await
            .map_err(|e| match e {
                Error::AuthFailure { status } => {
                    Error::Login(format!("credentials rejected (HTTP {status})"))
                }
                other => other,
            })?;

        let payload = parse_payload(&response.body)?;
        let session = Session::from_login_payload(payload, username, password)
            .ok_or_else(|| Error::Login("server returned no user record".to_string()))?;
        self.session.persist(&session)?;

        info!(username, "Logged in");
        Ok(session)
    }

    /// Removes the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub fn logout(&self) -> Result<()> {
        self.session.teardown().map_err(Into::into)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        header: AuthHeader,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.config.endpoint(path)?,
            header,
            body: body.cloned(),
        };
        debug!(method = %request.method, path, "Sending request");

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        Err(self.reject(&response))
    }

    fn reject(&self, response: &HttpResponse) -> Error {
        let status = response.status;
        if status == 401 || status == 404 {
            warn!(status, "Authentication failure, clearing session");
            if let Err(e) = self.session.teardown() {
                error!("Failed to clear session: {e}");
            }
            self.reload.force_reload();
            return Error::AuthFailure { status };
        }

        let message = server_message(&response.body)
            .or_else(|| Some(response.status_text.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("HTTP {status}"));
        Error::Api { status, message }
    }
}

fn parse_payload(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(Into::into)
}

fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
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
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn gateway(
        transport: &Arc<ScriptedTransport>,
    ) -> (Gateway<Arc<ScriptedTransport>>, ReloadSignal) {
        let reload = ReloadSignal::new();
        let config = ClientConfig::new("http://gallery.test").unwrap();
        let gateway = Gateway::new(Arc::clone(transport), config, SessionContext::in_memory())
            .with_reload_handler(reload.clone());
        (gateway, reload)
    }

    #[tokio::test]
    async fn test_request_returns_payload_unmodified() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(Method::GET, "/rest/map/Album/5", 200, &json!({"Records": [1, 2]}));
        let (gateway, _) = gateway(&transport);

        let value = gateway.get_json("/rest/map/Album/5").await.unwrap();
        assert_eq!(value, json!({"Records": [1, 2]}));
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::DELETE, "/rest/map/Album/5", HttpResponse::empty(200));
        let (gateway, _) = gateway(&transport);

        let value = gateway
            .request(Method::DELETE, "/rest/map/Album/5", None, AcceptKind::Json)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_headers_come_from_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(Method::GET, "/rest/map/Albums", 200, &json!({}));
        let (gateway, _) = gateway(&transport);
        gateway.session().persist(&Session::with_token("tok")).unwrap();

        gateway.get_json("/rest/map/Albums").await.unwrap();
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].authorization, "Bearer tok");
        assert_eq!(sent[0].accept, "application/json");
    }

    #[tokio::test]
    async fn test_auth_failure_tears_down_once_per_response() {
        for status in [401, 404] {
            let transport = Arc::new(ScriptedTransport::new());
            let path = endpoints::picture_media("x");
            transport.on(Method::GET, &path, HttpResponse::empty(status));
            let (gateway, reload) = gateway(&transport);
            gateway.session().persist(&Session::with_token("tok")).unwrap();

            let err = gateway
                .request_binary(&path, AcceptKind::Empty)
                .await
                .unwrap_err();

            assert!(matches!(err, Error::AuthFailure { status: s } if s == status));
            assert!(!gateway.session().is_logged_in());
            assert_eq!(reload.reload_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_api_error_prefers_server_message() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(Method::GET, "/a", 500, &json!({"message": "database offline"}));
        transport.on(Method::GET, "/b", HttpResponse::new(503, "<html>busy</html>"));
        let (gateway, reload) = gateway(&transport);
        gateway.session().persist(&Session::with_token("tok")).unwrap();

        let err = gateway.get_json("/a").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, ref message } if message == "database offline"));

        let err = gateway.get_json("/b").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 503, ref message } if message == "Service Unavailable"));

        assert!(gateway.session().is_logged_in());
        assert_eq!(reload.reload_count(), 0);
    }

    #[tokio::test]
    async fn test_network_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::GET, "/a", "connection refused");
        let (gateway, reload) = gateway(&transport);

        let err = gateway.get_json("/a").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(reload.reload_count(), 0);
    }

    #[tokio::test]
    async fn test_non_json_success_body() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::GET, "/a", HttpResponse::new(200, "plain"));
        let (gateway, _) = gateway(&transport);
        assert!(matches!(gateway.get_json("/a").await, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(Method::POST, "/login", 200, &json!({"token": "jwt", "admin": true}));
        let (gateway, _) = gateway(&transport);

        let session = gateway.login("alice", "secret").await.unwrap();
        assert_eq!(session.bearer_token(), Some("jwt"));

        let sent = transport.requests();
        assert_eq!(sent[0].authorization, "Basic YWxpY2U6c2VjcmV0");
        assert_eq!(sent[0].accept, "application/json");

        let stored = gateway.session().current().unwrap();
        assert_eq!(stored, session);
        assert_eq!(stored.extra.get("admin"), Some(&json!(true)));
        assert_eq!(
            gateway.session().derive_header(AcceptKind::Json).authorization,
            "Bearer jwt"
        );
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::POST, "/login", HttpResponse::empty(401));
        let (gateway, reload) = gateway(&transport);

        let err = gateway.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Login(_)));
        assert!(!gateway.session().is_logged_in());
        assert_eq!(reload.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_login_empty_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::POST, "/login", HttpResponse::empty(200));
        let (gateway, _) = gateway(&transport);

        assert!(matches!(gateway.login("alice", "pw").await, Err(Error::Login(_))));
        assert!(!gateway.session().is_logged_in());
    }

    #[test]
    fn test_reload_signal_wakes_subscriber() {
        let signal = ReloadSignal::new();
        let mut rx = signal.subscribe();
        {
            let mut changed = tokio_test::task::spawn(rx.changed());
            tokio_test::assert_pending!(changed.poll());

            signal.force_reload();
            assert!(changed.is_woken());
            tokio_test::assert_ready_ok!(changed.poll());
        }
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(signal.reload_count(), 1);
    }

    #[test]
    fn test_closure_reload_handler() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handler = move || {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        handler.force_reload();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
