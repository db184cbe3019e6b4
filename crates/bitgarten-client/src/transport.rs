//! HTTP transport seam.
//!
//! The gateway speaks to the network only through [`Transport`], which keeps
//! the status policy testable without sockets.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::AuthHeader;

pub use reqwest::Method;

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Credentials and Accept preference.
    pub header: AuthHeader,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Path plus query string, as sent on the request line.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }
}

/// A buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase for the status.
    pub status_text: String,
    /// Raw body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response with the canonical reason phrase.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    /// Creates a response with a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Creates a response with no body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, Bytes::new())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends prepared requests and buffers the whole response.
pub trait Transport: Send + Sync + 'static {
    /// Sends one request.
    ///
    /// Only failures to obtain a response are errors; any status code is a
    /// successful send.
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send {
        (**self).send(request)
    }
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the configured timeouts and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http_client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http_client.request(request.method, request.url);
        if !request.header.authorization.is_empty() {
            builder = builder.header(AUTHORIZATION, request.header.authorization);
        }
        if !request.header.accept.is_empty() {
            builder = builder.header(ACCEPT, request.header.accept);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_text() {
        let response = HttpResponse::empty(404);
        assert_eq!(response.status_text, "Not Found");
        assert!(!response.is_success());
        assert!(HttpResponse::empty(204).is_success());
    }

    #[test]
    fn test_path_and_query() {
        let request = HttpRequest {
            method: Method::GET,
            url: Url::parse("http://localhost:8130/rest/map/Albums?limit=0").unwrap(),
            header: AuthHeader::default(),
            body: None,
        };
        assert_eq!(request.path_and_query(), "/rest/map/Albums?limit=0");
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let config = ClientConfig::new("http://localhost:8130").unwrap();
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
