//! Client configuration types.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Address of the development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8130";

/// Gallery API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin every endpoint path is appended to.
    pub base_url: Url,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given server with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(base_url: impl AsRef<str>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Joins an endpoint path (with query) onto the base URL.
    ///
    /// Any path prefix on the base URL is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(Into::into)
    }
}

fn default_user_agent() -> String {
    format!("bitgarten/{}", env!("CARGO_PKG_VERSION"))
}

/// Builder for client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder for the given server.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }

    /// Sets the whole-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or is not http(s).
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = Url::parse(&self.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https, got {}",
                base_url.scheme()
            )));
        }

        Ok(ClientConfig {
            base_url,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        })
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

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8130/");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("bitgarten/"));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder("https://gallery.example.com")
            .request_timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .user_agent("test-agent")
            .build()
            .unwrap();

        assert_eq!(config.base_url.host_str(), Some("gallery.example.com"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_config_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(matches!(
            ClientConfig::new("ftp://gallery.example.com"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_keeps_query_and_prefix() {
        let config = ClientConfig::new("https://example.com/app/").unwrap();
        let url = config
            .endpoint("/binary/map/Picture/*/Media?search=Md5=abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/app/binary/map/Picture/*/Media?search=Md5=abc"
        );
    }
}
