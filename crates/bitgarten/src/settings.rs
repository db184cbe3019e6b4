//! Settings file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use bitgarten_client::{ClientConfig, DEFAULT_BASE_URL};
use bitgarten_core::LoaderOptions;
use serde::{Deserialize, Serialize};

/// Settings that persist across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Gallery server URL.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Fetch album cover thumbnails along with the album list.
    pub prefetch_thumbnails: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            prefetch_thumbnails: true,
        }
    }
}

impl AppSettings {
    /// Client configuration, with `url_override` winning over the file.
    pub fn client_config(&self, url_override: Option<&str>) -> anyhow::Result<ClientConfig> {
        let base_url = url_override.unwrap_or(&self.base_url);
        ClientConfig::builder(base_url)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .with_context(|| format!("invalid server URL {base_url}"))
    }

    /// Loader options from the file.
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::default().with_prefetch_summary_thumbnails(self.prefetch_thumbnails)
    }
}

fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bitgarten")
        .join("settings.json")
}

/// Load application settings from file.
pub async fn load_settings() -> anyhow::Result<AppSettings> {
    let settings_path = settings_path();

    if !settings_path.exists() {
        return Ok(AppSettings::default());
    }

    let contents = tokio::fs::read_to_string(&settings_path)
        .await
        .with_context(|| format!("reading {}", settings_path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("parsing {}", settings_path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"prefetch_thumbnails": false}"#).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(!settings.loader_options().prefetch_summary_thumbnails);
    }

    #[test]
    fn test_url_override() {
        let settings = AppSettings::default();
        let config = settings.client_config(Some("http://nas:9000")).unwrap();
        assert_eq!(config.base_url.as_str(), "http://nas:9000/");

        let config = settings.client_config(None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8130/");
    }

    #[test]
    fn test_bad_url() {
        assert!(AppSettings::default().client_config(Some("ftp://x")).is_err());
    }
}
