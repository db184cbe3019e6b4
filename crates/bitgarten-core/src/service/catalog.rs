//! Picture directories and their contents.

use std::sync::Arc;

use bitgarten_client::{Gateway, Transport, endpoints};
use serde::Deserialize;
use tracing::debug;

use crate::album::wire;
use crate::cache::ContentHash;
use crate::error::Result;

/// A picture listed in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPicture {
    /// File name.
    pub title: String,
    /// Hash of the media bytes.
    pub content_hash: ContentHash,
    /// Picture record ISN.
    pub isn: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DirectoryRecord {
    #[serde(default)]
    directory: String,
}

#[derive(Debug, Deserialize)]
struct PictureRecord {
    #[serde(rename = "PictureName", default)]
    name: String,
    #[serde(rename = "Md5", default)]
    md5: String,
    #[serde(rename = "ISN", default)]
    isn: u64,
}

/// Browses picture metadata by directory.
pub struct CatalogService<T> {
    gateway: Arc<Gateway<T>>,
}

impl<T> Clone for CatalogService<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<T: Transport> CatalogService<T> {
    /// Creates a service over a shared gateway.
    pub const fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    /// Lists the distinct directories pictures were imported from.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload has no records.
    pub async fn list_picture_directories(&self) -> Result<Vec<String>> {
        let payload = self.gateway.get_json(endpoints::PICTURE_DIRECTORIES).await?;
        let records: Vec<DirectoryRecord> = wire::records(payload, "picture directories")?;
        debug!(count = records.len(), "Fetched picture directories");
        Ok(records.into_iter().map(|r| r.directory).collect())
    }

    /// Lists the pictures in one directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload has no records.
    pub async fn list_directory_pictures(&self, directory: &str) -> Result<Vec<DirectoryPicture>> {
        let path = endpoints::picture_directory(directory);
        let payload = self.gateway.get_json(&path).await?;
        let records: Vec<PictureRecord> = wire::records(payload, "directory pictures")?;
        Ok(records
            .into_iter()
            .map(|r| DirectoryPicture {
                title: r.name,
                content_hash: r.md5.into(),
                isn: r.isn,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bitgarten_client::testing::ScriptedTransport;
    use bitgarten_client::{ClientConfig, Method, SessionContext};
    use serde_json::json;

    fn service() -> (CatalogService<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let config = ClientConfig::new("http://gallery.test").unwrap();
        let gateway = Gateway::new(Arc::clone(&transport), config, SessionContext::in_memory());
        (CatalogService::new(Arc::new(gateway)), transport)
    }

    #[tokio::test]
    async fn test_list_directories() {
        let (service, transport) = service();
        transport.on_json(
            Method::GET,
            endpoints::PICTURE_DIRECTORIES,
            200,
            &json!({"Records": [{"Directory": "2019"}, {"Directory": "2020"}]}),
        );
        let dirs = service.list_picture_directories().await.unwrap();
        assert_eq!(dirs, vec!["2019".to_string(), "2020".to_string()]);
    }

    #[tokio::test]
    async fn test_list_directory_pictures() {
        let (service, transport) = service();
        transport.on_json(
            Method::GET,
            &endpoints::picture_directory("2019"),
            200,
            &json!({"Records": [{"PictureName": "a.jpg", "Md5": "m1", "ISN": 11}]}),
        );
        let pictures = service.list_directory_pictures("2019").await.unwrap();
        assert_eq!(
            pictures,
            vec![DirectoryPicture {
                title: "a.jpg".to_string(),
                content_hash: "m1".into(),
                isn: 11,
            }]
        );
    }
}
