//! Album reads and record CRUD.

use std::sync::Arc;

use bitgarten_client::{AcceptKind, Gateway, Method, Transport, endpoints};
use serde_json::Value;
use tracing::{debug, info};

use crate::album::wire;
use crate::album::{AlbumDetail, AlbumId, AlbumSummary};
use crate::error::{Error, Result};

/// Fetches and normalises album records.
pub struct AlbumService<T> {
    gateway: Arc<Gateway<T>>,
}

impl<T> Clone for AlbumService<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<T: Transport> AlbumService<T> {
    /// Creates a service over a shared gateway.
    pub const fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    /// Fetches every album summary, in response order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload has no records.
    pub async fn fetch_summaries(&self) -> Result<Vec<AlbumSummary>> {
        let payload = self.gateway.get_json(endpoints::ALBUM_SUMMARIES).await?;
        let summaries = wire::summaries(payload)?;
        debug!(count = summaries.len(), "Fetched album summaries");
        Ok(summaries)
    }

    /// Fetches one album with its pictures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlbumId`] for ISN 0 without sending a request,
    /// and request or payload errors otherwise.
    pub async fn fetch_detail(&self, id: AlbumId) -> Result<AlbumDetail> {
        if !id.is_valid() {
            return Err(Error::InvalidAlbumId(id.0));
        }
        let payload = self.gateway.get_json(&endpoints::album(id.0)).await?;
        wire::detail(id, payload)
    }

    /// Creates an album from a raw record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_album(&self, record: &Value) -> Result<Value> {
        let body = wire::store_body(record);
        let response = self
            .gateway
            .request(Method::POST, endpoints::ALBUMS, Some(&body), AcceptKind::Json)
            .await?;
        info!("Album created");
        Ok(response)
    }

    /// Replaces an album record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlbumId`] for ISN 0, and request errors
    /// otherwise.
    pub async fn update_album(&self, id: AlbumId, record: &Value) -> Result<Value> {
        if !id.is_valid() {
            return Err(Error::InvalidAlbumId(id.0));
        }
        let body = wire::store_body(record);
        let response = self
            .gateway
            .request(
                Method::PUT,
                &endpoints::album_update(id.0),
                Some(&body),
                AcceptKind::Json,
            )
            .await?;
        info!(%id, "Album updated");
        Ok(response)
    }

    /// Deletes an album. ISN 0 is silently ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_album(&self, id: AlbumId) -> Result<()> {
        if !id.is_valid() {
            debug!("Ignoring delete of album 0");
            return Ok(());
        }
        self.gateway
            .request(Method::DELETE, &endpoints::album(id.0), None, AcceptKind::Json)
            .await?;
        info!(%id, "Album deleted");
        Ok(())
    }
}
