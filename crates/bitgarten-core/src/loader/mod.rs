//! Orchestration of album and media loads.
//!
//! [`Loader`] owns the shared state (gateway, media cache, album store) and
//! sequences the flows that span them: fetch an album, normalise its
//! pictures, dispatch media loads, commit the album.

mod dispatch;
mod stream;

use std::sync::Arc;
use std::time::Duration;

use bitgarten_client::{Gateway, Transport};
use serde_json::Value;
use tracing::{debug, info};

use crate::album::{AlbumDetail, AlbumId, AlbumStore, AlbumSummary};
use crate::cache::{CachedMedia, CachedThumbnail, MediaCache};
use crate::error::Result;
use crate::service::{AlbumService, CatalogService, DirectoryPicture, MediaService};

pub use dispatch::Dispatched;
pub use stream::PlaybackElement;

/// Default time a playback element gets to open its media source.
pub const DEFAULT_SOURCE_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Loader behaviour switches.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Dispatch a thumbnail load for every album after a summary load.
    pub prefetch_summary_thumbnails: bool,
    /// Bound on waiting for a media source to open.
    pub source_open_timeout: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            prefetch_summary_thumbnails: true,
            source_open_timeout: DEFAULT_SOURCE_OPEN_TIMEOUT,
        }
    }
}

impl LoaderOptions {
    /// Sets whether summary loads prefetch thumbnails.
    #[must_use]
    pub const fn with_prefetch_summary_thumbnails(mut self, enabled: bool) -> Self {
        self.prefetch_summary_thumbnails = enabled;
        self
    }

    /// Sets the media source open timeout.
    #[must_use]
    pub const fn with_source_open_timeout(mut self, timeout: Duration) -> Self {
        self.source_open_timeout = timeout;
        self
    }
}

/// Entry point of the data layer.
///
/// Cloning is cheap; clones share all state.
pub struct Loader<T> {
    gateway: Arc<Gateway<T>>,
    cache: Arc<MediaCache>,
    albums: Arc<AlbumStore>,
    initializing: Arc<tokio::sync::Mutex<()>>,
    options: LoaderOptions,
}

impl<T> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            cache: Arc::clone(&self.cache),
            albums: Arc::clone(&self.albums),
            initializing: Arc::clone(&self.initializing),
            options: self.options.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("gateway", &self.gateway)
            .field("images", &self.cache.image_count())
            .field("thumbnails", &self.cache.thumbnail_count())
            .field("albums", &self.albums.summary_count())
            .field("options", &self.options)
            .finish()
    }
}

impl<T: Transport> Loader<T> {
    /// Creates a loader with an empty cache and album store.
    pub fn new(gateway: Gateway<T>, options: LoaderOptions) -> Self {
        Self::with_state(
            Arc::new(gateway),
            Arc::new(MediaCache::new()),
            Arc::new(AlbumStore::new()),
            options,
        )
    }

    /// Creates a loader over existing shared state.
    pub fn with_state(
        gateway: Arc<Gateway<T>>,
        cache: Arc<MediaCache>,
        albums: Arc<AlbumStore>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            gateway,
            cache,
            albums,
            initializing: Arc::new(tokio::sync::Mutex::new(())),
            options,
        }
    }

    /// The gateway all requests go through.
    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    /// The media cache.
    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// The album store.
    pub fn albums(&self) -> &AlbumStore {
        &self.albums
    }

    /// Loader options.
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    fn media(&self) -> MediaService<T> {
        MediaService::new(Arc::clone(&self.gateway), Arc::clone(&self.cache))
    }

    fn album_service(&self) -> AlbumService<T> {
        AlbumService::new(Arc::clone(&self.gateway))
    }

    fn catalog(&self) -> CatalogService<T> {
        CatalogService::new(Arc::clone(&self.gateway))
    }

    /// Loads an image unless one is cached for `hash`.
    pub async fn load_image_if_absent(&self, hash: &str) -> Option<CachedMedia> {
        if let Some(hit) = self.cache.get(hash) {
            return Some(hit);
        }
        self.media().load_image(hash).await
    }

    /// Loads a video unless an entry is cached for `hash`.
    pub async fn load_video_if_absent(&self, hash: &str) -> Option<CachedMedia> {
        if let Some(hit) = self.cache.get(hash) {
            return Some(hit);
        }
        self.media().load_video(hash).await
    }

    /// Loads a thumbnail unless one is cached for `hash`.
    pub async fn load_thumbnail_if_absent(&self, hash: &str) -> Option<CachedThumbnail> {
        if let Some(hit) = self.cache.get_thumbnail(hash) {
            return Some(hit);
        }
        self.media().load_thumbnail(hash).await
    }

    /// Spawns an image load onto `dispatched`. Must run inside a Tokio
    /// runtime.
    pub fn dispatch_image(&self, hash: &str, dispatched: &mut Dispatched) {
        if hash.is_empty() || self.cache.contains(hash) {
            return;
        }
        let loader = self.clone();
        let hash = hash.to_string();
        dispatched.spawn(async move {
            loader.load_image_if_absent(&hash).await;
        });
    }

    /// Spawns a thumbnail load onto `dispatched`. Must run inside a Tokio
    /// runtime.
    pub fn dispatch_thumbnail(&self, hash: &str, dispatched: &mut Dispatched) {
        if hash.is_empty() || self.cache.contains_thumbnail(hash) {
            return;
        }
        let loader = self.clone();
        let hash = hash.to_string();
        dispatched.spawn(async move {
            loader.load_thumbnail_if_absent(&hash).await;
        });
    }

    /// Summaries, ascending by date. Never triggers a load.
    pub fn list_albums(&self) -> Vec<AlbumSummary> {
        self.albums.list_albums()
    }

    /// Loads summaries if none were ever loaded.
    ///
    /// Returns the thumbnail loads dispatched, empty if the store was
    /// already initialized. Concurrent callers wait for the first load
    /// instead of starting their own.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_album_summaries`].
    pub async fn ensure_initialized(&self) -> Result<Dispatched> {
        if self.albums.is_initialized() {
            return Ok(Dispatched::new());
        }
        let _initializing = self.initializing.lock().await;
        if self.albums.is_initialized() {
            return Ok(Dispatched::new());
        }
        debug!("Album store uninitialized, loading summaries");
        self.load_album_summaries().await
    }

    /// Replaces the summary list with a fresh bulk load.
    ///
    /// With `prefetch_summary_thumbnails` set, a thumbnail load is
    /// dispatched for every album cover.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload does not
    /// normalise; the store is left untouched in that case.
    pub async fn load_album_summaries(&self) -> Result<Dispatched> {
        let summaries = self.album_service().fetch_summaries().await?;

        let mut dispatched = Dispatched::new();
        if self.options.prefetch_summary_thumbnails {
            for summary in &summaries {
                self.dispatch_thumbnail(summary.thumbnail_hash.as_str(), &mut dispatched);
            }
        }

        self.albums.replace_summaries(summaries);
        info!(
            albums = self.albums.summary_count(),
            thumbnails = dispatched.len(),
            "Album summaries loaded"
        );
        Ok(dispatched)
    }

    /// Loads one album and appends it to the store.
    ///
    /// With `eager_load_images`, an image load is dispatched for every
    /// still-image picture; videos are never loaded here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidAlbumId`] for ISN 0, and request or
    /// payload errors otherwise.
    pub async fn load_album_detail(
        &self,
        id: AlbumId,
        eager_load_images: bool,
    ) -> Result<Dispatched> {
        let detail = self.album_service().fetch_detail(id).await?;

        let mut dispatched = Dispatched::new();
        if eager_load_images {
            for picture in detail.images() {
                self.dispatch_image(picture.content_hash.as_str(), &mut dispatched);
            }
        }

        debug!(%id, dispatched = dispatched.len(), "Album detail loaded");
        self.albums.append_detail(detail);
        Ok(dispatched)
    }

    /// Loads one album and dispatches a thumbnail load for every picture.
    ///
    /// # Errors
    ///
    /// See [`Loader::load_album_detail`].
    pub async fn load_album_thumbnails(&self, id: AlbumId) -> Result<Dispatched> {
        let detail = self.album_service().fetch_detail(id).await?;

        let mut dispatched = Dispatched::new();
        for picture in &detail.pictures {
            self.dispatch_thumbnail(picture.content_hash.as_str(), &mut dispatched);
        }

        debug!(%id, dispatched = dispatched.len(), "Album thumbnails loading");
        self.albums.append_detail(detail);
        Ok(dispatched)
    }

    /// First loaded detail for `id`.
    pub fn album_by_id(&self, id: AlbumId) -> Option<AlbumDetail> {
        self.albums.album_by_id(id)
    }

    /// Drops all albums and cached media.
    pub fn reset(&self) {
        self.albums.clear();
        self.cache.clear();
        info!("Loader state reset");
    }

    /// Creates an album. See [`AlbumService::create_album`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_album(&self, record: &Value) -> Result<Value> {
        self.album_service().create_album(record).await
    }

    /// Replaces an album record. See [`AlbumService::update_album`].
    ///
    /// # Errors
    ///
    /// Returns an error if the id is 0 or the request fails.
    pub async fn update_album(&self, id: AlbumId, record: &Value) -> Result<Value> {
        self.album_service().update_album(id, record).await
    }

    /// Deletes an album; ISN 0 is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_album(&self, id: AlbumId) -> Result<()> {
        self.album_service().delete_album(id).await
    }

    /// Lists picture import directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_picture_directories(&self) -> Result<Vec<String>> {
        self.catalog().list_picture_directories().await
    }

    /// Lists the pictures of one directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_directory_pictures(&self, directory: &str) -> Result<Vec<DirectoryPicture>> {
        self.catalog().list_directory_pictures(directory).await
    }
}
