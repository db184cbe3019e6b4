//! Fetching and caching of images, videos and thumbnails.
//!
//! Every load here is fail-soft: transport and decode failures are logged
//! and the load resolves to `None` without touching the cache.

use std::sync::Arc;

use bitgarten_client::{AcceptKind, Gateway, Transport, endpoints};
use bitgarten_media::{DataUrl, IMAGE_JPEG, VIDEO_MP4, probe_dimensions};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{CachedMedia, CachedThumbnail, ContentHash, MediaCache};

/// Loads media by content hash into a [`MediaCache`].
pub struct MediaService<T> {
    gateway: Arc<Gateway<T>>,
    cache: Arc<MediaCache>,
}

impl<T> Clone for MediaService<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<T: Transport> MediaService<T> {
    /// Creates a service writing to `cache`.
    pub const fn new(gateway: Arc<Gateway<T>>, cache: Arc<MediaCache>) -> Self {
        Self { gateway, cache }
    }

    /// The cache this service writes to.
    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    async fn fetch(&self, path: &str, hash: &str) -> Option<Bytes> {
        match self.gateway.request_binary(path, AcceptKind::Empty).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(hash, "Media fetch failed: {e}");
                None
            }
        }
    }

    /// Loads a full-size image.
    ///
    /// A cached entry is returned as is. Otherwise the bytes are fetched and
    /// committed as a pending entry, then the dimensions are probed and the
    /// entry updated; the value returned is the decoded entry. If the probe
    /// fails the pending entry is removed again.
    pub async fn load_image(&self, hash: &str) -> Option<CachedMedia> {
        if hash.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(hash) {
            debug!(hash, "Image cache hit");
            return Some(hit);
        }

        let bytes = self.fetch(&endpoints::picture_media(hash), hash).await?;
        let data_url = DataUrl::encode(IMAGE_JPEG, &bytes);
        self.cache
            .commit(CachedMedia::pending_image(ContentHash::new(hash), data_url));

        let probe = tokio::task::spawn_blocking(move || probe_dimensions(&bytes)).await;
        match probe {
            Ok(Ok(dimensions)) => {
                self.cache.mark_decoded(hash, dimensions);
            }
            Ok(Err(e)) => {
                warn!(hash, "Image decode failed: {e}");
                self.cache.discard_pending(hash);
                return None;
            }
            Err(e) => {
                warn!(hash, "Image decode task failed: {e}");
                self.cache.discard_pending(hash);
                return None;
            }
        }
        self.cache.get(hash)
    }

    /// Loads a video. Committed once, with no dimension step.
    pub async fn load_video(&self, hash: &str) -> Option<CachedMedia> {
        if hash.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(hash) {
            debug!(hash, "Video cache hit");
            return Some(hit);
        }

        let bytes = self.fetch(&endpoints::video_media(hash), hash).await?;
        let entry = CachedMedia::video(ContentHash::new(hash), DataUrl::encode(VIDEO_MP4, &bytes));
        self.cache.commit(entry.clone());
        Some(entry)
    }

    /// Loads a thumbnail into the thumbnail namespace.
    pub async fn load_thumbnail(&self, hash: &str) -> Option<CachedThumbnail> {
        if hash.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get_thumbnail(hash) {
            debug!(hash, "Thumbnail cache hit");
            return Some(hit);
        }

        let bytes = self.fetch(&endpoints::picture_thumbnail(hash), hash).await?;
        let entry = CachedThumbnail {
            content_hash: ContentHash::new(hash),
            data_url: DataUrl::encode(IMAGE_JPEG, &bytes),
        };
        self.cache.commit_thumbnail(entry.clone());
        Some(entry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bitgarten_client::testing::ScriptedTransport;
    use bitgarten_client::{ClientConfig, HttpResponse, Method, SessionContext};
    use std::io::Cursor;

    use crate::cache::{CacheEvent, DecodeState, Fill};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn service() -> (MediaService<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let config = ClientConfig::new("http://gallery.test").unwrap();
        let gateway = Gateway::new(Arc::clone(&transport), config, SessionContext::in_memory());
        let service = MediaService::new(Arc::new(gateway), Arc::new(MediaCache::new()));
        (service, transport)
    }

    #[tokio::test]
    async fn test_load_image_two_phase() {
        let (service, transport) = service();
        let bytes = png(3, 2);
        let path = endpoints::picture_media("abc");
        transport.on(Method::GET, &path, HttpResponse::new(200, bytes.clone()));
        let mut events = service.cache().subscribe();

        let media = service.load_image("abc").await.unwrap();
        assert_eq!(media.state, DecodeState::Ready { width: 3, height: 2 });
        assert_eq!(media.fill, Fill::Fill);
        assert_eq!(media.mime_type(), "image/jpeg");
        assert_eq!(media.data_url.decode().unwrap(), bytes);

        assert_eq!(events.recv().await.unwrap(), CacheEvent::MediaCommitted("abc".into()));
        assert!(matches!(
            events.recv().await.unwrap(),
            CacheEvent::MediaDecoded { width: 3, height: 2, .. }
        ));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].accept, "");
    }

    #[tokio::test]
    async fn test_cached_image_is_not_refetched() {
        let (service, transport) = service();
        let path = endpoints::picture_media("abc");
        transport.on(Method::GET, &path, HttpResponse::new(200, png(1, 1)));

        let first = service.load_image("abc").await.unwrap();
        let second = service.load_image("abc").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.count(&path), 1);
    }

    #[tokio::test]
    async fn test_undecodable_image_leaves_no_entry() {
        let (service, transport) = service();
        let path = endpoints::picture_media("bad");
        transport.on(Method::GET, &path, HttpResponse::new(200, "not an image"));
        let mut events = service.cache().subscribe();

        assert!(service.load_image("bad").await.is_none());
        assert!(!service.cache().contains("bad"));
        assert_eq!(events.recv().await.unwrap(), CacheEvent::MediaCommitted("bad".into()));
        assert_eq!(events.recv().await.unwrap(), CacheEvent::MediaDiscarded("bad".into()));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_soft() {
        let (service, transport) = service();
        transport.fail(Method::GET, &endpoints::picture_media("x"), "reset");
        transport.on(Method::GET, &endpoints::video_media("y"), HttpResponse::empty(500));

        assert!(service.load_image("x").await.is_none());
        assert!(service.load_video("y").await.is_none());
        assert_eq!(service.cache().image_count(), 0);
    }

    #[tokio::test]
    async fn test_load_video() {
        let (service, transport) = service();
        let path = endpoints::video_media("v1");
        transport.on(Method::GET, &path, HttpResponse::new(200, vec![0_u8, 159, 255]));

        let video = service.load_video("v1").await.unwrap();
        assert_eq!(video.state, DecodeState::NotApplicable);
        assert_eq!(video.fill, Fill::FillHeight);
        assert_eq!(video.data_url.to_string(), "data:video/mp4;base64,AJ//");
        assert!(service.cache().contains("v1"));
    }

    #[tokio::test]
    async fn test_load_thumbnail() {
        let (service, transport) = service();
        let path = endpoints::picture_thumbnail("h1");
        transport.on(Method::GET, &path, HttpResponse::new(200, "thumb"));

        let first = service.load_thumbnail("h1").await.unwrap();
        let second = service.load_thumbnail("h1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.count(&path), 1);
        assert_eq!(service.cache().thumbnail_count(), 1);
        assert!(!service.cache().contains("h1"));
    }

    #[tokio::test]
    async fn test_empty_hash_is_ignored() {
        let (service, transport) = service();
        assert!(service.load_image("").await.is_none());
        assert!(service.load_video("").await.is_none());
        assert!(service.load_thumbnail("").await.is_none());
        assert!(transport.requests().is_empty());
    }
}
