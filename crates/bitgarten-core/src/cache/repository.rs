//! In-memory media cache storage.

use std::collections::HashMap;

use bitgarten_media::Dimensions;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use super::model::{CacheEvent, CachedMedia, CachedThumbnail, ContentHash};

const EVENT_CAPACITY: usize = 256;

/// Process-wide store of fetched media, one entry per content hash per
/// namespace.
///
/// Writes replace whatever is stored under the hash, so concurrent loads of
/// the same hash converge on a single entry.
#[derive(Debug)]
pub struct MediaCache {
    media: RwLock<HashMap<ContentHash, CachedMedia>>,
    thumbnails: RwLock<HashMap<ContentHash, CachedThumbnail>>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            media: RwLock::new(HashMap::new()),
            thumbnails: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Subscribes to cache mutations.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Looks up an image or video entry.
    #[must_use]
    pub fn get(&self, hash: &str) -> Option<CachedMedia> {
        self.media.read().get(hash).cloned()
    }

    /// Returns true if an image or video entry exists for `hash`.
    #[must_use]
    pub fn contains(&self, hash: &str) -> bool {
        self.media.read().contains_key(hash)
    }

    /// Looks up a thumbnail.
    #[must_use]
    pub fn get_thumbnail(&self, hash: &str) -> Option<CachedThumbnail> {
        self.thumbnails.read().get(hash).cloned()
    }

    /// Returns true if a thumbnail exists for `hash`.
    #[must_use]
    pub fn contains_thumbnail(&self, hash: &str) -> bool {
        self.thumbnails.read().contains_key(hash)
    }

    /// Inserts or replaces an image or video entry.
    pub fn commit(&self, entry: CachedMedia) {
        let hash = entry.content_hash.clone();
        self.media.write().insert(hash.clone(), entry);
        debug!(%hash, "Committed media");
        self.publish(CacheEvent::MediaCommitted(hash));
    }

    /// Records decoded dimensions on a pending entry.
    ///
    /// Returns false if there is no pending entry for `hash`.
    pub fn mark_decoded(&self, hash: &str, dimensions: Dimensions) -> bool {
        let key = {
            let mut media = self.media.write();
            let Some(entry) = media.get_mut(hash).filter(|e| e.is_pending()) else {
                return false;
            };
            entry.decoded(dimensions);
            entry.content_hash.clone()
        };
        debug!(
            hash = %key,
            width = dimensions.width,
            height = dimensions.height,
            "Decoded media"
        );
        self.publish(CacheEvent::MediaDecoded {
            content_hash: key,
            width: dimensions.width,
            height: dimensions.height,
        });
        true
    }

    /// Removes the entry for `hash` only if it is still pending.
    ///
    /// Returns true if an entry was removed.
    pub fn discard_pending(&self, hash: &str) -> bool {
        let removed = {
            let mut media = self.media.write();
            if media.get(hash).is_some_and(CachedMedia::is_pending) {
                media.remove_entry(hash).map(|(key, _)| key)
            } else {
                None
            }
        };
        let Some(key) = removed else {
            return false;
        };
        debug!(hash = %key, "Discarded pending media");
        self.publish(CacheEvent::MediaDiscarded(key));
        true
    }

    /// Inserts or replaces a thumbnail.
    pub fn commit_thumbnail(&self, entry: CachedThumbnail) {
        let hash = entry.content_hash.clone();
        self.thumbnails.write().insert(hash.clone(), entry);
        debug!(%hash, "Committed thumbnail");
        self.publish(CacheEvent::ThumbnailCommitted(hash));
    }

    /// Number of image and video entries.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.media.read().len()
    }

    /// Number of thumbnail entries.
    #[must_use]
    pub fn thumbnail_count(&self) -> usize {
        self.thumbnails.read().len()
    }

    /// Drops every entry in both namespaces.
    pub fn clear(&self) {
        self.media.write().clear();
        self.thumbnails.write().clear();
        debug!("Media cache cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bitgarten_media::{DataUrl, IMAGE_JPEG, VIDEO_MP4};

    fn image(hash: &str) -> CachedMedia {
        CachedMedia::pending_image(hash.into(), DataUrl::encode(IMAGE_JPEG, hash.as_bytes()))
    }

    #[test]
    fn test_commit_and_get() {
        let cache = MediaCache::new();
        assert!(cache.get("a").is_none());

        cache.commit(image("a"));
        assert!(cache.contains("a"));
        assert_eq!(cache.get("a").unwrap().content_hash.as_str(), "a");
        assert_eq!(cache.image_count(), 1);
    }

    #[test]
    fn test_namespaces_do_not_alias() {
        let cache = MediaCache::new();
        cache.commit_thumbnail(CachedThumbnail {
            content_hash: "h".into(),
            data_url: DataUrl::encode(IMAGE_JPEG, b"t"),
        });
        assert!(cache.contains_thumbnail("h"));
        assert!(!cache.contains("h"));

        cache.commit(image("h"));
        assert_eq!(cache.image_count(), 1);
        assert_eq!(cache.thumbnail_count(), 1);
        assert_ne!(
            cache.get("h").unwrap().data_url,
            cache.get_thumbnail("h").unwrap().data_url
        );
    }

    #[test]
    fn test_recommit_keeps_one_entry() {
        let cache = MediaCache::new();
        cache.commit(image("a"));
        cache.commit(image("a"));
        assert_eq!(cache.image_count(), 1);
    }

    #[test]
    fn test_two_phase_commit_events() {
        let cache = MediaCache::new();
        let mut events = cache.subscribe();

        cache.commit(image("a"));
        assert!(cache.mark_decoded("a", Dimensions::new(4, 3)));
        assert!(!cache.mark_decoded("a", Dimensions::new(1, 1)));

        assert_eq!(events.try_recv().unwrap(), CacheEvent::MediaCommitted("a".into()));
        assert_eq!(
            events.try_recv().unwrap(),
            CacheEvent::MediaDecoded {
                content_hash: "a".into(),
                width: 4,
                height: 3
            }
        );
        assert!(events.try_recv().is_err());
        assert_eq!(cache.get("a").unwrap().width(), 4);
    }

    #[test]
    fn test_discard_only_pending() {
        let cache = MediaCache::new();
        cache.commit(image("a"));
        assert!(cache.discard_pending("a"));
        assert!(!cache.contains("a"));

        cache.commit(image("b"));
        cache.mark_decoded("b", Dimensions::new(2, 2));
        assert!(!cache.discard_pending("b"));

        cache.commit(CachedMedia::video("v".into(), DataUrl::encode(VIDEO_MP4, b"v")));
        assert!(!cache.discard_pending("v"));
        assert_eq!(cache.image_count(), 2);
    }

    #[test]
    fn test_mark_decoded_missing() {
        let cache = MediaCache::new();
        assert!(!cache.mark_decoded("nope", Dimensions::new(1, 1)));
    }

    #[test]
    fn test_clear() {
        let cache = MediaCache::new();
        cache.commit(image("a"));
        cache.commit_thumbnail(CachedThumbnail {
            content_hash: "a".into(),
            data_url: DataUrl::encode(IMAGE_JPEG, b"t"),
        });
        cache.clear();
        assert_eq!(cache.image_count(), 0);
        assert_eq!(cache.thumbnail_count(), 0);
    }
}
