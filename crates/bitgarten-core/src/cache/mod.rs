//! Content-addressed media cache.
//!
//! Decoded images and videos live in one namespace and thumbnails in
//! another, both keyed by [`ContentHash`]. Entries are never evicted.

mod model;
mod repository;

pub use model::{CacheEvent, CachedMedia, CachedThumbnail, ContentHash, DecodeState, Fill};
pub use repository::MediaCache;
