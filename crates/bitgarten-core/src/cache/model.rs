//! Cache data models.

use std::borrow::Borrow;
use std::fmt;

use bitgarten_media::{DataUrl, Dimensions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content-derived identifier of a media byte sequence (the record's MD5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wraps a hash string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The hash as sent in `search=Md5=` queries.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty hashes name nothing and are never fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ContentHash {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentHash {
    fn from(hash: &str) -> Self {
        Self::new(hash)
    }
}

impl From<String> for ContentHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

/// Layout hint carried with pictures and cached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Fill {
    /// Fit to width.
    #[default]
    #[serde(rename = "fill")]
    Fill,
    /// Fit to height.
    #[serde(rename = "fillHeight")]
    FillHeight,
}

impl Fill {
    /// Parses the wire value; anything but `fillHeight` is [`Fill::Fill`].
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        if value == "fillHeight" {
            Self::FillHeight
        } else {
            Self::Fill
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::FillHeight => "fillHeight",
        }
    }
}

/// Where a cached entry is in its decode lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeState {
    /// Committed, dimensions not known yet.
    Pending,
    /// Dimensions read from the decoded image.
    Ready {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Media that is never decoded for dimensions (video).
    NotApplicable,
}

/// A full-size image or video held as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMedia {
    /// Cache key.
    pub content_hash: ContentHash,
    /// Encoded payload.
    pub data_url: DataUrl,
    /// Fill hint: `fill` for images, `fillHeight` for videos.
    pub fill: Fill,
    /// Decode lifecycle.
    pub state: DecodeState,
    /// When the bytes arrived.
    pub fetched_at: DateTime<Utc>,
}

impl CachedMedia {
    /// A freshly fetched image awaiting its dimension probe.
    #[must_use]
    pub fn pending_image(content_hash: ContentHash, data_url: DataUrl) -> Self {
        Self {
            content_hash,
            data_url,
            fill: Fill::Fill,
            state: DecodeState::Pending,
            fetched_at: Utc::now(),
        }
    }

    /// A fetched video; committed once, never probed.
    #[must_use]
    pub fn video(content_hash: ContentHash, data_url: DataUrl) -> Self {
        Self {
            content_hash,
            data_url,
            fill: Fill::FillHeight,
            state: DecodeState::NotApplicable,
            fetched_at: Utc::now(),
        }
    }

    /// MIME type of the data URL.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.data_url.mime_type()
    }

    /// Width in pixels, 0 until decoded.
    #[must_use]
    pub const fn width(&self) -> u32 {
        match self.state {
            DecodeState::Ready { width, .. } => width,
            _ => 0,
        }
    }

    /// Height in pixels, 0 until decoded.
    #[must_use]
    pub const fn height(&self) -> u32 {
        match self.state {
            DecodeState::Ready { height, .. } => height,
            _ => 0,
        }
    }

    /// True while the dimension probe has not finished.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, DecodeState::Pending)
    }

    pub(crate) const fn decoded(&mut self, dimensions: Dimensions) {
        self.state = DecodeState::Ready {
            width: dimensions.width,
            height: dimensions.height,
        };
    }
}

/// A thumbnail. No dimensions are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedThumbnail {
    /// Cache key.
    pub content_hash: ContentHash,
    /// Encoded payload.
    pub data_url: DataUrl,
}

/// A mutation of the cache, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An image or video entry was inserted or replaced.
    MediaCommitted(ContentHash),
    /// A pending image entry received its dimensions.
    MediaDecoded {
        /// Entry key.
        content_hash: ContentHash,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A pending image entry was dropped after its probe failed.
    MediaDiscarded(ContentHash),
    /// A thumbnail entry was inserted or replaced.
    ThumbnailCommitted(ContentHash),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bitgarten_media::{IMAGE_JPEG, VIDEO_MP4};

    #[test]
    fn test_fill_from_wire() {
        assert_eq!(Fill::from_wire("fillHeight"), Fill::FillHeight);
        assert_eq!(Fill::from_wire("fill"), Fill::Fill);
        assert_eq!(Fill::from_wire(""), Fill::Fill);
        assert_eq!(Fill::FillHeight.as_str(), "fillHeight");
    }

    #[test]
    fn test_pending_image_has_zero_dimensions() {
        let mut media = CachedMedia::pending_image("h".into(), DataUrl::encode(IMAGE_JPEG, b"x"));
        assert!(media.is_pending());
        assert_eq!((media.width(), media.height()), (0, 0));
        assert_eq!(media.fill, Fill::Fill);

        media.decoded(Dimensions::new(640, 480));
        assert!(!media.is_pending());
        assert_eq!((media.width(), media.height()), (640, 480));
    }

    #[test]
    fn test_video_is_never_decoded() {
        let media = CachedMedia::video("v".into(), DataUrl::encode(VIDEO_MP4, b"x"));
        assert_eq!(media.state, DecodeState::NotApplicable);
        assert_eq!(media.fill, Fill::FillHeight);
        assert_eq!(media.mime_type(), "video/mp4");
        assert_eq!(media.width(), 0);
    }

    #[test]
    fn test_content_hash_serde_is_transparent() {
        let hash = ContentHash::new("abc123");
        assert_eq!(serde_json::to_string(&hash).unwrap(), "\"abc123\"");
        assert_eq!(hash.to_string(), "abc123");
        assert!(ContentHash::default().is_empty());
    }
}
