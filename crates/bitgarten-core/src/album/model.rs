//! Album data models.

use std::fmt;

use bitgarten_media::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{ContentHash, Fill};

/// Server-side record number of an album. 0 is never a real album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub u64);

impl AlbumId {
    /// Create a new album ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns false for ISN 0.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for AlbumId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One entry of the album list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSummary {
    /// Album ISN.
    pub isn: AlbumId,
    /// Album title.
    pub title: String,
    /// `date_time_raw` as a timestamp.
    pub date: DateTime<Utc>,
    /// Unix seconds as sent by the server; the sort key.
    pub date_time_raw: i64,
    /// Hash of the album's cover thumbnail.
    pub thumbnail_hash: ContentHash,
}

impl AlbumSummary {
    /// Builds a summary, deriving `date` from unix seconds.
    ///
    /// Out-of-range timestamps map to the epoch.
    #[must_use]
    pub fn new(
        isn: AlbumId,
        title: impl Into<String>,
        date_time_raw: i64,
        thumbnail_hash: ContentHash,
    ) -> Self {
        Self {
            isn,
            title: title.into(),
            date: unix_seconds(date_time_raw),
            date_time_raw,
            thumbnail_hash,
        }
    }
}

/// An album with its picture records in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumDetail {
    /// Album ISN the detail was requested for.
    pub id: AlbumId,
    /// Album title.
    pub title: String,
    /// Album date.
    pub date: DateTime<Utc>,
    /// Pictures, indexed from 1.
    pub pictures: Vec<PictureRef>,
}

impl AlbumDetail {
    /// Iterates the pictures whose MIME type is a still image.
    pub fn images(&self) -> impl Iterator<Item = &PictureRef> {
        self.pictures.iter().filter(|p| p.is_image())
    }
}

/// A picture inside an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureRef {
    /// 1-based position in the server response.
    pub index: usize,
    /// Hash of the media bytes.
    pub content_hash: ContentHash,
    /// MIME type from the record.
    pub mime_type: String,
    /// Layout hint.
    pub fill: Fill,
    /// Width from the record.
    pub width: u32,
    /// Height from the record.
    pub height: u32,
    /// Description.
    pub caption: String,
}

impl PictureRef {
    /// Classification of `mime_type`.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        MediaKind::of(&self.mime_type)
    }

    /// Returns true for still images.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.kind().is_image()
    }
}

pub(crate) fn unix_seconds(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
