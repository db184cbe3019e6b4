//! # bitgarten-core
//!
//! In-memory data layer of the Bitgarten gallery client.
//!
//! This crate provides:
//! - **Media cache** - Content-addressed images, videos and thumbnails with
//!   a two-phase decode commit
//! - **Album store** - Date-sorted album summaries and opened album details
//! - **Services** - Album, catalog and media loads over the fetch gateway
//! - **Loader** - Orchestrates album loads and dispatches concurrent media
//!   loads, plus fetch-then-append video streaming

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod album;
pub mod cache;
mod error;
pub mod loader;
pub mod service;

pub use album::{AlbumDetail, AlbumId, AlbumStore, AlbumSummary, PictureRef};
pub use cache::{
    CacheEvent, CachedMedia, CachedThumbnail, ContentHash, DecodeState, Fill, MediaCache,
};
pub use error::{Error, Result};
pub use loader::{Dispatched, Loader, LoaderOptions, PlaybackElement};
pub use service::{AlbumService, CatalogService, DirectoryPicture, MediaService};
