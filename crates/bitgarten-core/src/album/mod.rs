//! Album summaries and details.
//!
//! Summaries are the sorted list of every album; details are per-album
//! picture lists appended as albums are opened.

mod model;
mod repository;
pub(crate) mod wire;

pub use model::{AlbumDetail, AlbumId, AlbumSummary, PictureRef};
pub use repository::AlbumStore;
