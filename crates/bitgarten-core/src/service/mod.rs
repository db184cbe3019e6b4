//! Services that turn gateway calls into model values.
//!
//! Each service holds a shared [`Gateway`](bitgarten_client::Gateway); they
//! are cheap to clone and carry no state of their own beyond the cache they
//! write to.

pub mod album;
pub mod catalog;
pub mod media;

pub use album::AlbumService;
pub use catalog::{CatalogService, DirectoryPicture};
pub use media::MediaService;
