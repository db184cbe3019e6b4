//! # bitgarten-media
//!
//! Media primitives for the Bitgarten gallery client.
//!
//! ## Features
//!
//! - **Data URLs**: Byte-exact base64 embedding of fetched media
//! - **Content types**: MIME parsing (including codec parameters) and
//!   image/video classification
//! - **Dimension probe**: Header-only decode of image width and height
//! - **Buffered sources**: A media source / source buffer pair for
//!   fetch-then-append playback
//!
//! ## Quick Start
//!
//! ```ignore
//! use bitgarten_media::{DataUrl, IMAGE_JPEG, probe_dimensions};
//!
//! let url = DataUrl::encode(IMAGE_JPEG, &bytes);
//! let dims = probe_dimensions(&bytes)?;
//! println!("{}x{} -> {} bytes of URL", dims.width, dims.height, url.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod probe;
mod source;

pub mod encoding;

pub use content_type::{ContentType, IMAGE_JPEG, MediaKind, VIDEO_MP4, VIDEO_MP4_AVC};
pub use encoding::DataUrl;
pub use error::{Error, Result};
pub use probe::{Dimensions, probe_dimensions};
pub use source::{MediaSource, ReadyState, SourceBuffer};
