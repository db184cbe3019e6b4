//! Image dimension probing.

use std::io::Cursor;

use image::ImageReader;

use crate::error::Result;

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Creates a new dimension pair.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Reads the pixel dimensions of an encoded image.
///
/// The format is sniffed from the leading bytes; only the header is decoded.
/// This is blocking work and belongs on a blocking thread for large buffers.
///
/// # Errors
///
/// Returns an error if the format is unknown or the header is corrupt.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(Dimensions { width, height })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_probe_png() {
        let dims = probe_dimensions(&png(7, 3)).unwrap();
        assert_eq!(dims, Dimensions::new(7, 3));
    }

    #[test]
    fn test_probe_garbage_fails() {
        assert!(probe_dimensions(b"not an image").is_err());
        assert!(probe_dimensions(&[]).is_err());
    }
}
