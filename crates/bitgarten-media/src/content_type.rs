//! MIME content type handling.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME type used for decoded still images and thumbnails.
pub const IMAGE_JPEG: &str = "image/jpeg";

/// MIME type used for cached videos.
pub const VIDEO_MP4: &str = "video/mp4";

/// Codec-qualified type for buffered video playback.
pub const VIDEO_MP4_AVC: &str = "video/mp4; codecs=\"avc1.64002A, mp4a.40.2\"";

/// Broad classification of a picture record's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still image (`image/*`).
    Image,
    /// Video (`video/*`).
    Video,
    /// Anything else.
    Other,
}

impl MediaKind {
    /// Classifies a MIME type string by its prefix.
    ///
    /// Unparseable or empty types are [`MediaKind::Other`].
    #[must_use]
    pub fn of(mime_type: &str) -> Self {
        ContentType::parse(mime_type).map_or(Self::Other, |ct| ct.kind())
    }

    /// Returns true for still images.
    #[must_use]
    pub const fn is_image(self) -> bool {
        matches!(self, Self::Image)
    }
}

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "image", "video").
    pub main_type: String,
    /// Subtype (e.g., "jpeg", "mp4").
    pub sub_type: String,
    /// Parameters (e.g., codecs="avc1.64002A").
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the codecs parameter if present.
    #[must_use]
    pub fn codecs(&self) -> Option<&str> {
        self.parameters.get("codecs").map(String::as_str)
    }

    /// Returns the bare `type/subtype` essence.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Classifies this content type.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        if self.main_type.eq_ignore_ascii_case("image") {
            MediaKind::Image
        } else if self.main_type.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, params) = s.split_once(';').unwrap_or((s, ""));
        let type_str = type_str.trim();
        if type_str.is_empty() {
            return Err(Error::InvalidContentType("Empty content type".to_string()));
        }

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {type_str}")))?;
        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(s.to_string()));
        }

        let mut content_type = Self::new(main_type, sub_type);

        // Codec lists are quoted and may contain separators.
        for param in split_parameters(params) {
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                content_type.parameters.insert(key, value);
            }
        }

        Ok(content_type)
    }
}

fn split_parameters(params: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in params.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                out.push(params[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(params[start..].trim());
    out.retain(|p| !p.is_empty());
    out
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            // Quote value if it contains special characters
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("image/JPEG").unwrap();
        assert_eq!(ct.main_type, "image");
        assert_eq!(ct.sub_type, "jpeg");
        assert_eq!(ct.kind(), MediaKind::Image);
    }

    #[test]
    fn test_codec_parameter_keeps_commas() {
        let ct = ContentType::parse(VIDEO_MP4_AVC).unwrap();
        assert_eq!(ct.essence(), VIDEO_MP4);
        assert_eq!(ct.codecs(), Some("avc1.64002A, mp4a.40.2"));
        assert_eq!(ct.kind(), MediaKind::Video);
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(MediaKind::of("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::of("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::of("application/pdf"), MediaKind::Other);
        assert_eq!(MediaKind::of(""), MediaKind::Other);
        assert_eq!(MediaKind::of("image"), MediaKind::Other);
        assert!(MediaKind::of("image/gif").is_image());
    }

    #[test]
    fn test_content_type_display() {
        let ct = ContentType::new("video", "mp4").with_parameter("codecs", "avc1.64002A, mp4a.40.2");
        assert_eq!(ct.to_string(), VIDEO_MP4_AVC);
    }
}
