//! Data URL encoding and decoding.
//!
//! Media bytes are embedded as `data:<mime>;base64,<payload>`. The payload is
//! the standard base64 encoding of the raw octets: every byte maps to exactly
//! one Latin-1 code point before encoding, so nothing is ever reinterpreted as
//! UTF-8.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Maps each byte to the Latin-1 character with the same code point.
///
/// This is the "binary string" form of a buffer. Its characters, taken back
/// as bytes, are the original octets.
#[must_use]
pub fn latin1_binary_string(data: &[u8]) -> String {
    data.iter().copied().map(char::from).collect()
}

/// A base64 data URL carrying a MIME type and an encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataUrl {
    mime_type: String,
    payload: String,
}

impl DataUrl {
    /// Encodes raw bytes into a data URL tagged with `mime_type`.
    #[must_use]
    pub fn encode(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: encode_base64(bytes),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme or the base64 marker is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidDataUrl("missing data: scheme".to_string()))?;
        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| Error::InvalidDataUrl("only base64 payloads are supported".to_string()))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Returns the MIME type tag.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload without the prefix.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decodes the payload back into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_base64(&self.payload)
    }

    /// Length of the rendered URL in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        SCHEME.len() + self.mime_type.len() + BASE64_MARKER.len() + self.payload.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}{BASE64_MARKER}{}", self.mime_type, self.payload)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_data_url_display() {
        let url = DataUrl::encode("image/jpeg", &[0xff, 0xd8, 0xff]);
        assert_eq!(url.to_string(), "data:image/jpeg;base64,/9j/");
        assert_eq!(url.len(), url.to_string().len());
    }

    #[test]
    fn test_high_bytes_are_not_utf8_reinterpreted() {
        // 0xC3 0xA9 is "é" in UTF-8; it must stay two octets.
        let bytes = [0xc3, 0xa9, 0x00, 0x80, 0xff];
        let url = DataUrl::encode("image/jpeg", &bytes);
        assert_eq!(url.decode().unwrap(), bytes);

        let binary = latin1_binary_string(&bytes);
        assert_eq!(binary.chars().count(), bytes.len());
        let back: Vec<u8> = binary.chars().map(|c| u8::try_from(u32::from(c)).unwrap()).collect();
        assert_eq!(back, bytes);
    }

    #[test]
    fn test_parse() {
        let url = DataUrl::parse("data:video/mp4;base64,AAEC").unwrap();
        assert_eq!(url.mime_type(), "video/mp4");
        assert_eq!(url.payload(), "AAEC");
        assert_eq!(url.decode().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_rejects_non_base64() {
        assert!(DataUrl::parse("data:text/plain,hello").is_err());
        assert!(DataUrl::parse("image/jpeg;base64,AAEC").is_err());
    }

    proptest! {
        #[test]
        fn prop_payload_matches_standard_base64(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let url = DataUrl::encode("image/jpeg", &bytes);
            prop_assert_eq!(url.payload(), STANDARD.encode(&bytes));
            prop_assert_eq!(url.decode().unwrap(), bytes.clone());

            let binary = latin1_binary_string(&bytes);
            let octets: Vec<u8> = binary.chars().map(|c| c as u8).collect();
            prop_assert_eq!(octets, bytes);
        }
    }
}
