//! Inline image strings (`data:<mime>;base64,<payload>`).
//!
//! Every image the newsletter stores lives inside a document field in this
//! form, so it can be dropped straight into an `<img src>`. [`InlineImage`]
//! is the decoded view: a media type plus the raw bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InlineParseError {
    #[error("not a data URI (missing `data:` prefix)")]
    MissingScheme,
    #[error("data URI is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// A decoded inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Render as `data:<mime>;base64,<payload>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` string.
    ///
    /// Extra parameters between the media type and `;base64` (for example
    /// `;charset=utf-8`) are ignored.
    pub fn parse(uri: &str) -> Result<Self, InlineParseError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(InlineParseError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(InlineParseError::NotBase64)?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default();
        if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(InlineParseError::NotBase64);
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| InlineParseError::Payload(e.to_string()))?;
        Ok(Self::new(mime, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Display for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.mime, self.bytes.len())
    }
}

/// Length in characters of the data URI for `byte_len` bytes of `mime`.
///
/// Lets callers check a document size limit without building the string.
pub fn data_uri_len(mime: &str, byte_len: usize) -> usize {
    "data:".len() + mime.len() + ";base64,".len() + byte_len.div_ceil(3) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_standard_base64_with_padding() {
        let img = InlineImage::new("image/png", b"hi".to_vec());
        assert_eq!(img.to_data_uri(), "data:image/png;base64,aGk=");
    }

    #[test]
    fn parse_recovers_mime_and_bytes() {
        let img = InlineImage::parse("data:image/jpeg;base64,/9j/2Q==").unwrap();
        assert_eq!(img.mime, "image/jpeg");
        assert_eq!(img.bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(img.is_image());
    }

    #[test]
    fn parse_ignores_extra_parameters() {
        let img = InlineImage::parse("data:text/plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(img.mime, "text/plain");
        assert!(!img.is_image());
    }

    #[test]
    fn parse_rejects_plain_urls() {
        assert_eq!(
            InlineImage::parse("https://example.com/a.png"),
            Err(InlineParseError::MissingScheme)
        );
    }

    #[test]
    fn parse_rejects_percent_encoded_payloads() {
        assert_eq!(
            InlineImage::parse("data:image/svg+xml,%3Csvg%3E"),
            Err(InlineParseError::NotBase64)
        );
    }

    #[test]
    fn parse_rejects_bad_payload() {
        assert!(matches!(
            InlineImage::parse("data:image/png;base64,@@@"),
            Err(InlineParseError::Payload(_))
        ));
    }

    #[test]
    fn data_uri_len_matches_rendered_length() {
        for len in [0, 1, 2, 3, 4, 100] {
            let img = InlineImage::new("image/webp", vec![7u8; len]);
            assert_eq!(img.to_data_uri().len(), data_uri_len("image/webp", len));
        }
    }
}
