//! Image payloads sent alongside the roadmap prompt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Image encodings accepted by the upload workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// MIME type used for the model request's inline data part.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Errors from building an [`ImagePayload`] out of raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image payload is empty")]
    Empty,

    #[error("unrecognised image format (expected JPEG or PNG)")]
    UnknownFormat,
}

/// Opaque image bytes tagged with their format.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Wrap bytes whose format the caller has already established.
    pub fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Wrap bytes, detecting the format from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = ImageFormat::sniff(&bytes).ok_or(ImageError::UnknownFormat)?;
        Ok(Self { format, bytes })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard (padded) base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

// Image bytes are not useful in logs.
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"\x00\x00\x00\x0dIHDR");
        bytes
    }

    #[test]
    fn sniff_detects_png() {
        assert_eq!(ImageFormat::sniff(&png_bytes()), Some(ImageFormat::Png));
    }

    #[test]
    fn sniff_detects_jpeg() {
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            Some(ImageFormat::Jpeg)
        );
    }

    #[test]
    fn sniff_rejects_other_formats() {
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn from_bytes_rejects_empty() {
        assert_eq!(ImagePayload::from_bytes(vec![]), Err(ImageError::Empty));
    }

    #[test]
    fn from_bytes_rejects_unknown() {
        assert_eq!(
            ImagePayload::from_bytes(b"plain text".to_vec()),
            Err(ImageError::UnknownFormat)
        );
    }

    #[test]
    fn payload_reports_mime_type() {
        let payload = ImagePayload::from_bytes(png_bytes()).unwrap();
        assert_eq!(payload.format(), ImageFormat::Png);
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.len(), png_bytes().len());
    }

    #[test]
    fn base64_encoding_is_padded_standard() {
        let payload = ImagePayload::new(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(payload.to_base64(), "/9j/4A==");
    }

    #[test]
    fn debug_omits_bytes() {
        let payload = ImagePayload::new(ImageFormat::Jpeg, vec![0xFF; 64]);
        let debug = format!("{payload:?}");
        assert!(debug.contains("len: 64"));
        assert!(!debug.contains("255"));
    }
}
