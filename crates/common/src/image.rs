//! Inline images sent alongside a prompt (barcode-less billing scans and
//! customer photos).

use {
    base64::{Engine as _, engine::general_purpose::STANDARD as BASE64},
    serde::{Deserialize, Serialize},
};

/// 7 MB of raw bytes, comfortably below the inline request limit once
/// base64-encoded.
pub const MAX_IMAGE_BYTES: usize = 7 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,
    #[error("image is too large ({size} bytes, maximum is {MAX_IMAGE_BYTES})")]
    TooLarge { size: usize },
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// A base64-encoded image with its MIME type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl InlineImage {
    /// Encode raw image bytes.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { size: bytes.len() });
        }
        if !mime_type.starts_with("image/") {
            return Err(ImageError::UnsupportedType(mime_type.to_string()));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        })
    }

    /// Accept a `data:image/png;base64,...` URL as produced by browser
    /// camera captures.
    pub fn from_data_url(url: &str) -> Result<Self, ImageError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::UnsupportedType("not a data URL".into()))?;
        let Some((mime_type, data)) = rest.split_once(";base64,") else {
            return Err(ImageError::UnsupportedType("data URL is not base64".into()));
        };
        let bytes = BASE64.decode(data.trim())?;
        Self::from_bytes(mime_type, &bytes)
    }

    /// Encode a file's bytes, deriving the MIME type from its extension.
    pub fn from_file_bytes(extension: &str, bytes: &[u8]) -> Result<Self, ImageError> {
        let mime = mime_from_extension(extension)
            .ok_or_else(|| ImageError::UnsupportedType(extension.to_string()))?;
        Self::from_bytes(mime, bytes)
    }
}

/// Map a file extension to its MIME type.
#[must_use]
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
