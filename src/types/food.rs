//! Vision-stage inputs and outputs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::{PlatewiseError, Result};

/// One food item identified in a photo.
///
/// `quantity` is free text ("1 cup", "200g") and is passed through to the
/// estimator prompt verbatim; it is never parsed into a number and unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFoodItem {
    pub food_name: String,
    #[serde(default)]
    pub quantity: String,
}

impl ExtractedFoodItem {
    pub fn new(food_name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            food_name: food_name.into(),
            quantity: quantity.into(),
        }
    }
}

/// A validated, base64-encoded image ready to be sent to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    media_type: String,
    data: String,
    decoded_len: usize,
}

impl ImageInput {
    /// Default upper bound on decoded image size (10 MiB).
    pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

    /// Parse a `data:image/...;base64,` URL or a bare base64 payload.
    ///
    /// Bare payloads are assumed to be JPEG. Whitespace inside the payload
    /// is ignored. Fails with `InvalidInput` when the input is empty, is not
    /// an image data URL, does not decode, or exceeds `max_bytes` decoded.
    pub fn from_data_url(input: &str, max_bytes: usize) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PlatewiseError::InvalidInput("No image provided".into()));
        }

        let (media_type, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    PlatewiseError::InvalidInput("malformed data URL: missing ','".into())
                })?;
                let media_type = header.strip_suffix(";base64").ok_or_else(|| {
                    PlatewiseError::InvalidInput("data URL must be base64-encoded".into())
                })?;
                if !media_type.starts_with("image/") {
                    return Err(PlatewiseError::InvalidInput(format!(
                        "unsupported media type '{media_type}'"
                    )));
                }
                (media_type.to_string(), payload)
            }
            None => ("image/jpeg".to_string(), input),
        };

        let data: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = STANDARD
            .decode(data.as_bytes())
            .map_err(|e| PlatewiseError::InvalidInput(format!("image is not valid base64: {e}")))?;

        if decoded.is_empty() {
            return Err(PlatewiseError::InvalidInput("No image provided".into()));
        }
        if decoded.len() > max_bytes {
            return Err(PlatewiseError::InvalidInput(format!(
                "image is {} bytes, limit is {max_bytes}",
                decoded.len()
            )));
        }

        Ok(Self {
            media_type,
            data,
            decoded_len: decoded.len(),
        })
    }

    /// Wrap raw image bytes (e.g. read from disk).
    ///
    /// The media type is sniffed from the file signature, falling back to
    /// `image/jpeg`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(PlatewiseError::InvalidInput("No image provided".into()));
        }
        Ok(Self {
            media_type: sniff_media_type(bytes).unwrap_or("image/jpeg").to_string(),
            data: STANDARD.encode(bytes),
            decoded_len: bytes.len(),
        })
    }

    /// Media type, e.g. `image/png`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Decoded size in bytes.
    pub fn len(&self) -> usize {
        self.decoded_len
    }

    pub fn is_empty(&self) -> bool {
        self.decoded_len == 0
    }

    /// Re-encode as a `data:` URL, the form multimodal chat APIs accept.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
    ];
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, media_type)| *media_type)
}
