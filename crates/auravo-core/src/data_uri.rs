//! Base64 `data:` URIs used for images and recorded audio.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::AuravoError;

/// A validated `data:<mime>;base64,<payload>` URI.
///
/// Only the base64 form is accepted; the payload itself is not decoded
/// during validation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    raw: String,
    /// Byte offset of the `,` separating header from payload.
    comma: usize,
}

impl DataUri {
    /// Encode raw bytes under the given mime type.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &BASE64_STANDARD.encode(bytes))
    }

    /// Build a URI from an already base64-encoded payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        let raw = format!("data:{};base64,{}", mime_type, payload);
        let comma = "data:".len() + mime_type.len() + ";base64".len();
        Self { raw, comma }
    }

    /// The mime type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        let header = &self.raw["data:".len()..self.comma];
        header.strip_suffix(";base64").unwrap_or(header)
    }

    /// The base64 payload after the comma.
    pub fn payload(&self) -> &str {
        &self.raw[self.comma + 1..]
    }

    /// Decode the payload back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, AuravoError> {
        BASE64_STANDARD
            .decode(self.payload())
            .map_err(|e| AuravoError::InvalidDataUri(format!("bad base64 payload: {}", e)))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().starts_with("image/")
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type().starts_with("audio/")
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for DataUri {
    type Err = AuravoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| AuravoError::InvalidDataUri("missing 'data:' scheme".to_string()))?;
        let comma = rest
            .find(',')
            .ok_or_else(|| AuravoError::InvalidDataUri("missing ',' separator".to_string()))?;
        let header = &rest[..comma];
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            AuravoError::InvalidDataUri("only base64 data URIs are supported".to_string())
        })?;
        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(AuravoError::InvalidDataUri(format!(
                "invalid mime type '{}'",
                mime_type
            )));
        }
        Ok(Self {
            raw: s.to_string(),
            comma: "data:".len() + comma,
        })
    }
}

impl TryFrom<String> for DataUri {
    type Error = AuravoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.raw
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
