//! base64url codec for binary WebAuthn fields.
//!
//! Credential ceremonies operate on raw bytes while the relying-party
//! server speaks JSON, so every binary field crosses the wire as URL-safe,
//! padding-free base64 text.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;

/// URL-safe engine that never pads and ignores leftover bits in the final
/// character, matching browser `atob` and Python `urlsafe_b64decode`.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Errors produced when base64url text cannot be turned back into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A length of `4n + 1` characters can never come out of an encoder
    #[error("Invalid base64url length: {0}")]
    InvalidLength(usize),

    /// Character outside `A-Z a-z 0-9 - _`
    #[error("Invalid base64url character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    /// The base64 engine rejected text that passed both checks above
    #[error("Malformed base64url: {0}")]
    Malformed(String),
}

/// Decode URL-safe, unpadded base64 text into bytes.
pub fn base64url_decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    if text.len() % 4 == 1 {
        return Err(DecodeError::InvalidLength(text.len()));
    }

    if let Some((offset, character)) = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(DecodeError::InvalidCharacter { character, offset });
    }

    BASE64URL
        .decode(text)
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Encode bytes as URL-safe base64 text with all padding stripped.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64URL.encode(bytes.as_ref())
}
