//! Text encoding for cover images
//!
//! Records keep cover bytes as base64 text so the persisted value stays a
//! flat structure of strings.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode raw image bytes into the stored text form
pub fn encode_cover(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    STANDARD.encode(data)
}

/// Decode the stored text form back into image bytes
///
/// Accepts a `data:` URL as well, keeping only the part after the first comma.
pub fn decode_cover(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, body)| body).unwrap_or(""),
        None => text,
    };
    STANDARD.decode(payload.trim())
}
