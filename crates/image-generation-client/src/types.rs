//! Partial results of a streaming edit.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::GenerationError;

/// One progressively refined rendition of the edited image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    /// Decoded image bytes.
    pub image: Vec<u8>,
    /// Position in the stream, starting at 0.
    pub index: usize,
    /// True for the definitive result; nothing follows it.
    pub is_final: bool,
}

impl PartialResult {
    /// Decodes a base64 payload as sent by the service.
    pub fn from_b64(b64: &str, index: usize, is_final: bool) -> Result<Self, GenerationError> {
        let image = STANDARD
            .decode(b64.trim())
            .map_err(|e| GenerationError::MalformedResponse(format!("invalid base64 image: {}", e)))?;
        if image.is_empty() {
            return Err(GenerationError::MalformedResponse(
                "empty image payload".to_string(),
            ));
        }
        Ok(Self {
            image,
            index,
            is_final,
        })
    }
}
