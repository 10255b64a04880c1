//! # image-generation-client
//!
//! Streaming image edits: the [`GenerationClient`] trait, its [`PartialResult`] events, and an
//! OpenAI `images/edits` implementation ([`OpenAIImageEditClient`]) that decodes the SSE response.

mod error;
mod openai;
mod sse;
mod types;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use error::GenerationError;
pub use openai::{
    mime_for_extension, OpenAIImageEditClient, DEFAULT_IMAGE_MODEL, DEFAULT_PARTIAL_IMAGES,
    DEFAULT_READ_TIMEOUT_SECS,
};
pub use sse::{event_to_result, partial_results, SseDecoder, SseEvent};
pub use types::PartialResult;

/// Ordered, finite, non-restartable sequence of partial results.
pub type PartialResultStream = BoxStream<'static, Result<PartialResult, GenerationError>>;

/// Remote image-editing service that reports progress as a stream of partial results.
///
/// The stream ends after the event flagged final; an error item ends the job.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Opens a streaming edit of `image` (file extension `extension`, e.g. `.png`) guided by `prompt`.
    /// Errors returned here mean the request could not be initiated at all.
    async fn stream_edit(
        &self,
        image: Vec<u8>,
        extension: &str,
        prompt: &str,
    ) -> Result<PartialResultStream, GenerationError>;
}

/// Masks an API key for safe logging: first 7 chars + "***" + last 4 chars, or "***" when 11 chars or fewer.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    if len <= 11 {
        "***".to_string()
    } else {
        let head: String = chars[..7].iter().collect();
        let tail: String = chars[len - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
