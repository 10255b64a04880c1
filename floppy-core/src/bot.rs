//! Bot abstraction for sending text, photos and presence signals.
//!
//! [`Bot`] is transport-agnostic; floppy-telegram implements it via teloxide, tests substitute mocks.

use crate::error::{BotError, Result};
use crate::types::{Chat, ChatAction, DownloadedFile, Message, MessageHandle};
use async_trait::async_trait;

/// Abstraction over the chat transport. Implementations map to a concrete platform (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;
    /// Sends a text reply to the given message (same chat, threaded).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()>;
    /// Sends a photo, optionally captioned and threaded under `reply_to` (a message id). Returns a handle for later edits.
    async fn send_photo(
        &self,
        chat: &Chat,
        photo: Vec<u8>,
        caption: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<MessageHandle>;
    /// Replaces the media of an already-sent photo message in place.
    async fn edit_photo(
        &self,
        handle: &MessageHandle,
        photo: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()>;
    /// Shows a presence indicator in the chat; it expires on its own after a few seconds.
    async fn send_chat_action(&self, chat: &Chat, action: ChatAction) -> Result<()>;
    /// Resolves a file id on the transport and downloads its content.
    async fn download_file(&self, file_id: &str) -> Result<DownloadedFile>;
}

/// Parses a message id string into an i32 (Telegram message ids).
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| BotError::Bot(format!("Invalid message_id: {}", s)))
}
