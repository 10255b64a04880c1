//! Core types: user, chat, message, trigger content, handler response, and Handler trait.

use async_trait::async_trait;

/// Who sent a message.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

/// Chat (channel, group or private) identity.
#[derive(Debug, Clone)]
pub struct Chat {
    pub id: i64,
}

/// One size variant of a photo as offered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoRef {
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A file attachment with its declared media type and original filename, both optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub file_id: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

/// What a message carries, reduced to the cases the bot cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerContent {
    /// All size variants of one photo.
    Photo(Vec<PhotoRef>),
    Document(DocumentRef),
    None,
}

/// The message a command replies to.
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    pub content: TriggerContent,
}

/// A bot command addressed to us, e.g. `/floppify on a beach` → name `floppify`, args `["on", "a", "beach"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Builds a command from its name and the raw argument text; args are split on whitespace.
    pub fn new(name: impl Into<String>, raw_args: &str) -> Self {
        Self {
            name: name.into(),
            args: raw_args.split_whitespace().map(String::from).collect(),
        }
    }
}

/// A single incoming message with user, chat, and optional command and reply context.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub command: Option<Command>,
    pub reply_to: Option<ReplyTarget>,
}

/// Locates a message the bot has sent so it can be edited later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: i64,
    /// Transport-specific id (Telegram numeric string).
    pub message_id: String,
}

/// Presence indicator kinds. Only "uploading a photo" is shown while a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    UploadPhoto,
}

/// A downloaded remote file: its path on the transport's file server and its bytes.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub remote_path: String,
    pub bytes: Vec<u8>,
}

/// Handler result. `Stop` means the message was consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Not for this handler.
    Continue,
    Stop,
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Processes one incoming message.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: &Message) -> crate::error::Result<HandlerResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new_splits_args() {
        let cmd = Command::new("floppify", "  on a   beach ");
        assert_eq!(cmd.name, "floppify");
        assert_eq!(cmd.args, vec!["on", "a", "beach"]);
    }

    #[test]
    fn test_command_new_empty_args() {
        let cmd = Command::new("floppify", "");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_photo_ref_pixels() {
        let p = PhotoRef {
            file_id: "x".to_string(),
            width: 1280,
            height: 960,
        };
        assert_eq!(p.pixels(), 1_228_800);
    }
}
