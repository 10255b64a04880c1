//! Mocks for relay tests: a [`MockBot`] recording every transport call in order, and a
//! [`MockGenerationClient`] replaying a scripted event stream.

#![allow(dead_code)]

use async_trait::async_trait;
use floppy_core::{
    Bot, BotError, Chat, ChatAction, Command, DocumentRef, DownloadedFile, Message, MessageHandle,
    PhotoRef, ReplyTarget, Result, TriggerContent, User,
};
use futures::StreamExt;
use image_generation_client::{GenerationClient, GenerationError, PartialResult, PartialResultStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHAT_ID: i64 = 42;
pub const TRIGGER_ID: &str = "100";
pub const SOURCE_BYTES: &[u8] = b"source-image";

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Text(String),
    Reply(String),
    SendPhoto {
        image: Vec<u8>,
        caption: Option<String>,
        reply_to: Option<String>,
    },
    EditPhoto {
        message_id: String,
        image: Vec<u8>,
        caption: Option<String>,
    },
    Presence(ChatAction),
    Download(String),
}

/// Mock Bot: records calls; failures are opt-in.
pub struct MockBot {
    calls: Mutex<Vec<Call>>,
    remote_path: String,
    fail_download: bool,
    fail_send_photo: bool,
    /// 1-based edit attempt that fails with a plain transport error.
    fail_edit_attempt: Option<usize>,
    /// Number of leading edit attempts answered with a flood-control wait.
    retry_after_edits: usize,
    edit_attempts: AtomicUsize,
}

impl MockBot {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            remote_path: "photos/file_1.png".to_string(),
            fail_download: false,
            fail_send_photo: false,
            fail_edit_attempt: None,
            retry_after_edits: 0,
            edit_attempts: AtomicUsize::new(0),
        }
    }

    pub fn with_remote_path(mut self, path: &str) -> Self {
        self.remote_path = path.to_string();
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn failing_send_photo(mut self) -> Self {
        self.fail_send_photo = true;
        self
    }

    pub fn failing_edit_attempt(mut self, attempt: usize) -> Self {
        self.fail_edit_attempt = Some(attempt);
        self
    }

    pub fn retry_after_edits(mut self, count: usize) -> Self {
        self.retry_after_edits = count;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn photos_sent(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SendPhoto { .. }))
            .collect()
    }

    pub fn edits(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::EditPhoto { .. }))
            .collect()
    }

    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reply(t) | Call::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn presence_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Presence(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, _chat: &Chat, text: &str) -> Result<()> {
        self.record(Call::Text(text.to_string()));
        Ok(())
    }

    async fn reply_to(&self, _message: &Message, text: &str) -> Result<()> {
        self.record(Call::Reply(text.to_string()));
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: &Chat,
        photo: Vec<u8>,
        caption: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<MessageHandle> {
        if self.fail_send_photo {
            return Err(BotError::Bot("Bad Request: wrong file".to_string()));
        }
        self.record(Call::SendPhoto {
            image: photo,
            caption: caption.map(String::from),
            reply_to: reply_to.map(String::from),
        });
        Ok(MessageHandle {
            chat_id: chat.id,
            message_id: "555".to_string(),
        })
    }

    async fn edit_photo(
        &self,
        handle: &MessageHandle,
        photo: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let attempt = self.edit_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.retry_after_edits {
            return Err(BotError::RetryAfter(1));
        }
        if self.fail_edit_attempt == Some(attempt) {
            return Err(BotError::Bot("Bad Request: message to edit not found".to_string()));
        }
        self.record(Call::EditPhoto {
            message_id: handle.message_id.clone(),
            image: photo,
            caption: caption.map(String::from),
        });
        Ok(())
    }

    async fn send_chat_action(&self, _chat: &Chat, action: ChatAction) -> Result<()> {
        self.record(Call::Presence(action));
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<DownloadedFile> {
        self.record(Call::Download(file_id.to_string()));
        if self.fail_download {
            return Err(BotError::Bot("file is too big".to_string()));
        }
        Ok(DownloadedFile {
            remote_path: self.remote_path.clone(),
            bytes: SOURCE_BYTES.to_vec(),
        })
    }
}

/// Arguments of one `stream_edit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub image: Vec<u8>,
    pub extension: String,
    pub prompt: String,
}

type Script = std::result::Result<Vec<std::result::Result<PartialResult, GenerationError>>, GenerationError>;

/// Mock generation client replaying `script` once; `gap` delays every event.
pub struct MockGenerationClient {
    script: Mutex<Option<Script>>,
    gap: Option<Duration>,
    requests: Mutex<Vec<EditRequest>>,
}

impl MockGenerationClient {
    pub fn with_events(events: Vec<std::result::Result<PartialResult, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(Some(Ok(events))),
            gap: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GenerationError) -> Self {
        Self {
            script: Mutex::new(Some(Err(err))),
            gap: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn requests(&self) -> Vec<EditRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn stream_edit(
        &self,
        image: Vec<u8>,
        extension: &str,
        prompt: &str,
    ) -> std::result::Result<PartialResultStream, GenerationError> {
        self.requests.lock().unwrap().push(EditRequest {
            image,
            extension: extension.to_string(),
            prompt: prompt.to_string(),
        });
        let events = self
            .script
            .lock()
            .unwrap()
            .take()
            .expect("stream_edit called more than once")?;
        let gap = self.gap;
        Ok(futures::stream::iter(events)
            .then(move |event| async move {
                if let Some(gap) = gap {
                    tokio::time::sleep(gap).await;
                }
                event
            })
            .boxed())
    }
}

pub fn frame(byte: u8, index: usize, is_final: bool) -> std::result::Result<PartialResult, GenerationError> {
    Ok(PartialResult {
        image: vec![byte],
        index,
        is_final,
    })
}

pub fn photo_reply() -> ReplyTarget {
    ReplyTarget {
        content: TriggerContent::Photo(vec![
            PhotoRef {
                file_id: "thumb".to_string(),
                width: 90,
                height: 60,
            },
            PhotoRef {
                file_id: "full".to_string(),
                width: 1280,
                height: 853,
            },
        ]),
    }
}

pub fn document_reply(mime: Option<&str>, name: Option<&str>) -> ReplyTarget {
    ReplyTarget {
        content: TriggerContent::Document(DocumentRef {
            file_id: "doc".to_string(),
            mime_type: mime.map(String::from),
            file_name: name.map(String::from),
        }),
    }
}

pub fn floppify_message(reply_to: Option<ReplyTarget>, args: &str) -> Message {
    Message {
        id: TRIGGER_ID.to_string(),
        user: User {
            id: 7,
            username: Some("alice".to_string()),
        },
        chat: Chat { id: CHAT_ID },
        command: Some(Command::new("floppify", args)),
        reply_to,
    }
}
