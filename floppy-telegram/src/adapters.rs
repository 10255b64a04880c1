//! Adapters from Telegram (teloxide) types to floppy_core types.

use floppy_core::{
    Chat, DocumentRef, Message, PhotoRef, ReplyTarget, ToCoreMessage, ToCoreUser, TriggerContent,
    User,
};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`]. The command is left unset;
/// the dispatcher fills it from the parsed bot command.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or(User {
                    id: 0,
                    username: None,
                }),
            chat: Chat {
                id: self.0.chat.id.0,
            },
            command: None,
            reply_to: self.reply_target(),
        }
    }
}

impl<'a> TelegramMessageWrapper<'a> {
    fn reply_target(&self) -> Option<ReplyTarget> {
        self.0.reply_to_message().map(|target| ReplyTarget {
            content: trigger_content(target),
        })
    }
}

/// Reduces a message to the photo / document / nothing distinction. Animations count as
/// documents, as the Bot API sends them as both.
pub fn trigger_content(msg: &teloxide::types::Message) -> TriggerContent {
    if let Some(sizes) = msg.photo() {
        if !sizes.is_empty() {
            return TriggerContent::Photo(
                sizes
                    .iter()
                    .map(|p| PhotoRef {
                        file_id: p.file.id.to_string(),
                        width: p.width,
                        height: p.height,
                    })
                    .collect(),
            );
        }
    }
    if let Some(doc) = msg.document() {
        return TriggerContent::Document(DocumentRef {
            file_id: doc.file.id.to_string(),
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
            file_name: doc.file_name.clone(),
        });
    }
    if let Some(animation) = msg.animation() {
        return TriggerContent::Document(DocumentRef {
            file_id: animation.file.id.to_string(),
            mime_type: animation.mime_type.as_ref().map(|m| m.to_string()),
            file_name: animation.file_name.clone(),
        });
    }
    TriggerContent::None
}
