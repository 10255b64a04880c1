//! Wraps teloxide::Bot and implements [`floppy_core::Bot`]. Production code talks to Telegram; tests substitute another Bot impl.

use async_trait::async_trait;
use floppy_core::{
    parse_message_id, Bot as CoreBot, BotError, Chat, ChatAction, DownloadedFile, Message,
    MessageHandle, Result,
};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction as TgChatAction, ChatId, FileId, InputFile, InputMedia, InputMediaPhoto, MessageId,
    ReplyParameters,
};
use teloxide::{ApiError, RequestError};

/// Thin wrapper around teloxide::Bot that implements floppy-core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

/// Keeps flood-control waits typed so callers can back off; everything else becomes text.
fn map_request_error(e: RequestError) -> BotError {
    match e {
        RequestError::RetryAfter(secs) => BotError::RetryAfter(secs.seconds() as u64),
        other => BotError::Bot(other.to_string()),
    }
}

fn to_tg_action(action: ChatAction) -> TgChatAction {
    match action {
        ChatAction::UploadPhoto => TgChatAction::UploadPhoto,
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        let id = parse_message_id(&message.id)?;
        self.bot
            .send_message(ChatId(message.chat.id), text.to_string())
            .reply_parameters(ReplyParameters::new(MessageId(id)))
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: &Chat,
        photo: Vec<u8>,
        caption: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<MessageHandle> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat.id), InputFile::memory(photo));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if let Some(reply_to) = reply_to {
            let id = parse_message_id(reply_to)?;
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        let sent = request.await.map_err(map_request_error)?;
        Ok(MessageHandle {
            chat_id: chat.id,
            message_id: sent.id.to_string(),
        })
    }

    async fn edit_photo(
        &self,
        handle: &MessageHandle,
        photo: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let id = parse_message_id(&handle.message_id)?;
        let mut media = InputMediaPhoto::new(InputFile::memory(photo));
        if let Some(caption) = caption {
            media = media.caption(caption);
        }
        match self
            .bot
            .edit_message_media(ChatId(handle.chat_id), MessageId(id), InputMedia::Photo(media))
            .await
        {
            Ok(_) => Ok(()),
            // Identical frame: the visible state already matches.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(map_request_error(e)),
        }
    }

    async fn send_chat_action(&self, chat: &Chat, action: ChatAction) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat.id), to_tg_action(action))
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<DownloadedFile> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(map_request_error)?;
        let mut bytes = Vec::new();
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(|e| BotError::Bot(e.to_string()))?;
        Ok(DownloadedFile {
            remote_path: file.path,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tg_action() {
        assert_eq!(to_tg_action(ChatAction::UploadPhoto), TgChatAction::UploadPhoto);
    }

    #[test]
    fn test_map_request_error_keeps_text() {
        let err = map_request_error(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, BotError::Bot(_)));
    }
}
