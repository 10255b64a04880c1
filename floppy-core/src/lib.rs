//! # floppy-core
//!
//! Core types and traits for the floppify bot: [`Bot`] (the chat transport), [`Handler`],
//! message, chat and trigger-content types, and tracing initialization. Transport-agnostic;
//! used by floppy-telegram and image-handlers.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{parse_message_id, Bot};
pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use types::{
    ChatAction, Chat, Command, DocumentRef, DownloadedFile, Handler, HandlerResponse, Message,
    MessageHandle, PhotoRef, ReplyTarget, ToCoreMessage, ToCoreUser, TriggerContent, User,
};
