//! # floppy-telegram
//!
//! Telegram transport layer: adapters from teloxide types, the [`floppy_core::Bot`] implementation,
//! minimal config, and the command dispatcher. No image or generation logic lives here.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{trigger_content, TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use config::{build_teloxide_bot, TelegramConfig};
pub use runner::{run_dispatcher, run_guarded, FloppyCommand, MSG_APOLOGY};
