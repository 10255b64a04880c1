//! # floppy-bot
//!
//! Application wiring: loads config from env, builds the Telegram transport, the OpenAI image edit
//! client and the floppify relay, then runs the dispatcher.

pub mod cli;
pub mod config;
pub mod runner;

pub use cli::{Cli, Commands};
pub use config::{BotConfig, GenerationConfig};
pub use runner::{build_handler, run_bot};
