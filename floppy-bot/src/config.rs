//! BotConfig: Telegram connection + generation service + logging + relay tuning. Loaded from env.

use anyhow::Result;
use floppy_telegram::TelegramConfig;
use image_generation_client::{
    DEFAULT_IMAGE_MODEL, DEFAULT_PARTIAL_IMAGES, DEFAULT_READ_TIMEOUT_SECS,
};
use image_handlers::RelayConfig;
use std::env;
use std::time::Duration;

const DEFAULT_LOG_FILE: &str = "logs/floppy-bot.log";
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 4;
const MAX_PARTIAL_IMAGES: u8 = 3;

/// Image generation service settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// OPENAI_API_KEY
    pub api_key: String,
    /// OPENAI_BASE_URL
    pub base_url: Option<String>,
    /// OPENAI_IMAGE_MODEL
    pub model: String,
    /// OPENAI_PARTIAL_IMAGES
    pub partial_images: u8,
    /// HTTP_CONNECT_TIMEOUT_SECS
    pub connect_timeout_secs: u64,
    /// OPENAI_READ_TIMEOUT_SECS: longest silence between two stream reads.
    pub read_timeout_secs: u64,
}

impl GenerationConfig {
    /// OPENAI_API_KEY is required; the rest falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        let base_url = env::var("OPENAI_BASE_URL").ok();
        let model =
            env::var("OPENAI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());
        let partial_images = env::var("OPENAI_PARTIAL_IMAGES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PARTIAL_IMAGES);
        let connect_timeout_secs = env::var("HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let read_timeout_secs = env::var("OPENAI_READ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_READ_TIMEOUT_SECS);
        Ok(Self {
            api_key,
            base_url,
            model,
            partial_images,
            connect_timeout_secs,
            read_timeout_secs,
        })
    }
}

/// Full bot config. Use [`BotConfig::load`] then [`BotConfig::validate`] before starting.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub generation: GenerationConfig,
    /// LOG_FILE
    pub log_file: String,
    /// HEARTBEAT_INTERVAL_SECS
    pub heartbeat_interval_secs: u64,
}

impl BotConfig {
    /// Loads everything from env. `token` overrides TELEGRAM_TOKEN. A missing secret is an error.
    pub fn load(token: Option<String>) -> Result<Self> {
        let telegram = TelegramConfig::from_env(token)?;
        let generation = GenerationConfig::from_env()?;
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let heartbeat_interval_secs = env::var("HEARTBEAT_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECS);
        Ok(Self {
            telegram,
            generation,
            log_file,
            heartbeat_interval_secs,
        })
    }

    /// Rejects malformed URLs, an out-of-range partial image count and a zero heartbeat interval.
    pub fn validate(&self) -> Result<()> {
        self.telegram.validate()?;
        if let Some(ref url_str) = self.generation.base_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!("OPENAI_BASE_URL is set but not a valid URL: {}", url_str);
            }
        }
        if self.generation.partial_images > MAX_PARTIAL_IMAGES {
            anyhow::bail!(
                "OPENAI_PARTIAL_IMAGES must be between 0 and {}, got {}",
                MAX_PARTIAL_IMAGES,
                self.generation.partial_images
            );
        }
        if self.generation.read_timeout_secs == 0 {
            anyhow::bail!("OPENAI_READ_TIMEOUT_SECS must be greater than 0");
        }
        if self.heartbeat_interval_secs == 0 {
            anyhow::bail!("HEARTBEAT_INTERVAL_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            ..RelayConfig::default()
        }
    }
}
