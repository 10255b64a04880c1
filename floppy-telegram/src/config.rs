//! Telegram connection config: token, API URL, HTTP timeouts. Loaded from env.

use anyhow::Result;
use std::env;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Telegram Bot connection settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL (self-hosted Bot API server).
    pub telegram_api_url: Option<String>,
    pub connect_timeout_secs: u64,
    /// Upper bound for one request, media uploads included.
    pub timeout_secs: u64,
}

impl TelegramConfig {
    /// Loads from env: TELEGRAM_TOKEN (or BOT_TOKEN) is required unless `token` is given.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("TELEGRAM_TOKEN")
                .or_else(|_| env::var("BOT_TOKEN"))
                .map_err(|_| anyhow::anyhow!("TELEGRAM_TOKEN (or BOT_TOKEN) not set"))?,
        };
        if bot_token.trim().is_empty() {
            anyhow::bail!("TELEGRAM_TOKEN is empty");
        }
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let connect_timeout_secs = env::var("HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            bot_token,
            telegram_api_url,
            connect_timeout_secs,
            timeout_secs,
        })
    }

    /// TELEGRAM_API_URL must be a valid URL if set.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }
}

/// Builds a teloxide Bot with the configured timeouts and optional API URL.
pub fn build_teloxide_bot(config: &TelegramConfig) -> Result<teloxide::Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let mut bot = teloxide::Bot::with_client(config.bot_token.clone(), client);
    if let Some(ref url_str) = config.telegram_api_url {
        bot = bot.set_api_url(reqwest::Url::parse(url_str)?);
    }
    Ok(bot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "TELEGRAM_TOKEN",
            "BOT_TOKEN",
            "TELEGRAM_API_URL",
            "TELOXIDE_API_URL",
            "HTTP_CONNECT_TIMEOUT_SECS",
            "HTTP_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    fn config_with_token(token: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.to_string(),
            telegram_api_url: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "test_token");
        let config = TelegramConfig::from_env(None).unwrap();
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.timeout_secs, 60);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        clear_env();
        assert!(TelegramConfig::from_env(None).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_falls_back_to_bot_token() {
        clear_env();
        env::set_var("BOT_TOKEN", "legacy");
        env::set_var("HTTP_TIMEOUT_SECS", "90");
        let config = TelegramConfig::from_env(None).unwrap();
        assert_eq!(config.bot_token, "legacy");
        assert_eq!(config.timeout_secs, 90);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_token_wins() {
        clear_env();
        env::set_var("TELEGRAM_TOKEN", "env_token");
        let config = TelegramConfig::from_env(Some("cli_token".to_string())).unwrap();
        assert_eq!(config.bot_token, "cli_token");
        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = config_with_token("t");
        config.telegram_api_url = Some("not-a-valid-url".to_string());
        assert!(config.validate().is_err());
        config.telegram_api_url = Some("http://localhost:8081".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_teloxide_bot() {
        let config = config_with_token("123:abc");
        let bot = build_teloxide_bot(&config).unwrap();
        assert_eq!(bot.token(), "123:abc");
    }
}
