//! Startup: validate config, init logging, wire transport + generation client + relay, run the dispatcher.

use anyhow::Result;
use floppy_core::{init_tracing, Bot, Handler};
use floppy_telegram::{build_teloxide_bot, run_dispatcher, TelegramBotAdapter};
use image_generation_client::{mask_token, GenerationClient, OpenAIImageEditClient};
use image_handlers::{FloppifyHandler, ProgressiveRelay};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::{BotConfig, GenerationConfig};

fn build_generation_client(config: &GenerationConfig) -> OpenAIImageEditClient {
    let client = match config.base_url {
        Some(ref base_url) => {
            OpenAIImageEditClient::with_base_url(config.api_key.clone(), base_url.clone())
        }
        None => OpenAIImageEditClient::new(config.api_key.clone()),
    };
    client
        .with_model(config.model.clone())
        .with_partial_images(config.partial_images)
        .with_connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .with_read_timeout(Duration::from_secs(config.read_timeout_secs))
}

/// Builds the `/floppify` handler on top of the given transport and generation client.
pub fn build_handler(
    config: &BotConfig,
    bot: Arc<dyn Bot>,
    client: Arc<dyn GenerationClient>,
) -> Arc<dyn Handler> {
    let relay = ProgressiveRelay::new(bot, client, config.relay_config());
    Arc::new(FloppifyHandler::new(Arc::new(relay)))
}

/// Main entry: validate config, init logging, build components, then run the dispatcher until Ctrl-C.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(
        model = %config.generation.model,
        partial_images = config.generation.partial_images,
        heartbeat_interval_secs = config.heartbeat_interval_secs,
        api_key = %mask_token(&config.generation.api_key),
        telegram_api_url = ?config.telegram.telegram_api_url,
        "Initializing bot"
    );

    let teloxide_bot = build_teloxide_bot(&config.telegram)?;
    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let client: Arc<dyn GenerationClient> =
        Arc::new(build_generation_client(&config.generation));
    let handler = build_handler(&config, bot, client);

    info!("Bot started successfully");

    run_dispatcher(teloxide_bot, handler).await
}
