//! `/floppify` handler: hands matching commands to the [`ProgressiveRelay`].

use async_trait::async_trait;
use floppy_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::relay::ProgressiveRelay;

pub const COMMAND_NAME: &str = "floppify";

/// Runs one relay job per `/floppify` command; other messages pass through.
#[derive(Clone)]
pub struct FloppifyHandler {
    relay: Arc<ProgressiveRelay>,
}

impl FloppifyHandler {
    pub fn new(relay: Arc<ProgressiveRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl Handler for FloppifyHandler {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let is_floppify = message
            .command
            .as_ref()
            .map(|c| c.name == COMMAND_NAME)
            .unwrap_or(false);
        if !is_floppify {
            return Ok(HandlerResponse::Continue);
        }

        let report = self.relay.run(message).await;
        info!(
            user_id = message.user.id,
            chat_id = message.chat.id,
            state = ?report.state,
            frames = report.frames_relayed,
            "Floppify job finished"
        );
        Ok(HandlerResponse::Stop)
    }
}
