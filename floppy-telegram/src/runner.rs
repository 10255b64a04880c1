//! Command dispatcher: registers the bot's commands, routes `/floppify` to the handler, and
//! runs every job in its own task behind a process-wide failure guard.

use anyhow::Result;
use floppy_core::{Bot as CoreBot, Command, Handler, Message as CoreMessage, ToCoreMessage};
use std::sync::Arc;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::utils::command::{BotCommands, ParseError};
use tracing::{debug, error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;
use super::bot_adapter::TelegramBotAdapter;

/// Sent to the chat when a job fails in a way its handler did not report itself.
pub const MSG_APOLOGY: &str = "⚠️ Oops, something went wrong. Try again later.";

/// Commands the bot understands; also the list registered with Telegram at startup.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum FloppyCommand {
    #[command(
        description = "Floppify an image by replying to it with this command.",
        parse_with = raw_args
    )]
    Floppify(String),
}

/// Accepts any (possibly empty) free text after the command.
fn raw_args(input: String) -> Result<(String,), ParseError> {
    Ok((input,))
}

impl FloppyCommand {
    fn to_core(&self) -> Command {
        match self {
            FloppyCommand::Floppify(args) => Command::new("floppify", args),
        }
    }
}

/// Runs `handler` on `message` in a child task. A returned error or a panic is logged and answered
/// with [`MSG_APOLOGY`]; it never propagates to the dispatcher or other jobs.
#[instrument(skip(handler, bot, message), fields(chat_id = message.chat.id, message_id = %message.id))]
pub async fn run_guarded(handler: Arc<dyn Handler>, bot: Arc<dyn CoreBot>, message: CoreMessage) {
    let job_message = message.clone();
    let outcome = tokio::spawn(async move { handler.handle(&job_message).await }).await;

    let fault = match outcome {
        Ok(Ok(response)) => {
            debug!(response = ?response, "Handler finished");
            return;
        }
        Ok(Err(e)) => e.to_string(),
        Err(join_err) => format!("handler task aborted: {}", join_err),
    };

    error!(error = %fault, "Exception in handler");
    if let Err(e) = bot.reply_to(&message, MSG_APOLOGY).await {
        warn!(error = %e, "Failed to send apology");
    }
}

async fn on_command(
    msg: Message,
    cmd: FloppyCommand,
    handler: Arc<dyn Handler>,
    transport: Arc<dyn CoreBot>,
) -> ResponseResult<()> {
    let mut core_msg = TelegramMessageWrapper(&msg).to_core();
    core_msg.command = Some(cmd.to_core());

    info!(
        user_id = core_msg.user.id,
        username = ?core_msg.user.username,
        chat_id = core_msg.chat.id,
        message_id = %core_msg.id,
        command = ?cmd,
        "Received command"
    );

    // The dispatcher must not wait on a job that may stream for minutes.
    tokio::spawn(run_guarded(handler, transport, core_msg));
    Ok(())
}

/// **Entry point.** Registers the command list, then long-polls until Ctrl-C.
#[instrument(skip(bot, handler))]
pub async fn run_dispatcher(bot: teloxide::Bot, handler: Arc<dyn Handler>) -> Result<()> {
    bot.set_my_commands(FloppyCommand::bot_commands()).await?;
    info!("Bot commands registered");

    let transport: Arc<dyn CoreBot> = Arc::new(TelegramBotAdapter::new(bot.clone()));

    let tree = Update::filter_message()
        .filter_command::<FloppyCommand>()
        .endpoint(on_command);

    info!("Starting dispatcher with long polling");

    Dispatcher::builder(bot, tree)
        .dependencies(dptree::deps![handler, transport])
        .default_handler(|upd| async move {
            debug!(update = ?upd, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in floppify dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    warn!("Dispatcher stopped");
    Ok(())
}
