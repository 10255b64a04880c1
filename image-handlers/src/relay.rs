//! Progressive relay: owns one `/floppify` job from trigger to terminal state.
//!
//! # Entry points
//!
//! - **[`ProgressiveRelay::run`]** – Validates, stages, streams and relays; never returns an error,
//!   the outcome is in the [`JobReport`].
//!
//! Every partial result is applied in arrival order onto a single photo message: the first one
//! creates it, each later one replaces its media in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use floppy_core::{Bot, BotError, Chat, ChatAction, Message, MessageHandle};
use futures::StreamExt;
use image_generation_client::{GenerationClient, PartialResult};
use tracing::{debug, error, info, instrument, warn};

use crate::error::JobError;
use crate::heartbeat::PresenceHeartbeat;
use crate::prompt::build_prompt;
use crate::source::{select_source, stage_source, StagedSource};

// --- User-facing texts ---
pub const MSG_GENERATION_FAILED: &str = "⚠️ OpenAI didn’t return an image. Please try again later.";
pub const MSG_DONE_CAPTION: &str = "😼 Here’s your Floppified image!";

/// Job lifecycle. `Completed`, `Rejected` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Validating,
    Staged,
    Streaming,
    Completed,
    Rejected,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Rejected | JobState::Failed)
    }

    /// Allowed edges of the lifecycle. Staging failures go straight from `Validating` to `Failed`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Validating, Staged)
                | (Validating, Rejected)
                | (Validating, Failed)
                | (Staged, Streaming)
                | (Staged, Failed)
                | (Streaming, Completed)
                | (Streaming, Failed)
        )
    }
}

/// Tuning for one relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Must stay below the transport's presence expiry (5 s on Telegram).
    pub heartbeat_interval: Duration,
    pub presence: ChatAction,
    /// Attempts per send/edit when the transport asks us to back off.
    pub max_send_attempts: u32,
    /// Where source images are staged; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(4),
            presence: ChatAction::UploadPhoto,
            max_send_attempts: 3,
            staging_dir: None,
        }
    }
}

/// State of one job. Lives only inside [`ProgressiveRelay::run`].
pub(crate) struct Job {
    chat: Chat,
    trigger_message_id: String,
    prompt: String,
    source: Option<StagedSource>,
    outbound: Option<MessageHandle>,
    state: JobState,
    started_at: Instant,
    frames_relayed: usize,
}

impl Job {
    fn new(message: &Message) -> Self {
        Self {
            chat: message.chat.clone(),
            trigger_message_id: message.id.clone(),
            prompt: String::new(),
            source: None,
            outbound: None,
            state: JobState::Validating,
            started_at: Instant::now(),
            frames_relayed: 0,
        }
    }

    fn transition(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            // Lifecycle bug; keep going with the requested state so the job still terminates.
            error!(from = ?self.state, to = ?next, "Invalid job state transition");
        }
        debug!(chat_id = self.chat.id, from = ?self.state, to = ?next, "Job state transition");
        self.state = next;
    }

    fn release_source(&mut self) {
        if let Some(staged) = self.source.take() {
            let path = staged.release();
            debug!(path = %path.display(), "Staged source removed");
        }
    }

    fn into_report(self, error: Option<JobError>) -> JobReport {
        JobReport {
            state: self.state,
            frames_relayed: self.frames_relayed,
            outbound: self.outbound,
            error,
        }
    }
}

/// Outcome of one job.
#[derive(Debug)]
pub struct JobReport {
    pub state: JobState,
    pub frames_relayed: usize,
    pub outbound: Option<MessageHandle>,
    pub error: Option<JobError>,
}

/// Drives jobs against a chat transport and a generation service. Holds no per-job state, so one
/// relay serves any number of concurrent jobs.
pub struct ProgressiveRelay {
    bot: Arc<dyn Bot>,
    client: Arc<dyn GenerationClient>,
    config: RelayConfig,
}

impl ProgressiveRelay {
    pub fn new(bot: Arc<dyn Bot>, client: Arc<dyn GenerationClient>, config: RelayConfig) -> Self {
        Self { bot, client, config }
    }

    /// **Entry point.** Runs one job for `message` (a `/floppify` command) to a terminal state.
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = %message.id))]
    pub async fn run(&self, message: &Message) -> JobReport {
        let mut job = Job::new(message);

        let source = match select_source(message.reply_to.as_ref()) {
            Ok(source) => source,
            Err(reason) => {
                info!(reason = %reason, "Trigger rejected");
                job.transition(JobState::Rejected);
                self.notify(message, reason.user_message()).await;
                return job.into_report(Some(JobError::InputValidation(reason)));
            }
        };

        let args = message
            .command
            .as_ref()
            .map(|c| c.args.as_slice())
            .unwrap_or(&[]);
        job.prompt = build_prompt(args);

        let staging_dir = self.config.staging_dir.as_deref();
        match stage_source(self.bot.as_ref(), &source, staging_dir).await {
            Ok(staged) => job.source = Some(staged),
            Err(e) => {
                job.transition(JobState::Failed);
                return self.finish_failed(job, message, e).await;
            }
        }
        job.transition(JobState::Staged);

        let heartbeat = PresenceHeartbeat::start(
            self.bot.clone(),
            job.chat.clone(),
            self.config.presence,
            self.config.heartbeat_interval,
        );

        let outcome = self.stream(&mut job).await;
        match &outcome {
            Ok(()) => job.transition(JobState::Completed),
            Err(_) => job.transition(JobState::Failed),
        }
        heartbeat.stop().await;

        match outcome {
            Ok(()) => {
                job.release_source();
                info!(
                    frames = job.frames_relayed,
                    elapsed_ms = job.started_at.elapsed().as_millis() as u64,
                    "Job completed"
                );
                job.into_report(None)
            }
            Err(e) => self.finish_failed(job, message, e).await,
        }
    }

    /// Opens the remote stream and relays each event. `Ok` only once the final event is shown.
    async fn stream(&self, job: &mut Job) -> Result<(), JobError> {
        let (image, extension) = match job.source.as_ref() {
            Some(staged) => (staged.read().await?, staged.extension.clone()),
            None => {
                return Err(JobError::Staging(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no staged source",
                )))
            }
        };

        let mut events = self
            .client
            .stream_edit(image, &extension, &job.prompt)
            .await?;
        job.transition(JobState::Streaming);

        while let Some(event) = events.next().await {
            let partial = event?;
            self.relay_frame(job, &partial).await?;
            if partial.is_final {
                return Ok(());
            }
        }
        Err(JobError::StreamEndedEarly)
    }

    /// Shows one partial result: creates the outbound photo on the first frame, edits it afterwards.
    async fn relay_frame(&self, job: &mut Job, partial: &PartialResult) -> Result<(), JobError> {
        // Remote edits can pause longer than the presence indicator lives.
        if let Err(e) = self.bot.send_chat_action(&job.chat, self.config.presence).await {
            warn!(error = %e, "Presence signal failed");
        }

        let caption = partial.is_final.then_some(MSG_DONE_CAPTION);
        match &job.outbound {
            None => {
                let handle = self
                    .send_photo_with_retry(&job.chat, &partial.image, caption, &job.trigger_message_id)
                    .await
                    .map_err(JobError::Transport)?;
                job.outbound = Some(handle);
            }
            Some(handle) => {
                self.edit_photo_with_retry(handle, &partial.image, caption)
                    .await
                    .map_err(JobError::Transport)?;
            }
        }
        job.frames_relayed += 1;
        debug!(
            frame = job.frames_relayed,
            index = partial.index,
            is_final = partial.is_final,
            size = partial.image.len(),
            "Frame relayed"
        );
        Ok(())
    }

    /// Back-off to apply for `err`, or `None` when it should not be retried.
    fn retry_delay(&self, err: &BotError, attempt: u32) -> Option<Duration> {
        match err {
            BotError::RetryAfter(secs) if attempt < self.config.max_send_attempts => {
                Some(Duration::from_secs(*secs))
            }
            _ => None,
        }
    }

    async fn send_photo_with_retry(
        &self,
        chat: &Chat,
        image: &[u8],
        caption: Option<&str>,
        reply_to: &str,
    ) -> floppy_core::Result<MessageHandle> {
        let mut attempt = 1;
        loop {
            match self
                .bot
                .send_photo(chat, image.to_vec(), caption, Some(reply_to))
                .await
            {
                Ok(handle) => return Ok(handle),
                Err(e) => match self.retry_delay(&e, attempt) {
                    Some(delay) => {
                        warn!(error = %e, attempt, "Failed to send photo, retrying after {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn edit_photo_with_retry(
        &self,
        handle: &MessageHandle,
        image: &[u8],
        caption: Option<&str>,
    ) -> floppy_core::Result<()> {
        let mut attempt = 1;
        loop {
            match self.bot.edit_photo(handle, image.to_vec(), caption).await {
                Ok(()) => return Ok(()),
                Err(e) => match self.retry_delay(&e, attempt) {
                    Some(delay) => {
                        warn!(error = %e, attempt, "Failed to edit photo, retrying after {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    /// Terminal bookkeeping for `Failed`: drop the staged file, then tell the user. A preview
    /// already on screen stays as it is.
    async fn finish_failed(&self, mut job: Job, message: &Message, err: JobError) -> JobReport {
        job.release_source();
        error!(
            error = %err,
            frames = job.frames_relayed,
            has_preview = job.outbound.is_some(),
            elapsed_ms = job.started_at.elapsed().as_millis() as u64,
            "Job failed"
        );
        self.notify(message, MSG_GENERATION_FAILED).await;
        job.into_report(Some(err))
    }

    async fn notify(&self, message: &Message, text: &str) {
        if let Err(e) = self.bot.reply_to(message, text).await {
            error!(error = %e, "Failed to send notice");
        }
    }
}
