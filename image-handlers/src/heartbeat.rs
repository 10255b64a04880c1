//! Presence heartbeat: keeps the chat's "uploading photo" indicator alive while a job runs.
//!
//! Telegram drops a chat action after about five seconds, so it has to be repeated for as long as
//! the remote edit takes. Send failures are logged and never end the job.

use std::sync::Arc;
use std::time::Duration;

use floppy_core::{Bot, Chat, ChatAction};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Starts presence heartbeats for one chat.
pub struct PresenceHeartbeat;

impl PresenceHeartbeat {
    /// Spawns the heartbeat task. The first signal goes out immediately, then one every `interval`.
    pub fn start(
        bot: Arc<dyn Bot>,
        chat: Chat,
        action: ChatAction,
        interval: Duration,
    ) -> HeartbeatHandle {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut beats: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    result = bot.send_chat_action(&chat, action) => {
                        beats += 1;
                        if let Err(e) = result {
                            warn!(chat_id = chat.id, error = %e, "Presence signal failed");
                        }
                    }
                }
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!(chat_id = chat.id, beats, "Heartbeat stopped");
        });
        HeartbeatHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owner of a running heartbeat. [`HeartbeatHandle::stop`] consumes it, so a job can stop its
/// heartbeat only once; dropping the handle without stopping still cancels the task.
pub struct HeartbeatHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Cancels the heartbeat and waits until its task has exited.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Heartbeat task ended abnormally");
            }
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
