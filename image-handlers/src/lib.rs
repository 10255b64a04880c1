//! # image-handlers
//!
//! The `/floppify` job: resolve the replied-to image, build the prompt, stream the remote edit and
//! relay every partial result onto one continuously edited photo message, with a presence
//! heartbeat running alongside.

mod error;
mod floppify_handler;
mod heartbeat;
mod prompt;
mod relay;
mod source;

pub use error::{JobError, RejectReason};
pub use floppify_handler::{FloppifyHandler, COMMAND_NAME};
pub use heartbeat::{HeartbeatHandle, PresenceHeartbeat};
pub use prompt::{build_prompt, DEFAULT_PROMPT};
pub use relay::{
    JobReport, JobState, ProgressiveRelay, RelayConfig, MSG_DONE_CAPTION,
    MSG_GENERATION_FAILED,
};
pub use source::{
    extension_from_path, is_image_document, select_source, stage_source, SourceRef, StagedSource,
    IMAGE_EXTENSIONS,
};
