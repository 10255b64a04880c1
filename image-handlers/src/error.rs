use floppy_core::BotError;
use image_generation_client::GenerationError;
use thiserror::Error;

/// Why a trigger was refused before any work started. Each maps to its own user-facing text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("command is not a reply")]
    NoReply,
    #[error("replied-to document is not an image")]
    NotAnImage,
    #[error("replied-to message has no photo or document")]
    NoImageContent,
}

impl RejectReason {
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectReason::NoReply => "❗️ Reply to an image with /floppify to use this command.",
            RejectReason::NotAnImage => {
                "❗️ That file isn’t an image. Send a PNG/JPG and reply /floppify."
            }
            RejectReason::NoImageContent => "❗️ Reply to a photo or image-file with /floppify.",
        }
    }
}

/// Everything that can end a job early.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("input rejected: {0}")]
    InputValidation(RejectReason),

    #[error("source download failed: {0}")]
    Download(#[source] BotError),

    #[error("staging failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error("generation failed: {0}")]
    Remote(#[from] GenerationError),

    #[error("transport failed: {0}")]
    Transport(#[source] BotError),

    #[error("stream ended without a final image")]
    StreamEndedEarly,
}
