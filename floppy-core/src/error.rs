use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Bot error: {0}")]
    Bot(String),

    /// Flood control: the transport asks us to wait this many seconds.
    #[error("Retry after {0}s")]
    RetryAfter(u64),

}

pub type Result<T> = std::result::Result<T, BotError>;
