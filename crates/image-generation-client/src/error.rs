use thiserror::Error;

/// Failure kinds of a streaming edit. None of them are retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Could not reach the service or the connection dropped mid-stream.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The service refused the request (content policy, bad parameters, quota).
    #[error("Request rejected: {0}")]
    RemoteRejected(String),

    /// An event or its image payload could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
