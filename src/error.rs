//! Error types shared across the router, the response helpers and the server

use thiserror::Error;

/// Error returned by an application handler.
///
/// Any error type can be surfaced from a handler with `?`; its `Display`
/// text becomes the `message` field of the 500 response.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by an application handler
pub type HandlerResult = Result<(), HandlerError>;

/// Errors raised by the router itself
#[derive(Debug, Error)]
pub enum RouterError {
    /// A body-writing helper was called on a response that is already finalized
    #[error("response already sent")]
    AlreadySent,

    /// `status()` recorded a code that is not a valid HTTP status
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    /// JSON serialization of a response value failed
    #[error("failed to serialize JSON body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Listener or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// `host:port` did not parse into a socket address
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
