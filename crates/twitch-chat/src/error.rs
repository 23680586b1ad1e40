//! Transport error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, TwitchChatError>;

/// Errors from the chat transport and the roster API client.
#[derive(Error, Debug)]
pub enum TwitchChatError {
    /// Connection-related errors (WebSocket, handshake)
    #[error("Connection error: {0}")]
    Connection(String),

    /// IRC protocol errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Helix API errors (bad status, empty responses)
    #[error("API error: {0}")]
    Api(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TwitchChatError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an API error.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}
