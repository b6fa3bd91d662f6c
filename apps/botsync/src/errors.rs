use thiserror::Error;

/// Errors raised by a transport adapter
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while running a node
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Work execution failed: {0}")]
    WorkFailed(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Callback queue is closed")]
    QueueClosed,

    #[error("Node is already running")]
    AlreadyRunning,
}

pub type BotResult<T> = Result<T, BotError>;
