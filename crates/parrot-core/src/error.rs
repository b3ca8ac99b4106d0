use thiserror::Error;

/// Top-level error type for Parrot.
#[derive(Debug, Error)]
pub enum ParrotError {
    /// A write was rejected before touching storage (empty group, keyword, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The durability layer failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The store was used after `close()`.
    #[error("store is closed")]
    Closed,

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Outbound HTTP fetch failed (images, invitation codes).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ParrotError {
    /// Whether this error came from the caller rather than from storage.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
