//! Crate-wide error type.
//!
//! Poller-internal failures degrade to partial or empty results and are
//! only logged; `Error` surfaces at the fallible boundaries the host can
//! actually observe, such as opening an arbitration session or running
//! the process-listing tool.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Disk arbitration error: {0}")]
    Arbitration(String),

    #[error("System call error: {0}")]
    System(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Monitor channel closed")]
    ChannelClosed,
}

impl Error {
    pub(crate) fn arbitration<S: Into<String>>(msg: S) -> Self {
        Error::Arbitration(msg.into())
    }

    pub(crate) fn system<S: Into<String>>(msg: S) -> Self {
        Error::System(msg.into())
    }

    pub(crate) fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Error::InvalidData(msg.into())
    }
}

/// Result type for darwin-storage operations
pub type Result<T> = std::result::Result<T, Error>;
