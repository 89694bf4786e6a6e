//! Error types for the connectify service process.
//!
//! Per-request failures live in [`crate::directory::DirectoryError`]; this
//! type covers startup and process-level faults.

/// Top-level error type for the connectify service.
#[derive(Debug, thiserror::Error)]
pub enum ConnectifyError {
    /// Missing or invalid configuration, detected at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Store could not be opened or initialized.
    #[error("store error: {0}")]
    Store(String),

    /// HTTP server bind or serve error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ConnectifyError>;
