//! Error types for snapshot exports

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Export errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger or storage error
    #[error("Ledger error: {0}")]
    Ledger(#[from] depositbox_ledger::Error),

    /// No candidate leaderboard document exists
    #[error("Leaderboard document not found (tried {0})")]
    DocumentNotFound(String),

    /// Document exists but does not have the expected shape
    #[error("Malformed leaderboard document: {0}")]
    MalformedDocument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the external document (missing, unreadable, unparseable)
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::DocumentNotFound(_)
                | Error::MalformedDocument(_)
                | Error::Serialization(_)
                | Error::Io(_)
        )
    }
}
