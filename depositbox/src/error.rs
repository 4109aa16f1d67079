//! Error types for the deposit box service

use thiserror::Error;

/// Result type for deposit box operations
pub type Result<T> = std::result::Result<T, Error>;

/// Deposit box errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger, storage or configuration error
    #[error("Ledger error: {0}")]
    Ledger(#[from] depositbox_ledger::Error),

    /// Claim or leaderboard export error
    #[error("Export error: {0}")]
    Export(#[from] depositbox_export::Error),

    /// Webhook transport setup error
    #[error("Notification error: {0}")]
    Notify(#[from] depositbox_notify::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),
}
