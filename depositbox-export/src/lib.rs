//! DepositBox Snapshot Exporter
//!
//! Read-only projections of a ledger snapshot.
//!
//! # Projections

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! 1. **Claim allocation**: a fixed budget split proportionally, floored per
//!    depositor, written once to storage
//! 2. **Leaderboard**: top-N ranking with display names, paginated and merged
//!    into an externally owned display document
//!
//! Both are recomputed from scratch on every export; neither is kept as live
//! state.
//!
//! # Example
//!
//! ```no_run
//! use depositbox_export::{compute_claim_allocation, compute_leaderboard};
//! use depositbox_ledger::{LedgerStore, Storage};
//! use std::sync::Arc;
//!
//! fn main() -> depositbox_export::Result<()> {
//!     let storage = Arc::new(Storage::open_dir("./data/depositbox")?);
//!     let ledger = LedgerStore::load(storage, "DepositBoxLog")?;
//!     let snapshot = ledger.snapshot();
//!
//!     let allocation = compute_claim_allocation(&snapshot, 1_000);
//!     let board = compute_leaderboard(&snapshot, 10, 10, |_| None);
//!     println!("{} rewards, {} ranked", allocation.rewards.len(), board.entries.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod claim;
pub mod leaderboard;
pub mod document;
pub mod error;

// Re-exports
pub use error::{Error, Result};
pub use claim::{compute_claim_allocation, write_claim_allocation, ClaimAllocation, ClaimSnapshot};
pub use leaderboard::{compute_leaderboard, Leaderboard, LeaderboardEntry};
pub use document::{export_leaderboard, ExportReport, MergeAction};
