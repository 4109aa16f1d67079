//! DepositBox Ledger
//!
//! Durable cumulative ledger credited by deposits into designated containers.
//!
//! # Architecture
//!
//! - **LedgerStore**: depositor → cumulative amount, written through on every credit
//! - **PendingDepositTracker**: per-item bridge from the accept gate to the add event
//! - **Storage**: one JSON document per key under the data directory
//! - **Snapshots**: immutable copies for summaries and exporters

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! # Invariants
//!
//! - Conservation: Σ(entries) == Σ(amounts passed to `credit`)
//! - Monotonic: entries never decrease and are never deleted
//! - At most one pending association per item identity
//! - Zero totals yield 0%, never a division fault

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod storage;
pub mod ledger;
pub mod pending;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    percentage_of, ContainerId, ContainerInfo, DepositReceipt, DepositorId, DepositorSummary,
    Item, ItemId, ItemTypeId, LedgerEntry, LedgerSnapshot,
};
pub use storage::{is_valid_key, Storage};
pub use ledger::LedgerStore;
pub use pending::{PendingDepositTracker, PendingState};
pub use config::{Config, DocumentTarget, LeaderboardConfig, WebhookConfig};
pub use metrics::Metrics;
