//! DepositBox Service
//!
//! Turns designated containers into drop boxes: deposits of one item type are
//! credited to the depositing player's durable ledger entry and the item is
//! destroyed.
//!
//! # Architecture
//!
//! - **DepositBox**: container lifecycle, accept/add bridge, crediting
//! - **DepositBoxActor**: single writer over the deposit box, periodic export
//! - **ContainerHost / ServerConsole**: seams to the game server

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! # Invariants
//!
//! - An item is credited at most once, and only after its accept gate
//! - The ledger is persisted before the item is destroyed
//! - Notification failures never affect the ledger

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod adapter;
pub mod host;
pub mod service;
pub mod actor;
pub mod error;

// Re-exports
pub use error::{Error, Result};
pub use adapter::{AdapterRegistry, ContainerEventAdapter};
pub use host::{ContainerHost, ServerConsole};
pub use service::{DepositBox, MutationOutcome, RetainReason};
pub use actor::{spawn_deposit_box_actor, DepositBoxActor, DepositBoxHandle, DepositMessage};
