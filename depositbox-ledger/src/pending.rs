//! Bridge between the accept-time and add-time container callbacks
//!
//! The accept gate sees who is moving an item; the add notification only
//! sees the item. Each item therefore moves through a two-state machine:
//!
//! ```text
//!             put (accept gate)
//! NoAssociation ───────────────▶ Pending(depositor)
//!       ▲                               │
//!       └──────── take_if_present ──────┘   (add notification)
//!       └──────── discard ──────────────┘   (item destroyed elsewhere)
//! ```
//!
//! # Precondition
//!
//! For a given item the host completes the accept callback before it invokes
//! the add callback. Nothing here can enforce that ordering; across distinct
//! items no ordering is assumed.
//!
//! The tracker is process-local and never persisted. It is not synchronized:
//! callers must route every access through a single writer.

use crate::types::{DepositorId, ItemId};
use std::collections::HashMap;

/// Bridging state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingState {
    /// No deposit is in flight for the item
    NoAssociation,

    /// The item was accepted on behalf of a depositor and awaits its add event
    Pending(DepositorId),
}

/// Item identity → depositor associations awaiting their add event
#[derive(Debug, Default)]
pub struct PendingDepositTracker {
    associations: HashMap<ItemId, DepositorId>,
}

impl PendingDepositTracker {
    /// Create empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `item` is being deposited by `depositor`
    ///
    /// A stale association for the same item is replaced and returned.
    pub fn put(&mut self, item: ItemId, depositor: DepositorId) -> Option<DepositorId> {
        let stale = self.associations.insert(item, depositor);
        if let Some(stale) = &stale {
            tracing::debug!(%item, %stale, "Replaced stale pending association");
        }
        stale
    }

    /// Read and remove the association for `item`
    pub fn take_if_present(&mut self, item: ItemId) -> Option<DepositorId> {
        self.associations.remove(&item)
    }

    /// Current state of `item`
    pub fn state(&self, item: ItemId) -> PendingState {
        match self.associations.get(&item) {
            Some(depositor) => PendingState::Pending(depositor.clone()),
            None => PendingState::NoAssociation,
        }
    }

    /// Drop the association of an item destroyed outside the credit path
    pub fn discard(&mut self, item: ItemId) -> bool {
        self.associations.remove(&item).is_some()
    }

    /// Number of associations in flight
    pub fn len(&self) -> usize {
        self.associations.len()
    }

    /// True if nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}
