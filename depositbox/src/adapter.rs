//! Per-container adapter state
//!
//! Each deposit box container gets one adapter. Adapters are plain data in a
//! registry owned by [`DepositBox`](crate::DepositBox); the event handling
//! itself lives on the deposit box, so shutdown can enumerate and detach every
//! adapter in one place.

use chrono::{DateTime, Utc};
use depositbox_ledger::{ContainerId, Item, ItemTypeId};
use std::collections::HashMap;

/// Adapter state for one subscribed container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEventAdapter {
    /// Container the adapter is attached to
    pub container: ContainerId,

    /// Item type the container accepts
    pub deposit_item: ItemTypeId,

    /// When the adapter was attached
    pub attached_at: DateTime<Utc>,
}

impl ContainerEventAdapter {
    /// Create adapter for `container`
    pub fn new(container: ContainerId, deposit_item: ItemTypeId) -> Self {
        Self {
            container,
            deposit_item,
            attached_at: Utc::now(),
        }
    }

    /// True if `item` is the deposit item type
    pub fn accepts(&self, item: &Item) -> bool {
        item.item_type == self.deposit_item
    }
}

/// Container identity → adapter
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ContainerId, ContainerEventAdapter>,
}

impl AdapterRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an adapter; false if the container already has one
    pub fn attach(&mut self, adapter: ContainerEventAdapter) -> bool {
        if self.adapters.contains_key(&adapter.container) {
            return false;
        }
        self.adapters.insert(adapter.container, adapter);
        true
    }

    /// Remove the adapter of `container`
    pub fn detach(&mut self, container: ContainerId) -> Option<ContainerEventAdapter> {
        self.adapters.remove(&container)
    }

    /// Remove every adapter
    pub fn drain(&mut self) -> Vec<ContainerEventAdapter> {
        self.adapters.drain().map(|(_, adapter)| adapter).collect()
    }

    /// Adapter of `container`
    pub fn get(&self, container: ContainerId) -> Option<&ContainerEventAdapter> {
        self.adapters.get(&container)
    }

    /// Number of attached adapters
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// True if no adapter is attached
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
