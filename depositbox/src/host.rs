//! Seams to the game server that owns containers, items and players
//!
//! The host drives the deposit box: it forwards each subscribed container's
//! accept gate and add/remove notifications, and reports destroyed items and
//! containers. The deposit box calls back through these traits.
//!
//! # Host contract
//!
//! For any item, the accept gate completes before the matching add
//! notification is delivered. Callbacks for all containers arrive on one
//! logical execution context.

use depositbox_ledger::{ContainerId, DepositorId, Item};

/// Container and item operations provided by the host
pub trait ContainerHost {
    /// Start forwarding `container`'s accept gate and mutation events
    fn subscribe(&mut self, container: ContainerId);

    /// Stop forwarding events for `container`
    fn unsubscribe(&mut self, container: ContainerId);

    /// Player currently moving `item`, if any
    fn resolve_owner(&self, item: &Item) -> Option<DepositorId>;

    /// Permanently remove `item` from the world
    fn destroy_item(&mut self, item: &Item);
}

/// Player directory and console access used by the leaderboard export
pub trait ServerConsole {
    /// Human-readable name of `depositor`
    fn display_name(&self, depositor: &DepositorId) -> Option<String>;

    /// Run a server console command
    fn run_command(&mut self, command: &str);
}
