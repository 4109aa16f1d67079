//! Metrics collection for observability
//!
//! Prometheus metrics for the deposit pipeline, kept in a private registry
//! so several deposit boxes (and tests) can coexist in one process.
//!
//! # Metrics
//!
//! - `depositbox_deposits_credited_total` - Deposits credited to the ledger
//! - `depositbox_amount_credited_total` - Sum of credited amounts
//! - `depositbox_integrity_violations_total` - Add events with no pending association
//! - `depositbox_pending_associations` - Associations awaiting their add event
//! - `depositbox_orphans_purged_total` - Associations dropped on item destruction
//! - `depositbox_notifications_failed_total` - Webhook calls that failed
//! - `depositbox_leaderboard_exports_total` - Successful leaderboard exports

use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Deposits credited
    pub deposits_credited: IntCounter,

    /// Sum of credited amounts
    pub amount_credited: IntCounter,

    /// Add events with no pending association
    pub integrity_violations: IntCounter,

    /// Associations in flight
    pub pending_associations: IntGauge,

    /// Orphaned associations purged
    pub orphans_purged: IntCounter,

    /// Failed webhook notifications
    pub notifications_failed: IntCounter,

    /// Leaderboard exports written
    pub leaderboard_exports: IntCounter,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_credited = IntCounter::new(
            "depositbox_deposits_credited_total",
            "Deposits credited to the ledger",
        )?;
        registry.register(Box::new(deposits_credited.clone()))?;

        let amount_credited = IntCounter::new(
            "depositbox_amount_credited_total",
            "Sum of credited deposit amounts",
        )?;
        registry.register(Box::new(amount_credited.clone()))?;

        let integrity_violations = IntCounter::new(
            "depositbox_integrity_violations_total",
            "Add events for deposit items with no pending association",
        )?;
        registry.register(Box::new(integrity_violations.clone()))?;

        let pending_associations = IntGauge::new(
            "depositbox_pending_associations",
            "Pending associations awaiting their add event",
        )?;
        registry.register(Box::new(pending_associations.clone()))?;

        let orphans_purged = IntCounter::new(
            "depositbox_orphans_purged_total",
            "Pending associations dropped because their item was destroyed",
        )?;
        registry.register(Box::new(orphans_purged.clone()))?;

        let notifications_failed = IntCounter::new(
            "depositbox_notifications_failed_total",
            "Webhook notifications that failed",
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        let leaderboard_exports = IntCounter::new(
            "depositbox_leaderboard_exports_total",
            "Leaderboard sections written to the display document",
        )?;
        registry.register(Box::new(leaderboard_exports.clone()))?;

        Ok(Self {
            deposits_credited,
            amount_credited,
            integrity_violations,
            pending_associations,
            orphans_purged,
            notifications_failed,
            leaderboard_exports,
            registry,
        })
    }

    /// Record a credited deposit
    pub fn record_credit(&self, amount: u64) {
        self.deposits_credited.inc();
        self.amount_credited.inc_by(amount);
    }

    /// Record an add event with no pending association
    pub fn record_integrity_violation(&self) {
        self.integrity_violations.inc();
    }

    /// Update the in-flight association gauge
    pub fn set_pending(&self, count: usize) {
        self.pending_associations.set(count as i64);
    }

    /// Record a purged orphan
    pub fn record_orphan_purged(&self) {
        self.orphans_purged.inc();
    }

    /// Record a leaderboard export
    pub fn record_leaderboard_export(&self) {
        self.leaderboard_exports.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
