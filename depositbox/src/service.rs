//! The deposit box: container lifecycle, accept/add bridge and crediting
//!
//! Every host callback lands on one `&mut DepositBox`. A deposit is credited
//! in two phases:
//!
//! 1. **Accept gate**: the host asks whether an item may enter a container.
//!    Deposit items are accepted and the acting player is recorded as a
//!    pending association keyed by item identity.
//! 2. **Add event**: the host reports the item inside the container. The
//!    association is consumed, the ledger is credited and the item destroyed.
//!
//! An add with no association is an integrity violation; the item is kept
//! and nothing is credited.

use crate::adapter::{AdapterRegistry, ContainerEventAdapter};
use crate::host::{ContainerHost, ServerConsole};
use crate::Result;
use depositbox_export::{
    compute_claim_allocation, compute_leaderboard, write_claim_allocation, ClaimSnapshot,
    ExportReport,
};
use depositbox_ledger::{
    percentage_of, Config, ContainerId, ContainerInfo, DepositReceipt, DepositorId,
    DepositorSummary, Item, ItemId, ItemTypeId, LedgerSnapshot, LedgerStore, Metrics,
    PendingDepositTracker, Storage,
};
use depositbox_notify::NotificationDispatcher;
use std::sync::Arc;

/// Why an added deposit item was left in its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainReason {
    /// No accept gate recorded a depositor for the item
    NoPendingAssociation,

    /// The ledger rejected or failed to persist the credit
    CreditFailed,
}

/// Outcome of an add/remove notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Removal, foreign item type or unknown container
    Ignored,

    /// Ledger credited and item destroyed
    Credited(DepositReceipt),

    /// Item kept, nothing credited
    Retained(RetainReason),
}

/// Deposit box service state
pub struct DepositBox<H: ContainerHost> {
    config: Config,
    storage: Arc<Storage>,
    ledger: LedgerStore,
    pending: PendingDepositTracker,
    adapters: AdapterRegistry,
    notifier: NotificationDispatcher,
    metrics: Metrics,
    host: H,
}

impl<H: ContainerHost> std::fmt::Debug for DepositBox<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositBox")
            .field("ledger", &self.ledger)
            .field("pending", &self.pending.len())
            .field("adapters", &self.adapters.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl<H: ContainerHost> DepositBox<H> {
    /// Open storage under `config.data_dir` and load the ledger
    pub fn open(
        config: Config,
        notifier: NotificationDispatcher,
        metrics: Metrics,
        host: H,
    ) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        Self::with_storage(config, storage, notifier, metrics, host)
    }

    /// Load the ledger from an already opened storage
    ///
    /// Failed notifications are counted on `metrics`.
    pub fn with_storage(
        config: Config,
        storage: Arc<Storage>,
        notifier: NotificationDispatcher,
        metrics: Metrics,
        host: H,
    ) -> Result<Self> {
        let ledger = LedgerStore::load(storage.clone(), config.ledger_key.clone())?;
        let notifier = notifier.with_failure_counter(metrics.notifications_failed.clone());

        tracing::info!(
            depositors = ledger.snapshot().len(),
            total = ledger.total_credited(),
            notifications = notifier.is_enabled(),
            "Deposit box ledger loaded"
        );

        Ok(Self {
            config,
            storage,
            ledger,
            pending: PendingDepositTracker::new(),
            adapters: AdapterRegistry::new(),
            notifier,
            metrics,
            host,
        })
    }

    /// Attach every deposit box among `containers`; returns how many were attached
    pub fn on_server_initialized<I>(&mut self, containers: I) -> usize
    where
        I: IntoIterator<Item = ContainerInfo>,
    {
        let attached = containers
            .into_iter()
            .filter(|container| self.on_container_spawned(container))
            .count();

        tracing::info!(attached, "Existing deposit boxes attached");
        attached
    }

    /// Attach an adapter if `container` carries the deposit box skin
    pub fn on_container_spawned(&mut self, container: &ContainerInfo) -> bool {
        if container.skin_id != self.config.deposit_box_skin_id {
            return false;
        }

        let adapter = ContainerEventAdapter::new(container.id, ItemTypeId(self.config.deposit_item_id));
        if !self.adapters.attach(adapter) {
            return false;
        }

        self.host.subscribe(container.id);
        tracing::debug!(container = %container.id, "Deposit box attached");
        true
    }

    /// Detach the adapter of a destroyed container
    pub fn on_container_destroyed(&mut self, container: ContainerId) {
        if self.adapters.detach(container).is_some() {
            self.host.unsubscribe(container);
            tracing::debug!(%container, "Deposit box detached");
        }
    }

    /// Accept gate: may `item` enter `container`?
    ///
    /// Containers without an adapter are not restricted.
    pub fn evaluate_acceptance(&mut self, container: ContainerId, item: &Item) -> bool {
        let adapter = match self.adapters.get(container) {
            Some(adapter) => adapter,
            None => {
                tracing::debug!(%container, item = %item.id, "Accept gate on unattached container");
                return true;
            }
        };

        if !adapter.accepts(item) {
            return false;
        }

        match self.host.resolve_owner(item) {
            Some(depositor) => {
                self.pending.put(item.id, depositor);
                self.metrics.set_pending(self.pending.len());
            }
            None => {
                tracing::debug!(item = %item.id, %container, "Deposit item accepted with no resolvable owner");
            }
        }

        true
    }

    /// Add/remove notification for `item` in `container`
    pub fn on_mutation(&mut self, container: ContainerId, item: &Item, added: bool) -> MutationOutcome {
        if !added {
            return MutationOutcome::Ignored;
        }

        match self.adapters.get(container) {
            Some(adapter) if adapter.accepts(item) => {}
            _ => return MutationOutcome::Ignored,
        }

        let depositor = match self.pending.take_if_present(item.id) {
            Some(depositor) => depositor,
            None => {
                let violation = depositbox_ledger::Error::IntegrityViolation(format!(
                    "{} added to {} with no pending depositor",
                    item.id, container
                ));
                tracing::warn!(error = %violation, "Deposit item retained");
                self.metrics.record_integrity_violation();
                return MutationOutcome::Retained(RetainReason::NoPendingAssociation);
            }
        };
        self.metrics.set_pending(self.pending.len());

        match self.credit_deposit(&depositor, i64::from(item.amount)) {
            Ok(receipt) => {
                self.host.destroy_item(item);
                MutationOutcome::Credited(receipt)
            }
            Err(e) => {
                tracing::error!(%depositor, item = %item.id, error = %e, "Deposit not credited, item retained");
                MutationOutcome::Retained(RetainReason::CreditFailed)
            }
        }
    }

    /// Drop the pending association of a destroyed item
    pub fn on_item_destroyed(&mut self, item: ItemId) -> bool {
        if !self.pending.discard(item) {
            return false;
        }

        self.metrics.record_orphan_purged();
        self.metrics.set_pending(self.pending.len());
        tracing::debug!(%item, "Orphaned pending association purged");
        true
    }

    fn credit_deposit(&mut self, depositor: &DepositorId, amount: i64) -> Result<DepositReceipt> {
        let total = self.ledger.credit(depositor, amount)?;
        let deposited = amount.unsigned_abs();

        self.metrics.record_credit(deposited);

        let receipt = DepositReceipt {
            depositor: depositor.clone(),
            deposited,
            total,
            percentage: percentage_of(total, self.ledger.total_credited()),
        };

        tracing::info!(
            %depositor,
            deposited,
            total,
            percentage = %receipt.percentage,
            "Deposit credited"
        );

        self.notifier.notify(depositor, deposited, total);
        Ok(receipt)
    }

    /// Amount and share of one depositor
    pub fn summary_for_depositor(&self, depositor: &DepositorId) -> DepositorSummary {
        self.ledger.snapshot().summary_for(depositor)
    }

    /// Every depositor, ranked by amount
    pub fn summary_all(&self) -> Vec<DepositorSummary> {
        self.ledger.snapshot().summaries()
    }

    /// Split `budget` over the current ledger and persist the result
    pub fn compute_claim_allocation(&self, budget: u64) -> Result<ClaimSnapshot> {
        let allocation = compute_claim_allocation(&self.ledger.snapshot(), budget);
        Ok(write_claim_allocation(&self.storage, &self.config.claims_key, &allocation)?)
    }

    /// Merge the current leaderboard into the display document, then reload it
    pub fn export_leaderboard(&self, console: &mut dyn ServerConsole) -> Result<ExportReport> {
        let settings = &self.config.leaderboard;
        let board = compute_leaderboard(
            &self.ledger.snapshot(),
            settings.top_n,
            settings.page_size,
            |depositor| console.display_name(depositor),
        );

        let report = depositbox_export::export_leaderboard(settings, &board)?;
        self.metrics.record_leaderboard_export();

        if let Some(command) = &report.reload_command {
            console.run_command(command);
        }

        Ok(report)
    }

    /// Detach every adapter and forget pending associations
    pub fn shutdown(&mut self) -> usize {
        let adapters = self.adapters.drain();
        for adapter in &adapters {
            self.host.unsubscribe(adapter.container);
        }

        let dropped = self.pending.len();
        self.pending = PendingDepositTracker::new();
        self.metrics.set_pending(0);

        tracing::info!(detached = adapters.len(), dropped, "Deposit box shut down");
        adapters.len()
    }

    /// Immutable copy of the ledger
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Sum of every credit
    pub fn total_credited(&self) -> u64 {
        self.ledger.total_credited()
    }

    /// Number of attached containers
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Number of pending associations
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Host callbacks
    pub fn host(&self) -> &H {
        &self.host
    }
}
