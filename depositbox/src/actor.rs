//! Single-writer actor around [`DepositBox`]
//!
//! Host callbacks, admin queries and the periodic leaderboard export all go
//! through one mailbox, so the ledger and the pending associations are only
//! ever touched by one task.
//!
//! ```text
//!   host events ─┐
//!   admin calls ─┼─► DepositBoxHandle ──mpsc──► DepositBoxActor ──► DepositBox
//!                │                                   ▲
//!                └───────────── export timer ────────┘
//! ```
//!
//! Messages are processed in the order they were sent, which preserves the
//! host's guarantee that an accept gate precedes its add event.

use crate::host::{ContainerHost, ServerConsole};
use crate::service::{DepositBox, MutationOutcome};
use crate::{Error, Result};
use depositbox_export::{ClaimSnapshot, ExportReport};
use depositbox_ledger::{ContainerId, ContainerInfo, DepositorId, DepositorSummary, Item, ItemId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Message sent to the deposit box actor
#[derive(Debug)]
pub enum DepositMessage {
    /// A container was spawned
    ContainerSpawned {
        container: ContainerInfo,
        response: oneshot::Sender<bool>,
    },

    /// A container was destroyed
    ContainerDestroyed { container: ContainerId },

    /// Accept gate
    EvaluateAcceptance {
        container: ContainerId,
        item: Item,
        response: oneshot::Sender<bool>,
    },

    /// Item added to or removed from a container
    ItemMutated {
        container: ContainerId,
        item: Item,
        added: bool,
        response: oneshot::Sender<MutationOutcome>,
    },

    /// An item left the world
    ItemDestroyed { item: ItemId },

    /// One depositor's amount and share
    SummaryForDepositor {
        depositor: DepositorId,
        response: oneshot::Sender<DepositorSummary>,
    },

    /// Every depositor's amount and share
    SummaryAll {
        response: oneshot::Sender<Vec<DepositorSummary>>,
    },

    /// Split a budget and persist the result
    ComputeClaimAllocation {
        budget: u64,
        response: oneshot::Sender<Result<ClaimSnapshot>>,
    },

    /// Export the leaderboard now
    ExportLeaderboard {
        response: oneshot::Sender<Result<ExportReport>>,
    },

    /// Detach everything and stop; replies with the number of detached containers
    Shutdown { response: oneshot::Sender<usize> },
}

/// Actor that owns the deposit box
pub struct DepositBoxActor<H: ContainerHost, C: ServerConsole> {
    /// Service state
    core: DepositBox<H>,

    /// Console used by leaderboard exports
    console: C,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<DepositMessage>,

    /// Period of the leaderboard export
    export_interval: Duration,

    /// Periodic export enabled
    export_enabled: bool,
}

impl<H: ContainerHost, C: ServerConsole> std::fmt::Debug for DepositBoxActor<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositBoxActor")
            .field("core", &self.core)
            .field("export_interval", &self.export_interval)
            .field("export_enabled", &self.export_enabled)
            .finish()
    }
}

impl<H: ContainerHost, C: ServerConsole> DepositBoxActor<H, C> {
    /// Create new actor
    pub fn new(core: DepositBox<H>, console: C, mailbox: mpsc::Receiver<DepositMessage>) -> Self {
        let settings = &core.config().leaderboard;
        let export_interval = Duration::from_secs(settings.export_interval_mins.max(1) * 60);
        let export_enabled = settings.enabled;

        Self {
            core,
            console,
            mailbox,
            export_interval,
            export_enabled,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut export_timer = interval_at(Instant::now() + self.export_interval, self.export_interval);
        export_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = self.mailbox.recv() => {
                    match msg {
                        Some(DepositMessage::Shutdown { response }) => {
                            let detached = self.core.shutdown();
                            let _ = response.send(detached);
                            break;
                        }
                        Some(msg) => self.handle_message(msg),
                        // Every handle dropped
                        None => {
                            self.core.shutdown();
                            break;
                        }
                    }
                }

                _ = export_timer.tick(), if self.export_enabled => {
                    if let Err(e) = self.core.export_leaderboard(&mut self.console) {
                        tracing::warn!(error = %e, "Scheduled leaderboard export failed");
                    }
                }
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: DepositMessage) {
        match msg {
            DepositMessage::ContainerSpawned { container, response } => {
                let _ = response.send(self.core.on_container_spawned(&container));
            }

            DepositMessage::ContainerDestroyed { container } => {
                self.core.on_container_destroyed(container);
            }

            DepositMessage::EvaluateAcceptance { container, item, response } => {
                let _ = response.send(self.core.evaluate_acceptance(container, &item));
            }

            DepositMessage::ItemMutated { container, item, added, response } => {
                let _ = response.send(self.core.on_mutation(container, &item, added));
            }

            DepositMessage::ItemDestroyed { item } => {
                self.core.on_item_destroyed(item);
            }

            DepositMessage::SummaryForDepositor { depositor, response } => {
                let _ = response.send(self.core.summary_for_depositor(&depositor));
            }

            DepositMessage::SummaryAll { response } => {
                let _ = response.send(self.core.summary_all());
            }

            DepositMessage::ComputeClaimAllocation { budget, response } => {
                let _ = response.send(self.core.compute_claim_allocation(budget));
            }

            DepositMessage::ExportLeaderboard { response } => {
                let _ = response.send(self.core.export_leaderboard(&mut self.console));
            }

            DepositMessage::Shutdown { .. } => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct DepositBoxHandle {
    sender: mpsc::Sender<DepositMessage>,
}

impl DepositBoxHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<DepositMessage>) -> Self {
        Self { sender }
    }

    async fn send(&self, msg: DepositMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> DepositMessage) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Report a spawned container; true if it was attached
    pub async fn container_spawned(&self, container: ContainerInfo) -> Result<bool> {
        self.request(|response| DepositMessage::ContainerSpawned { container, response })
            .await
    }

    /// Report a destroyed container
    pub async fn container_destroyed(&self, container: ContainerId) -> Result<()> {
        self.send(DepositMessage::ContainerDestroyed { container }).await
    }

    /// Accept gate
    pub async fn evaluate_acceptance(&self, container: ContainerId, item: Item) -> Result<bool> {
        self.request(|response| DepositMessage::EvaluateAcceptance {
            container,
            item,
            response,
        })
        .await
    }

    /// Report an add (`added == true`) or removal
    pub async fn item_mutated(
        &self,
        container: ContainerId,
        item: Item,
        added: bool,
    ) -> Result<MutationOutcome> {
        self.request(|response| DepositMessage::ItemMutated {
            container,
            item,
            added,
            response,
        })
        .await
    }

    /// Report a destroyed item
    pub async fn item_destroyed(&self, item: ItemId) -> Result<()> {
        self.send(DepositMessage::ItemDestroyed { item }).await
    }

    /// Amount and share of `depositor`
    pub async fn summary_for_depositor(&self, depositor: DepositorId) -> Result<DepositorSummary> {
        self.request(|response| DepositMessage::SummaryForDepositor { depositor, response })
            .await
    }

    /// Every depositor, ranked
    pub async fn summary_all(&self) -> Result<Vec<DepositorSummary>> {
        self.request(|response| DepositMessage::SummaryAll { response })
            .await
    }

    /// Split `budget` over the ledger and persist it
    pub async fn compute_claim_allocation(&self, budget: u64) -> Result<ClaimSnapshot> {
        self.request(|response| DepositMessage::ComputeClaimAllocation { budget, response })
            .await?
    }

    /// Export the leaderboard immediately
    pub async fn export_leaderboard(&self) -> Result<ExportReport> {
        self.request(|response| DepositMessage::ExportLeaderboard { response })
            .await?
    }

    /// Shutdown actor; returns the number of containers detached
    pub async fn shutdown(&self) -> Result<usize> {
        self.request(|response| DepositMessage::Shutdown { response })
            .await
    }
}

/// Spawn the deposit box actor
pub fn spawn_deposit_box_actor<H, C>(core: DepositBox<H>, console: C) -> DepositBoxHandle
where
    H: ContainerHost + Send + 'static,
    C: ServerConsole + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = DepositBoxActor::new(core, console, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    DepositBoxHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depositbox_ledger::{Config, ItemId, Metrics};
    use depositbox_notify::NotificationDispatcher;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const PAPER: i32 = -1779183908;
    const SKIN: u64 = 1641384897;

    #[derive(Default)]
    struct SharedHost {
        owners: HashMap<ItemId, DepositorId>,
        destroyed: Arc<Mutex<Vec<ItemId>>>,
    }

    impl ContainerHost for SharedHost {
        fn subscribe(&mut self, _container: ContainerId) {}

        fn unsubscribe(&mut self, _container: ContainerId) {}

        fn resolve_owner(&self, item: &Item) -> Option<DepositorId> {
            self.owners.get(&item.id).cloned()
        }

        fn destroy_item(&mut self, item: &Item) {
            self.destroyed.lock().unwrap().push(item.id);
        }
    }

    #[derive(Default)]
    struct RecordingConsole {
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl ServerConsole for RecordingConsole {
        fn display_name(&self, depositor: &DepositorId) -> Option<String> {
            Some(format!("Player {}", depositor))
        }

        fn run_command(&mut self, command: &str) {
            self.commands.lock().unwrap().push(command.to_string());
        }
    }

    fn core(dir: &std::path::Path, host: SharedHost, enabled: bool) -> DepositBox<SharedHost> {
        let mut config = Config::default();
        config.data_dir = dir.join("data");
        config.leaderboard.enabled = enabled;
        config.leaderboard.targets[0].path = dir.join("oxide/config/ServerInfo.json");
        config.leaderboard.targets[1].path = dir.join("carbon/configs/ServerInfo.json");
        DepositBox::open(config, NotificationDispatcher::disabled(), Metrics::new().unwrap(), host)
            .unwrap()
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let temp_dir = tempfile::tempdir().unwrap();
        let handle = spawn_deposit_box_actor(
            core(temp_dir.path(), SharedHost::default(), false),
            RecordingConsole::default(),
        );

        assert!(handle
            .container_spawned(ContainerInfo { id: ContainerId(1), skin_id: SKIN })
            .await
            .unwrap());

        assert_eq!(handle.shutdown().await.unwrap(), 1);
        assert!(matches!(
            handle.summary_all().await,
            Err(Error::Concurrency(_))
        ));
    }

    #[tokio::test]
    async fn test_actor_deposit_flow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let destroyed = Arc::new(Mutex::new(Vec::new()));
        let host = SharedHost {
            owners: [(ItemId(10), DepositorId::new("P1"))].into_iter().collect(),
            destroyed: destroyed.clone(),
        };
        let handle = spawn_deposit_box_actor(
            core(temp_dir.path(), host, false),
            RecordingConsole::default(),
        );

        handle
            .container_spawned(ContainerInfo { id: ContainerId(1), skin_id: SKIN })
            .await
            .unwrap();

        let paper = Item::new(10, PAPER, 7);
        assert!(handle.evaluate_acceptance(ContainerId(1), paper.clone()).await.unwrap());
        let outcome = handle.item_mutated(ContainerId(1), paper, true).await.unwrap();
        assert!(matches!(outcome, MutationOutcome::Credited(_)));

        let summary = handle.summary_for_depositor(DepositorId::new("P1")).await.unwrap();
        assert_eq!(summary.amount, 7);
        assert_eq!(*destroyed.lock().unwrap(), vec![ItemId(10)]);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_export_runs_reload_command() {
        let temp_dir = tempfile::tempdir().unwrap();
        let document = temp_dir.path().join("carbon/configs/ServerInfo.json");
        std::fs::create_dir_all(document.parent().unwrap()).unwrap();
        std::fs::write(&document, r#"{"Tabs":[]}"#).unwrap();

        let commands = Arc::new(Mutex::new(Vec::new()));
        let handle = spawn_deposit_box_actor(
            core(temp_dir.path(), SharedHost::default(), false),
            RecordingConsole { commands: commands.clone() },
        );

        let report = handle.export_leaderboard().await.unwrap();

        assert_eq!(report.path, document);
        assert_eq!(*commands.lock().unwrap(), vec!["c.reload ServerInfo".to_string()]);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_export_without_document_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let handle = spawn_deposit_box_actor(
            core(temp_dir.path(), SharedHost::default(), false),
            RecordingConsole::default(),
        );

        assert!(matches!(
            handle.export_leaderboard().await,
            Err(Error::Export(_))
        ));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_export() {
        let temp_dir = tempfile::tempdir().unwrap();
        let document = temp_dir.path().join("oxide/config/ServerInfo.json");
        std::fs::create_dir_all(document.parent().unwrap()).unwrap();
        std::fs::write(&document, r#"{"Tabs":[]}"#).unwrap();

        let commands = Arc::new(Mutex::new(Vec::new()));
        let handle = spawn_deposit_box_actor(
            core(temp_dir.path(), SharedHost::default(), true),
            RecordingConsole { commands: commands.clone() },
        );

        tokio::time::sleep(Duration::from_secs(30 * 60 + 1)).await;
        // Round-trip through the mailbox so the tick has been handled
        handle.summary_all().await.unwrap();

        assert_eq!(*commands.lock().unwrap(), vec!["oxide.reload ServerInfo".to_string()]);

        handle.shutdown().await.unwrap();
    }
}
