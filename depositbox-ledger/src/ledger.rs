//! Durable cumulative ledger
//!
//! Maps each depositor to the total amount ever credited to them. Every
//! credit is written through to storage before it becomes visible; if the
//! write fails the in-memory state is rolled back, so memory and disk agree.
//!
//! # Schema
//!
//! The document stored under the ledger key is a flat object:
//!
//! ```text
//! { "76561198000000001": 8, "76561198000000002": 2 }
//! ```
//!
//! Older deployments stored an append-only log instead:
//!
//! ```text
//! { "deposits": [ { "steamid": "...", "timestamp": "...", "amount_deposited": 5 } ] }
//! ```
//!
//! The log form is aggregated and rewritten in the flat form once, at load.

use crate::{
    types::{DepositorId, LedgerSnapshot},
    Error, Result, Storage,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One record of the legacy append-only log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyDepositEntry {
    /// Depositor
    #[serde(rename = "steamid")]
    pub steam_id: String,

    /// ISO-8601 time of the deposit
    #[serde(default)]
    pub timestamp: Option<String>,

    /// Amount of that deposit
    #[serde(rename = "amount_deposited")]
    pub amount_deposited: i64,
}

/// Either on-disk schema of the ledger document
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedLedger {
    Legacy { deposits: Vec<LegacyDepositEntry> },
    Totals(BTreeMap<DepositorId, u64>),
}

/// Durable mapping depositor → cumulative amount
#[derive(Debug)]
pub struct LedgerStore {
    storage: Arc<Storage>,
    key: String,
    totals: BTreeMap<DepositorId, u64>,
    total: u64,
}

impl LedgerStore {
    /// Load the ledger stored under `key`; an absent document is an empty ledger
    pub fn load(storage: Arc<Storage>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        let (totals, migrated) = match storage.read_object::<PersistedLedger>(&key)? {
            None => (BTreeMap::new(), false),
            Some(PersistedLedger::Totals(totals)) => (totals, false),
            Some(PersistedLedger::Legacy { deposits }) => (aggregate_legacy(&deposits)?, true),
        };

        let total = totals
            .values()
            .try_fold(0u64, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| {
                Error::ArithmeticDegenerate(format!("Ledger '{}' total overflows u64", key))
            })?;

        let store = Self {
            storage,
            key,
            totals,
            total,
        };

        if migrated {
            store.persist()?;
            tracing::info!(
                key = %store.key,
                depositors = store.totals.len(),
                "Migrated legacy deposit log to cumulative ledger"
            );
        }

        tracing::info!(
            key = %store.key,
            depositors = store.totals.len(),
            total = store.total,
            "Ledger loaded"
        );

        Ok(store)
    }

    /// Credit `amount` to `depositor` and persist; returns the new cumulative amount
    ///
    /// Non-positive amounts are rejected without touching state.
    pub fn credit(&mut self, depositor: &DepositorId, amount: i64) -> Result<u64> {
        if amount <= 0 {
            return Err(Error::ArithmeticDegenerate(format!(
                "Credit amount must be positive, got {} for {}",
                amount, depositor
            )));
        }
        let amount = amount as u64;

        let previous = self.totals.get(depositor).copied();
        let updated = previous.unwrap_or(0).checked_add(amount);
        let grand_total = self.total.checked_add(amount);
        let (updated, grand_total) = match (updated, grand_total) {
            (Some(updated), Some(grand_total)) => (updated, grand_total),
            _ => {
                return Err(Error::ArithmeticDegenerate(format!(
                    "Credit of {} to {} overflows the ledger",
                    amount, depositor
                )))
            }
        };

        self.totals.insert(depositor.clone(), updated);

        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => self.totals.insert(depositor.clone(), previous),
                None => self.totals.remove(depositor),
            };
            tracing::error!(%depositor, amount, error = %e, "Ledger persist failed, credit rolled back");
            return Err(e);
        }

        self.total = grand_total;

        tracing::debug!(%depositor, amount, total = updated, "Deposit credited");

        Ok(updated)
    }

    /// Amount credited to `depositor` so far
    pub fn amount_for(&self, depositor: &DepositorId) -> u64 {
        self.totals.get(depositor).copied().unwrap_or(0)
    }

    /// Sum of every credited amount
    pub fn total_credited(&self) -> u64 {
        self.total
    }

    /// Immutable copy for summaries and exporters
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.totals.clone())
    }

    /// Storage key of the ledger document
    pub fn key(&self) -> &str {
        &self.key
    }

    fn persist(&self) -> Result<()> {
        self.storage.write_object(&self.key, &self.totals)
    }
}

fn aggregate_legacy(deposits: &[LegacyDepositEntry]) -> Result<BTreeMap<DepositorId, u64>> {
    let mut totals = BTreeMap::new();

    for entry in deposits {
        if entry.amount_deposited <= 0 {
            tracing::warn!(
                steam_id = %entry.steam_id,
                amount = entry.amount_deposited,
                "Skipping non-positive legacy deposit"
            );
            continue;
        }

        let slot = totals.entry(DepositorId::new(entry.steam_id.clone())).or_insert(0u64);
        *slot = slot.checked_add(entry.amount_deposited as u64).ok_or_else(|| {
            Error::ArithmeticDegenerate(format!(
                "Legacy deposits of {} overflow u64",
                entry.steam_id
            ))
        })?;
    }

    Ok(totals)
}
