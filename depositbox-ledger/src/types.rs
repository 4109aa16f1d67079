//! Core types for the deposit ledger
//!
//! Identities are newtypes so a container id can never be passed where an
//! item id is expected. Amounts are unsigned once they reach the ledger;
//! host-reported quantities stay signed until validated by `credit`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable external identity of a depositor (player id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepositorId(String);

impl DepositorId {
    /// Create new depositor ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepositorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned identity of a single item instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Host-assigned identity of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Item definition (type tag), e.g. `-1779183908` for paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub i32);

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient unit of a virtual good inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Instance identity
    pub id: ItemId,

    /// Type tag
    pub item_type: ItemTypeId,

    /// Stack quantity as reported by the host
    pub amount: i32,
}

impl Item {
    /// Create new item
    pub fn new(id: u64, item_type: i32, amount: i32) -> Self {
        Self {
            id: ItemId(id),
            item_type: ItemTypeId(item_type),
            amount,
        }
    }
}

/// Container as seen at spawn time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Container identity
    pub id: ContainerId,

    /// Visual marker that selects deposit boxes
    pub skin_id: u64,
}

/// Cumulative amount credited to one depositor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Depositor
    pub depositor: DepositorId,

    /// Cumulative amount
    pub amount: u64,
}

/// Immutable copy of the ledger
///
/// Exporters and summaries read from a snapshot, so later credits never show
/// up halfway through an iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    totals: BTreeMap<DepositorId, u64>,
    total: u64,
}

impl LedgerSnapshot {
    /// Build a snapshot from per-depositor totals
    pub fn new(totals: BTreeMap<DepositorId, u64>) -> Self {
        // Saturates on overflow
        let total = totals
            .values()
            .fold(0u64, |acc, amount| acc.saturating_add(*amount));
        Self { totals, total }
    }

    /// Amount credited to `depositor` (0 if absent)
    pub fn amount_for(&self, depositor: &DepositorId) -> u64 {
        self.totals.get(depositor).copied().unwrap_or(0)
    }

    /// Sum over all depositors
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of depositors
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// True if nothing has been credited
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Iterate in depositor order
    pub fn iter(&self) -> impl Iterator<Item = (&DepositorId, u64)> {
        self.totals.iter().map(|(depositor, amount)| (depositor, *amount))
    }

    /// Entries sorted by amount descending, ties by depositor ascending
    pub fn ranked(&self) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .iter()
            .map(|(depositor, amount)| LedgerEntry {
                depositor: depositor.clone(),
                amount,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.depositor.cmp(&b.depositor))
        });
        entries
    }

    /// Share of the total held by `depositor`, in percent
    pub fn percentage_for(&self, depositor: &DepositorId) -> Decimal {
        percentage_of(self.amount_for(depositor), self.total)
    }

    /// Amount and share of one depositor; unknown depositors read 0 / 0%
    pub fn summary_for(&self, depositor: &DepositorId) -> DepositorSummary {
        DepositorSummary {
            depositor: depositor.clone(),
            amount: self.amount_for(depositor),
            percentage: self.percentage_for(depositor),
        }
    }

    /// Summaries of every depositor in rank order
    pub fn summaries(&self) -> Vec<DepositorSummary> {
        self.ranked()
            .into_iter()
            .map(|entry| DepositorSummary {
                percentage: percentage_of(entry.amount, self.total),
                depositor: entry.depositor,
                amount: entry.amount,
            })
            .collect()
    }
}

/// `part / total * 100`, rounded to two places; a zero total yields 0
pub fn percentage_of(part: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

/// Per-depositor view used by summary queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositorSummary {
    /// Depositor
    pub depositor: DepositorId,

    /// Cumulative amount
    pub amount: u64,

    /// Share of all deposits in percent
    pub percentage: Decimal,
}

/// Result of a credited deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Depositor
    pub depositor: DepositorId,

    /// Amount credited by this deposit
    pub deposited: u64,

    /// Depositor's cumulative amount after the credit
    pub total: u64,

    /// Depositor's share of all deposits after the credit, in percent
    pub percentage: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, u64)]) -> LedgerSnapshot {
        LedgerSnapshot::new(
            entries
                .iter()
                .map(|(id, amount)| (DepositorId::new(*id), *amount))
                .collect(),
        )
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage_of(0, 0), Decimal::ZERO);
        assert_eq!(percentage_of(5, 0), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        assert_eq!(percentage_of(1, 3), Decimal::new(3333, 2));
        assert_eq!(format!("{:.2}", percentage_of(8, 10)), "80.00");
    }

    #[test]
    fn test_ranked_tie_break() {
        let snap = snapshot(&[("C", 20), ("B", 30), ("A", 30)]);
        let ranked: Vec<_> = snap
            .ranked()
            .into_iter()
            .map(|e| e.depositor.as_str().to_string())
            .collect();
        assert_eq!(ranked, vec!["A", "B", "C"]);
        assert_eq!(snap.total(), 80);
    }

    #[test]
    fn test_missing_depositor_reads_zero() {
        let snap = snapshot(&[("A", 10)]);
        assert_eq!(snap.amount_for(&DepositorId::new("Z")), 0);
        assert_eq!(snap.percentage_for(&DepositorId::new("Z")), Decimal::ZERO);
    }

    #[test]
    fn test_total_saturates() {
        let snap = snapshot(&[("A", u64::MAX), ("B", 5)]);
        assert_eq!(snap.total(), u64::MAX);
        assert_eq!(snap.amount_for(&DepositorId::new("B")), 5);
    }

    #[test]
    fn test_summaries_in_rank_order() {
        let snap = snapshot(&[("P2", 2), ("P1", 8)]);
        let summaries = snap.summaries();

        assert_eq!(summaries[0].depositor, DepositorId::new("P1"));
        assert_eq!(summaries[0].percentage, Decimal::new(8000, 2));
        assert_eq!(summaries[1].percentage, Decimal::new(2000, 2));
        assert_eq!(LedgerSnapshot::default().summary_for(&DepositorId::new("P1")).amount, 0);
    }
}
