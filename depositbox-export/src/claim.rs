//! Proportional claim allocation
//!
//! Splits a fixed reward budget across depositors in proportion to their
//! cumulative deposits:
//!
//! ```text
//! reward(d) = floor(amount(d) * budget / total)
//! ```
//!
//! Integer arithmetic is done in `u128`, so the floor is exact and the result
//! is identical for identical inputs. Truncation remainders stay unallocated.
//!
//! # Example
//!
//! ```text
//! Ledger {A: 1, B: 2}, budget 10
//!   A: floor(1 * 10 / 3) = 3
//!   B: floor(2 * 10 / 3) = 6
//!   unallocated: 1
//! ```

use crate::Result;
use chrono::{DateTime, Utc};
use depositbox_ledger::{DepositorId, LedgerSnapshot, Storage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rewards derived from one ledger snapshot and budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAllocation {
    /// Budget that was split
    pub budget: u64,

    /// Ledger total the shares were computed against
    pub total_credited: u64,

    /// Truncation remainder left unallocated
    pub unallocated: u64,

    /// Reward per depositor
    pub rewards: BTreeMap<DepositorId, u64>,
}

impl ClaimAllocation {
    /// Sum of all rewards
    pub fn allocated(&self) -> u64 {
        self.budget - self.unallocated
    }

    /// Reward for `depositor` (0 if absent)
    pub fn reward_for(&self, depositor: &DepositorId) -> u64 {
        self.rewards.get(depositor).copied().unwrap_or(0)
    }
}

/// Allocation as written to storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSnapshot {
    /// When the allocation was computed
    pub generated_at: DateTime<Utc>,

    /// The allocation
    #[serde(flatten)]
    pub allocation: ClaimAllocation,
}

/// Compute the allocation of `budget` over `snapshot`
///
/// A zero ledger total yields an empty allocation with the whole budget
/// unallocated.
pub fn compute_claim_allocation(snapshot: &LedgerSnapshot, budget: u64) -> ClaimAllocation {
    let total = snapshot.total();

    if total == 0 {
        return ClaimAllocation {
            budget,
            total_credited: 0,
            unallocated: budget,
            rewards: BTreeMap::new(),
        };
    }

    let mut rewards = BTreeMap::new();
    let mut allocated = 0u64;

    for (depositor, amount) in snapshot.iter().filter(|(_, amount)| *amount > 0) {
        // amount <= total, so the quotient never exceeds budget
        let reward = (amount as u128 * budget as u128 / total as u128) as u64;
        allocated += reward;
        rewards.insert(depositor.clone(), reward);
    }

    ClaimAllocation {
        budget,
        total_credited: total,
        unallocated: budget - allocated,
        rewards,
    }
}

/// Persist `allocation` under `key`, stamped with the current time
pub fn write_claim_allocation(
    storage: &Storage,
    key: &str,
    allocation: &ClaimAllocation,
) -> Result<ClaimSnapshot> {
    let snapshot = ClaimSnapshot {
        generated_at: Utc::now(),
        allocation: allocation.clone(),
    };

    storage.write_object(key, &snapshot)?;

    tracing::info!(
        key,
        budget = allocation.budget,
        depositors = allocation.rewards.len(),
        unallocated = allocation.unallocated,
        "Claim allocation written"
    );

    Ok(snapshot)
}
