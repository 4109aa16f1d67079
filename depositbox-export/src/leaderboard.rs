//! Ranked leaderboard projection
//!
//! Orders depositors by amount (descending, ties broken by depositor id
//! ascending), keeps the first `top_n`, resolves display names and splits the
//! result into fixed-size pages for rendering.

use depositbox_ledger::{DepositorId, LedgerSnapshot};
use serde::{Deserialize, Serialize};

/// One ranked row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based rank
    pub rank: usize,

    /// Depositor behind the row
    pub depositor: DepositorId,

    /// Resolved name, or the raw id when unresolved
    pub display_name: String,

    /// Cumulative amount
    pub amount: u64,
}

impl LeaderboardEntry {
    /// Text line shown in the display document
    pub fn render(&self) -> String {
        format!("{}. {} - {}", self.rank, self.display_name, self.amount)
    }
}

/// Ranked entries plus their page split
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leaderboard {
    /// Entries in rank order
    pub entries: Vec<LeaderboardEntry>,

    /// Entries per page
    pub page_size: usize,
}

impl Leaderboard {
    /// Entries split into pages of `page_size`
    pub fn pages(&self) -> Vec<&[LeaderboardEntry]> {
        self.entries.chunks(self.page_size.max(1)).collect()
    }

    /// Rendered text lines per page
    pub fn rendered_pages(&self) -> Vec<Vec<String>> {
        self.pages()
            .into_iter()
            .map(|page| page.iter().map(LeaderboardEntry::render).collect())
            .collect()
    }

    /// True if no depositor is ranked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rank `snapshot` and keep the first `top_n` depositors
pub fn compute_leaderboard<F>(
    snapshot: &LedgerSnapshot,
    top_n: usize,
    page_size: usize,
    resolve_display_name: F,
) -> Leaderboard
where
    F: Fn(&DepositorId) -> Option<String>,
{
    let entries = snapshot
        .ranked()
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(index, entry)| {
            let display_name = resolve_display_name(&entry.depositor)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| entry.depositor.to_string());
            LeaderboardEntry {
                rank: index + 1,
                depositor: entry.depositor,
                display_name,
                amount: entry.amount,
            }
        })
        .collect();

    Leaderboard {
        entries,
        page_size: page_size.max(1),
    }
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

    fn ids(board: &Leaderboard) -> Vec<(&str, u64)> {
        board
            .entries
            .iter()
            .map(|e| (e.depositor.as_str(), e.amount))
            .collect()
    }

    #[test]
    fn test_top_n_order() {
        let board = compute_leaderboard(&snapshot(&[("A", 10), ("B", 30), ("C", 20)]), 2, 10, |_| None);

        assert_eq!(ids(&board), vec![("B", 30), ("C", 20)]);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.entries[1].rank, 2);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let board = compute_leaderboard(&snapshot(&[("Z", 50), ("M", 50), ("A", 5)]), 3, 10, |_| None);

        assert_eq!(ids(&board), vec![("M", 50), ("Z", 50), ("A", 5)]);
    }

    #[test]
    fn test_display_name_fallback() {
        let board = compute_leaderboard(&snapshot(&[("P1", 8), ("P2", 2)]), 10, 10, |id| {
            match id.as_str() {
                "P1" => Some("Alice".to_string()),
                "P2" => Some("  ".to_string()),
                _ => None,
            }
        });

        assert_eq!(board.entries[0].display_name, "Alice");
        assert_eq!(board.entries[1].display_name, "P2");
        assert_eq!(board.entries[0].render(), "1. Alice - 8");
    }

    #[test]
    fn test_pagination() {
        let entries: Vec<(String, u64)> = (0..7).map(|i| (format!("P{}", i), 100 - i)).collect();
        let snap = LedgerSnapshot::new(
            entries
                .iter()
                .map(|(id, amount)| (DepositorId::new(id.clone()), *amount))
                .collect(),
        );

        let board = compute_leaderboard(&snap, 10, 3, |_| None);
        let pages = board.rendered_pages();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 3);
        assert_eq!(pages[2], vec!["7. P6 - 94".to_string()]);
    }

    #[test]
    fn test_empty_snapshot() {
        let board = compute_leaderboard(&LedgerSnapshot::default(), 10, 5, |_| None);

        assert!(board.is_empty());
        assert!(board.pages().is_empty());
    }
}
