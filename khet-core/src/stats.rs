//! Search statistics tracking.

use std::ops::AddAssign;

/// Counters collected during one or more searches.
///
/// Owned by the caller and passed into [`crate::Searcher::search`], so
/// concurrent searches never share counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered, the root included
    pub nodes_visited: u64,

    /// Depth-limit and no-move positions handed to the evaluator
    pub leaves_evaluated: u64,

    /// Children where the laser destroyed a King
    pub terminal_hits: u64,

    /// Sibling moves skipped by alpha-beta cutoffs
    pub branches_pruned: u64,

    /// Deepest ply reached below the root
    pub max_ply: u32,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_node(&mut self, ply: u32) {
        self.nodes_visited += 1;
        self.max_ply = self.max_ply.max(ply);
    }

    #[inline]
    pub(crate) fn record_leaf(&mut self) {
        self.leaves_evaluated += 1;
    }

    #[inline]
    pub(crate) fn record_terminal(&mut self) {
        self.terminal_hits += 1;
    }

    #[inline]
    pub(crate) fn record_cutoff(&mut self, skipped: usize) {
        self.branches_pruned += skipped as u64;
    }

    /// Share of the tree skipped by pruning, in percent.
    pub fn prune_rate(&self) -> f64 {
        let total = self.nodes_visited + self.branches_pruned;
        if total > 0 {
            100.0 * self.branches_pruned as f64 / total as f64
        } else {
            0.0
        }
    }
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, other: SearchStats) {
        self.nodes_visited += other.nodes_visited;
        self.leaves_evaluated += other.leaves_evaluated;
        self.terminal_hits += other.terminal_hits;
        self.branches_pruned += other.branches_pruned;
        self.max_ply = self.max_ply.max(other.max_ply);
    }
}
