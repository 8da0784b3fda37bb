//! Self-play statistics tracking.

use std::time::Instant;

use khet_core::{Player, SearchStats};

/// Format whole seconds as `hh:mm:ss`.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format a count with a k/M suffix.
pub fn format_count(n: u64) -> String {
    const K: u64 = 1_000;
    const M: u64 = K * 1_000;

    if n >= M {
        format!("{:.2}M", n as f64 / M as f64)
    } else if n >= K {
        format!("{:.1}k", n as f64 / K as f64)
    } else {
        n.to_string()
    }
}

/// Why a game stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEnd {
    KingDestroyed(Player),
    NoLegalMoves(Player),
    PlyLimit,
    Interrupted,
}

/// Statistics collected over one self-play game.
#[derive(Debug)]
pub struct SelfPlayStats {
    pub plies: u32,

    /// Pieces removed by the laser
    pub captures: u32,

    /// Search counters summed over every move
    pub search: SearchStats,

    /// Deepest completed search depth on any move
    pub deepest: u32,

    /// Moves whose deepening was cut short
    pub early_stops: u32,

    depth_total: u64,
    start_time: Instant,
}

impl SelfPlayStats {
    pub fn new() -> Self {
        Self {
            plies: 0,
            captures: 0,
            search: SearchStats::new(),
            deepest: 0,
            early_stops: 0,
            depth_total: 0,
            start_time: Instant::now(),
        }
    }

    pub fn record_ply(&mut self, search: SearchStats, depth: u32, stopped_early: bool, captured: bool) {
        self.plies += 1;
        self.search += search;
        self.depth_total += depth as u64;
        self.deepest = self.deepest.max(depth);
        if stopped_early {
            self.early_stops += 1;
        }
        if captured {
            self.captures += 1;
        }
    }

    pub fn average_depth(&self) -> f64 {
        if self.plies > 0 {
            self.depth_total as f64 / self.plies as f64
        } else {
            0.0
        }
    }

    pub fn nodes_per_sec(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.search.nodes_visited as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print final summary
    pub fn print_summary(&self, end: GameEnd) {
        match end {
            GameEnd::KingDestroyed(winner) => println!("Result: {} wins", winner),
            GameEnd::NoLegalMoves(player) => println!("Result: {} has no legal moves", player),
            GameEnd::PlyLimit => println!("Result: ply limit reached"),
            GameEnd::Interrupted => println!("Result: interrupted"),
        }
        println!("Plies: {}", self.plies);
        println!("Captures: {}", self.captures);
        println!(
            "Depth: average {:.1}, deepest {}, {} moves cut short",
            self.average_depth(),
            self.deepest,
            self.early_stops
        );
        println!("Nodes visited: {}", format_count(self.search.nodes_visited));
        println!("Terminal hits: {}", self.search.terminal_hits);
        println!(
            "Branches pruned: {} ({:.1}%)",
            format_count(self.search.branches_pruned),
            self.search.prune_rate()
        );
        println!(
            "Time: {} ({:.0} nodes/sec)",
            format_elapsed(self.start_time.elapsed().as_secs()),
            self.nodes_per_sec()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(3_725), "01:02:05");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(12_345), "12.3k");
        assert_eq!(format_count(2_500_000), "2.50M");
    }

    #[test]
    fn test_record_ply() {
        let mut stats = SelfPlayStats::new();
        let search = SearchStats {
            nodes_visited: 100,
            branches_pruned: 25,
            ..SearchStats::default()
        };
        stats.record_ply(search, 2, false, true);
        stats.record_ply(search, 4, true, false);

        assert_eq!(stats.plies, 2);
        assert_eq!(stats.captures, 1);
        assert_eq!(stats.early_stops, 1);
        assert_eq!(stats.deepest, 4);
        assert_eq!(stats.average_depth(), 3.0);
        assert_eq!(stats.search.nodes_visited, 200);
        assert_eq!(stats.search.branches_pruned, 50);
    }
}
