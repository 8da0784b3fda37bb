//! Depth-limited minimax with optional alpha-beta pruning.
//!
//! The search mutates a single board through [`Board::apply_quiet`] and
//! [`Board::undo`]; the board is back in its original state when
//! [`Searcher::search`] returns, including after an interrupted search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::eval::{EvalContext, Evaluator};
use crate::stats::SearchStats;
use crate::{Board, Move, Player, Undo};

/// Nodes between checks of the stop flag and deadline.
const STOP_CHECK_INTERVAL: u64 = 1024;

/// How to choose among root moves with the same best score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// First move in enumeration order. Reproducible.
    #[default]
    FirstFound,
    /// Uniformly among the tied moves, from a seeded generator.
    Random { seed: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies to look ahead; at least 1.
    pub max_depth: u32,
    /// Use alpha-beta cutoffs. Without pruning the full tree is searched.
    pub prune: bool,
    pub tie_break: TieBreak,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 3,
            prune: true,
            tie_break: TieBreak::FirstFound,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// Score of the best move from the root player's point of view.
    pub score: i32,
    /// None when the root player has no legal move.
    pub best_move: Option<Move>,
    /// False when the search was stopped early; the result then only covers
    /// the root moves searched before the stop.
    pub complete: bool,
}

/// Runs searches with one evaluator and configuration.
pub struct Searcher<'a, E: Evaluator + ?Sized> {
    evaluator: &'a E,
    config: SearchConfig,
    running: Option<&'a AtomicBool>,
    deadline: Option<Instant>,
    rng: Option<StdRng>,
    root: Player,
    aborted: bool,
    since_check: u64,
}

impl<'a, E: Evaluator + ?Sized> Searcher<'a, E> {
    pub fn new(evaluator: &'a E, config: SearchConfig) -> Self {
        let rng = match config.tie_break {
            TieBreak::FirstFound => None,
            TieBreak::Random { seed } => Some(StdRng::seed_from_u64(seed)),
        };
        Searcher {
            evaluator,
            config,
            running: None,
            deadline: None,
            rng,
            root: Player::One,
            aborted: false,
            since_check: 0,
        }
    }

    /// Abandon the search once `running` reads false.
    pub fn with_running_flag(mut self, running: &'a AtomicBool) -> Self {
        self.running = Some(running);
        self
    }

    /// Abandon the search once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Search for the best move of `root` on `board`.
    pub fn search(&mut self, board: &mut Board, root: Player, stats: &mut SearchStats) -> SearchResult {
        self.root = root;
        self.aborted = false;
        self.since_check = 0;
        let depth = self.config.max_depth.max(1);

        stats.record_node(0);
        let moves = board.legal_moves(root);
        if moves.is_empty() {
            stats.record_leaf();
            return SearchResult {
                score: self.static_score(board, depth),
                best_move: None,
                complete: true,
            };
        }

        let mut best = i32::MIN;
        let mut tied: Vec<Move> = Vec::new();
        let mut alpha = i32::MIN;
        let beta = i32::MAX;

        for mov in moves {
            let undo = board.apply_quiet(root, mov);
            let score = self.child_score(board, &undo, depth - 1, 1, alpha, beta, stats);
            board.undo(&undo);
            if self.aborted {
                break;
            }

            if score > best {
                best = score;
                tied.clear();
                tied.push(mov);
            } else if score == best && self.rng.is_some() {
                tied.push(mov);
            }

            if self.config.prune {
                // Under random tie-breaking, equal siblings must still be
                // scored exactly.
                let bound = if self.rng.is_some() { best.saturating_sub(1) } else { best };
                alpha = alpha.max(bound);
            }
        }

        let best_move = match (&mut self.rng, tied.len()) {
            (_, 0) => None,
            (Some(rng), n) => Some(tied[rng.random_range(0..n)]),
            (None, _) => Some(tied[0]),
        };

        debug!(
            root = %root,
            depth,
            score = best,
            best = ?best_move,
            nodes = stats.nodes_visited,
            pruned = stats.branches_pruned,
            complete = !self.aborted,
            "search finished"
        );

        SearchResult {
            score: best,
            best_move,
            complete: !self.aborted,
        }
    }

    /// Score the position after `undo`'s move: terminal if a King fell,
    /// otherwise searched from the opponent's side.
    #[allow(clippy::too_many_arguments)]
    fn child_score(
        &mut self,
        board: &mut Board,
        undo: &Undo,
        depth: u32,
        ply: u32,
        alpha: i32,
        beta: i32,
        stats: &mut SearchStats,
    ) -> i32 {
        if undo.game_ending() {
            stats.record_node(ply);
            stats.record_terminal();
            let ctx = EvalContext {
                game_ended: true,
                winner: undo.winner(),
                depth,
                root_player: self.root,
                max_depth: self.config.max_depth,
            };
            return self.evaluator.evaluate(board, &ctx);
        }
        self.node(board, undo.mover.opponent(), depth, ply, alpha, beta, stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn node(
        &mut self,
        board: &mut Board,
        to_move: Player,
        depth: u32,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
        stats: &mut SearchStats,
    ) -> i32 {
        stats.record_node(ply);
        self.since_check += 1;
        if self.since_check >= STOP_CHECK_INTERVAL {
            self.since_check = 0;
            self.aborted = self.should_stop();
        }
        if self.aborted {
            return 0;
        }

        if depth == 0 {
            stats.record_leaf();
            return self.static_score(board, 0);
        }

        let moves = board.legal_moves(to_move);
        if moves.is_empty() {
            stats.record_leaf();
            return self.static_score(board, depth);
        }

        let maximizing = to_move == self.root;
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for (i, &mov) in moves.iter().enumerate() {
            let undo = board.apply_quiet(to_move, mov);
            let score = self.child_score(board, &undo, depth - 1, ply + 1, alpha, beta, stats);
            board.undo(&undo);
            if self.aborted {
                return 0;
            }

            if maximizing {
                best = best.max(score);
                if self.config.prune {
                    alpha = alpha.max(best);
                }
            } else {
                best = best.min(score);
                if self.config.prune {
                    beta = beta.min(best);
                }
            }

            if self.config.prune && beta <= alpha {
                stats.record_cutoff(moves.len() - i - 1);
                break;
            }
        }
        best
    }

    fn static_score(&self, board: &Board, depth: u32) -> i32 {
        let ctx = EvalContext {
            game_ended: false,
            winner: None,
            depth,
            root_player: self.root,
            max_depth: self.config.max_depth,
        };
        self.evaluator.evaluate(board, &ctx)
    }

    fn should_stop(&self) -> bool {
        self.running.is_some_and(|running| !running.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
