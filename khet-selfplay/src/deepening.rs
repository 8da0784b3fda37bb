//! Iterative deepening on top of the core searcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use khet_core::{Board, Evaluator, Player, SearchConfig, SearchResult, SearchStats, Searcher, TieBreak};
use tracing::debug;

/// Limits for one move.
#[derive(Clone, Copy, Debug)]
pub struct Budget {
    pub max_depth: u32,
    /// Wall-clock allowance per move; None searches every depth to the end.
    pub time: Option<Duration>,
    pub tie_break: TieBreak,
}

#[derive(Clone, Debug)]
pub struct Deepened {
    /// Result of the deepest completed depth. Falls back to the partial
    /// depth-1 result when not even depth 1 finished.
    pub best: Option<SearchResult>,
    /// Deepest depth whose search completed, 0 if none did.
    pub depth_completed: u32,
    pub stats: SearchStats,
    /// True when the time budget or an interrupt cut the deepening short.
    pub stopped_early: bool,
}

/// Search depth 1, 2, ... up to `budget.max_depth`, keeping the deepest
/// result that finished.
pub fn deepen<E: Evaluator + ?Sized>(
    board: &Board,
    mover: Player,
    evaluator: &E,
    budget: Budget,
    running: &AtomicBool,
) -> Deepened {
    let start = Instant::now();
    let deadline = budget.time.map(|t| start + t);
    let out_of_time = || deadline.is_some_and(|d| Instant::now() >= d);

    let mut outcome = Deepened {
        best: None,
        depth_completed: 0,
        stats: SearchStats::new(),
        stopped_early: false,
    };

    for depth in 1..=budget.max_depth.max(1) {
        if depth > 1 && (!running.load(Ordering::SeqCst) || out_of_time()) {
            outcome.stopped_early = true;
            break;
        }

        let config = SearchConfig {
            max_depth: depth,
            prune: true,
            tie_break: budget.tie_break,
        };
        let mut searcher = Searcher::new(evaluator, config).with_running_flag(running);
        if let Some(deadline) = deadline {
            searcher = searcher.with_deadline(deadline);
        }

        let mut scratch = board.clone();
        let mut stats = SearchStats::new();
        let result = searcher.search(&mut scratch, mover, &mut stats);
        outcome.stats += stats;

        if !result.complete {
            if outcome.best.is_none() && result.best_move.is_some() {
                outcome.best = Some(result);
            }
            outcome.stopped_early = true;
            break;
        }

        debug!(
            depth,
            score = result.score,
            nodes = stats.nodes_visited,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "depth completed"
        );
        outcome.best = Some(result);
        outcome.depth_completed = depth;

        // No legal move: deeper searches would say the same.
        if result.best_move.is_none() {
            break;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use khet_core::{HeuristicEvaluator, Move, Piece, PieceKind, Pos, Rotation};

    fn p(x: u8, y: u8) -> Pos {
        Pos::from_xy(x, y)
    }

    fn budget(max_depth: u32, time: Option<Duration>) -> Budget {
        Budget {
            max_depth,
            time,
            tie_break: TieBreak::FirstFound,
        }
    }

    #[test]
    fn test_deepens_to_max_depth() {
        let mut board = Board::new();
        board.place(p(9, 7), Piece::new(PieceKind::Emitter, Player::One, Rotation::Up));
        board.place(p(8, 4), Piece::new(PieceKind::Deflector, Player::One, Rotation::LeftDown));
        board.place(p(4, 7), Piece::new(PieceKind::King, Player::One, Rotation::Up));
        board.place(p(0, 0), Piece::new(PieceKind::Emitter, Player::Two, Rotation::Down));
        board.place(p(5, 4), Piece::new(PieceKind::King, Player::Two, Rotation::Up));

        let running = AtomicBool::new(true);
        let eval = HeuristicEvaluator::default();
        let deepened = deepen(&board, Player::One, &eval, budget(3, None), &running);

        assert_eq!(deepened.depth_completed, 3);
        assert!(!deepened.stopped_early);
        let best = deepened.best.unwrap();
        assert!(best.complete);
        assert_eq!(best.best_move, Some(Move::Translate { from: p(8, 4), to: p(9, 4) }));
    }

    #[test]
    fn test_interrupt_stops_after_first_depth() {
        let running = AtomicBool::new(false);
        let eval = HeuristicEvaluator::default();
        let deepened = deepen(&Board::initial(), Player::One, &eval, budget(4, None), &running);

        assert!(deepened.stopped_early);
        assert!(deepened.depth_completed <= 1);
    }

    #[test]
    fn test_spent_budget_still_returns_a_move() {
        let running = AtomicBool::new(true);
        let eval = HeuristicEvaluator::default();
        let deepened = deepen(
            &Board::initial(),
            Player::Two,
            &eval,
            budget(5, Some(Duration::ZERO)),
            &running,
        );

        assert!(deepened.stopped_early);
        assert!(deepened.depth_completed <= 1);
        assert!(deepened.best.and_then(|r| r.best_move).is_some());
        assert!(deepened.stats.nodes_visited > 0);
    }
}
