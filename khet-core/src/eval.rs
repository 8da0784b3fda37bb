//! Position evaluation.
//!
//! The search only depends on [`Evaluator`]; [`HeuristicEvaluator`] is the
//! default implementation, driven by [`EvalWeights`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Board, PieceKind, Player, Pos, CELLS, HEIGHT, WIDTH};

/// Largest magnitude accepted for any heuristic weight.
pub const MAX_WEIGHT: i32 = 1_000_000;

/// Largest accepted `win_score`.
pub const MAX_WIN_SCORE: i32 = 1_000_000_000;

/// What the search knows about the position being scored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EvalContext {
    /// A King was destroyed on the move leading here.
    pub game_ended: bool,
    pub winner: Option<Player>,
    /// Plies left before the depth limit.
    pub depth: u32,
    /// The player the score is computed for.
    pub root_player: Player,
    pub max_depth: u32,
}

/// Scores positions. Higher is better for `ctx.root_player`, and terminal
/// scores must dominate heuristic ones.
pub trait Evaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext) -> i32;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, board: &Board, ctx: &EvalContext) -> i32 {
        (**self).evaluate(board, ctx)
    }
}

/// Tunable weights for [`HeuristicEvaluator`]. Missing JSON fields take the
/// default value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub deflector: i32,
    pub guard: i32,
    pub king: i32,
    pub mirror: i32,

    /// Own Mirror within one row or column of the enemy King.
    pub mirror_alignment: i32,
    /// Own Deflector within one row or column of the enemy King.
    pub deflector_alignment: i32,
    /// Extra for an aligned piece close to the enemy King.
    pub alignment_close_bonus: i32,
    /// Cells along the aligned axis that count as close.
    pub alignment_range: i32,

    /// Base score for an own reflector first in line from the emitter.
    pub support_base: i32,
    /// Pressure `max(0, reach - distance)` towards the enemy King's coordinate.
    pub support_reach: i32,
    pub support_too_close_penalty: i32,
    /// Reflectors nearer to the emitter than this are penalised.
    pub support_min_distance: i32,

    pub win_score: i32,
    /// Per remaining ply, so faster wins score higher.
    pub depth_bonus: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            deflector: 10,
            guard: 15,
            king: 200,
            mirror: 0,
            mirror_alignment: 3,
            deflector_alignment: 2,
            alignment_close_bonus: 2,
            alignment_range: 4,
            support_base: 2,
            support_reach: 6,
            support_too_close_penalty: 3,
            support_min_distance: 3,
            win_score: 1_000_000,
            depth_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightsError {
    #[error("{name} = {value} is outside [-{limit}, {limit}]")]
    OutOfRange {
        name: &'static str,
        value: i32,
        limit: i32,
    },

    #[error("{name} = {value} must not be negative")]
    Negative { name: &'static str, value: i32 },

    #[error("win_score {win_score} does not exceed the largest heuristic score {heuristic}")]
    WinScoreTooSmall { win_score: i32, heuristic: i64 },
}

impl EvalWeights {
    /// Check that every weight is bounded and that a win outscores any
    /// heuristic position, so evaluation cannot overflow.
    pub fn validate(&self) -> Result<(), WeightsError> {
        let heuristic = [
            ("deflector", self.deflector),
            ("guard", self.guard),
            ("king", self.king),
            ("mirror", self.mirror),
            ("mirror_alignment", self.mirror_alignment),
            ("deflector_alignment", self.deflector_alignment),
            ("alignment_close_bonus", self.alignment_close_bonus),
            ("alignment_range", self.alignment_range),
            ("support_base", self.support_base),
            ("support_reach", self.support_reach),
            ("support_too_close_penalty", self.support_too_close_penalty),
            ("support_min_distance", self.support_min_distance),
            ("depth_bonus", self.depth_bonus),
        ];
        for (name, value) in heuristic {
            if !(-MAX_WEIGHT..=MAX_WEIGHT).contains(&value) {
                return Err(WeightsError::OutOfRange {
                    name,
                    value,
                    limit: MAX_WEIGHT,
                });
            }
        }
        for (name, value) in [("depth_bonus", self.depth_bonus), ("win_score", self.win_score)] {
            if value < 0 {
                return Err(WeightsError::Negative { name, value });
            }
        }
        if self.win_score > MAX_WIN_SCORE {
            return Err(WeightsError::OutOfRange {
                name: "win_score",
                value: self.win_score,
                limit: MAX_WIN_SCORE,
            });
        }

        let heuristic = self.max_heuristic();
        if (self.win_score as i64) <= heuristic {
            return Err(WeightsError::WinScoreTooSmall {
                win_score: self.win_score,
                heuristic,
            });
        }
        Ok(())
    }

    /// Upper bound on the magnitude of a non-terminal score.
    pub fn max_heuristic(&self) -> i64 {
        let abs = |w: i32| (w as i64).abs();
        let pieces = CELLS as i64;
        let material = [self.deflector, self.guard, self.king, self.mirror]
            .into_iter()
            .map(abs)
            .max()
            .unwrap_or(0);
        let alignment = abs(self.mirror_alignment).max(abs(self.deflector_alignment))
            + abs(self.alignment_close_bonus);
        let support =
            abs(self.support_base) + abs(self.support_reach) + abs(self.support_too_close_penalty);
        pieces * material + pieces * alignment + 2 * support
    }

    fn material(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Deflector => self.deflector,
            PieceKind::Guard => self.guard,
            PieceKind::King => self.king,
            PieceKind::Mirror => self.mirror,
            PieceKind::Emitter => 0,
        }
    }
}

/// Material, King alignment and emitter support.
#[derive(Clone, Debug, Default)]
pub struct HeuristicEvaluator {
    pub weights: EvalWeights,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights) -> Self {
        HeuristicEvaluator { weights }
    }

    /// Score for a finished game, from `root`'s point of view.
    pub fn terminal(&self, winner: Player, remaining: u32, root: Player) -> i32 {
        let bonus = (remaining.min(i32::MAX as u32) as i32).saturating_mul(self.weights.depth_bonus);
        let score = self.weights.win_score.saturating_add(bonus);
        if winner == root {
            score
        } else {
            score.saturating_neg()
        }
    }

    pub fn material(&self, board: &Board, root: Player) -> i32 {
        board
            .pieces()
            .map(|(_, piece)| {
                let value = self.weights.material(piece.kind);
                if piece.owner == root {
                    value
                } else {
                    -value
                }
            })
            .sum()
    }

    /// Own reflectors lined up with the enemy King.
    pub fn king_alignment(&self, board: &Board, root: Player) -> i32 {
        let Some(king) = board.king_pos(root.opponent()) else {
            return 0;
        };
        let (kx, ky) = (king.x() as i32, king.y() as i32);
        let w = &self.weights;

        board
            .pieces()
            .filter(|(_, piece)| piece.owner == root)
            .map(|(pos, piece)| {
                let base = match piece.kind {
                    PieceKind::Mirror => w.mirror_alignment,
                    PieceKind::Deflector => w.deflector_alignment,
                    _ => return 0,
                };
                let (x, y) = (pos.x() as i32, pos.y() as i32);
                let x_aligned = (x - kx).abs() <= 1;
                let y_aligned = (y - ky).abs() <= 1;

                let close = if y_aligned {
                    (x - kx).abs() <= w.alignment_range
                } else if x_aligned {
                    (y - ky).abs() <= w.alignment_range
                } else {
                    return 0;
                };
                if close {
                    base + w.alignment_close_bonus
                } else {
                    base
                }
            })
            .sum()
    }

    /// Own reflectors first in line from the emitter along each axis.
    pub fn emitter_support(&self, board: &Board, root: Player) -> i32 {
        let Some(king) = board.king_pos(root.opponent()) else {
            return 0;
        };
        self.axis_support(board, root, king.x() as i32, true)
            + self.axis_support(board, root, king.y() as i32, false)
    }

    fn axis_support(&self, board: &Board, root: Player, enemy_coord: i32, along_x: bool) -> i32 {
        let emitter = Board::emitter_pos(root);
        let step = match root {
            Player::One => -1,
            Player::Two => 1,
        };
        let limit = if along_x { WIDTH } else { HEIGHT } as i32;
        let w = &self.weights;

        let (ex, ey) = (emitter.x() as i32, emitter.y() as i32);
        let start = if along_x { ex } else { ey };

        for distance in 1..limit {
            let (x, y) = if along_x {
                (ex + step * distance, ey)
            } else {
                (ex, ey + step * distance)
            };
            let Some(pos) = Pos::try_from_xy(x, y) else {
                break;
            };
            let Some(piece) = board.piece_at(pos) else {
                continue;
            };
            if piece.owner != root {
                break;
            }
            if matches!(piece.kind, PieceKind::Deflector | PieceKind::Mirror) {
                let coord = start + step * distance;
                let pressure = (w.support_reach - (coord - enemy_coord).abs()).max(0);
                let penalty = if distance < w.support_min_distance {
                    w.support_too_close_penalty
                } else {
                    0
                };
                return w.support_base + pressure - penalty;
            }
        }
        0
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext) -> i32 {
        if ctx.game_ended {
            return match ctx.winner {
                Some(winner) => self.terminal(winner, ctx.depth, ctx.root_player),
                None => 0,
            };
        }
        let root = ctx.root_player;
        self.material(board, root) + self.king_alignment(board, root) + self.emitter_support(board, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, Rotation};

    fn p(x: u8, y: u8) -> Pos {
        Pos::from_xy(x, y)
    }

    fn ctx(root: Player) -> EvalContext {
        EvalContext {
            game_ended: false,
            winner: None,
            depth: 0,
            root_player: root,
            max_depth: 3,
        }
    }

    #[test]
    fn test_initial_position_is_balanced() {
        let eval = HeuristicEvaluator::default();
        let board = Board::initial();
        assert_eq!(eval.material(&board, Player::One), 0);
        assert_eq!(
            eval.evaluate(&board, &ctx(Player::One)),
            eval.evaluate(&board, &ctx(Player::Two)),
            "mirrored layout scores the same for both sides"
        );
    }

    #[test]
    fn test_material_counts_from_root_view() {
        let eval = HeuristicEvaluator::default();
        let mut board = Board::new();
        board.place(p(3, 3), Piece::new(PieceKind::Guard, Player::One, Rotation::Up));
        board.place(p(6, 6), Piece::new(PieceKind::Deflector, Player::Two, Rotation::LeftUp));
        assert_eq!(eval.material(&board, Player::One), 5);
        assert_eq!(eval.material(&board, Player::Two), -5);
    }

    #[test]
    fn test_terminal_dominates_and_prefers_fast_wins() {
        let eval = HeuristicEvaluator::default();
        let board = Board::initial();
        let won = |depth| EvalContext {
            game_ended: true,
            winner: Some(Player::One),
            depth,
            root_player: Player::One,
            max_depth: 4,
        };
        let fast = eval.evaluate(&board, &won(3));
        let slow = eval.evaluate(&board, &won(0));
        assert!(fast > slow);
        assert!(slow > 10_000);

        let lost = EvalContext {
            root_player: Player::Two,
            ..won(3)
        };
        assert_eq!(eval.evaluate(&board, &lost), -fast);
    }

    #[test]
    fn test_alignment_bonus() {
        let eval = HeuristicEvaluator::default();
        let mut board = Board::new();
        board.place(p(5, 0), Piece::new(PieceKind::King, Player::Two, Rotation::Down));
        board.place(p(4, 3), Piece::new(PieceKind::Mirror, Player::One, Rotation::LeftUp));
        board.place(p(0, 6), Piece::new(PieceKind::Deflector, Player::One, Rotation::LeftUp));
        board.place(p(9, 1), Piece::new(PieceKind::Deflector, Player::One, Rotation::LeftUp));

        // Mirror: column 4 is next to the King's column, 3 rows away: 3 + 2.
        // Deflector at (0,6): not aligned. Deflector at (9,1): row aligned, 4 columns away: 2 + 2.
        assert_eq!(eval.king_alignment(&board, Player::One), 5 + 4);
        assert_eq!(eval.king_alignment(&board, Player::Two), 0, "no enemy King");
    }

    #[test]
    fn test_emitter_support() {
        let eval = HeuristicEvaluator::default();
        let mut board = Board::new();
        board.place(p(9, 7), Piece::new(PieceKind::Emitter, Player::One, Rotation::Up));
        board.place(p(5, 0), Piece::new(PieceKind::King, Player::Two, Rotation::Down));
        // Row 7, first piece west of the emitter: own Deflector at x=6, 3 cells away.
        board.place(p(6, 7), Piece::new(PieceKind::Deflector, Player::One, Rotation::LeftUp));
        // Column 9, first piece north of the emitter: own Guard (skipped), then
        // own Mirror at y=5, 2 cells away and so penalised.
        board.place(p(9, 6), Piece::new(PieceKind::Guard, Player::One, Rotation::Up));
        board.place(p(9, 5), Piece::new(PieceKind::Mirror, Player::One, Rotation::LeftUp));

        let x_axis = 2 + (6 - 1);
        let y_axis = 2 + (6 - 5) - 3;
        assert_eq!(eval.emitter_support(&board, Player::One), x_axis + y_axis);

        // An enemy piece first in line blocks support.
        board.place(p(8, 7), Piece::new(PieceKind::Guard, Player::Two, Rotation::Up));
        assert_eq!(eval.emitter_support(&board, Player::One), y_axis);
    }

    #[test]
    fn test_terminal_saturates_with_huge_weights() {
        let eval = HeuristicEvaluator::new(EvalWeights {
            win_score: 2_147_483_000,
            depth_bonus: 1_000,
            ..EvalWeights::default()
        });
        let won = EvalContext {
            game_ended: true,
            winner: Some(Player::One),
            depth: 3,
            root_player: Player::One,
            max_depth: 3,
        };
        assert_eq!(eval.evaluate(&Board::initial(), &won), i32::MAX);

        let lost = EvalContext {
            root_player: Player::Two,
            ..won
        };
        assert_eq!(eval.evaluate(&Board::initial(), &lost), -i32::MAX);
    }

    #[test]
    fn test_weights_validation() {
        assert_eq!(EvalWeights::default().validate(), Ok(()));
        assert!(EvalWeights::default().max_heuristic() < EvalWeights::default().win_score as i64);

        let huge = EvalWeights {
            win_score: 2_147_483_000,
            depth_bonus: 1_000,
            ..EvalWeights::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(WeightsError::OutOfRange { name: "win_score", .. })
        ));

        let weak_win = EvalWeights {
            win_score: 500,
            ..EvalWeights::default()
        };
        assert!(matches!(
            weak_win.validate(),
            Err(WeightsError::WinScoreTooSmall { win_score: 500, .. })
        ));

        let king = EvalWeights {
            king: MAX_WEIGHT + 1,
            ..EvalWeights::default()
        };
        assert!(matches!(
            king.validate(),
            Err(WeightsError::OutOfRange { name: "king", .. })
        ));

        let backwards = EvalWeights {
            depth_bonus: -5,
            ..EvalWeights::default()
        };
        assert_eq!(
            backwards.validate(),
            Err(WeightsError::Negative { name: "depth_bonus", value: -5 })
        );
    }

    #[test]
    fn test_weights_deserialize_with_defaults() {
        let weights: EvalWeights = serde_json::from_str(r#"{"king": 500, "depth_bonus": 1}"#).unwrap();
        assert_eq!(weights.king, 500);
        assert_eq!(weights.depth_bonus, 1);
        assert_eq!(weights.guard, EvalWeights::default().guard);
    }
}
