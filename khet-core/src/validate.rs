//! Structural checks for boards that arrive from outside the engine.

use crate::error::{GameError, GameResult};
use crate::movegen::rotation_cycle;
use crate::{Board, PieceKind, Player};

impl Board {
    /// Check the invariants make/undo and search rely on.
    ///
    /// A side without a King is reported as [`GameError::GameOver`], so
    /// callers can tell a finished game from a malformed board.
    pub fn validate(&self) -> GameResult<()> {
        for player in Player::ALL {
            let home = Board::emitter_pos(player);
            match self.piece_at(home) {
                Some(piece) if piece.kind == PieceKind::Emitter && piece.owner == player => {}
                _ => {
                    return Err(GameError::InvalidBoard(format!(
                        "{} has no emitter at {}",
                        player, home
                    )))
                }
            }
        }

        for (pos, piece) in self.pieces() {
            if piece.kind == PieceKind::Emitter && pos != Board::emitter_pos(piece.owner) {
                return Err(GameError::InvalidBoard(format!(
                    "extra emitter at {}",
                    pos
                )));
            }
            if !rotation_cycle(piece.kind, piece.owner).contains(&piece.rotation) {
                return Err(GameError::InvalidBoard(format!(
                    "{:?} at {} cannot face {:?}",
                    piece.kind, pos, piece.rotation
                )));
            }
            if piece.movable != (piece.kind != PieceKind::Emitter) {
                return Err(GameError::InvalidBoard(format!(
                    "{:?} at {} has the wrong movable flag",
                    piece.kind, pos
                )));
            }
            if !self.cell(pos).admits(piece.owner) {
                return Err(GameError::InvalidBoard(format!(
                    "{} is reserved for the other player",
                    pos
                )));
            }
        }

        for player in Player::ALL {
            let kings = self
                .pieces()
                .filter(|(_, p)| p.kind == PieceKind::King && p.owner == player)
                .count();
            match kings {
                0 => {
                    return Err(GameError::GameOver {
                        winner: player.opponent(),
                    })
                }
                1 => {}
                n => {
                    return Err(GameError::InvalidBoard(format!(
                        "{} has {} Kings",
                        player, n
                    )))
                }
            }
        }
        Ok(())
    }
}
