//! In-place make/undo.
//!
//! A turn is applied in two steps: the move itself, then the mover's laser.
//! [`Board::undo`] reverses them in the opposite order, so
//! `board.undo(&board.apply_quiet(p, m))` leaves the board unchanged.


use crate::laser::{self, BeamHit};
use crate::movegen::is_swap;
use crate::{Board, Move, Piece, PieceKind, Player, Pos, Rotation};

/// A piece removed by a laser hit, and where it stood.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DestroyedPiece {
    pub pos: Pos,
    pub piece: Piece,
}

impl From<BeamHit> for DestroyedPiece {
    fn from(hit: BeamHit) -> Self {
        DestroyedPiece {
            pos: hit.pos,
            piece: hit.piece,
        }
    }
}

/// Information needed to undo a move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Undo {
    /// The move that was made.
    pub mov: Move,
    /// Whose laser fired.
    pub mover: Player,
    /// Piece that stood on the destination of a translation.
    pub displaced: Option<Piece>,
    /// The displaced piece traded places with the mover.
    pub swapped: bool,
    /// Facing before a rotation.
    pub previous_rotation: Option<Rotation>,
    /// Piece removed by the laser.
    pub destroyed: Option<DestroyedPiece>,
}

impl Undo {
    /// The laser destroyed a King.
    #[inline]
    pub fn game_ending(&self) -> bool {
        self.destroyed
            .is_some_and(|d| d.piece.kind == PieceKind::King)
    }

    /// The winner, when this move ended the game.
    pub fn winner(&self) -> Option<Player> {
        self.destroyed
            .filter(|d| d.piece.kind == PieceKind::King)
            .map(|d| d.piece.owner.opponent())
    }
}

/// What a turn did, for presentation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Outcome {
    /// Cells the beam visited, starting at the emitter.
    pub path: Vec<Pos>,
    pub destroyed: Option<DestroyedPiece>,
    pub game_ending: bool,
    pub winner: Option<Player>,
}

impl Board {
    /// Apply a move and fire `mover`'s laser, recording the beam path.
    ///
    /// Panics if there is no piece at the move's source cell.
    pub fn apply_and_resolve(&mut self, mover: Player, mov: Move) -> (Undo, Outcome) {
        let mut undo = self.make(mover, mov);
        let mut path = Vec::with_capacity(16);
        let hit = laser::walk(self, mover, |pos| path.push(pos));
        self.record_hit(&mut undo, hit);

        let outcome = Outcome {
            path,
            destroyed: undo.destroyed,
            game_ending: undo.game_ending(),
            winner: undo.winner(),
        };
        (undo, outcome)
    }

    /// Apply a move and fire `mover`'s laser without tracking the path.
    ///
    /// Panics if there is no piece at the move's source cell.
    pub fn apply_quiet(&mut self, mover: Player, mov: Move) -> Undo {
        let mut undo = self.make(mover, mov);
        let hit = laser::walk(self, mover, |_| {});
        self.record_hit(&mut undo, hit);
        undo
    }

    /// Undo a move made by [`Board::apply_and_resolve`] or [`Board::apply_quiet`].
    pub fn undo(&mut self, undo: &Undo) {
        if let Some(destroyed) = undo.destroyed {
            debug_assert!(self.piece_at(destroyed.pos).is_none());
            self.place(destroyed.pos, destroyed.piece);
        }

        match undo.mov {
            Move::Rotate { at, .. } => {
                let piece = self.piece_mut(at).expect("No piece to rotate back");
                piece.rotation = undo
                    .previous_rotation
                    .expect("Rotation undo without previous rotation");
            }
            Move::Translate { from, to } => {
                let piece = self.remove_piece(to).expect("No piece at destination");
                if undo.swapped {
                    let occupant = self.remove_piece(from).expect("No swapped piece at source");
                    self.place(to, occupant);
                } else if let Some(displaced) = undo.displaced {
                    self.place(to, displaced);
                }
                self.place(from, piece);
            }
        }
    }

    fn make(&mut self, mover: Player, mov: Move) -> Undo {
        let mut undo = Undo {
            mov,
            mover,
            displaced: None,
            swapped: false,
            previous_rotation: None,
            destroyed: None,
        };

        match mov {
            Move::Rotate { at, rotation } => {
                let piece = self.piece_mut(at).expect("No piece to rotate");
                undo.previous_rotation = Some(piece.rotation);
                piece.rotation = rotation;
            }
            Move::Translate { from, to } => {
                let piece = self.remove_piece(from).expect("No piece at source");
                undo.displaced = self.remove_piece(to);
                if let Some(occupant) = undo.displaced.filter(|occ| is_swap(&piece, occ)) {
                    self.place(from, occupant);
                    undo.swapped = true;
                }
                self.place(to, piece);
            }
        }
        undo
    }

    fn record_hit(&mut self, undo: &mut Undo, hit: Option<BeamHit>) {
        if let Some(hit) = hit {
            self.remove_piece(hit.pos);
            undo.destroyed = Some(hit.into());
        }
    }
}
