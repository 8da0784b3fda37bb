//! Legal destinations, rotation windows and full move lists.
//!
//! Enumeration order is fixed so search results are reproducible:
//! pieces in row-major order, destinations by row then column around the
//! piece, then rotations (previous step first, next step second).

use crate::{Board, Move, Piece, PieceKind, Player, Pos, Rotation};

const MIRROR_CYCLE: [Rotation; 2] = [Rotation::LeftUp, Rotation::RightUp];
const DEFLECTOR_CYCLE: [Rotation; 4] = [
    Rotation::LeftUp,
    Rotation::RightUp,
    Rotation::RightDown,
    Rotation::LeftDown,
];
const CARDINAL_CYCLE: [Rotation; 4] = [Rotation::Up, Rotation::Right, Rotation::Down, Rotation::Left];
const EMITTER_TWO_CYCLE: [Rotation; 2] = [Rotation::Down, Rotation::Right];
const EMITTER_ONE_CYCLE: [Rotation; 2] = [Rotation::Up, Rotation::Left];

/// The rotation cycle a piece of `kind` owned by `owner` turns through.
pub fn rotation_cycle(kind: PieceKind, owner: Player) -> &'static [Rotation] {
    match (kind, owner) {
        (PieceKind::Mirror, _) => &MIRROR_CYCLE,
        (PieceKind::Deflector, _) => &DEFLECTOR_CYCLE,
        (PieceKind::Guard | PieceKind::King, _) => &CARDINAL_CYCLE,
        (PieceKind::Emitter, Player::Two) => &EMITTER_TWO_CYCLE,
        (PieceKind::Emitter, Player::One) => &EMITTER_ONE_CYCLE,
    }
}

/// The window `[previous, current, next]` around the piece's rotation.
///
/// A rotation outside the piece's cycle yields `[current; 3]`, so nothing but
/// the current facing is offered.
pub fn valid_rotations(piece: &Piece) -> [Rotation; 3] {
    let cycle = rotation_cycle(piece.kind, piece.owner);
    match cycle.iter().position(|&r| r == piece.rotation) {
        Some(i) => {
            let n = cycle.len();
            [cycle[(i + n - 1) % n], cycle[i], cycle[(i + 1) % n]]
        }
        None => [piece.rotation; 3],
    }
}

/// Rotations that actually change the piece: previous then next, skipping
/// the current facing and the repeated entry of two-state cycles.
pub fn rotation_targets(piece: &Piece) -> impl Iterator<Item = Rotation> {
    let [prev, current, next] = valid_rotations(piece);
    let second = (next != prev).then_some(next);
    std::iter::once(prev)
        .chain(second)
        .filter(move |&r| r != current)
}

/// Whether turning `piece` to `rotation` is a legal, non-trivial rotation.
pub fn is_legal_rotation(piece: &Piece, rotation: Rotation) -> bool {
    rotation != piece.rotation && valid_rotations(piece).contains(&rotation)
}

/// Cells the piece at `from` may translate to when moved by `mover`.
///
/// Empty when there is no piece or it is not movable. An occupied neighbour
/// is only a destination for a Mirror swapping with a Deflector or Guard of
/// either side, and only if that occupant may stand on `from`.
pub fn valid_destinations(board: &Board, from: Pos, mover: Player) -> Vec<Pos> {
    let mut out = Vec::with_capacity(8);
    let Some(piece) = board.piece_at(from) else {
        return out;
    };
    if !piece.movable {
        return out;
    }

    for dy in -1..=1i8 {
        for dx in -1..=1i8 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(to) = from.offset(dx, dy) else {
                continue;
            };
            let cell = board.cell(to);
            if !cell.admits(mover) {
                continue;
            }
            match cell.piece {
                None => out.push(to),
                Some(occupant) if is_swap(&piece, &occupant) => {
                    if board.cell(from).admits(occupant.owner) {
                        out.push(to);
                    }
                }
                Some(_) => {}
            }
        }
    }
    out
}

/// A Mirror moving onto a Deflector or Guard trades places with it.
#[inline]
pub(crate) fn is_swap(mover: &Piece, occupant: &Piece) -> bool {
    mover.kind == PieceKind::Mirror
        && matches!(occupant.kind, PieceKind::Deflector | PieceKind::Guard)
}

impl Board {
    /// Every legal move for `player`.
    pub fn legal_moves(&self, player: Player) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        for (from, piece) in self.pieces().filter(|(_, p)| p.owner == player) {
            moves.extend(
                valid_destinations(self, from, player)
                    .into_iter()
                    .map(|to| Move::Translate { from, to }),
            );
            moves.extend(
                rotation_targets(&piece).map(|rotation| Move::Rotate { at: from, rotation }),
            );
        }
        moves
    }
}
