//! Laser impact rules and beam tracing.
//!
//! The impact table is a single `match` over (kind, rotation, travel direction).
//! Every combination the table does not list destroys the piece.
//!
//! ```text
//! Deflector (face direction)     Mirror
//!   LeftDown:  Right→Down, Up→Left    LeftUp  "\": Right→Down, Down→Right, Left→Up, Up→Left
//!   LeftUp:    Right→Up, Down→Left    RightUp "/": Right→Up, Up→Right, Left→Down, Down→Left
//!   RightDown: Left→Down, Up→Right
//!   RightUp:   Left→Up, Down→Right
//!
//! Guard: absorbs beams travelling along its facing axis.
//! Emitter: absorbs everything. King: any hit destroys it and ends the game.
//! ```

use tracing::trace;

use crate::{Board, Direction, PieceKind, Piece, Player, Pos, Rotation, CELLS};

/// A beam visits at most every cell once per direction before repeating.
const MAX_BEAM_STEPS: usize = 4 * CELLS;

/// Result of the beam reaching an occupied cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Impact {
    /// Outgoing direction after a reflection; None when the beam stops.
    pub next: Option<Direction>,
    /// The piece is destroyed (and the beam stops).
    pub destroyed: bool,
    /// The destroyed piece was a King.
    pub game_ending: bool,
}

impl Impact {
    pub const ABSORBED: Impact = Impact {
        next: None,
        destroyed: false,
        game_ending: false,
    };

    pub const DESTROYED: Impact = Impact {
        next: None,
        destroyed: true,
        game_ending: false,
    };

    pub const KING_HIT: Impact = Impact {
        next: None,
        destroyed: true,
        game_ending: true,
    };

    #[inline]
    const fn reflect(dir: Direction) -> Impact {
        Impact {
            next: Some(dir),
            destroyed: false,
            game_ending: false,
        }
    }
}

/// Resolve a beam travelling in `dir` hitting `piece`.
pub fn resolve(dir: Direction, piece: &Piece) -> Impact {
    use Direction as D;
    use PieceKind as K;
    use Rotation as R;

    match (piece.kind, piece.rotation, dir) {
        (K::Emitter, _, _) => Impact::ABSORBED,
        (K::King, _, _) => Impact::KING_HIT,

        (K::Guard, R::Up | R::Down, D::Up | D::Down) => Impact::ABSORBED,
        (K::Guard, R::Left | R::Right, D::Left | D::Right) => Impact::ABSORBED,

        (K::Deflector, R::LeftDown, D::Right) => Impact::reflect(D::Down),
        (K::Deflector, R::LeftDown, D::Up) => Impact::reflect(D::Left),
        (K::Deflector, R::LeftUp, D::Right) => Impact::reflect(D::Up),
        (K::Deflector, R::LeftUp, D::Down) => Impact::reflect(D::Left),
        (K::Deflector, R::RightDown, D::Left) => Impact::reflect(D::Down),
        (K::Deflector, R::RightDown, D::Up) => Impact::reflect(D::Right),
        (K::Deflector, R::RightUp, D::Left) => Impact::reflect(D::Up),
        (K::Deflector, R::RightUp, D::Down) => Impact::reflect(D::Right),

        (K::Mirror, R::LeftUp, D::Right) => Impact::reflect(D::Down),
        (K::Mirror, R::LeftUp, D::Down) => Impact::reflect(D::Right),
        (K::Mirror, R::LeftUp, D::Left) => Impact::reflect(D::Up),
        (K::Mirror, R::LeftUp, D::Up) => Impact::reflect(D::Left),
        (K::Mirror, R::RightUp, D::Right) => Impact::reflect(D::Up),
        (K::Mirror, R::RightUp, D::Up) => Impact::reflect(D::Right),
        (K::Mirror, R::RightUp, D::Left) => Impact::reflect(D::Down),
        (K::Mirror, R::RightUp, D::Down) => Impact::reflect(D::Left),

        _ => Impact::DESTROYED,
    }
}

/// A piece the beam destroyed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct BeamHit {
    pub pos: Pos,
    pub piece: Piece,
    pub game_ending: bool,
}

/// Walk the beam of `player`'s emitter, calling `visit` for every cell it
/// passes through (the emitter cell first). Returns the destroyed piece, if any.
///
/// A board without the player's emitter in its home corner fires nothing.
pub(crate) fn walk(board: &Board, player: Player, mut visit: impl FnMut(Pos)) -> Option<BeamHit> {
    let start = Board::emitter_pos(player);
    let emitter = board
        .piece_at(start)
        .filter(|p| p.kind == PieceKind::Emitter && p.owner == player)?;
    let mut dir = Direction::from_rotation(emitter.rotation)?;
    let mut pos = start;
    visit(pos);

    for _ in 0..MAX_BEAM_STEPS {
        pos = pos.step(dir)?;
        visit(pos);

        let Some(piece) = board.piece_at(pos) else {
            continue;
        };
        let impact = resolve(dir, &piece);
        if impact.destroyed {
            trace!(%pos, kind = ?piece.kind, owner = %piece.owner, "laser destroyed piece");
            return Some(BeamHit {
                pos,
                piece,
                game_ending: impact.game_ending,
            });
        }
        dir = impact.next?;
    }
    None
}

/// The full beam of one shot, for presentation.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LaserShot {
    /// Cells visited, starting with the emitter.
    pub path: Vec<Pos>,
    /// Piece destroyed by the beam, if any.
    pub destroyed: Option<(Pos, Piece)>,
    /// A King was destroyed.
    pub game_ending: bool,
}

/// Trace `player`'s beam without changing the board.
pub fn trace(board: &Board, player: Player) -> LaserShot {
    let mut path = Vec::with_capacity(16);
    let hit = walk(board, player, |pos| path.push(pos));
    LaserShot {
        path,
        destroyed: hit.map(|h| (h.pos, h.piece)),
        game_ending: hit.is_some_and(|h| h.game_ending),
    }
}
