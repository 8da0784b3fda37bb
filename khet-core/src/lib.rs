//! Khet laser game rules with a flat-array board representation.
//!
//! # Board Layout
//!
//! ```text
//! 10 columns × 8 rows, stored row-major in a fixed array of 80 cells.
//!
//! Cell index = y * 10 + x, with (0,0) the top-left corner:
//!   (0,0)=0   (1,0)=1   ...  (9,0)=9
//!   (0,1)=10  (1,1)=11  ...  (9,1)=19
//!   ...
//!   (0,7)=70  (1,7)=71  ...  (9,7)=79
//!
//! "Down" increases y. Player Two's emitter sits at (0,0), Player One's at (9,7).
//! ```
//!
//! Each cell optionally holds a piece and may be reserved for one player. A
//! reserved cell can only be entered by pieces of the player it is reserved for.
//!
//! # Turn Structure
//!
//! A turn is exactly one [`Move`]: either a one-cell translation or a one-step
//! rotation. After the move the mover's emitter fires (see [`laser`]); the beam
//! may destroy one piece, and destroying a King ends the game.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod apply;
pub mod error;
pub mod eval;
pub mod game;
pub mod laser;
pub mod movegen;
pub mod search;
pub mod stats;
mod validate;

pub use apply::{DestroyedPiece, Outcome, Undo};
pub use error::{GameError, GameResult};
pub use eval::{EvalContext, EvalWeights, Evaluator, HeuristicEvaluator, WeightsError};
pub use laser::{Impact, LaserShot};
pub use search::{SearchConfig, SearchResult, Searcher, TieBreak};
pub use stats::SearchStats;

/// Board width (columns).
pub const WIDTH: u8 = 10;
/// Board height (rows).
pub const HEIGHT: u8 = 8;
/// Number of cells on the board.
pub const CELLS: usize = WIDTH as usize * HEIGHT as usize;

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Convert from u8 (1 or 2) to Player.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Player> {
        match bits {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", *self as u8)
    }
}

/// Position on the 10x8 board (0-79).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from column and row.
    #[inline]
    pub fn from_xy(x: u8, y: u8) -> Pos {
        debug_assert!(x < WIDTH && y < HEIGHT);
        Pos(y * WIDTH + x)
    }

    /// Create a position from signed coordinates, or None if off the board.
    #[inline]
    pub fn try_from_xy(x: i32, y: i32) -> Option<Pos> {
        if Board::is_inside(x, y) {
            Some(Pos::from_xy(x as u8, y as u8))
        } else {
            None
        }
    }

    /// Get the column (0-9).
    #[inline]
    pub fn x(self) -> u8 {
        self.0 % WIDTH
    }

    /// Get the row (0-7).
    #[inline]
    pub fn y(self) -> u8 {
        self.0 / WIDTH
    }

    /// Iterate over all 80 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..CELLS as u8).map(Pos)
    }

    /// The position `(dx, dy)` away, or None when that falls off the board.
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Option<Pos> {
        Pos::try_from_xy(self.x() as i32 + dx as i32, self.y() as i32 + dy as i32)
    }

    /// The neighbouring position in `dir`, or None at the edge.
    #[inline]
    pub fn step(self, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

/// Travel direction of the laser beam.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Column and row delta of one step.
    #[inline]
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The beam direction an emitter with this rotation fires in.
    /// Diagonal rotations do not map to a direction.
    pub fn from_rotation(rotation: Rotation) -> Option<Direction> {
        match rotation {
            Rotation::Up => Some(Direction::Up),
            Rotation::Down => Some(Direction::Down),
            Rotation::Left => Some(Direction::Left),
            Rotation::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Piece facing.
///
/// Guards, Kings and Emitters use the cardinal facings. Deflectors use the
/// diagonals, naming the direction their mirrored face points to. Mirrors use
/// `LeftUp` ("\") and `RightUp` ("/").
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Rotation {
    Up,
    Down,
    Left,
    Right,
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
}

impl Rotation {
    pub const ALL: [Rotation; 8] = [
        Rotation::Up,
        Rotation::Down,
        Rotation::Left,
        Rotation::Right,
        Rotation::LeftUp,
        Rotation::LeftDown,
        Rotation::RightUp,
        Rotation::RightDown,
    ];

    #[inline]
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Rotation::LeftUp | Rotation::LeftDown | Rotation::RightUp | Rotation::RightDown
        )
    }

    fn glyph(self) -> char {
        match self {
            Rotation::Up => '↑',
            Rotation::Down => '↓',
            Rotation::Left => '←',
            Rotation::Right => '→',
            Rotation::LeftUp => '↖',
            Rotation::LeftDown => '↙',
            Rotation::RightUp => '↗',
            Rotation::RightDown => '↘',
        }
    }
}

/// Piece kind. Khet names: Emitter = Sphinx, King = Pharaoh, Guard = Anubis,
/// Deflector = Pyramid, Mirror = Scarab.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Emitter,
    King,
    Guard,
    Deflector,
    Mirror,
}

impl PieceKind {
    pub const ALL: [PieceKind; 5] = [
        PieceKind::Emitter,
        PieceKind::King,
        PieceKind::Guard,
        PieceKind::Deflector,
        PieceKind::Mirror,
    ];

    /// Single-letter symbol, upper case for Player One.
    pub fn symbol(self, owner: Player) -> char {
        let c = match self {
            PieceKind::Emitter => 'E',
            PieceKind::King => 'K',
            PieceKind::Guard => 'G',
            PieceKind::Deflector => 'D',
            PieceKind::Mirror => 'M',
        };
        match owner {
            Player::One => c,
            Player::Two => c.to_ascii_lowercase(),
        }
    }
}

/// A piece on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub owner: Player,
    pub rotation: Rotation,
    pub movable: bool,
}

impl Piece {
    /// Create a piece. Everything but the Emitter is movable.
    pub fn new(kind: PieceKind, owner: Player, rotation: Rotation) -> Piece {
        Piece {
            kind,
            owner,
            rotation,
            movable: kind != PieceKind::Emitter,
        }
    }
}

/// One board cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct Cell {
    pub piece: Option<Piece>,
    /// The only player whose pieces may enter this cell, if reserved.
    pub reserved_for: Option<Player>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        piece: None,
        reserved_for: None,
    };

    /// Whether a piece owned by `player` may stand on this cell.
    #[inline]
    pub fn admits(&self, player: Player) -> bool {
        self.reserved_for.map_or(true, |owner| owner == player)
    }
}

/// A move in the game: one action per turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Move {
    /// Move a piece to a neighbouring cell (or swap, for a Mirror).
    Translate { from: Pos, to: Pos },
    /// Turn a piece in place by one step of its rotation cycle.
    Rotate { at: Pos, rotation: Rotation },
}

impl Move {
    /// The cell of the piece that acts.
    #[inline]
    pub fn from(&self) -> Pos {
        match self {
            Move::Translate { from, .. } => *from,
            Move::Rotate { at, .. } => *at,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Translate { from, to } => write!(f, "{}->{}", from, to),
            Move::Rotate { at, rotation } => write!(f, "{}@{:?}", at, rotation),
        }
    }
}

// ============================================================================
// Board
// ============================================================================

/// Starting pieces: (x, y, kind, owner, rotation).
const INITIAL_LAYOUT: [(u8, u8, PieceKind, Player, Rotation); 26] = {
    use PieceKind::*;
    use Player::*;
    use Rotation::*;
    [
        (0, 0, Emitter, Two, Down),
        (9, 7, Emitter, One, Up),
        (5, 0, King, Two, Down),
        (4, 7, King, One, Up),
        (4, 0, Guard, Two, Down),
        (6, 0, Guard, Two, Down),
        (3, 7, Guard, One, Up),
        (5, 7, Guard, One, Up),
        (7, 0, Deflector, Two, RightDown),
        (2, 1, Deflector, Two, LeftDown),
        (0, 3, Deflector, Two, RightUp),
        (0, 4, Deflector, Two, RightDown),
        (7, 3, Deflector, Two, RightDown),
        (7, 4, Deflector, Two, RightUp),
        (6, 5, Deflector, Two, RightDown),
        (2, 7, Deflector, One, LeftUp),
        (7, 6, Deflector, One, RightUp),
        (9, 4, Deflector, One, LeftDown),
        (9, 3, Deflector, One, LeftUp),
        (2, 4, Deflector, One, LeftUp),
        (2, 3, Deflector, One, LeftDown),
        (3, 2, Deflector, One, LeftUp),
        (4, 3, Mirror, Two, RightUp),
        (5, 3, Mirror, Two, LeftUp),
        (4, 4, Mirror, One, LeftUp),
        (5, 4, Mirror, One, RightUp),
    ]
};

/// The game board: a fixed array of cells.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    cells: [Cell; CELLS],
}

impl Board {
    /// Create an empty board with no reserved cells.
    pub fn new() -> Board {
        Board {
            cells: [Cell::EMPTY; CELLS],
        }
    }

    /// Create the standard starting position.
    pub fn initial() -> Board {
        let mut board = Board::new();

        for y in 0..HEIGHT {
            board.reserve(Pos::from_xy(WIDTH - 1, y), Some(Player::One));
            board.reserve(Pos::from_xy(0, y), Some(Player::Two));
        }
        board.reserve(Pos::from_xy(WIDTH - 2, 0), Some(Player::One));
        board.reserve(Pos::from_xy(WIDTH - 2, HEIGHT - 1), Some(Player::One));
        board.reserve(Pos::from_xy(1, 0), Some(Player::Two));
        board.reserve(Pos::from_xy(1, HEIGHT - 1), Some(Player::Two));

        for (x, y, kind, owner, rotation) in INITIAL_LAYOUT {
            board.place(Pos::from_xy(x, y), Piece::new(kind, owner, rotation));
        }

        board
    }

    /// Get the cell at a position.
    #[inline]
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.0 as usize]
    }

    /// Get the piece at a position, if any.
    #[inline]
    pub fn piece_at(&self, pos: Pos) -> Option<Piece> {
        self.cells[pos.0 as usize].piece
    }

    #[inline]
    pub(crate) fn piece_mut(&mut self, pos: Pos) -> Option<&mut Piece> {
        self.cells[pos.0 as usize].piece.as_mut()
    }

    /// Check whether signed coordinates lie on the board. Every off-board
    /// step goes through here before a cell is indexed.
    #[inline]
    pub fn is_inside(x: i32, y: i32) -> bool {
        (0..WIDTH as i32).contains(&x) && (0..HEIGHT as i32).contains(&y)
    }

    /// Clear the piece from a cell, keeping its reservation.
    #[inline]
    pub fn remove_piece(&mut self, pos: Pos) -> Option<Piece> {
        self.cells[pos.0 as usize].piece.take()
    }

    /// Put a piece on a cell, replacing whatever was there.
    #[inline]
    pub fn place(&mut self, pos: Pos, piece: Piece) {
        self.cells[pos.0 as usize].piece = Some(piece);
    }

    /// Set or clear the reservation of a cell.
    #[inline]
    pub fn reserve(&mut self, pos: Pos, player: Option<Player>) {
        self.cells[pos.0 as usize].reserved_for = player;
    }

    /// Home corner of a player's emitter.
    #[inline]
    pub fn emitter_pos(player: Player) -> Pos {
        match player {
            Player::One => Pos::from_xy(WIDTH - 1, HEIGHT - 1),
            Player::Two => Pos::from_xy(0, 0),
        }
    }

    /// Find a player's King.
    pub fn king_pos(&self, player: Player) -> Option<Pos> {
        self.pieces()
            .find(|(_, piece)| piece.kind == PieceKind::King && piece.owner == player)
            .map(|(pos, _)| pos)
    }

    /// Iterate over all pieces in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.piece.map(|piece| (Pos(i as u8), piece)))
    }

    /// Total number of pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.piece.is_some()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    /// Text rendering: `K↑` is Player One's King facing up, lower case letters
    /// are Player Two, and empty reserved cells show the owning player number.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for x in 0..WIDTH {
            write!(f, " {} ", x)?;
        }
        writeln!(f)?;
        for y in 0..HEIGHT {
            write!(f, "{} ", y)?;
            for x in 0..WIDTH {
                let cell = self.cell(Pos::from_xy(x, y));
                match (cell.piece, cell.reserved_for) {
                    (Some(piece), _) => {
                        write!(f, " {}{}", piece.kind.symbol(piece.owner), piece.rotation.glyph())?
                    }
                    (None, Some(owner)) => write!(f, " {} ", owner as u8)?,
                    (None, None) => write!(f, " . ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(board: &Board, player: Player, kind: PieceKind) -> usize {
        board
            .pieces()
            .filter(|(_, p)| p.owner == player && p.kind == kind)
            .count()
    }

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
        assert_eq!(Player::from_bits(2), Some(Player::Two));
        assert_eq!(Player::from_bits(0), None);
    }

    #[test]
    fn test_pos_from_xy() {
        assert_eq!(Pos::from_xy(0, 0), Pos(0));
        assert_eq!(Pos::from_xy(9, 0), Pos(9));
        assert_eq!(Pos::from_xy(0, 1), Pos(10));
        assert_eq!(Pos::from_xy(9, 7), Pos(79));
        for pos in Pos::all() {
            assert_eq!(Pos::from_xy(pos.x(), pos.y()), pos);
        }
    }

    #[test]
    fn test_pos_offset_stays_on_board() {
        let corner = Pos::from_xy(9, 0);
        assert_eq!(corner.offset(1, 0), None, "no wrap into the next row");
        assert_eq!(corner.offset(0, -1), None);
        assert_eq!(corner.offset(-1, 1), Some(Pos::from_xy(8, 1)));
        assert_eq!(Pos::from_xy(0, 3).step(Direction::Left), None);
        assert_eq!(Pos::from_xy(0, 3).step(Direction::Down), Some(Pos::from_xy(0, 4)));
        assert_eq!(Pos::try_from_xy(10, 0), None);
        assert_eq!(Pos::try_from_xy(-1, 0), None);
    }

    #[test]
    fn test_is_inside() {
        assert!(Board::is_inside(0, 0));
        assert!(Board::is_inside(9, 7));
        assert!(!Board::is_inside(10, 7));
        assert!(!Board::is_inside(9, 8));
        assert!(!Board::is_inside(-1, 3));
        for pos in Pos::all() {
            assert!(Board::is_inside(pos.x() as i32, pos.y() as i32));
        }
    }

    #[test]
    fn test_remove_preserves_reservation() {
        let mut board = Board::initial();
        let pos = Pos::from_xy(0, 3);
        assert_eq!(board.cell(pos).reserved_for, Some(Player::Two));

        let removed = board.remove_piece(pos);
        assert_eq!(removed.map(|p| p.kind), Some(PieceKind::Deflector));
        assert_eq!(board.piece_at(pos), None);
        assert_eq!(board.cell(pos).reserved_for, Some(Player::Two));
    }

    #[test]
    fn test_place_and_remove_roundtrip() {
        let mut board = Board::new();
        let piece = Piece::new(PieceKind::Guard, Player::One, Rotation::Left);
        board.place(Pos(33), piece);
        assert_eq!(board.piece_at(Pos(33)), Some(piece));
        assert_eq!(board.piece_count(), 1);
        assert_eq!(board.remove_piece(Pos(33)), Some(piece));
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_initial_layout_counts() {
        let board = Board::initial();
        assert_eq!(board.piece_count(), 26);
        for player in Player::ALL {
            assert_eq!(count(&board, player, PieceKind::Emitter), 1);
            assert_eq!(count(&board, player, PieceKind::King), 1);
            assert_eq!(count(&board, player, PieceKind::Guard), 2);
            assert_eq!(count(&board, player, PieceKind::Deflector), 7);
            assert_eq!(count(&board, player, PieceKind::Mirror), 2);
        }
    }

    #[test]
    fn test_initial_emitters_on_own_reserved_corners() {
        let board = Board::initial();
        for player in Player::ALL {
            let pos = Board::emitter_pos(player);
            let piece = board.piece_at(pos).expect("emitter present");
            assert_eq!(piece.kind, PieceKind::Emitter);
            assert_eq!(piece.owner, player);
            assert!(!piece.movable);
            assert_eq!(board.cell(pos).reserved_for, Some(player));
        }
    }

    #[test]
    fn test_initial_pieces_respect_reservations() {
        let board = Board::initial();
        for (pos, piece) in board.pieces() {
            assert!(
                board.cell(pos).admits(piece.owner),
                "{:?} at {} sits on a cell reserved for the opponent",
                piece,
                pos
            );
        }
    }

    #[test]
    fn test_king_positions() {
        let board = Board::initial();
        assert_eq!(board.king_pos(Player::One), Some(Pos::from_xy(4, 7)));
        assert_eq!(board.king_pos(Player::Two), Some(Pos::from_xy(5, 0)));
        assert_eq!(Board::new().king_pos(Player::One), None);
    }

    #[test]
    fn test_move_from() {
        let slide = Move::Translate { from: Pos(3), to: Pos(4) };
        let turn = Move::Rotate { at: Pos(7), rotation: Rotation::Left };
        assert_eq!(slide.from(), Pos(3));
        assert_eq!(turn.from(), Pos(7));
    }

    #[test]
    fn test_display_marks_pieces_and_reservations() {
        let text = Board::initial().to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 1 + HEIGHT as usize);
        assert!(rows[1].contains("e↓"), "Player Two emitter in row 0: {}", rows[1]);
        assert!(rows[8].contains("E↑"), "Player One emitter in row 7: {}", rows[8]);
        assert!(rows[2].contains(" 1 "), "reserved empty cell for Player One in row 1");
    }
}
