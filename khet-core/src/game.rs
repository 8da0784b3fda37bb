//! Stateless turn operations.
//!
//! Each call takes a full board value and returns the next one; nothing is
//! kept between calls. Input is checked and rejected with a [`GameError`]
//! before the board is touched.

use tracing::debug;

use crate::error::{GameError, GameResult};
use crate::eval::Evaluator;
use crate::movegen::{is_legal_rotation, valid_destinations, valid_rotations};
use crate::search::{SearchConfig, Searcher};
use crate::stats::SearchStats;
use crate::{Board, DestroyedPiece, Move, Piece, Player, Pos, Rotation};

/// The board after one turn and what happened during it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub board: Board,
    pub mov: Move,
    /// Cells the beam visited, starting at the mover's emitter.
    pub laser_path: Vec<Pos>,
    pub destroyed: Option<DestroyedPiece>,
    pub next_player: Player,
    pub game_ended: bool,
    pub winner: Option<Player>,
}

/// Everything the piece on a cell may do this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidMoves {
    pub destinations: Vec<Pos>,
    /// `[previous, current, next]` in the piece's rotation cycle.
    pub rotations: [Rotation; 3],
}

/// A turn chosen by the search.
#[derive(Clone, Debug)]
pub struct AgentTurn {
    pub turn: TurnOutcome,
    pub score: i32,
    pub stats: SearchStats,
}

/// Convert request coordinates to a board position.
pub fn position(x: i32, y: i32) -> GameResult<Pos> {
    Pos::try_from_xy(x, y).ok_or(GameError::OutOfBounds { x, y })
}

/// The standard starting position.
pub fn start_game() -> Board {
    Board::initial()
}

/// Translate `mover`'s piece from `from` to `to`, then fire `mover`'s laser.
pub fn make_move(mover: Player, board: Board, from: Pos, to: Pos) -> GameResult<TurnOutcome> {
    board.validate()?;
    own_piece(&board, from, mover)?;
    if !valid_destinations(&board, from, mover).contains(&to) {
        return Err(GameError::IllegalDestination { from, to });
    }
    Ok(play(mover, board, Move::Translate { from, to }))
}

/// Turn `mover`'s piece at `at` one step to `rotation`, then fire `mover`'s laser.
pub fn rotate(mover: Player, board: Board, at: Pos, rotation: Rotation) -> GameResult<TurnOutcome> {
    board.validate()?;
    let piece = own_piece(&board, at, mover)?;
    if rotation == piece.rotation {
        return Err(GameError::NoOpRotation { at, rotation });
    }
    if !is_legal_rotation(&piece, rotation) {
        return Err(GameError::IllegalRotation { at, rotation });
    }
    Ok(play(mover, board, Move::Rotate { at, rotation }))
}

/// Destinations and rotation window for `mover`'s piece at `at`.
pub fn valid_moves(board: &Board, mover: Player, at: Pos) -> GameResult<ValidMoves> {
    board.validate()?;
    let piece = own_piece(board, at, mover)?;
    Ok(ValidMoves {
        destinations: valid_destinations(board, at, mover),
        rotations: valid_rotations(&piece),
    })
}

/// Let the search pick `mover`'s move and play it.
pub fn move_by_agent<E: Evaluator + ?Sized>(
    board: Board,
    mover: Player,
    evaluator: &E,
    config: SearchConfig,
) -> GameResult<AgentTurn> {
    board.validate()?;

    let mut scratch = board.clone();
    let mut stats = SearchStats::new();
    let result = Searcher::new(evaluator, config).search(&mut scratch, mover, &mut stats);
    let mov = result
        .best_move
        .ok_or(GameError::NoLegalMoves { player: mover })?;

    debug!(%mover, %mov, score = result.score, nodes = stats.nodes_visited, "agent move");
    Ok(AgentTurn {
        turn: play(mover, board, mov),
        score: result.score,
        stats,
    })
}

fn own_piece(board: &Board, at: Pos, mover: Player) -> GameResult<Piece> {
    let piece = board.piece_at(at).ok_or(GameError::EmptyCell { pos: at })?;
    if piece.owner != mover {
        return Err(GameError::NotYourPiece {
            pos: at,
            owner: piece.owner,
            mover,
        });
    }
    Ok(piece)
}

fn play(mover: Player, mut board: Board, mov: Move) -> TurnOutcome {
    let (_, outcome) = board.apply_and_resolve(mover, mov);
    TurnOutcome {
        board,
        mov,
        laser_path: outcome.path,
        destroyed: outcome.destroyed,
        next_player: mover.opponent(),
        game_ended: outcome.game_ending,
        winner: outcome.winner,
    }
}
