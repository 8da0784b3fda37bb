//! Error types for game operations
//!
//! These cover caller input that does not describe a legal turn. Broken board
//! invariants inside make/undo are not represented here: they panic.

use thiserror::Error;

use crate::{Player, Pos, Rotation};

/// Errors returned by the public game operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Coordinates outside the 10x8 board
    #[error("position ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    /// No piece at the requested cell
    #[error("no piece at {pos}")]
    EmptyCell { pos: Pos },

    /// The piece belongs to the other player
    #[error("piece at {pos} belongs to {owner}, not {mover}")]
    NotYourPiece { pos: Pos, owner: Player, mover: Player },

    /// Destination not produced by the move generator
    #[error("{to} is not a valid destination for the piece at {from}")]
    IllegalDestination { from: Pos, to: Pos },

    /// Rotation is not one step away in the piece's cycle
    #[error("{rotation:?} is not a valid rotation for the piece at {at}")]
    IllegalRotation { at: Pos, rotation: Rotation },

    /// Rotating to the current facing would not change the board
    #[error("the piece at {at} already faces {rotation:?}")]
    NoOpRotation { at: Pos, rotation: Rotation },

    /// A King has already been destroyed
    #[error("the game is over, {winner} won")]
    GameOver { winner: Player },

    /// The player to move is completely blocked
    #[error("{player} has no legal moves")]
    NoLegalMoves { player: Player },

    /// Board received from outside breaks a board invariant
    #[error("invalid board: {0}")]
    InvalidBoard(String),
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
