//! JSON request and response models, and their conversions to core types.
//!
//! Boards travel as `cells[y][x]`, top row first. Players are `1` or `2`.

use khet_core::game::{AgentTurn, TurnOutcome, ValidMoves};
use khet_core::{
    Board, Cell, DestroyedPiece, GameError, Move, Piece, PieceKind, Player, Pos, Rotation, HEIGHT,
    WIDTH,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Board
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionModel {
    pub x: i32,
    pub y: i32,
}

impl From<Pos> for PositionModel {
    fn from(pos: Pos) -> Self {
        PositionModel {
            x: pos.x() as i32,
            y: pos.y() as i32,
        }
    }
}

impl TryFrom<PositionModel> for Pos {
    type Error = GameError;

    fn try_from(model: PositionModel) -> Result<Self, GameError> {
        khet_core::game::position(model.x, model.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceModel {
    pub kind: PieceKind,
    pub owner: u8,
    pub rotation: Rotation,
    pub movable: bool,
}

impl From<Piece> for PieceModel {
    fn from(piece: Piece) -> Self {
        PieceModel {
            kind: piece.kind,
            owner: piece.owner as u8,
            rotation: piece.rotation,
            movable: piece.movable,
        }
    }
}

impl TryFrom<PieceModel> for Piece {
    type Error = GameError;

    fn try_from(model: PieceModel) -> Result<Self, GameError> {
        Ok(Piece {
            kind: model.kind,
            owner: parse_player(model.owner)?,
            rotation: model.rotation,
            movable: model.movable,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellModel {
    pub piece: Option<PieceModel>,
    pub reserved_for: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardModel {
    pub cells: Vec<Vec<CellModel>>,
}

impl From<&Board> for BoardModel {
    fn from(board: &Board) -> Self {
        let cells = (0..HEIGHT)
            .map(|y| {
                (0..WIDTH)
                    .map(|x| {
                        let cell = board.cell(Pos::from_xy(x, y));
                        CellModel {
                            piece: cell.piece.map(PieceModel::from),
                            reserved_for: cell.reserved_for.map(|p| p as u8),
                        }
                    })
                    .collect()
            })
            .collect();
        BoardModel { cells }
    }
}

impl TryFrom<&BoardModel> for Board {
    type Error = GameError;

    fn try_from(model: &BoardModel) -> Result<Self, GameError> {
        if model.cells.len() != HEIGHT as usize
            || model.cells.iter().any(|row| row.len() != WIDTH as usize)
        {
            return Err(GameError::InvalidBoard(format!(
                "expected {} rows of {} cells",
                HEIGHT, WIDTH
            )));
        }

        let mut board = Board::new();
        for (y, row) in model.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let pos = Pos::from_xy(x as u8, y as u8);
                let cell = Cell {
                    piece: cell.piece.map(Piece::try_from).transpose()?,
                    reserved_for: cell.reserved_for.map(parse_player).transpose()?,
                };
                board.reserve(pos, cell.reserved_for);
                if let Some(piece) = cell.piece {
                    board.place(pos, piece);
                }
            }
        }
        Ok(board)
    }
}

pub fn parse_player(bits: u8) -> Result<Player, GameError> {
    Player::from_bits(bits)
        .ok_or_else(|| GameError::InvalidBoard(format!("unknown player {}, expected 1 or 2", bits)))
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub player: u8,
    pub board: BoardModel,
    pub from: PositionModel,
    pub to: PositionModel,
}

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub player: u8,
    pub board: BoardModel,
    pub at: PositionModel,
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize)]
pub struct ValidMovesRequest {
    pub player: u8,
    pub board: BoardModel,
    pub at: PositionModel,
}

#[derive(Debug, Deserialize)]
pub struct AgentMoveRequest {
    pub player: u8,
    pub board: BoardModel,
    #[serde(default)]
    pub depth: Option<u32>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub board: BoardModel,
    pub current_player: u8,
    pub game_ended: bool,
    pub laser: Vec<PositionModel>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestroyedPieceModel {
    pub position: PositionModel,
    pub piece: PieceModel,
}

impl From<DestroyedPiece> for DestroyedPieceModel {
    fn from(destroyed: DestroyedPiece) -> Self {
        DestroyedPieceModel {
            position: destroyed.pos.into(),
            piece: destroyed.piece.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub board: BoardModel,
    pub laser: Vec<PositionModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroyed_piece: Option<DestroyedPieceModel>,
    pub next_player: u8,
    pub game_ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<u8>,
}

impl From<&TurnOutcome> for MoveResponse {
    fn from(turn: &TurnOutcome) -> Self {
        MoveResponse {
            board: BoardModel::from(&turn.board),
            laser: turn.laser_path.iter().copied().map(PositionModel::from).collect(),
            destroyed_piece: turn.destroyed.map(DestroyedPieceModel::from),
            next_player: turn.next_player as u8,
            game_ended: turn.game_ended,
            winner: turn.winner.map(|p| p as u8),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidMovesResponse {
    pub valid_positions: Vec<PositionModel>,
    pub valid_rotations: [Rotation; 3],
}

impl From<ValidMoves> for ValidMovesResponse {
    fn from(moves: ValidMoves) -> Self {
        ValidMovesResponse {
            valid_positions: moves.destinations.into_iter().map(PositionModel::from).collect(),
            valid_rotations: moves.rotations,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveModel {
    Translate {
        from: PositionModel,
        to: PositionModel,
    },
    Rotate {
        at: PositionModel,
        rotation: Rotation,
    },
}

impl From<Move> for MoveModel {
    fn from(mov: Move) -> Self {
        match mov {
            Move::Translate { from, to } => MoveModel::Translate {
                from: from.into(),
                to: to.into(),
            },
            Move::Rotate { at, rotation } => MoveModel::Rotate {
                at: at.into(),
                rotation,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentMoveResponse {
    pub result: MoveResponse,
    pub chosen: MoveModel,
    pub score: i32,
    pub nodes_visited: u64,
    pub branches_pruned: u64,
}

impl From<&AgentTurn> for AgentMoveResponse {
    fn from(agent: &AgentTurn) -> Self {
        AgentMoveResponse {
            result: MoveResponse::from(&agent.turn),
            chosen: agent.turn.mov.into(),
            score: agent.score,
            nodes_visited: agent.stats.nodes_visited,
            branches_pruned: agent.stats.branches_pruned,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthModel {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorModel {
    pub detail: String,
}
