//! HTTP handlers. Every request carries the whole board; nothing is stored
//! between calls.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use khet_core::game::{self, TurnOutcome};
use khet_core::{Board, GameError, HeuristicEvaluator, Player, Pos};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::models::{
    parse_player, AgentMoveRequest, AgentMoveResponse, BoardModel, ErrorModel, GameResponse,
    HealthModel, MoveRequest, MoveResponse, RotateRequest, ValidMovesRequest, ValidMovesResponse,
};

/// Shared application state
pub struct AppStateInner {
    config: ApiConfig,
    evaluator: HeuristicEvaluator,
}

pub type AppState = Arc<AppStateInner>;

type Rejection = (StatusCode, Json<ErrorModel>);

pub fn router(config: ApiConfig) -> Router {
    let state: AppState = Arc::new(AppStateInner {
        evaluator: HeuristicEvaluator::new(config.weights.clone()),
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/game/start", post(start_game))
        .route("/game/move", post(make_move))
        .route("/game/rotate", post(rotate))
        .route("/game/valid-moves", post(valid_moves))
        .route("/game/agent-move", post(agent_move))
        .layer(cors)
        .with_state(state)
}

fn reject(status: StatusCode, detail: impl ToString) -> Rejection {
    (
        status,
        Json(ErrorModel {
            detail: detail.to_string(),
        }),
    )
}

fn bad_request(err: GameError) -> Rejection {
    warn!(error = %err, "request rejected");
    reject(StatusCode::BAD_REQUEST, err)
}

/// Decode the player and board every game request starts with.
fn decode(player: u8, board: &BoardModel) -> Result<(Player, Board), Rejection> {
    let player = parse_player(player).map_err(bad_request)?;
    let board = Board::try_from(board).map_err(bad_request)?;
    Ok((player, board))
}

fn turn_response(turn: Result<TurnOutcome, GameError>) -> Result<Json<MoveResponse>, Rejection> {
    let turn = turn.map_err(bad_request)?;
    if turn.game_ended {
        info!(winner = ?turn.winner, "game ended");
    }
    Ok(Json(MoveResponse::from(&turn)))
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

async fn start_game() -> Json<GameResponse> {
    let board = game::start_game();
    Json(GameResponse {
        board: BoardModel::from(&board),
        current_player: Player::One as u8,
        game_ended: false,
        laser: Vec::new(),
    })
}

async fn make_move(Json(req): Json<MoveRequest>) -> Result<Json<MoveResponse>, Rejection> {
    let (player, board) = decode(req.player, &req.board)?;
    let from = Pos::try_from(req.from).map_err(bad_request)?;
    let to = Pos::try_from(req.to).map_err(bad_request)?;
    info!(%player, %from, %to, "move");
    turn_response(game::make_move(player, board, from, to))
}

async fn rotate(Json(req): Json<RotateRequest>) -> Result<Json<MoveResponse>, Rejection> {
    let (player, board) = decode(req.player, &req.board)?;
    let at = Pos::try_from(req.at).map_err(bad_request)?;
    info!(%player, %at, rotation = ?req.rotation, "rotate");
    turn_response(game::rotate(player, board, at, req.rotation))
}

async fn valid_moves(
    Json(req): Json<ValidMovesRequest>,
) -> Result<Json<ValidMovesResponse>, Rejection> {
    let (player, board) = decode(req.player, &req.board)?;
    let at = Pos::try_from(req.at).map_err(bad_request)?;
    let moves = game::valid_moves(&board, player, at).map_err(bad_request)?;
    Ok(Json(ValidMovesResponse::from(moves)))
}

async fn agent_move(
    State(state): State<AppState>,
    Json(req): Json<AgentMoveRequest>,
) -> Result<Json<AgentMoveResponse>, Rejection> {
    let (player, board) = decode(req.player, &req.board)?;
    let config = state.config.search_config(req.depth);
    info!(%player, depth = config.max_depth, "agent move requested");

    // The search is CPU-bound; keep it off the async workers.
    let search_state = Arc::clone(&state);
    let agent = tokio::task::spawn_blocking(move || {
        game::move_by_agent(board, player, &search_state.evaluator, config)
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "agent search task failed");
        reject(StatusCode::INTERNAL_SERVER_ERROR, "agent search failed")
    })?
    .map_err(bad_request)?;

    info!(
        %player,
        mov = %agent.turn.mov,
        score = agent.score,
        nodes = agent.stats.nodes_visited,
        pruned = agent.stats.branches_pruned,
        "agent moved"
    );
    Ok(Json(AgentMoveResponse::from(&agent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router(ApiConfig::default()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn initial_board() -> Value {
        let (_, body) = call("POST", "/game/start", None).await;
        body["board"].clone()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_start_game() {
        let (status, body) = call("POST", "/game/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_player"], 1);
        assert_eq!(body["game_ended"], false);
        assert_eq!(body["board"]["cells"].as_array().unwrap().len(), 8);
        assert_eq!(body["board"]["cells"][7][9]["piece"]["kind"], "Emitter");
        assert_eq!(body["board"]["cells"][7][9]["piece"]["owner"], 1);
    }

    #[tokio::test]
    async fn test_move_fires_laser() {
        let board = initial_board().await;
        let (status, body) = call(
            "POST",
            "/game/move",
            Some(json!({
                "player": 1,
                "board": board,
                "from": {"x": 3, "y": 2},
                "to": {"x": 3, "y": 1},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["next_player"], 2);
        assert_eq!(body["game_ended"], false);
        assert_eq!(body["laser"][0], json!({"x": 9, "y": 7}));
        assert_eq!(body["board"]["cells"][1][3]["piece"]["kind"], "Deflector");
        assert!(body.get("winner").is_none());
    }

    #[tokio::test]
    async fn test_rotate_rejections_are_bad_requests() {
        let board = initial_board().await;
        let (status, body) = call(
            "POST",
            "/game/rotate",
            Some(json!({
                "player": 2,
                "board": board,
                "at": {"x": 5, "y": 0},
                "rotation": "Up",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("not a valid rotation"));

        let (status, _) = call(
            "POST",
            "/game/rotate",
            Some(json!({
                "player": 2,
                "board": board,
                "at": {"x": 5, "y": 0},
                "rotation": "Left",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_moves() {
        let board = initial_board().await;
        let (status, body) = call(
            "POST",
            "/game/valid-moves",
            Some(json!({"player": 1, "board": board, "at": {"x": 4, "y": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid_rotations"], json!(["Left", "Up", "Right"]));
        assert_eq!(
            body["valid_positions"],
            json!([{"x": 3, "y": 6}, {"x": 4, "y": 6}, {"x": 5, "y": 6}])
        );

        let (status, _) = call(
            "POST",
            "/game/valid-moves",
            Some(json!({"player": 1, "board": board, "at": {"x": 12, "y": 0}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_player_and_board() {
        let board = initial_board().await;
        let (status, body) = call(
            "POST",
            "/game/valid-moves",
            Some(json!({"player": 3, "board": board, "at": {"x": 4, "y": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("unknown player"));

        let (status, _) = call(
            "POST",
            "/game/move",
            Some(json!({
                "player": 1,
                "board": {"cells": []},
                "from": {"x": 3, "y": 2},
                "to": {"x": 3, "y": 1},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_agent_move() {
        let board = initial_board().await;
        let (status, body) = call(
            "POST",
            "/game/agent-move",
            Some(json!({"player": 1, "board": board, "depth": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["nodes_visited"].as_u64().unwrap() > 0);
        assert_eq!(body["result"]["next_player"], 2);
        let kind = body["chosen"]["type"].as_str().unwrap();
        assert!(kind == "translate" || kind == "rotate");
    }
}
