//! Gomoku Web API
//!
//! Bridges HTTP callers onto the `gomoku-core` rules engine. Each game
//! session is persisted as one SQLite row with the board stored as its
//! serde JSON round-trip; the core is the single authority on move
//! legality and game status.
//!
//! Endpoints:
//! - `GET  /health` - liveness
//! - `POST /games` - create a session `{ size, owner? }` -> `{ id }`
//! - `GET  /games` - list sessions (id, status, created_at)
//! - `GET  /games/{id}` - full game state
//! - `PUT  /games/{id}/move` - apply a move `{ row, col }`
//! - `POST /games/{id}/restart` - reset the session in place
//!
//! Mutations are serialized by the single store lock: a handler fetches
//! the session, applies one move through the core and persists the result
//! before the lock is released, so no two moves interleave.

use std::path::Path as FilePath;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use gomoku_core::{winning_tiles, GameError, GameSession, GameStatus, Pos, Stone};

// =============================================================================
// Storage
// =============================================================================

/// SQLite-backed session store.
///
/// A single connection behind a mutex: every handler locks it for the whole
/// fetch-apply-persist cycle, which serializes mutations per session.
struct GameStore {
    conn: Mutex<Connection>,
}

impl GameStore {
    const SCHEMA: &'static str = "
        CREATE TABLE IF NOT EXISTS games (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            owner       TEXT,
            created_at  INTEGER NOT NULL,
            status      TEXT NOT NULL,
            read_only   INTEGER NOT NULL,
            session     TEXT NOT NULL
        );
    ";

    /// Open (and initialize) the store at the given path.
    fn open(path: &FilePath) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(GameStore {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    #[cfg(test)]
    fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(GameStore {
            conn: Mutex::new(conn),
        })
    }
}

/// One persisted game session.
struct StoredGame {
    id: i64,
    owner: Option<String>,
    created_at: i64,
    read_only: bool,
    session: GameSession,
}

/// Current unix time in seconds.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// The stable status name used in the status column and list responses.
fn status_label(status: GameStatus) -> &'static str {
    match status {
        GameStatus::TurnBlack => "TURN_BLACK",
        GameStatus::TurnWhite => "TURN_WHITE",
        GameStatus::WinnerBlack => "WINNER_BLACK",
        GameStatus::WinnerWhite => "WINNER_WHITE",
        GameStatus::Draw => "DRAW",
    }
}

/// Insert a fresh session, returning its id.
fn insert_game(
    conn: &Connection,
    session: &GameSession,
    owner: Option<&str>,
) -> rusqlite::Result<i64> {
    let json = serde_json::to_string(session).expect("session serializes");
    conn.execute(
        "INSERT INTO games (owner, created_at, status, read_only, session)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            owner,
            unix_now(),
            status_label(session.status()),
            false,
            json
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a session by id, or `None` if it does not exist.
fn fetch_game(conn: &Connection, id: i64) -> rusqlite::Result<Option<StoredGame>> {
    conn.query_row(
        "SELECT id, owner, created_at, read_only, session FROM games WHERE id = ?1",
        [id],
        |row| {
            let json: String = row.get(4)?;
            let session = serde_json::from_str(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(StoredGame {
                id: row.get(0)?,
                owner: row.get(1)?,
                created_at: row.get(2)?,
                read_only: row.get(3)?,
                session,
            })
        },
    )
    .optional()
}

/// Persist the updated session state for an existing row.
fn persist_game(
    conn: &Connection,
    id: i64,
    session: &GameSession,
    read_only: bool,
) -> rusqlite::Result<()> {
    let json = serde_json::to_string(session).expect("session serializes");
    conn.execute(
        "UPDATE games SET status = ?2, read_only = ?3, session = ?4 WHERE id = ?1",
        params![id, status_label(session.status()), read_only, json],
    )?;
    Ok(())
}

/// List all sessions as (id, status, created_at) summaries.
fn list_game_rows(conn: &Connection) -> rusqlite::Result<Vec<GameSummaryModel>> {
    let mut stmt =
        conn.prepare("SELECT id, status, created_at FROM games ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(GameSummaryModel {
            id: row.get(0)?,
            status: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Shared application state
type AppState = Arc<GameStore>;

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Deserialize)]
struct CreateGameRequest {
    size: usize,
    owner: Option<String>,
}

#[derive(Serialize)]
struct CreatedModel {
    id: i64,
}

#[derive(Deserialize)]
struct MoveRequest {
    row: usize,
    col: usize,
}

#[derive(Serialize)]
struct GameSummaryModel {
    id: i64,
    status: String,
    created_at: i64,
}

#[derive(Serialize)]
struct TileModel {
    stone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<u32>,
}

#[derive(Serialize)]
struct GameStateModel {
    id: i64,
    size: usize,
    status: GameStatus,
    board: Vec<Vec<TileModel>>,
    total_moves: u32,
    read_only: bool,
    created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    /// Tiles of the winning run(s), present only for a decided game.
    #[serde(skip_serializing_if = "Option::is_none")]
    winning_line: Option<Vec<(usize, usize)>>,
}

#[derive(Serialize)]
struct HealthModel {
    status: String,
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorModel>);

fn bad_request(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorModel {
            detail: detail.into(),
        }),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorModel {
            detail: "Game not found".to_string(),
        }),
    )
}

fn game_error(err: GameError) -> ApiError {
    bad_request(err.to_string())
}

fn db_error(err: rusqlite::Error) -> ApiError {
    tracing::error!(error = %err, "game store query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorModel {
            detail: "Internal server error".to_string(),
        }),
    )
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Label for a stone, upgraded to a win marker on winning tiles.
fn stone_label(stone: Stone, on_winning_line: bool) -> &'static str {
    match (stone, on_winning_line) {
        (Stone::Empty, _) => "EMPTY",
        (Stone::Black, false) => "BLACK",
        (Stone::White, false) => "WHITE",
        (Stone::Black, true) => "BLACK_WIN",
        (Stone::White, true) => "WHITE_WIN",
    }
}

/// Convert a stored game to the JSON-serializable state model.
///
/// For a decided game the winning tiles are recomputed from the board with
/// the core's shared win scan and rendered with the `*_WIN` display
/// markers; the underlying stored stones stay plain BLACK/WHITE.
fn game_view(game: &StoredGame) -> GameStateModel {
    let session = &game.session;
    let board = session.board();

    let win_tiles: Vec<Pos> = match session.status().winner() {
        Some(winner) => winning_tiles(board, winner),
        None => Vec::new(),
    };

    let rows: Vec<Vec<TileModel>> = (0..board.size())
        .map(|row| {
            (0..board.size())
                .map(|col| {
                    let pos = Pos::new(row, col);
                    let tile = board.get(pos).expect("position is within bounds");
                    TileModel {
                        stone: stone_label(tile.stone, win_tiles.contains(&pos)).to_string(),
                        order: tile.order,
                    }
                })
                .collect()
        })
        .collect();

    let winning_line = if win_tiles.is_empty() {
        None
    } else {
        Some(win_tiles.iter().map(|pos| (pos.row, pos.col)).collect())
    };

    GameStateModel {
        id: game.id,
        size: board.size(),
        status: session.status(),
        board: rows,
        total_moves: session.total_moves(),
        read_only: game.read_only,
        created_at: game.created_at,
        owner: game.owner.clone(),
        winning_line,
    }
}

// =============================================================================
// API Endpoints
// =============================================================================

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

async fn create_game(
    State(state): State<AppState>,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<CreatedModel>, ApiError> {
    let session = GameSession::new(req.size).map_err(game_error)?;

    let conn = state.conn.lock().unwrap();
    let id = insert_game(&conn, &session, req.owner.as_deref()).map_err(db_error)?;
    tracing::info!(id, size = req.size, "created game");
    Ok(Json(CreatedModel { id }))
}

async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameSummaryModel>>, ApiError> {
    let conn = state.conn.lock().unwrap();
    let games = list_game_rows(&conn).map_err(db_error)?;
    Ok(Json(games))
}

async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<GameStateModel>, ApiError> {
    let conn = state.conn.lock().unwrap();
    let game = fetch_game(&conn, game_id)
        .map_err(db_error)?
        .ok_or_else(not_found)?;
    Ok(Json(game_view(&game)))
}

async fn make_move(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    let conn = state.conn.lock().unwrap();
    let mut game = fetch_game(&conn, game_id)
        .map_err(db_error)?
        .ok_or_else(not_found)?;

    // Completed games are read-only; reject before touching the core.
    if game.read_only {
        return Err(bad_request("Cannot update a complete game"));
    }

    // The mover is whichever color the stored status says is to move.
    let player = match game.session.status().turn() {
        Some(player) => player,
        None => return Err(game_error(GameError::GameAlreadyOver)),
    };

    game.session
        .apply(Pos::new(req.row, req.col), player)
        .map_err(game_error)?;
    game.read_only = game.session.status().is_terminal();

    persist_game(&conn, game_id, &game.session, game.read_only).map_err(db_error)?;
    tracing::debug!(
        game_id,
        row = req.row,
        col = req.col,
        status = status_label(game.session.status()),
        "applied move"
    );
    Ok(Json(game_view(&game)))
}

async fn restart_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<GameStateModel>, ApiError> {
    let conn = state.conn.lock().unwrap();
    let mut game = fetch_game(&conn, game_id)
        .map_err(db_error)?
        .ok_or_else(not_found)?;

    game.session.restart();
    game.read_only = false;

    persist_game(&conn, game_id, &game.session, false).map_err(db_error)?;
    tracing::info!(game_id, "restarted game");
    Ok(Json(game_view(&game)))
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = std::env::var("GOMOKU_DB").unwrap_or_else(|_| "gomoku.db".to_string());
    let store = GameStore::open(FilePath::new(&db_path)).expect("Failed to open game store");
    tracing::info!(path = %db_path, "opened game store");

    let state: AppState = Arc::new(store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/games", get(list_games).post(create_game))
        .route("/games/{game_id}", get(get_game))
        .route("/games/{game_id}/move", put(make_move))
        .route("/games/{game_id}/restart", post(restart_game))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    tracing::info!("Gomoku API running on http://localhost:8080");
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomoku_core::Player;

    fn finished_session() -> GameSession {
        let mut session = GameSession::new(5).unwrap();
        for col in 0..4 {
            session.apply(Pos::new(0, col), Player::Black).unwrap();
            session.apply(Pos::new(1, col), Player::White).unwrap();
        }
        session.apply(Pos::new(0, 4), Player::Black).unwrap();
        assert_eq!(session.status(), GameStatus::WinnerBlack);
        session
    }

    #[test]
    fn test_store_roundtrip() {
        let store = GameStore::in_memory().unwrap();
        let conn = store.conn.lock().unwrap();

        let session = GameSession::new(5).unwrap();
        let id = insert_game(&conn, &session, Some("player-one")).unwrap();

        let game = fetch_game(&conn, id).unwrap().unwrap();
        assert_eq!(game.id, id);
        assert_eq!(game.owner.as_deref(), Some("player-one"));
        assert!(!game.read_only);
        assert_eq!(game.session, session);

        assert!(fetch_game(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_persist_and_list() {
        let store = GameStore::in_memory().unwrap();
        let conn = store.conn.lock().unwrap();

        let mut session = GameSession::new(5).unwrap();
        let first = insert_game(&conn, &session, None).unwrap();
        let second = insert_game(&conn, &GameSession::new(6).unwrap(), None).unwrap();

        session.apply(Pos::new(2, 2), Player::Black).unwrap();
        persist_game(&conn, first, &session, false).unwrap();

        let games = list_game_rows(&conn).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, first);
        assert_eq!(games[0].status, "TURN_WHITE");
        assert_eq!(games[1].id, second);
        assert_eq!(games[1].status, "TURN_BLACK");

        let reloaded = fetch_game(&conn, first).unwrap().unwrap();
        assert_eq!(reloaded.session, session);
    }

    #[test]
    fn test_view_marks_winning_tiles() {
        let session = finished_session();
        let game = StoredGame {
            id: 1,
            owner: None,
            created_at: 0,
            read_only: true,
            session,
        };

        let view = game_view(&game);
        assert_eq!(view.status, GameStatus::WinnerBlack);
        assert!(view.read_only);
        assert_eq!(view.total_moves, 9);

        // The whole top row renders with the win marker
        for col in 0..5 {
            assert_eq!(view.board[0][col].stone, "BLACK_WIN");
            assert!(view.board[0][col].order.is_some());
        }
        // White's stones and empty tiles are unmarked
        assert_eq!(view.board[1][0].stone, "WHITE");
        assert_eq!(view.board[4][4].stone, "EMPTY");
        assert_eq!(view.board[4][4].order, None);

        let line = view.winning_line.unwrap();
        assert_eq!(line.len(), 5);
        for col in 0..5 {
            assert!(line.contains(&(0, col)));
        }
    }

    #[test]
    fn test_view_of_ongoing_game_has_no_markers() {
        let mut session = GameSession::new(5).unwrap();
        session.apply(Pos::new(2, 2), Player::Black).unwrap();
        let game = StoredGame {
            id: 7,
            owner: Some("player-two".to_string()),
            created_at: 42,
            read_only: false,
            session,
        };

        let view = game_view(&game);
        assert_eq!(view.status, GameStatus::TurnWhite);
        assert_eq!(view.board[2][2].stone, "BLACK");
        assert_eq!(view.winning_line, None);
        assert_eq!(view.owner.as_deref(), Some("player-two"));
    }
}
