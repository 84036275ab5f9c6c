//! Gomoku (five-in-a-row) game rules.
//!
//! # Board Model
//!
//! ```text
//! Board: size × size tiles, row-major, size fixed at creation (5..=20).
//!
//! Tile: stone (EMPTY / BLACK / WHITE) plus the 1-based move order at
//! which the stone was placed. Order is present exactly when the tile
//! holds a stone; across a board the orders are 1..=total_moves with
//! no gaps or repeats.
//!
//! Status machine:
//!   TURN_BLACK <-> TURN_WHITE         (flip after a non-winning move)
//!   TURN_X -> WINNER_X                (move completes a 5-run)
//!   TURN_X -> DRAW                    (board fills with no 5-run)
//! WINNER_BLACK, WINNER_WHITE and DRAW are absorbing.
//! ```
//!
//! Move application is a pure function: [`apply_move`] takes the current
//! `(board, status, total_moves)` triple plus the requested position and
//! player, and either returns a fresh [`MoveOutcome`] or rejects the move
//! without touching its inputs. [`GameSession`] wraps the triple for
//! callers that want read-modify-write convenience.
//!
//! Win detection scans the four axes (row, column, both diagonals) outward
//! from the just-placed stone. The same scan produces both the win decision
//! and the winning coordinates used for display highlighting.

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::{Deserialize, Serialize};

/// Minimum allowed board size.
pub const MIN_BOARD_SIZE: usize = 5;

/// Maximum allowed board size.
pub const MAX_BOARD_SIZE: usize = 20;

/// Number of consecutive stones required to win.
pub const STONES_TO_WIN: usize = 5;

/// Player identifier. Black always moves first.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// The stone this player places.
    #[inline]
    pub fn stone(self) -> Stone {
        match self {
            Player::Black => Stone::Black,
            Player::White => Stone::White,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::Black => write!(f, "BLACK"),
            Player::White => write!(f, "WHITE"),
        }
    }
}

/// Contents of a single tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    /// Check if this is the empty stone.
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Stone::Empty
    }

    /// The player that owns this stone, if any.
    #[inline]
    pub fn player(self) -> Option<Player> {
        match self {
            Stone::Empty => None,
            Stone::Black => Some(Player::Black),
            Stone::White => Some(Player::White),
        }
    }
}

/// Position on the board, zero-indexed `(row, col)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    /// Create a position from row and column.
    #[inline]
    pub fn new(row: usize, col: usize) -> Pos {
        Pos { row, col }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One cell of the board: at most one stone, plus the move order at which
/// it was placed. `order` is `Some` exactly when the stone is non-empty.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Tile {
    pub stone: Stone,
    pub order: Option<u32>,
}

impl Tile {
    /// An empty tile with no order.
    pub const EMPTY: Tile = Tile {
        stone: Stone::Empty,
        order: None,
    };
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rejections produced by board construction and move application.
///
/// All of these are caller-input errors: they are reported to the caller,
/// never retried, and a rejected operation leaves the game state untouched.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameError {
    /// Requested board size is outside `MIN_BOARD_SIZE..=MAX_BOARD_SIZE`.
    InvalidSize(usize),
    /// Position is outside the board's coordinate range.
    OutOfBounds(Pos),
    /// Target tile already holds a stone.
    TileOccupied(Pos),
    /// The player attempting to move is not the player to move.
    WrongTurn(Player),
    /// The session is already in a terminal status.
    GameAlreadyOver,
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::InvalidSize(size) => write!(
                f,
                "board size {} is outside the allowed range {}..={}",
                size, MIN_BOARD_SIZE, MAX_BOARD_SIZE
            ),
            GameError::OutOfBounds(pos) => write!(f, "position {} is out of bounds", pos),
            GameError::TileOccupied(pos) => write!(f, "tile at {} is already occupied", pos),
            GameError::WrongTurn(player) => write!(f, "it is not {}'s turn", player),
            GameError::GameAlreadyOver => write!(f, "the game is already over"),
        }
    }
}

impl std::error::Error for GameError {}

// ============================================================================
// BOARD
// ============================================================================

/// Square grid of tiles, `size × size`, row-major.
///
/// The board is a data container: it validates its own shape (size bounds,
/// coordinate range) but not game rules. Occupancy and turn checks belong
/// to [`apply_move`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    tiles: Vec<Tile>,
}

impl Board {
    /// Create an all-empty board.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidSize` if `size` is outside
    /// `MIN_BOARD_SIZE..=MAX_BOARD_SIZE`.
    pub fn new(size: usize) -> Result<Board, GameError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(GameError::InvalidSize(size));
        }
        Ok(Board {
            size,
            tiles: vec![Tile::EMPTY; size * size],
        })
    }

    /// Board side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of tiles (`size²`).
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.size * self.size
    }

    /// Check if a position is on the board.
    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    /// Get the tile at a position.
    ///
    /// # Errors
    ///
    /// Returns `GameError::OutOfBounds` if the position is off the board.
    pub fn get(&self, pos: Pos) -> Result<&Tile, GameError> {
        if !self.contains(pos) {
            return Err(GameError::OutOfBounds(pos));
        }
        Ok(&self.tiles[pos.row * self.size + pos.col])
    }

    /// Set the tile at a position to `{stone, order}`.
    ///
    /// Does NOT check occupancy: ensuring the target tile was empty is the
    /// engine's business rule, not a structural invariant of the grid.
    ///
    /// # Errors
    ///
    /// Returns `GameError::OutOfBounds` if the position is off the board.
    pub fn place(&mut self, pos: Pos, stone: Stone, order: u32) -> Result<(), GameError> {
        if !self.contains(pos) {
            return Err(GameError::OutOfBounds(pos));
        }
        self.tiles[pos.row * self.size + pos.col] = Tile {
            stone,
            order: Some(order),
        };
        Ok(())
    }

    /// Iterate over all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Pos::new(row, col)))
    }

    /// Number of non-empty tiles.
    pub fn stone_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.stone.is_empty()).count()
    }
}

// ============================================================================
// WIN DETECTION
// ============================================================================

/// The four scan axes: row, column, `\` diagonal, `/` diagonal.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Check if `(row, col)` is on the board and holds the given stone.
///
/// Signed coordinates so that walking off any edge reads as a mismatch: an
/// opposing stone, an empty tile and out-of-bounds all terminate a scan
/// identically.
#[inline]
fn is_players_stone(board: &Board, row: isize, col: isize, stone: Stone) -> bool {
    if row < 0 || col < 0 {
        return false;
    }
    let pos = Pos::new(row as usize, col as usize);
    board.contains(pos) && board.get(pos).map(|t| t.stone) == Ok(stone)
}

/// Find the winning line through a position, if one exists.
///
/// For each of the four axes, collects the contiguous run of `player`'s
/// stones through `pos` by extending outward in both directions. Any axis
/// whose run reaches [`STONES_TO_WIN`] contributes its full run to the
/// result; when several axes qualify at once the result is their union,
/// with `pos` reported once.
///
/// Returns `None` when no axis reaches the threshold. The tile at `pos` is
/// expected to already hold the player's stone; callers scan after
/// placing, never before.
pub fn winning_line(board: &Board, pos: Pos, player: Player) -> Option<Vec<Pos>> {
    let stone = player.stone();
    let mut winning: Vec<Pos> = Vec::new();

    for &(dr, dc) in &AXES {
        let mut run = vec![pos];

        // Walk backward along the axis
        let (mut row, mut col) = (pos.row as isize - dr, pos.col as isize - dc);
        while is_players_stone(board, row, col, stone) {
            run.push(Pos::new(row as usize, col as usize));
            row -= dr;
            col -= dc;
        }

        // Walk forward along the axis
        let (mut row, mut col) = (pos.row as isize + dr, pos.col as isize + dc);
        while is_players_stone(board, row, col, stone) {
            run.push(Pos::new(row as usize, col as usize));
            row += dr;
            col += dc;
        }

        if run.len() >= STONES_TO_WIN {
            for p in run {
                if !winning.contains(&p) {
                    winning.push(p);
                }
            }
        }
    }

    if winning.is_empty() {
        None
    } else {
        Some(winning)
    }
}

/// All tiles belonging to a winning run for `player`, anywhere on the board.
///
/// Display helper for finished games where the deciding move is no longer
/// known: re-runs the shared scan from every stone of the player and merges
/// the results. Empty when the player has no 5-run.
pub fn winning_tiles(board: &Board, player: Player) -> Vec<Pos> {
    let stone = player.stone();
    let mut tiles: Vec<Pos> = Vec::new();

    for pos in board.positions() {
        if board.get(pos).map(|t| t.stone) != Ok(stone) {
            continue;
        }
        if let Some(line) = winning_line(board, pos, player) {
            for p in line {
                if !tiles.contains(&p) {
                    tiles.push(p);
                }
            }
        }
    }

    tiles
}

// ============================================================================
// STATUS
// ============================================================================

/// Game status state machine.
///
/// `TurnBlack` and `TurnWhite` alternate; the other three states are
/// terminal and absorbing.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    TurnBlack,
    TurnWhite,
    WinnerBlack,
    WinnerWhite,
    Draw,
}

impl GameStatus {
    /// The turn status for a player.
    #[inline]
    pub fn turn_of(player: Player) -> GameStatus {
        match player {
            Player::Black => GameStatus::TurnBlack,
            Player::White => GameStatus::TurnWhite,
        }
    }

    /// The winner status for a player.
    #[inline]
    pub fn win_of(player: Player) -> GameStatus {
        match player {
            Player::Black => GameStatus::WinnerBlack,
            Player::White => GameStatus::WinnerWhite,
        }
    }

    /// The player to move, or `None` if the game is over.
    #[inline]
    pub fn turn(self) -> Option<Player> {
        match self {
            GameStatus::TurnBlack => Some(Player::Black),
            GameStatus::TurnWhite => Some(Player::White),
            _ => None,
        }
    }

    /// The winner, or `None` for a draw or an ongoing game.
    #[inline]
    pub fn winner(self) -> Option<Player> {
        match self {
            GameStatus::WinnerBlack => Some(Player::Black),
            GameStatus::WinnerWhite => Some(Player::White),
            _ => None,
        }
    }

    /// Check if no further moves are accepted.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self.turn().is_none()
    }
}

// ============================================================================
// MOVE APPLICATION
// ============================================================================

/// Result of a successful move: the replacement state triple plus the
/// winning coordinates when the move decided the game.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveOutcome {
    pub board: Board,
    pub status: GameStatus,
    pub total_moves: u32,
    pub winning_line: Option<Vec<Pos>>,
}

/// Validate and apply one move.
///
/// Preconditions are checked in order, each with its own rejection:
///
/// 1. `status` must not be terminal (`GameAlreadyOver`)
/// 2. `pos` must be on the board (`OutOfBounds`)
/// 3. the target tile must be empty (`TileOccupied`)
/// 4. `player` must match the turn (`WrongTurn`)
///
/// On success the stone is placed with `order = total_moves + 1` and the
/// win scan runs from the placed position. A winning move ends the game in
/// the mover's favor even when it also fills the board; a non-winning move
/// that fills the board ends in a draw; otherwise the turn flips.
///
/// Pure: the inputs are never mutated, so a rejection leaves the caller's
/// state exactly as it was.
pub fn apply_move(
    board: &Board,
    status: GameStatus,
    total_moves: u32,
    pos: Pos,
    player: Player,
) -> Result<MoveOutcome, GameError> {
    let turn = match status.turn() {
        Some(turn) => turn,
        None => return Err(GameError::GameAlreadyOver),
    };

    let tile = board.get(pos)?;
    if !tile.stone.is_empty() {
        return Err(GameError::TileOccupied(pos));
    }

    if player != turn {
        return Err(GameError::WrongTurn(player));
    }

    let total_moves = total_moves + 1;
    let mut board = board.clone();
    board.place(pos, player.stone(), total_moves)?;

    let line = winning_line(&board, pos, player);
    let status = if line.is_some() {
        GameStatus::win_of(player)
    } else if total_moves as usize == board.tile_count() {
        GameStatus::Draw
    } else {
        GameStatus::turn_of(player.opponent())
    };

    Ok(MoveOutcome {
        board,
        status,
        total_moves,
        winning_line: line,
    })
}

// ============================================================================
// SESSION
// ============================================================================

/// One game in progress or completed: a board plus the status machine and
/// move counter that [`apply_move`] operates on.
///
/// The session owns its board exclusively; the board is created empty here
/// and mutated one tile at a time through [`GameSession::apply`]. Callers
/// that persist sessions must serialize mutations per session; `apply` is
/// read-modify-write with no internal locking.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameSession {
    board: Board,
    status: GameStatus,
    total_moves: u32,
}

impl GameSession {
    /// Start a new game: empty board, Black to move, zero moves.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidSize` for an out-of-range size.
    pub fn new(size: usize) -> Result<GameSession, GameError> {
        Ok(GameSession {
            board: Board::new(size)?,
            status: GameStatus::TurnBlack,
            total_moves: 0,
        })
    }

    /// The current board.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The current status.
    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Stones placed so far.
    #[inline]
    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }

    /// Apply one move for `player`, committing the outcome on success.
    ///
    /// Returns the winning line when the move decided the game. On
    /// rejection the session is left byte-for-byte unchanged.
    pub fn apply(&mut self, pos: Pos, player: Player) -> Result<Option<Vec<Pos>>, GameError> {
        let outcome = apply_move(&self.board, self.status, self.total_moves, pos, player)?;
        self.board = outcome.board;
        self.status = outcome.status;
        self.total_moves = outcome.total_moves;
        Ok(outcome.winning_line)
    }

    /// Reset to the initial state: same size, fresh board, Black to move.
    ///
    /// This reuses the session identity: it is a reset of an existing
    /// game, not the creation of a new one.
    pub fn restart(&mut self) {
        let size = self.board.size;
        self.board = Board {
            size,
            tiles: vec![Tile::EMPTY; size * size],
        };
        self.status = GameStatus::TurnBlack;
        self.total_moves = 0;
    }
}
