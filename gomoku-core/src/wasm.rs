//! WASM bindings for gomoku-core
//!
//! Provides a JavaScript-friendly API for the game logic, used by the
//! browser-local variant of the game where the same rules run client-side.

use crate::{GameSession, GameStatus, Player, Pos, Tile};
use wasm_bindgen::prelude::*;

/// WASM-friendly wrapper around a game session
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
    winning: Option<Vec<Pos>>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game with the given board size
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize) -> Result<WasmGame, JsValue> {
        let session = GameSession::new(size).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame {
            session,
            winning: None,
        })
    }

    /// Board side length
    pub fn size(&self) -> usize {
        self.session.board().size()
    }

    /// Stones placed so far
    #[wasm_bindgen(js_name = totalMoves)]
    pub fn total_moves(&self) -> u32 {
        self.session.total_moves()
    }

    /// Current status: "TURN_BLACK", "TURN_WHITE", "WINNER_BLACK",
    /// "WINNER_WHITE" or "DRAW"
    pub fn status(&self) -> String {
        match self.session.status() {
            GameStatus::TurnBlack => "TURN_BLACK",
            GameStatus::TurnWhite => "TURN_WHITE",
            GameStatus::WinnerBlack => "WINNER_BLACK",
            GameStatus::WinnerWhite => "WINNER_WHITE",
            GameStatus::Draw => "DRAW",
        }
        .to_string()
    }

    /// Apply a move for whichever color is to move. Returns true if the
    /// move was accepted.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, row: usize, col: usize) -> bool {
        let player = match self.session.status().turn() {
            Some(player) => player,
            None => return false,
        };
        match self.session.apply(Pos::new(row, col), player) {
            Ok(line) => {
                self.winning = line;
                true
            }
            Err(_) => false,
        }
    }

    /// Get winning line as array of coordinates [row, col, row, col, ...]
    /// Returns empty array if the game has no winner
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u32> {
        match &self.winning {
            Some(line) => line
                .iter()
                .flat_map(|pos| [pos.row as u32, pos.col as u32])
                .collect(),
            None => vec![],
        }
    }

    /// Get the board as a JSON array of rows, each row an array of
    /// { stone, order } tiles
    pub fn tiles(&self) -> JsValue {
        let board = self.session.board();
        let rows: Vec<Vec<Tile>> = (0..board.size())
            .map(|row| {
                (0..board.size())
                    .map(|col| *board.get(Pos::new(row, col)).unwrap())
                    .collect()
            })
            .collect();
        serde_wasm_bindgen::to_value(&rows).unwrap()
    }

    /// Check if the game is over (win or draw)
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.session.status().is_terminal()
    }

    /// The winner: 0 (none), 1 (black) or 2 (white)
    pub fn winner(&self) -> u8 {
        match self.session.status().winner() {
            None => 0,
            Some(Player::Black) => 1,
            Some(Player::White) => 2,
        }
    }

    /// Reset to an empty board with Black to move, keeping the size
    pub fn restart(&mut self) {
        self.session.restart();
        self.winning = None;
    }
}
