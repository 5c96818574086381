use crate::engine::{choose_move, Difficulty};
use crate::game::{ClockTick, Game, MoveOutcome, SelectOutcome};
use crate::piece::PieceType;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct MoveResult {
    accepted: bool,
    promotion_pending: bool,
    error: Option<String>,
}

fn string_to_piece_type(s: &str) -> Option<PieceType> {
    match s {
        "Queen" | "queen" => Some(PieceType::Queen),
        "Rook" | "rook" => Some(PieceType::Rook),
        "Bishop" | "bishop" => Some(PieceType::Bishop),
        "Knight" | "knight" => Some(PieceType::Knight),
        _ => None,
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

/// Browser binding. The page owns the only handle and drives the clock with
/// its own interval by calling `tick_clock` once per second.
#[wasm_bindgen]
pub struct ChessGame {
    game: Game,
}

#[wasm_bindgen]
impl ChessGame {
    #[wasm_bindgen(constructor)]
    pub fn new(time_limit_secs: Option<u32>) -> ChessGame {
        let game = match time_limit_secs {
            Some(secs) => Game::new(secs),
            None => Game::default(),
        };
        ChessGame { game }
    }

    pub fn get_state(&self) -> JsValue {
        to_js(&self.game.snapshot())
    }

    pub fn select(&mut self, row: usize, col: usize) -> JsValue {
        let result = match self.game.select((row, col)) {
            SelectOutcome::Moved(outcome) => MoveResult {
                accepted: true,
                promotion_pending: outcome == MoveOutcome::PromotionPending,
                error: None,
            },
            SelectOutcome::Rejected(err) => MoveResult {
                accepted: false,
                promotion_pending: false,
                error: Some(err.to_string()),
            },
            SelectOutcome::Selected | SelectOutcome::Deselected | SelectOutcome::Ignored => MoveResult {
                accepted: false,
                promotion_pending: false,
                error: None,
            },
        };
        to_js(&result)
    }

    pub fn make_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> JsValue {
        let result = match self.game.commit_move((from_row, from_col), (to_row, to_col)) {
            Ok(outcome) => MoveResult {
                accepted: true,
                promotion_pending: outcome == MoveOutcome::PromotionPending,
                error: None,
            },
            Err(err) => MoveResult {
                accepted: false,
                promotion_pending: false,
                error: Some(err.to_string()),
            },
        };
        to_js(&result)
    }

    pub fn promote(&mut self, row: usize, col: usize, piece: &str) -> bool {
        match string_to_piece_type(piece) {
            Some(kind) => self.game.promote((row, col), kind).is_ok(),
            None => false,
        }
    }

    /// Play the bot's move for the side to move. Returns the move or null.
    pub fn make_bot_move(&mut self, difficulty: &str) -> JsValue {
        let difficulty = difficulty.parse::<Difficulty>().unwrap_or(Difficulty::Normal);
        let color = self.game.current_player();
        match choose_move(&mut self.game, color, difficulty) {
            Some(mv) => to_js(&mv),
            None => JsValue::NULL,
        }
    }

    pub fn get_legal_moves_for_square(&self, row: usize, col: usize) -> JsValue {
        to_js(&self.game.valid_moves_for((row, col)))
    }

    pub fn start_clock(&mut self) {
        self.game.start_clock();
    }

    pub fn stop_clock(&mut self) {
        self.game.stop_clock();
    }

    /// Returns true when this tick ran a clock out.
    pub fn tick_clock(&mut self) -> bool {
        if !self.game.is_clock_running() {
            return false;
        }
        self.game.tick_clock() == ClockTick::Expired
    }

    pub fn reset(&mut self) {
        self.game.reset();
    }
}
