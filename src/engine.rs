// =============================================================================
// Bot move selection
//
// One-ply heuristic: every legal move of the bot's side is scored on its own
// and the best is played. Difficulty controls which terms are used and how
// much randomness is mixed in:
//
//   easy   - random base in [0, 100) plus a capture bonus; one of the top five
//            moves is picked at random.
//   normal - capture value + centralization + jitter in [0, 5).
//   hard   - normal's terms + positional bonus + safety penalty + threats,
//            with jitter in [0, 2).
//
// Normal and hard take the strict maximum, so the first move in scan order
// wins ties.
// =============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::board::Board;
use crate::error::UnknownDifficulty;
use crate::game::{Game, MoveOutcome};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};

/// Platform-appropriate random number in [0, 1).
/// Uses js_sys::Math::random() in WASM builds, rand crate natively.
fn random_f64() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Math::random()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen::<f64>()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Normal => write!(f, "normal"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

// =============================================================================
// Weights
// =============================================================================

/// Multiplier on the captured piece's value.
const CAPTURE_WEIGHT: f64 = 10.0;
/// Per unit of Manhattan distance gained toward the board centre.
const CENTRALIZATION_WEIGHT: f64 = 0.5;
/// Per rank a pawn stands past its second rank.
const PAWN_ADVANCE_WEIGHT: f64 = 0.5;
const KNIGHT_CENTRE_BONUS: f64 = 2.0;
const ROOK_SEVENTH_RANK_BONUS: f64 = 3.0;
/// Multiplier on the mover's value when it lands on an attacked square.
const HANGING_PENALTY: f64 = 3.0;
/// Multiplier on the value of each enemy piece newly attacked.
const THREAT_WEIGHT: f64 = 0.5;

const EASY_RANDOM_RANGE: f64 = 100.0;
const NORMAL_JITTER: f64 = 5.0;
const HARD_JITTER: f64 = 2.0;
/// Easy mode picks uniformly among this many best-scored moves.
const EASY_POOL: usize = 5;

const CENTRE: f64 = 3.5;

struct ScoredMove {
    mv: Move,
    score: f64,
}

// =============================================================================
// Scoring
// =============================================================================

/// Every legal move of `color`, in row-major board-scan order.
pub fn enumerate_all_legal_moves(board: &Board, color: Color) -> Vec<Move> {
    board.all_legal_moves(color)
}

/// Score `mv` for the piece on its origin square. Higher is better.
pub fn score_move(board: &Board, mv: Move, difficulty: Difficulty) -> f64 {
    let piece = match board.get(mv.from) {
        Some(p) => p,
        None => return 0.0,
    };
    let capture = capture_value(board, mv, piece);

    match difficulty {
        Difficulty::Easy => random_f64() * EASY_RANDOM_RANGE + capture,
        Difficulty::Normal => capture + centralization(mv) + random_f64() * NORMAL_JITTER,
        Difficulty::Hard => {
            let after = board.with_move(mv.from, mv.to);
            capture
                + centralization(mv)
                + positional_bonus(piece, mv)
                + safety_penalty(&after, mv, piece)
                + threat_bonus(board, &after, mv, piece)
                + random_f64() * HARD_JITTER
        }
    }
}

fn capture_value(board: &Board, mv: Move, piece: Piece) -> f64 {
    board
        .get(mv.to)
        .filter(|target| target.color != piece.color)
        .map(|target| target.piece_type.value() * CAPTURE_WEIGHT)
        .unwrap_or(0.0)
}

fn centre_distance((row, col): (usize, usize)) -> f64 {
    (row as f64 - CENTRE).abs() + (col as f64 - CENTRE).abs()
}

/// Decrease in Manhattan distance to the centre, weighted. Negative when the
/// piece moves outward.
fn centralization(mv: Move) -> f64 {
    (centre_distance(mv.from) - centre_distance(mv.to)) * CENTRALIZATION_WEIGHT
}

/// Piece-specific bonus for the destination square.
fn positional_bonus(piece: Piece, mv: Move) -> f64 {
    let (row, col) = mv.to;
    match piece.piece_type {
        PieceType::Pawn => {
            let ranks_advanced = match piece.color {
                Color::White => 6 - row as i32,
                Color::Black => row as i32 - 1,
            };
            ranks_advanced as f64 * PAWN_ADVANCE_WEIGHT
        }
        PieceType::Knight => {
            if (2..=5).contains(&row) && (2..=5).contains(&col) {
                KNIGHT_CENTRE_BONUS
            } else {
                0.0
            }
        }
        PieceType::Rook => {
            // The rank just in front of the opponent's back rank
            let seventh = piece.color.opposite().pawn_start_row();
            if row == seventh {
                ROOK_SEVENTH_RANK_BONUS
            } else {
                0.0
            }
        }
        PieceType::Bishop | PieceType::Queen | PieceType::King => 0.0,
    }
}

/// Penalty for leaving the moved piece on a square the opponent attacks.
fn safety_penalty(after: &Board, mv: Move, piece: Piece) -> f64 {
    if after.is_attacked(mv.to, piece.color) {
        -piece.piece_type.value() * HANGING_PENALTY
    } else {
        0.0
    }
}

/// Bonus for each enemy piece the mover attacks from its destination that it
/// did not already attack from its origin.
fn threat_bonus(before: &Board, after: &Board, mv: Move, piece: Piece) -> f64 {
    after
        .pieces()
        .filter(|(_, p)| p.color != piece.color)
        .filter(|&(sq, _)| after.can_attack(mv.to, sq, piece) && !before.can_attack(mv.from, sq, piece))
        .map(|(_, p)| p.piece_type.value() * THREAT_WEIGHT)
        .sum()
}

// =============================================================================
// Move selection
// =============================================================================

/// Pick a move for `color` on `board` without playing it. `None` iff `color`
/// has no legal move.
pub fn pick_move(board: &Board, color: Color, difficulty: Difficulty) -> Option<Move> {
    let legal_moves = enumerate_all_legal_moves(board, color);
    if legal_moves.is_empty() {
        return None;
    }

    let scored: Vec<ScoredMove> = legal_moves
        .into_iter()
        .map(|mv| {
            let score = score_move(board, mv, difficulty);
            trace!(mv = %mv.to_uci(), score, "scored candidate");
            ScoredMove { mv, score }
        })
        .collect();

    match difficulty {
        Difficulty::Easy => pick_from_pool(scored, random_f64()),
        Difficulty::Normal | Difficulty::Hard => {
            let mut best = &scored[0];
            for candidate in &scored[1..] {
                if candidate.score > best.score {
                    best = candidate;
                }
            }
            Some(best.mv)
        }
    }
}

/// Sort best-first and take the move at `r` in [0, 1) across the top
/// `EASY_POOL` entries.
fn pick_from_pool(mut scored: Vec<ScoredMove>, r: f64) -> Option<Move> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    let top = scored.len().min(EASY_POOL);
    if top == 0 {
        return None;
    }
    let index = ((r * top as f64) as usize).min(top - 1);
    Some(scored[index].mv)
}

/// Promotion choice for the bot. Always a queen at every difficulty.
pub fn best_promotion(_difficulty: Difficulty) -> PieceType {
    PieceType::Queen
}

/// Pick and play a move for `color`, resolving any promotion it triggers.
/// Returns the move played, or `None` if nothing could be played.
pub fn choose_move(game: &mut Game, color: Color, difficulty: Difficulty) -> Option<Move> {
    if game.is_over() || game.pending_promotion().is_some() {
        debug!(status = ?game.status(), "bot asked to move while game is not accepting moves");
        return None;
    }
    if game.current_player() != color {
        warn!(%color, to_move = %game.current_player(), "bot asked to move out of turn");
        return None;
    }

    let mv = match pick_move(game.board(), color, difficulty) {
        Some(mv) => mv,
        None => {
            warn!(%color, status = ?game.status(), "no legal moves for a side still in play");
            return None;
        }
    };

    match game.commit_move(mv.from, mv.to) {
        Ok(MoveOutcome::Completed) => {}
        Ok(MoveOutcome::PromotionPending) => {
            if let Err(err) = game.promote(mv.to, best_promotion(difficulty)) {
                warn!(%err, "bot promotion rejected");
            }
        }
        Err(err) => {
            warn!(%err, mv = %mv.to_uci(), "bot move rejected");
            return None;
        }
    }
    debug!(%color, %difficulty, mv = %mv.to_uci(), "bot moved");
    Some(mv)
}
