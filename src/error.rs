// =============================================================================
// Errors for rule violations and configuration
//
// A rejected operation never mutates the game; the error only says why.
// =============================================================================

use thiserror::Error;

use crate::board::Square;
use crate::piece::{Color, PieceType};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleError {
    #[error("square {0:?} is off the board")]
    OffBoard(Square),

    #[error("no piece at {0:?}")]
    NoPiece(Square),

    #[error("piece at {square:?} belongs to {color}, but it is {to_move}'s turn")]
    WrongColor {
        square: Square,
        color: Color,
        to_move: Color,
    },

    #[error("illegal destination {to:?} from {from:?}")]
    IllegalDestination { from: Square, to: Square },

    #[error("the game is over")]
    GameOver,

    #[error("a pawn promotion must be resolved first")]
    PromotionPending,

    #[error("no promotion is pending on {0:?}")]
    NoPendingPromotion(Square),

    #[error("piece at {0:?} is not a pawn")]
    NotAPawn(Square),

    #[error("a pawn cannot promote to a {0}")]
    InvalidPromotion(PieceType),

    #[error("position has {count} {color} kings, expected exactly one")]
    KingCount { color: Color, count: usize },
}

pub type RuleResult<T> = Result<T, RuleError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown difficulty {0:?}, expected easy, normal or hard")]
pub struct UnknownDifficulty(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("time limit must be at least one second")]
    ZeroTimeLimit,

    #[error("tick period must be at least one millisecond")]
    ZeroTickPeriod,
}
