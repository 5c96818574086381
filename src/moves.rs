use serde::{Deserialize, Serialize};

use crate::board::Square;
use crate::piece::Piece;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

/// One committed move as recorded in the game history.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub from: Square,
    pub to: Square,
    pub captured: Option<Piece>,
}

impl HistoryEntry {
    pub fn as_move(&self) -> Move {
        Move { from: self.from, to: self.to }
    }
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Coordinate notation, e.g. "e2e4". Row 7 is rank 1, col 0 is file a.
    pub fn to_uci(&self) -> String {
        let fc = (b'a' + self.from.1 as u8) as char;
        let fr = (b'8' - self.from.0 as u8) as char;
        let tc = (b'a' + self.to.1 as u8) as char;
        let tr = (b'8' - self.to.0 as u8) as char;
        format!("{fc}{fr}{tc}{tr}")
    }

    /// Parse coordinate notation. Anything past the four square characters is ignored.
    pub fn from_uci(s: &str) -> Option<Move> {
        let bytes = s.as_bytes();
        if bytes.len() < 4 {
            return None;
        }
        let square = |file: u8, rank: u8| -> Option<Square> {
            if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
                return None;
            }
            Some(((b'8' - rank) as usize, (file - b'a') as usize))
        };
        Some(Move {
            from: square(bytes[0], bytes[1])?,
            to: square(bytes[2], bytes[3])?,
        })
    }
}
