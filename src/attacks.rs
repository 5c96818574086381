// =============================================================================
// Attack detection
//
// Works on any `Board` value, including the simulated copies the legality
// filter and the bot build for what-if questions.
// =============================================================================

use crate::board::{Board, Square};
use crate::piece::{Color, Piece, PieceType};

impl Board {
    /// True iff any piece of the side opposing `defender` can reach `sq` by its
    /// raw capture pattern. King safety of the attacker is not considered.
    pub fn is_attacked(&self, sq: Square, defender: Color) -> bool {
        let attacker = defender.opposite();
        self.pieces()
            .filter(|(_, p)| p.color == attacker)
            .any(|(from, p)| self.can_attack(from, sq, p))
    }

    /// Whether `piece`, standing on `from`, attacks `to` on this board.
    /// Occupancy of `from` and `to` is not consulted, only the squares between.
    pub fn can_attack(&self, from: Square, to: Square, piece: Piece) -> bool {
        if from == to {
            return false;
        }
        let dr = to.0 as i32 - from.0 as i32;
        let dc = to.1 as i32 - from.1 as i32;

        match piece.piece_type {
            PieceType::Pawn => dr == piece.color.pawn_direction() && dc.abs() == 1,
            PieceType::Knight => matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1)),
            PieceType::King => dr.abs() <= 1 && dc.abs() <= 1,
            PieceType::Bishop => dr.abs() == dc.abs() && self.line_is_clear(from, to),
            PieceType::Rook => (dr == 0 || dc == 0) && self.line_is_clear(from, to),
            PieceType::Queen => {
                (dr.abs() == dc.abs() || dr == 0 || dc == 0) && self.line_is_clear(from, to)
            }
        }
    }

    /// No occupied square strictly between `from` and `to`. The two squares
    /// must share a row, column or diagonal.
    fn line_is_clear(&self, from: Square, to: Square) -> bool {
        let dr = (to.0 as i32 - from.0 as i32).signum();
        let dc = (to.1 as i32 - from.1 as i32).signum();
        let mut r = from.0 as i32 + dr;
        let mut c = from.1 as i32 + dc;
        while (r, c) != (to.0 as i32, to.1 as i32) {
            if self.squares[r as usize][c as usize].is_some() {
                return false;
            }
            r += dr;
            c += dc;
        }
        true
    }

    /// Whether `color`'s king is attacked. A board without that king (only
    /// possible in hand-built positions) reports no check.
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.is_attacked(king, color),
            None => false,
        }
    }
}
