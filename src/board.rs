use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};

/// A board coordinate as `(row, col)`. Row 0 is Black's back rank, row 7 White's.
pub type Square = (usize, usize);

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const STRAIGHTS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// The 8x8 grid. Pure data plus the movement rules that read it; game flow
/// lives in `Game`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Board {
    pub squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    /// The standard 32-piece starting position.
    pub fn new() -> Self {
        let mut squares = [[None; 8]; 8];

        // Black pieces (rows 0-1)
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            squares[0][col] = Some(Piece::new(kind, Color::Black));
        }
        for sq in &mut squares[1] {
            *sq = Some(Piece::new(PieceType::Pawn, Color::Black));
        }

        // White pieces (rows 6-7)
        for sq in &mut squares[6] {
            *sq = Some(Piece::new(PieceType::Pawn, Color::White));
        }
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            squares[7][col] = Some(Piece::new(kind, Color::White));
        }

        Board { squares }
    }

    fn in_bounds(row: i32, col: i32) -> bool {
        (0..8).contains(&row) && (0..8).contains(&col)
    }

    pub fn is_on_board(sq: Square) -> bool {
        sq.0 < 8 && sq.1 < 8
    }

    /// The occupant of `sq`, or `None` for an empty or off-board square.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        if Self::is_on_board(sq) {
            self.squares[sq.0][sq.1]
        } else {
            None
        }
    }

    /// Place `piece` on `sq`. Off-board squares are left alone and reported
    /// with `false`, mirroring `get`.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> bool {
        if !Self::is_on_board(sq) {
            return false;
        }
        self.squares[sq.0][sq.1] = piece;
        true
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..8usize).flat_map(move |r| {
            (0..8usize).filter_map(move |c| self.squares[r][c].map(|p| ((r, c), p)))
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// A copy of this board with the piece on `from` moved to `to`, replacing
    /// any occupant. The live board is never touched.
    pub fn with_move(&self, from: Square, to: Square) -> Board {
        let mut copy = *self;
        copy.squares[to.0][to.1] = copy.squares[from.0][from.1];
        copy.squares[from.0][from.1] = None;
        copy
    }

    // =========================================================================
    // Pseudo-moves
    // =========================================================================

    /// Destinations the piece on `sq` can reach by its movement rules alone,
    /// ignoring the safety of its own king. Empty for an empty square.
    pub fn pseudo_moves(&self, sq: Square) -> Vec<Square> {
        let mut moves = Vec::new();
        let piece = match self.get(sq) {
            Some(p) => p,
            None => return moves,
        };
        let (row, col) = sq;
        let color = piece.color;

        match piece.piece_type {
            PieceType::Pawn => self.generate_pawn_moves(row, col, color, &mut moves),
            PieceType::Knight => self.generate_step_moves(row, col, color, &KNIGHT_OFFSETS, &mut moves),
            PieceType::Bishop => self.generate_sliding_moves(row, col, color, &DIAGONALS, &mut moves),
            PieceType::Rook => self.generate_sliding_moves(row, col, color, &STRAIGHTS, &mut moves),
            PieceType::Queen => {
                self.generate_sliding_moves(row, col, color, &DIAGONALS, &mut moves);
                self.generate_sliding_moves(row, col, color, &STRAIGHTS, &mut moves);
            }
            PieceType::King => self.generate_step_moves(row, col, color, &KING_OFFSETS, &mut moves),
        }

        moves
    }

    fn generate_pawn_moves(&self, row: usize, col: usize, color: Color, moves: &mut Vec<Square>) {
        let dir = color.pawn_direction();
        let forward = row as i32 + dir;
        if !Self::in_bounds(forward, col as i32) {
            return;
        }
        let forward = forward as usize;

        // Single push, then double push from the start rank
        if self.squares[forward][col].is_none() {
            moves.push((forward, col));

            if row == color.pawn_start_row() {
                let double = forward as i32 + dir;
                if Self::in_bounds(double, col as i32) && self.squares[double as usize][col].is_none() {
                    moves.push((double as usize, col));
                }
            }
        }

        // Diagonal captures only; no en passant
        for dc in [-1i32, 1] {
            let nc = col as i32 + dc;
            if !Self::in_bounds(forward as i32, nc) {
                continue;
            }
            let target = (forward, nc as usize);
            if self.get(target).map(|p| p.color != color).unwrap_or(false) {
                moves.push(target);
            }
        }
    }

    /// Knight and king: fixed offsets, blocked only by friendly pieces.
    fn generate_step_moves(
        &self,
        row: usize,
        col: usize,
        color: Color,
        offsets: &[(i32, i32)],
        moves: &mut Vec<Square>,
    ) {
        for (dr, dc) in offsets {
            let r = row as i32 + dr;
            let c = col as i32 + dc;
            if !Self::in_bounds(r, c) {
                continue;
            }
            let target = (r as usize, c as usize);
            if self.get(target).map(|p| p.color == color).unwrap_or(false) {
                continue;
            }
            moves.push(target);
        }
    }

    fn generate_sliding_moves(
        &self,
        row: usize,
        col: usize,
        color: Color,
        directions: &[(i32, i32)],
        moves: &mut Vec<Square>,
    ) {
        for (dr, dc) in directions {
            let mut r = row as i32 + dr;
            let mut c = col as i32 + dc;
            while Self::in_bounds(r, c) {
                let target = (r as usize, c as usize);
                if let Some(p) = self.get(target) {
                    if p.color != color {
                        moves.push(target);
                    }
                    break;
                }
                moves.push(target);
                r += dr;
                c += dc;
            }
        }
    }

    // =========================================================================
    // Legality filter
    // =========================================================================

    /// Pseudo-moves of `mover`'s piece on `sq` that do not leave `mover`'s king
    /// attacked. Each candidate is tried on a copy of the board. Empty if `sq`
    /// does not hold a piece of `mover`.
    pub fn legal_moves(&self, sq: Square, mover: Color) -> Vec<Square> {
        match self.get(sq) {
            Some(p) if p.color == mover => {}
            _ => return Vec::new(),
        }
        self.pseudo_moves(sq)
            .into_iter()
            .filter(|&to| !self.with_move(sq, to).is_in_check(mover))
            .collect()
    }

    /// Every legal move of `color`, in row-major board-scan order.
    pub fn all_legal_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in self.pieces() {
            if piece.color != color {
                continue;
            }
            moves.extend(self.legal_moves(from, color).into_iter().map(|to| Move::new(from, to)));
        }
        moves
    }

    pub fn has_legal_move(&self, color: Color) -> bool {
        self.pieces()
            .filter(|(_, p)| p.color == color)
            .any(|(from, _)| !self.legal_moves(from, color).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(board: &mut Board, sq: Square, kind: PieceType, color: Color) {
        board.set(sq, Some(Piece::new(kind, color)));
    }

    fn sorted(mut v: Vec<Square>) -> Vec<Square> {
        v.sort();
        v
    }

    #[test]
    fn starting_position_has_32_pieces_and_twenty_moves_each() {
        let board = Board::new();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.find_king(Color::White), Some((7, 4)));
        assert_eq!(board.find_king(Color::Black), Some((0, 4)));
        assert_eq!(board.all_legal_moves(Color::White).len(), 20);
        assert_eq!(board.all_legal_moves(Color::Black).len(), 20);
    }

    #[test]
    fn empty_square_has_no_moves() {
        let board = Board::new();
        assert!(board.pseudo_moves((4, 4)).is_empty());
        assert!(board.legal_moves((4, 4), Color::White).is_empty());
    }

    #[test]
    fn pawn_single_and_double_push_from_start() {
        let board = Board::new();
        assert_eq!(sorted(board.pseudo_moves((6, 4))), vec![(4, 4), (5, 4)]);
        assert_eq!(sorted(board.pseudo_moves((1, 3))), vec![(2, 3), (3, 3)]);
    }

    #[test]
    fn pawn_double_push_blocked_by_either_square() {
        let mut board = Board::new();
        place(&mut board, (4, 4), PieceType::Knight, Color::Black);
        assert_eq!(board.pseudo_moves((6, 4)), vec![(5, 4)]);

        place(&mut board, (5, 4), PieceType::Knight, Color::Black);
        assert!(board.pseudo_moves((6, 4)).is_empty());
    }

    #[test]
    fn pawn_captures_only_enemies_diagonally() {
        let mut board = Board::empty();
        place(&mut board, (4, 4), PieceType::Pawn, Color::White);
        place(&mut board, (3, 3), PieceType::Rook, Color::Black);
        place(&mut board, (3, 5), PieceType::Rook, Color::White);
        place(&mut board, (3, 4), PieceType::Knight, Color::Black);
        assert_eq!(board.pseudo_moves((4, 4)), vec![(3, 3)]);
    }

    #[test]
    fn knight_in_corner_and_centre() {
        let mut board = Board::empty();
        place(&mut board, (0, 0), PieceType::Knight, Color::White);
        place(&mut board, (4, 4), PieceType::Knight, Color::White);
        assert_eq!(sorted(board.pseudo_moves((0, 0))), vec![(1, 2), (2, 1)]);
        assert_eq!(board.pseudo_moves((4, 4)).len(), 8);
    }

    #[test]
    fn sliding_rays_stop_at_first_blocker() {
        let mut board = Board::empty();
        place(&mut board, (4, 4), PieceType::Rook, Color::White);
        place(&mut board, (4, 6), PieceType::Pawn, Color::Black);
        place(&mut board, (2, 4), PieceType::Pawn, Color::White);
        let moves = board.pseudo_moves((4, 4));

        assert!(moves.contains(&(4, 5)));
        assert!(moves.contains(&(4, 6)), "enemy blocker is capturable");
        assert!(!moves.contains(&(4, 7)), "nothing beyond the blocker");
        assert!(moves.contains(&(3, 4)));
        assert!(!moves.contains(&(2, 4)), "friendly blocker excluded");
        assert!(!moves.contains(&(1, 4)));
        assert_eq!(moves.len(), 2 + 1 + 4 + 3);
    }

    #[test]
    fn queen_is_union_of_bishop_and_rook() {
        let mut board = Board::empty();
        place(&mut board, (3, 3), PieceType::Queen, Color::Black);
        let queen = sorted(board.pseudo_moves((3, 3)));

        place(&mut board, (3, 3), PieceType::Bishop, Color::Black);
        let mut union = board.pseudo_moves((3, 3));
        place(&mut board, (3, 3), PieceType::Rook, Color::Black);
        union.extend(board.pseudo_moves((3, 3)));

        assert_eq!(queen, sorted(union));
        assert_eq!(queen.len(), 27);
    }

    #[test]
    fn pseudo_moves_never_land_on_friendly_pieces() {
        let board = Board::new();
        for (sq, piece) in board.pieces() {
            for to in board.pseudo_moves(sq) {
                assert!(
                    board.get(to).map(|p| p.color != piece.color).unwrap_or(true),
                    "{sq:?} -> {to:?} lands on a friendly piece"
                );
            }
        }
    }

    #[test]
    fn pinned_piece_cannot_leave_the_pin_line() {
        let mut board = Board::empty();
        place(&mut board, (7, 4), PieceType::King, Color::White);
        place(&mut board, (6, 4), PieceType::Bishop, Color::White);
        place(&mut board, (0, 4), PieceType::Rook, Color::Black);
        place(&mut board, (0, 0), PieceType::King, Color::Black);

        assert!(!board.pseudo_moves((6, 4)).is_empty());
        assert!(board.legal_moves((6, 4), Color::White).is_empty());
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let mut board = Board::empty();
        place(&mut board, (7, 4), PieceType::King, Color::White);
        place(&mut board, (0, 3), PieceType::Rook, Color::Black);
        place(&mut board, (0, 7), PieceType::King, Color::Black);
        let moves = board.legal_moves((7, 4), Color::White);
        assert!(!moves.contains(&(7, 3)));
        assert!(!moves.contains(&(6, 3)));
        assert!(moves.contains(&(6, 4)));
    }

    #[test]
    fn legal_moves_empty_for_opponent_piece() {
        let board = Board::new();
        assert!(board.legal_moves((1, 0), Color::White).is_empty());
    }

    #[test]
    fn with_move_leaves_original_untouched() {
        let board = Board::new();
        let moved = board.with_move((6, 4), (4, 4));
        assert_eq!(board, Board::new());
        assert_eq!(moved.get((6, 4)), None);
        assert_eq!(moved.get((4, 4)), Some(Piece::new(PieceType::Pawn, Color::White)));
    }

    #[test]
    fn set_ignores_off_board_squares() {
        let mut board = Board::empty();
        let queen = Some(Piece::new(PieceType::Queen, Color::White));
        assert!(!board.set((8, 0), queen));
        assert!(!board.set((3, 8), queen));
        assert_eq!(board, Board::empty());
        assert!(board.set((7, 7), queen));
        assert_eq!(board.get((7, 7)), queen);
    }
}
