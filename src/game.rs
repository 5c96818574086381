// =============================================================================
// Game state machine
//
// Owns the live board, whose turn it is, the UI selection, pending pawn
// promotion, both clocks and the move history. Every mutating entry point
// validates first and only then touches state, so a rejected call leaves the
// game exactly as it was.
//
// Status after each committed move or promotion is derived for the side now
// to move: no legal moves + in check = checkmate, no legal moves otherwise =
// stalemate. Checkmate, stalemate and timeout are terminal.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, Square};
use crate::config::GameConfig;
use crate::error::{RuleError, RuleResult};
use crate::moves::{HistoryEntry, Move};
use crate::piece::{Color, Piece, PieceType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Check,
    Checkmate,
    Stalemate,
    Timeout,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Timeout)
    }
}

/// A pawn sitting on its far rank waiting for a replacement kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPromotion {
    pub square: Square,
    pub color: Color,
}

/// Result of an accepted `commit_move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The turn passed to the other side.
    Completed,
    /// A pawn reached its far rank; `promote` must be called before play continues.
    PromotionPending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// An own piece is now selected.
    Selected,
    /// The selected square was clicked again and the selection cleared.
    Deselected,
    /// The click completed a move from the selected square.
    Moved(MoveOutcome),
    /// The click attempted a move that was rejected. State is unchanged.
    Rejected(RuleError),
    /// Nothing selected and the click was not on an own piece.
    Ignored,
}

/// Result of one clock tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockTick {
    /// One second was taken from the side to move.
    Running,
    /// The side to move ran out of time; status is now `Timeout`.
    Expired,
    /// The tick had no effect: the game is over or the clock was stopped.
    Stopped,
}

#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    current_player: Color,
    selected: Option<Square>,
    valid_moves: Vec<Square>,
    history: Vec<HistoryEntry>,
    status: GameStatus,
    winner: Option<Color>,
    pending_promotion: Option<PendingPromotion>,
    white_time: u32,
    black_time: u32,
    config: GameConfig,
    clock_epoch: u64,
    clock_running: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::with_config(&GameConfig::default())
    }
}

impl Game {
    /// A fresh game in the starting position with `time_limit_secs` on each clock.
    pub fn new(time_limit_secs: u32) -> Self {
        Self::with_config(&GameConfig::with_time_limit(time_limit_secs))
    }

    pub fn with_config(config: &GameConfig) -> Self {
        Game {
            board: Board::new(),
            current_player: Color::White,
            selected: None,
            valid_moves: Vec::new(),
            history: Vec::new(),
            status: GameStatus::Playing,
            winner: None,
            pending_promotion: None,
            white_time: config.time_limit_secs,
            black_time: config.time_limit_secs,
            config: config.clone(),
            clock_epoch: 0,
            clock_running: false,
        }
    }

    /// Start from an arbitrary position with `to_move` on turn. The position
    /// must hold exactly one king per color. Status is derived immediately.
    pub fn from_position(board: Board, to_move: Color, config: &GameConfig) -> RuleResult<Self> {
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces()
                .filter(|(_, p)| p.color == color && p.piece_type == PieceType::King)
                .count();
            if kings != 1 {
                return Err(RuleError::KingCount { color, count: kings });
            }
        }
        let mut game = Self::with_config(config);
        game.board = board;
        game.current_player = to_move;
        game.refresh_status();
        Ok(game)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_in_check(&self) -> bool {
        self.board.is_in_check(self.current_player)
    }

    pub fn selected_square(&self) -> Option<Square> {
        self.selected
    }

    /// Legal destinations of the selected piece.
    pub fn valid_moves(&self) -> &[Square] {
        &self.valid_moves
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(HistoryEntry::as_move)
    }

    /// Kinds of the pieces `color` has captured, in capture order.
    pub fn captured_by(&self, color: Color) -> Vec<PieceType> {
        self.history
            .iter()
            .filter_map(|h| h.captured)
            .filter(|p| p.color != color)
            .map(|p| p.piece_type)
            .collect()
    }

    pub fn time_left(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_time,
            Color::Black => self.black_time,
        }
    }

    pub fn time_limit(&self) -> u32 {
        self.config.time_limit_secs
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Legal destinations from `sq`, or nothing if `sq` does not hold a piece
    /// of the side to move or the game is not accepting moves.
    pub fn valid_moves_for(&self, sq: Square) -> Vec<Square> {
        if self.ensure_accepting_moves().is_err() {
            return Vec::new();
        }
        self.board.legal_moves(sq, self.current_player)
    }

    /// Every legal move of the side to move, in board-scan order.
    pub fn all_legal_moves(&self) -> Vec<Move> {
        self.board.all_legal_moves(self.current_player)
    }

    // =========================================================================
    // Moves
    // =========================================================================

    fn ensure_accepting_moves(&self) -> RuleResult<()> {
        if self.status.is_terminal() {
            return Err(RuleError::GameOver);
        }
        if self.pending_promotion.is_some() {
            return Err(RuleError::PromotionPending);
        }
        Ok(())
    }

    /// UI click on `sq`. Re-clicking the selection clears it, clicking an own
    /// piece selects it, and any other click with a selection tries to move there.
    pub fn select(&mut self, sq: Square) -> SelectOutcome {
        if self.selected == Some(sq) {
            self.clear_selection();
            return SelectOutcome::Deselected;
        }

        match self.board.get(sq) {
            Some(p) if p.color == self.current_player => {
                self.selected = Some(sq);
                self.valid_moves = self.valid_moves_for(sq);
                SelectOutcome::Selected
            }
            _ => match self.selected {
                Some(from) => match self.commit_move(from, sq) {
                    Ok(outcome) => SelectOutcome::Moved(outcome),
                    Err(err) => SelectOutcome::Rejected(err),
                },
                None => SelectOutcome::Ignored,
            },
        }
    }

    /// Validate and play `from -> to` for the side to move.
    pub fn commit_move(&mut self, from: Square, to: Square) -> RuleResult<MoveOutcome> {
        self.ensure_accepting_moves()?;
        for sq in [from, to] {
            if !Board::is_on_board(sq) {
                return Err(RuleError::OffBoard(sq));
            }
        }
        let piece = self.board.get(from).ok_or(RuleError::NoPiece(from))?;
        if piece.color != self.current_player {
            return Err(RuleError::WrongColor {
                square: from,
                color: piece.color,
                to_move: self.current_player,
            });
        }
        if !self.board.legal_moves(from, piece.color).contains(&to) {
            return Err(RuleError::IllegalDestination { from, to });
        }

        let captured = self.board.get(to);
        self.history.push(HistoryEntry { from, to, captured });
        self.board = self.board.with_move(from, to);
        debug!(
            color = %piece.color,
            piece = %piece.piece_type,
            mv = %Move::new(from, to).to_uci(),
            captured = ?captured.map(|p| p.piece_type),
            "move committed"
        );

        if piece.piece_type == PieceType::Pawn && to.0 == piece.color.promotion_row() {
            self.pending_promotion = Some(PendingPromotion { square: to, color: piece.color });
            self.clear_selection();
            debug!(square = ?to, color = %piece.color, "promotion pending");
            return Ok(MoveOutcome::PromotionPending);
        }

        self.end_turn();
        Ok(MoveOutcome::Completed)
    }

    /// Resolve the pending promotion on `sq` to `kind` and pass the turn.
    pub fn promote(&mut self, sq: Square, kind: PieceType) -> RuleResult<()> {
        if self.status.is_terminal() {
            return Err(RuleError::GameOver);
        }
        match self.pending_promotion {
            Some(pending) if pending.square == sq => {}
            _ => return Err(RuleError::NoPendingPromotion(sq)),
        }
        let pawn = self
            .board
            .get(sq)
            .filter(|p| p.piece_type == PieceType::Pawn)
            .ok_or(RuleError::NotAPawn(sq))?;
        if !kind.is_promotion_target() {
            return Err(RuleError::InvalidPromotion(kind));
        }

        self.board.set(sq, Some(Piece::new(kind, pawn.color)));
        self.pending_promotion = None;
        debug!(square = ?sq, color = %pawn.color, kind = %kind, "pawn promoted");
        self.end_turn();
        Ok(())
    }

    fn end_turn(&mut self) {
        self.current_player = self.current_player.opposite();
        self.clear_selection();
        self.refresh_status();
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.valid_moves.clear();
    }

    /// Re-derive status and winner for the side to move.
    fn refresh_status(&mut self) {
        let mover = self.current_player;
        let in_check = self.board.is_in_check(mover);
        let can_move = self.board.has_legal_move(mover);

        let (status, winner) = match (can_move, in_check) {
            (false, true) => (GameStatus::Checkmate, Some(mover.opposite())),
            (false, false) => (GameStatus::Stalemate, None),
            (true, true) => (GameStatus::Check, None),
            (true, false) => (GameStatus::Playing, None),
        };
        if status != self.status {
            debug!(?status, to_move = %mover, "status changed");
        }
        self.status = status;
        self.winner = winner;

        if status.is_terminal() {
            self.clock_running = false;
            info!(?status, winner = ?winner, moves = self.history.len(), "game over");
        }
    }

    /// Back to the starting position with full clocks. Also stops the clock.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_player = Color::White;
        self.clear_selection();
        self.history.clear();
        self.status = GameStatus::Playing;
        self.winner = None;
        self.pending_promotion = None;
        self.white_time = self.config.time_limit_secs;
        self.black_time = self.config.time_limit_secs;
        self.stop_clock();
        debug!(time_limit = self.config.time_limit_secs, "game reset");
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Arm the clock and return the epoch the driver must present on each tick.
    /// Any previously armed epoch becomes stale.
    pub fn start_clock(&mut self) -> u64 {
        self.clock_epoch += 1;
        self.clock_running = true;
        self.clock_epoch
    }

    pub fn stop_clock(&mut self) {
        self.clock_running = false;
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock_running
    }

    /// Take one second from the side to move. Reaching zero ends the game with
    /// `Timeout` and no winner.
    pub fn tick_clock(&mut self) -> ClockTick {
        if self.status.is_terminal() {
            self.clock_running = false;
            return ClockTick::Stopped;
        }
        let remaining = match self.current_player {
            Color::White => &mut self.white_time,
            Color::Black => &mut self.black_time,
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return ClockTick::Running;
        }

        self.status = GameStatus::Timeout;
        self.clock_running = false;
        info!(flagged = %self.current_player, "clock expired");
        ClockTick::Expired
    }

    /// A tick from a driver armed with `epoch`. Ticks from a stopped or
    /// superseded driver are ignored.
    pub fn tick_clock_for(&mut self, epoch: u64) -> ClockTick {
        if !self.clock_running || epoch != self.clock_epoch {
            return ClockTick::Stopped;
        }
        self.tick_clock()
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            squares: self.board.squares,
            current_player: self.current_player,
            status: self.status,
            winner: self.winner,
            in_check: self.is_in_check(),
            selected: self.selected,
            valid_moves: self.valid_moves.clone(),
            pending_promotion: self.pending_promotion,
            white_time: self.white_time,
            black_time: self.black_time,
            history: self.history.clone(),
            last_move: self.last_move(),
            captured_by_white: self.captured_by(Color::White),
            captured_by_black: self.captured_by(Color::Black),
        }
    }
}

/// Everything a host UI needs to draw the game, as one serializable value.
#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot {
    pub squares: [[Option<Piece>; 8]; 8],
    pub current_player: Color,
    pub status: GameStatus,
    pub winner: Option<Color>,
    pub in_check: bool,
    pub selected: Option<Square>,
    pub valid_moves: Vec<Square>,
    pub pending_promotion: Option<PendingPromotion>,
    pub white_time: u32,
    pub black_time: u32,
    pub history: Vec<HistoryEntry>,
    pub last_move: Option<Move>,
    pub captured_by_white: Vec<PieceType>,
    pub captured_by_black: Vec<PieceType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(board: &mut Board, sq: Square, kind: PieceType, color: Color) {
        board.set(sq, Some(Piece::new(kind, color)));
    }

    /// White to move: Ra1 can deliver a back-rank mate on row 0.
    fn back_rank_position() -> Game {
        let mut board = Board::empty();
        place(&mut board, (7, 4), PieceType::King, Color::White);
        place(&mut board, (7, 0), PieceType::Rook, Color::White);
        place(&mut board, (0, 7), PieceType::King, Color::Black);
        place(&mut board, (1, 6), PieceType::Pawn, Color::Black);
        place(&mut board, (1, 7), PieceType::Pawn, Color::Black);
        Game::from_position(board, Color::White, &GameConfig::default()).expect("valid position")
    }

    #[test]
    fn new_game_starts_white_playing_with_full_clocks() {
        let game = Game::new(120);
        assert_eq!(game.current_player(), Color::White);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.time_left(Color::White), 120);
        assert_eq!(game.time_left(Color::Black), 120);
        assert!(game.history().is_empty());
        assert_eq!(Game::default().time_limit(), 300);
    }

    #[test]
    fn king_pawn_push_is_accepted() {
        let mut game = Game::default();
        assert_eq!(game.commit_move((6, 4), (4, 4)), Ok(MoveOutcome::Completed));
        assert_eq!(game.piece_at((6, 4)), None);
        assert_eq!(game.piece_at((4, 4)), Some(Piece::new(PieceType::Pawn, Color::White)));
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn rejected_moves_leave_state_untouched() {
        let mut game = Game::default();
        let before = game.snapshot();

        assert_eq!(game.commit_move((4, 4), (3, 4)), Err(RuleError::NoPiece((4, 4))));
        assert!(matches!(game.commit_move((1, 4), (3, 4)), Err(RuleError::WrongColor { .. })));
        assert_eq!(
            game.commit_move((6, 4), (3, 4)),
            Err(RuleError::IllegalDestination { from: (6, 4), to: (3, 4) })
        );
        assert_eq!(game.commit_move((6, 4), (8, 4)), Err(RuleError::OffBoard((8, 4))));

        let after = game.snapshot();
        assert_eq!(after.squares, before.squares);
        assert_eq!(after.history, before.history);
        assert_eq!(after.current_player, before.current_player);
        assert_eq!(after.status, before.status);
    }

    #[test]
    fn select_toggles_and_moves() {
        let mut game = Game::default();
        assert_eq!(game.select((4, 4)), SelectOutcome::Ignored);

        assert_eq!(game.select((6, 4)), SelectOutcome::Selected);
        assert_eq!(game.selected_square(), Some((6, 4)));
        assert_eq!(game.valid_moves().len(), 2);

        assert_eq!(game.select((6, 4)), SelectOutcome::Deselected);
        assert_eq!(game.selected_square(), None);
        assert!(game.valid_moves().is_empty());

        game.select((7, 6));
        assert_eq!(game.select((6, 3)), SelectOutcome::Selected, "own piece switches selection");
        assert_eq!(game.select((4, 3)), SelectOutcome::Moved(MoveOutcome::Completed));
        assert_eq!(game.selected_square(), None);
        assert_eq!(game.current_player(), Color::Black);
    }

    #[test]
    fn select_with_illegal_target_keeps_selection() {
        let mut game = Game::default();
        game.select((6, 4));
        let outcome = game.select((3, 4));
        assert!(matches!(outcome, SelectOutcome::Rejected(RuleError::IllegalDestination { .. })));
        assert_eq!(game.selected_square(), Some((6, 4)));
        assert_eq!(game.current_player(), Color::White);
    }

    #[test]
    fn back_rank_mate_sets_winner() {
        let mut game = back_rank_position();
        assert_eq!(game.status(), GameStatus::Playing);
        game.commit_move((7, 0), (0, 0)).expect("rook lift is legal");
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert_eq!(game.winner(), Some(Color::White));
        assert!(game.is_over());
        assert_eq!(game.commit_move((1, 6), (2, 6)), Err(RuleError::GameOver));
    }

    #[test]
    fn check_is_reported_when_escape_exists() {
        let mut board = Board::empty();
        place(&mut board, (7, 4), PieceType::King, Color::White);
        place(&mut board, (7, 0), PieceType::Rook, Color::White);
        place(&mut board, (0, 7), PieceType::King, Color::Black);
        let mut game = Game::from_position(board, Color::White, &GameConfig::default()).unwrap();
        game.commit_move((7, 0), (0, 0)).unwrap();
        assert_eq!(game.status(), GameStatus::Check);
        assert_eq!(game.winner(), None);
        assert!(game.is_in_check());
    }

    #[test]
    fn queen_move_into_stalemate() {
        let mut board = Board::empty();
        place(&mut board, (0, 0), PieceType::King, Color::Black);
        place(&mut board, (2, 5), PieceType::Queen, Color::White);
        place(&mut board, (7, 7), PieceType::King, Color::White);
        let mut game = Game::from_position(board, Color::White, &GameConfig::default()).unwrap();

        game.commit_move((2, 5), (2, 1)).unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn promotion_holds_the_turn_until_resolved() {
        let mut game = back_rank_position();
        let mut board = *game.board();
        board.set((7, 0), None);
        board.set((1, 0), Some(Piece::new(PieceType::Pawn, Color::White)));
        game = Game::from_position(board, Color::White, &GameConfig::default()).unwrap();

        assert_eq!(game.commit_move((1, 0), (0, 0)), Ok(MoveOutcome::PromotionPending));
        assert_eq!(game.current_player(), Color::White);
        assert_eq!(
            game.pending_promotion(),
            Some(PendingPromotion { square: (0, 0), color: Color::White })
        );
        assert_eq!(game.commit_move((7, 4), (6, 4)), Err(RuleError::PromotionPending));
        assert_eq!(game.commit_move((1, 6), (2, 6)), Err(RuleError::PromotionPending));

        assert_eq!(game.promote((0, 1), PieceType::Queen), Err(RuleError::NoPendingPromotion((0, 1))));
        assert_eq!(game.promote((0, 0), PieceType::King), Err(RuleError::InvalidPromotion(PieceType::King)));
        assert_eq!(game.pending_promotion().map(|p| p.square), Some((0, 0)));

        game.promote((0, 0), PieceType::Queen).expect("queen promotion");
        assert_eq!(game.piece_at((0, 0)), Some(Piece::new(PieceType::Queen, Color::White)));
        assert_eq!(game.pending_promotion(), None);
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert_eq!(game.winner(), Some(Color::White));
    }

    #[test]
    fn promote_without_pending_fails() {
        let mut game = Game::default();
        assert_eq!(game.promote((6, 0), PieceType::Queen), Err(RuleError::NoPendingPromotion((6, 0))));
        assert_eq!(game.piece_at((6, 0)).map(|p| p.piece_type), Some(PieceType::Pawn));
    }

    #[test]
    fn captures_are_recorded_in_history() {
        let mut game = Game::default();
        game.commit_move((6, 4), (4, 4)).unwrap();
        game.commit_move((1, 3), (3, 3)).unwrap();
        game.commit_move((4, 4), (3, 3)).unwrap();
        let last = game.history().last().copied().unwrap();
        assert_eq!(last.captured, Some(Piece::new(PieceType::Pawn, Color::Black)));
        assert_eq!(game.captured_by(Color::White), vec![PieceType::Pawn]);
        assert!(game.captured_by(Color::Black).is_empty());
    }

    #[test]
    fn clock_ticks_the_side_to_move_and_times_out_without_winner() {
        let mut game = Game::new(2);
        assert_eq!(game.tick_clock(), ClockTick::Running);
        assert_eq!(game.time_left(Color::White), 1);
        assert_eq!(game.time_left(Color::Black), 2);

        assert_eq!(game.tick_clock(), ClockTick::Expired);
        assert_eq!(game.time_left(Color::White), 0);
        assert_eq!(game.status(), GameStatus::Timeout);
        assert_eq!(game.winner(), None);

        assert_eq!(game.tick_clock(), ClockTick::Stopped);
        assert_eq!(game.commit_move((6, 4), (4, 4)), Err(RuleError::GameOver));
    }

    #[test]
    fn stale_clock_epochs_are_ignored() {
        let mut game = Game::new(10);
        let first = game.start_clock();
        let second = game.start_clock();
        assert_eq!(game.tick_clock_for(first), ClockTick::Stopped);
        assert_eq!(game.tick_clock_for(second), ClockTick::Running);

        game.stop_clock();
        game.stop_clock();
        assert_eq!(game.tick_clock_for(second), ClockTick::Stopped);
        assert_eq!(game.time_left(Color::White), 9);
    }

    #[test]
    fn reset_restores_everything_and_stops_clock() {
        let mut game = Game::new(30);
        game.start_clock();
        game.commit_move((6, 4), (4, 4)).unwrap();
        game.tick_clock();
        game.select((1, 4));

        game.reset();
        assert_eq!(*game.board(), Board::new());
        assert!(game.history().is_empty());
        assert_eq!(game.current_player(), Color::White);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.selected_square(), None);
        assert_eq!(game.time_left(Color::White), 30);
        assert_eq!(game.time_left(Color::Black), 30);
        assert!(!game.is_clock_running());
    }

    #[test]
    fn from_position_requires_one_king_each() {
        let mut board = Board::empty();
        place(&mut board, (7, 4), PieceType::King, Color::White);
        let err = Game::from_position(board, Color::White, &GameConfig::default()).unwrap_err();
        assert_eq!(err, RuleError::KingCount { color: Color::Black, count: 0 });
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let game = Game::default();
        let json = serde_json::to_value(game.snapshot()).expect("snapshot serializes");
        assert_eq!(json["current_player"], "White");
        assert_eq!(json["status"], "Playing");
        assert_eq!(json["white_time"], 300);
    }
}
