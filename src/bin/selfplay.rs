use chess_rules::engine::{choose_move, Difficulty};
use chess_rules::game::Game;
use chess_rules::piece::Color;
use tracing::info;

const MAX_PLIES: u32 = 200;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut game = Game::default();
    let mut plies = 0;

    while !game.is_over() && plies < MAX_PLIES {
        let color = game.current_player();
        let difficulty = match color {
            Color::White => Difficulty::Normal,
            Color::Black => Difficulty::Hard,
        };
        match choose_move(&mut game, color, difficulty) {
            Some(mv) => {
                plies += 1;
                info!(ply = plies, %color, %difficulty, mv = %mv.to_uci(), "move");
            }
            None => break,
        }
    }

    let winner = game.winner().map(|c| c.to_string()).unwrap_or_else(|| "none".to_string());
    eprintln!("Game over after {plies} plies: {:?}, winner {winner}", game.status());
}
