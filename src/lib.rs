pub mod attacks;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod moves;
pub mod piece;

#[cfg(not(target_arch = "wasm32"))]
pub mod clock;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
