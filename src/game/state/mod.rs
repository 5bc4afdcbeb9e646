//! Phase machine: title, play with its help overlay, game over.

pub mod game_state;

pub use game_state::{GameState, Phase};
