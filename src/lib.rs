//! Library entry point for the egg hunt.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;

// Re-export main types for convenience
pub use config::{Cli, GameConfig};
pub use error::{GameError, Result};
pub use game::App;
