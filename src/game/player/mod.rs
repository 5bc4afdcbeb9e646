//! First-person player controller.

pub mod player;

pub use player::Player;
