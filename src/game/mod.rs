//! Game-specific logic and features.

pub mod hunt;
pub mod player;
pub mod state;
pub mod world;

// Re-export commonly used types
pub use hunt::{Hunt, HuntEvent};
pub use world::{App, Camera, Level};
