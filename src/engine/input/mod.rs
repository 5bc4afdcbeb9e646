//! Input handling module
//! This module turns keyboard, mouse and focus events into game actions.

pub mod handler;

pub use handler::{GameInput, InputHandler, MoveCommand};
