//! Engine module containing audio, graphics, input, and window management.

pub mod audio;
pub mod graphics;
pub mod input;
pub mod window;

// Re-export commonly used types
pub use audio::{AudioEngine, SoundId};
pub use graphics::{renderer::Renderer, texture::Texture, vertex::Vertex};
pub use input::InputHandler;
