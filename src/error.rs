//! Error types shared by the engine layer and the game.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while starting or running the hunt.
#[derive(Error, Debug)]
pub enum GameError {
    /// The configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// File that was being read.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The level document is not valid RON for a level.
    #[error("level parse error: {0}")]
    LevelParse(#[from] ron::error::SpannedError),

    /// The level parsed but describes something we cannot build.
    #[error("level validation error: {0}")]
    LevelValidation(String),

    /// A model file could not be imported.
    #[error("failed to load model {path}: {reason}")]
    Model {
        path: PathBuf,
        reason: String,
    },

    /// A texture file could not be decoded.
    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image and alpha map of one texture differ in size.
    #[error("alpha map {alpha} is {found:?}, expected {expected:?}")]
    AlphaMismatch {
        alpha: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// A sound file is missing or not a PCM WAV we can play.
    #[error("failed to load sound {path}: {reason}")]
    Sound {
        path: PathBuf,
        reason: String,
    },

    /// The audio output stream could not be opened.
    #[error("audio output unavailable: {0}")]
    Audio(String),

    /// Window, surface, adapter or device creation failed.
    #[error("graphics initialization failed: {0}")]
    Graphics(String),

    /// The swap chain could not hand out a frame.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, GameError>;
