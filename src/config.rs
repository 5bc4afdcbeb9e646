//! Start-up preferences: command line flags layered over an optional RON file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Parser, Debug, Default)]
#[command(name = "egg-hunt")]
#[command(about = "A first-person egg hunt in a spring meadow")]
pub struct Cli {
    /// RON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Level file to play instead of the built-in meadow
    #[arg(long)]
    pub level: Option<PathBuf>,

    /// Directory that model, texture and sound paths are relative to
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in borderless fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Disable all sound
    #[arg(long)]
    pub mute: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Egg Hunt".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Radians of turn per pixel of mouse movement.
    pub mouse_sensitivity: f32,
    /// Units per second while walking.
    pub walk_speed: f32,
    /// Units per second while Shift is held.
    pub run_speed: f32,
    pub invert_y: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.002,
            walk_speed: 530.0,
            run_speed: 780.0,
            invert_y: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Scales every voice, 1.0 leaves levels untouched.
    pub master_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub controls: ControlsConfig,
    pub audio: AudioConfig,
    pub assets_dir: PathBuf,
    /// `None` plays the embedded meadow level.
    pub level: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            controls: ControlsConfig::default(),
            audio: AudioConfig::default(),
            assets_dir: PathBuf::from("assets"),
            level: None,
        }
    }
}

impl GameConfig {
    pub fn from_ron_str(source: &str, path: &Path) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| GameError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_ron_str(&source, path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads the file named by `--config` (if any) and applies the remaining flags on top.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.window.width = width;
        }
        if let Some(height) = cli.height {
            self.window.height = height;
        }
        if cli.fullscreen {
            self.window.fullscreen = true;
        }
        if cli.mute {
            self.audio.enabled = false;
        }
        if let Some(assets) = &cli.assets {
            self.assets_dir = assets.clone();
        }
        if let Some(level) = &cli.level {
            self.level = Some(level.clone());
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| GameError::Config {
            path: PathBuf::from("<resolved>"),
            reason: reason.to_string(),
        };
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window size must be non-zero"));
        }
        if !(self.controls.walk_speed > 0.0 && self.controls.run_speed > 0.0) {
            return Err(invalid("movement speeds must be positive"));
        }
        if !(0.0..=4.0).contains(&self.audio.master_volume) {
            return Err(invalid("master volume must be within 0.0..=4.0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let source = "(window: (width: 1920, height: 1080), audio: (enabled: false))";
        let config = GameConfig::from_ron_str(source, Path::new("test.ron")).unwrap();

        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 1080);
        assert_eq!(config.window.title, "Egg Hunt");
        assert!(!config.audio.enabled);
        assert_eq!(config.controls, ControlsConfig::default());
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = GameConfig::default();
        let cli = Cli {
            width: Some(800),
            height: Some(600),
            fullscreen: true,
            mute: true,
            level: Some(PathBuf::from("other.ron")),
            ..Default::default()
        };
        config.apply_cli(&cli);

        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert!(config.window.fullscreen);
        assert!(!config.audio.enabled);
        assert_eq!(config.level, Some(PathBuf::from("other.ron")));
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let err = GameConfig::from_ron_str("(window: 3)", Path::new("bad.ron")).unwrap_err();
        assert!(matches!(err, GameError::Config { .. }));
    }

    #[test]
    fn test_zero_size_rejected() {
        let cli = Cli {
            width: Some(0),
            ..Default::default()
        };
        assert!(GameConfig::resolve(&cli).is_err());
    }
}
