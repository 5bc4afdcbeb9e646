//! Game state management implementation.

use log::info;

use crate::engine::input::GameInput;

/// Primary phase of the game loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Title,
    Play,
    GameOver,
}

/// Phase plus the help overlay flag, which only means something during Play.
#[derive(Debug, Default)]
pub struct GameState {
    phase: Phase,
    help: bool,
    quit: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_help_shown(&self) -> bool {
        self.help
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Applies a key or button action. Returns true when the phase or the
    /// help flag changed.
    pub fn apply(&mut self, input: GameInput) -> bool {
        match (input, self.phase) {
            (GameInput::Quit, _) => {
                self.request_quit();
                false
            }
            (GameInput::Confirm, Phase::Title) => {
                info!("Hunt started");
                self.phase = Phase::Play;
                true
            }
            (GameInput::ToggleHelp, Phase::Play) => {
                self.help = !self.help;
                true
            }
            _ => false,
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Play → GameOver. Does nothing in any other phase, so it happens once.
    pub fn finish(&mut self) -> bool {
        if self.phase != Phase::Play {
            return false;
        }
        info!("All eggs found");
        self.phase = Phase::GameOver;
        self.help = false;
        true
    }

    pub fn movement_allowed(&self) -> bool {
        self.phase == Phase::Play && !self.help
    }

    /// Fire only counts in Play with the help overlay hidden.
    pub fn can_pick_up(&self) -> bool {
        self.movement_allowed()
    }
}
