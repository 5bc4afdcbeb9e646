//! The rules of the hunt, free of any window, GPU or audio handle.
//!
//! `Hunt` owns the phase machine and the eggs. The application feeds it
//! actions and frame times and reacts to the events it returns.

use std::time::Instant;

use glam::Vec3;
use log::info;

use crate::engine::graphics::Frustum;
use crate::engine::input::GameInput;
use crate::game::state::{GameState, Phase};
use crate::game::world::collectible::{EggField, EggParams};
use crate::game::world::geometry::Ray;
use crate::game::world::level::Level;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HuntEvent {
    Started,
    HelpToggled(bool),
    EggCollected { index: usize, position: Vec3 },
    Won,
    Quit,
}

pub struct Hunt {
    state: GameState,
    eggs: EggField,
    started: Instant,
}

impl Hunt {
    /// `model_radius` is the bounding radius of the egg mesh as loaded.
    pub fn new(level: &Level, model_radius: f32, now: Instant) -> Self {
        let params = EggParams::from_level(level, model_radius);
        Self {
            state: GameState::new(),
            eggs: EggField::new(level, params),
            started: now,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn eggs(&self) -> &EggField {
        &self.eggs
    }

    /// Seconds since the hunt was created; drives bob and spin.
    pub fn elapsed(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.started).as_secs_f32()
    }

    /// Applies one action from the player standing at `position` looking
    /// along `heading`.
    pub fn handle(&mut self, input: GameInput, position: Vec3, heading: Vec3, now: Instant) -> Vec<HuntEvent> {
        let mut events = Vec::new();
        match input {
            GameInput::Fire => {
                if !self.state.can_pick_up() {
                    return events;
                }
                let ray = Ray::new(position, heading);
                for index in self.eggs.try_pickup(&ray, position, now) {
                    let position = self.eggs.eggs()[index].position;
                    events.push(HuntEvent::EggCollected { index, position });
                }
                if self.eggs.all_collected() && self.state.finish() {
                    events.push(HuntEvent::Won);
                }
            }
            GameInput::DebugDump => {
                info!(
                    "Player at ({:.1}, {:.1}, {:.1}) heading ({:.3}, {:.3}, {:.3})",
                    position.x, position.y, position.z, heading.x, heading.y, heading.z
                );
            }
            other => {
                let before = self.state.phase();
                if self.state.apply(other) {
                    if before == Phase::Title && self.state.phase() == Phase::Play {
                        events.push(HuntEvent::Started);
                    } else if other == GameInput::ToggleHelp {
                        events.push(HuntEvent::HelpToggled(self.state.is_help_shown()));
                    }
                }
                if self.state.should_quit() {
                    events.push(HuntEvent::Quit);
                }
            }
        }
        events
    }

    /// Window close or any other quit that did not come from a key.
    pub fn request_quit(&mut self) {
        self.state.request_quit();
    }

    /// Bobs the eggs for this frame and records which are in view.
    pub fn animate(&mut self, now: Instant, frustum: &Frustum) {
        let t = self.elapsed(now);
        self.eggs.animate(t, frustum);
    }

    /// Expires finished pickup effects and returns where the glitter should
    /// be, if anywhere.
    pub fn update_effects(&mut self, now: Instant) -> Option<Vec3> {
        let origin = self.eggs.effect_origin(now);
        self.eggs.expire_effects(now);
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunt() -> (Hunt, Instant) {
        let now = Instant::now();
        let level = Level::embedded().unwrap();
        (Hunt::new(&level, 10.0, now), now)
    }

    #[test]
    fn test_fire_on_title_does_nothing() {
        let (mut hunt, now) = hunt();
        let events = hunt.handle(GameInput::Fire, Vec3::ZERO, Vec3::Z, now);
        assert!(events.is_empty());
        assert_eq!(hunt.phase(), Phase::Title);
    }

    #[test]
    fn test_start_help_and_quit_events() {
        let (mut hunt, now) = hunt();
        assert_eq!(hunt.handle(GameInput::Confirm, Vec3::ZERO, Vec3::Z, now), vec![HuntEvent::Started]);
        assert_eq!(
            hunt.handle(GameInput::ToggleHelp, Vec3::ZERO, Vec3::Z, now),
            vec![HuntEvent::HelpToggled(true)]
        );
        assert_eq!(hunt.handle(GameInput::Quit, Vec3::ZERO, Vec3::Z, now), vec![HuntEvent::Quit]);
        assert!(hunt.state().should_quit());
    }

    #[test]
    fn test_debug_dump_changes_nothing() {
        let (mut hunt, now) = hunt();
        assert!(hunt.handle(GameInput::DebugDump, Vec3::ONE, Vec3::Z, now).is_empty());
        assert_eq!(hunt.phase(), Phase::Title);
    }

    #[test]
    fn test_elapsed_saturates() {
        let (hunt, now) = hunt();
        assert_eq!(hunt.elapsed(now), 0.0);
    }
}
