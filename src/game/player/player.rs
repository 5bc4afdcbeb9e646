//! Player implementation.

use glam::{Vec2, Vec3};

use crate::config::ControlsConfig;
use crate::engine::input::MoveCommand;
use crate::game::world::camera::Camera;

pub struct Player {
    pub camera: Camera,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
}

impl Player {
    pub fn new(position: Vec3, heading: Vec3, controls: &ControlsConfig) -> Self {
        Self {
            camera: Camera::from_heading(position, heading),
            walk_speed: controls.walk_speed,
            run_speed: controls.run_speed,
            mouse_sensitivity: controls.mouse_sensitivity,
            invert_y: controls.invert_y,
        }
    }

    /// Turns by the mouse delta, then walks along the ground plane. Height
    /// never changes.
    pub fn update(&mut self, delta_time: f32, movement: MoveCommand, mouse_delta: Vec2) {
        let pitch_sign = if self.invert_y { 1.0 } else { -1.0 };
        self.camera.rotate(
            mouse_delta.x * self.mouse_sensitivity,
            pitch_sign * mouse_delta.y * self.mouse_sensitivity,
        );

        let mut direction = Vec3::ZERO;
        if movement.forward {
            direction += self.camera.forward();
        }
        if movement.back {
            direction -= self.camera.forward();
        }
        if movement.right {
            direction += self.camera.right();
        }
        if movement.left {
            direction -= self.camera.right();
        }

        let speed = if movement.run { self.run_speed } else { self.walk_speed };
        self.camera.position += direction.normalize_or_zero() * speed * delta_time;
    }

    pub fn position(&self) -> Vec3 {
        self.camera.position
    }

    pub fn heading(&self) -> Vec3 {
        self.camera.heading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Vec3::new(0.0, 100.0, 0.0), Vec3::Z, &ControlsConfig::default())
    }

    #[test]
    fn test_walk_forward() {
        let mut player = player();
        let forward = MoveCommand {
            forward: true,
            ..Default::default()
        };
        player.update(1.0, forward, Vec2::ZERO);
        assert!(player.position().distance(Vec3::new(0.0, 100.0, 530.0)) < 1e-3);
    }

    #[test]
    fn test_run_and_diagonal() {
        let mut player = player();
        let diagonal = MoveCommand {
            forward: true,
            right: true,
            run: true,
            ..Default::default()
        };
        player.update(0.5, diagonal, Vec2::ZERO);
        let moved = player.position() - Vec3::new(0.0, 100.0, 0.0);
        assert!((moved.length() - 390.0).abs() < 1e-2);
        assert!(moved.x > 0.0 && moved.z > 0.0);
    }

    #[test]
    fn test_height_is_fixed_when_looking_down() {
        let mut player = player();
        player.update(0.0, MoveCommand::default(), Vec2::new(0.0, 500.0));
        assert!(player.heading().y < 0.0);
        let forward = MoveCommand {
            forward: true,
            ..Default::default()
        };
        player.update(1.0, forward, Vec2::ZERO);
        assert_eq!(player.position().y, 100.0);
    }

    #[test]
    fn test_invert_y() {
        let mut player = player();
        player.invert_y = true;
        player.update(0.0, MoveCommand::default(), Vec2::new(0.0, 500.0));
        assert!(player.heading().y > 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut player = player();
        let both = MoveCommand {
            forward: true,
            back: true,
            ..Default::default()
        };
        player.update(1.0, both, Vec2::ZERO);
        assert_eq!(player.position(), Vec3::new(0.0, 100.0, 0.0));
    }
}
