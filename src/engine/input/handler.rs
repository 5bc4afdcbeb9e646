use std::collections::HashSet;

use glam::Vec2;
use log::debug;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window};

/// Discrete actions triggered by a single key or button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    /// Enter: leave the title screen.
    Confirm,
    /// F1: show or hide the help screen.
    ToggleHelp,
    /// Escape.
    Quit,
    /// F2: log the player position.
    DebugDump,
    /// Left mouse button: try to pick up an egg.
    Fire,
}

/// Movement keys held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveCommand {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl MoveCommand {
    pub fn is_moving(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

#[derive(Default)]
pub struct InputHandler {
    pressed_keys: HashSet<KeyCode>,
    mouse_delta: (f64, f64),
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks held keys and returns the action for a fresh press. Auto-repeat
    /// presses of a key that is already down produce nothing.
    pub fn handle_keyboard_input_event(&mut self, keycode: KeyCode, pressed: bool) -> Option<GameInput> {
        if !pressed {
            self.pressed_keys.remove(&keycode);
            return None;
        }
        if !self.pressed_keys.insert(keycode) {
            return None;
        }
        match keycode {
            KeyCode::Enter | KeyCode::NumpadEnter => Some(GameInput::Confirm),
            KeyCode::F1 => Some(GameInput::ToggleHelp),
            KeyCode::Escape => Some(GameInput::Quit),
            KeyCode::F2 => Some(GameInput::DebugDump),
            _ => None,
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) -> Option<GameInput> {
        match (button, pressed) {
            (MouseButton::Left, true) => Some(GameInput::Fire),
            _ => None,
        }
    }

    pub fn handle_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0;
        self.mouse_delta.1 += delta.1;
    }

    /// Mouse movement accumulated since the previous call.
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        let (x, y) = std::mem::take(&mut self.mouse_delta);
        Vec2::new(x as f32, y as f32)
    }

    pub fn movement(&self) -> MoveCommand {
        use KeyCode::*;
        MoveCommand {
            forward: self.pressed_keys.contains(&KeyW),
            back: self.pressed_keys.contains(&KeyS),
            left: self.pressed_keys.contains(&KeyA),
            right: self.pressed_keys.contains(&KeyD),
            run: self.pressed_keys.contains(&ShiftLeft) || self.pressed_keys.contains(&ShiftRight),
        }
    }

    pub fn handle_window_focus(&mut self, focused: bool, window: Option<&Window>) {
        if !focused {
            // Releases are not delivered while unfocused
            self.pressed_keys.clear();
            self.mouse_delta = (0.0, 0.0);
        }
        if let Some(window) = window {
            if focused {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    debug!("Cursor grab unavailable: {e}");
                }
                window.set_cursor_visible(false);
                debug!("Window focused, cursor locked and hidden");
            } else {
                let _ = window.set_cursor_grab(CursorGrabMode::None);
                window.set_cursor_visible(true);
                debug!("Window unfocused, cursor unlocked and visible");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_keys() {
        let mut input = InputHandler::new();
        assert_eq!(input.handle_keyboard_input_event(KeyCode::Enter, true), Some(GameInput::Confirm));
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F1, true), Some(GameInput::ToggleHelp));
        assert_eq!(input.handle_keyboard_input_event(KeyCode::Escape, true), Some(GameInput::Quit));
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F2, true), Some(GameInput::DebugDump));
        assert_eq!(input.handle_keyboard_input_event(KeyCode::KeyQ, true), None);
    }

    #[test]
    fn test_repeat_press_is_ignored() {
        let mut input = InputHandler::new();
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F1, true), Some(GameInput::ToggleHelp));
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F1, true), None);
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F1, false), None);
        assert_eq!(input.handle_keyboard_input_event(KeyCode::F1, true), Some(GameInput::ToggleHelp));
    }

    #[test]
    fn test_movement_flags() {
        let mut input = InputHandler::new();
        input.handle_keyboard_input_event(KeyCode::KeyW, true);
        input.handle_keyboard_input_event(KeyCode::KeyD, true);
        input.handle_keyboard_input_event(KeyCode::ShiftLeft, true);

        let command = input.movement();
        assert!(command.forward && command.right && command.run);
        assert!(!command.back && !command.left);
        assert!(command.is_moving());

        input.handle_keyboard_input_event(KeyCode::KeyW, false);
        input.handle_keyboard_input_event(KeyCode::KeyD, false);
        assert!(!input.movement().is_moving());
    }

    #[test]
    fn test_mouse_delta_drains() {
        let mut input = InputHandler::new();
        input.handle_mouse_motion((3.0, -1.0));
        input.handle_mouse_motion((2.0, 4.0));
        assert_eq!(input.take_mouse_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.take_mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_fire_on_left_press_only() {
        let mut input = InputHandler::new();
        assert_eq!(input.handle_mouse_button(MouseButton::Left, true), Some(GameInput::Fire));
        assert_eq!(input.handle_mouse_button(MouseButton::Left, false), None);
        assert_eq!(input.handle_mouse_button(MouseButton::Right, true), None);
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut input = InputHandler::new();
        input.handle_keyboard_input_event(KeyCode::KeyW, true);
        input.handle_window_focus(false, None);
        assert!(!input.movement().is_moving());
    }
}
