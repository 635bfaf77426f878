//! Device state fed from window events

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::source::{GamepadAxis, InputSource, JoystickId};

/// Pixels of touchpad scrolling counted as one wheel notch
const PIXELS_PER_LINE: f32 = 20.0;

/// Snapshot of keyboard, mouse and gamepad state.
///
/// Window events update it as they arrive; gamepad backends push button and
/// axis values through the setters. Call [`InputState::end_frame`] after the
/// tick's controllers have sampled it.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently pressed keys
    pressed_keys: FxHashSet<KeyCode>,
    /// Currently pressed mouse buttons
    pressed_mouse_buttons: FxHashSet<MouseButton>,
    /// Current mouse position
    mouse_position: Vec2,
    /// Wheel notches this frame
    wheel_delta: f32,
    /// Held buttons per joystick
    joystick_buttons: FxHashMap<JoystickId, FxHashSet<u32>>,
    /// Last reported analog values
    joystick_axes: FxHashMap<(JoystickId, GamepadAxis), f32>,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state (wheel movement)
    pub fn end_frame(&mut self) {
        self.wheel_delta = 0.0;
    }

    /// Feed a window event. Returns `true` if the event was input.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.process_keyboard(code, event.state);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.process_mouse_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.process_scroll(notches);
                true
            }
            _ => false,
        }
    }

    /// Process a keyboard event
    pub fn process_keyboard(&mut self, key_code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed_keys.insert(key_code);
            }
            ElementState::Released => {
                self.pressed_keys.remove(&key_code);
            }
        }
    }

    /// Process a mouse button event
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed_mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.pressed_mouse_buttons.remove(&button);
            }
        }
    }

    /// Process scroll wheel notches
    pub fn process_scroll(&mut self, delta: f32) {
        self.wheel_delta += delta;
    }

    /// Set a joystick button
    pub fn set_joystick_button(&mut self, joystick: JoystickId, button: u32, down: bool) {
        let held = self.joystick_buttons.entry(joystick).or_default();
        if down {
            held.insert(button);
        } else {
            held.remove(&button);
        }
    }

    /// Set a joystick axis, clamped to [-1, 1]
    pub fn set_joystick_axis(&mut self, joystick: JoystickId, axis: GamepadAxis, value: f32) {
        self.joystick_axes
            .insert((joystick, axis), value.clamp(-1.0, 1.0));
    }

    /// Forget a disconnected joystick
    pub fn remove_joystick(&mut self, joystick: JoystickId) {
        self.joystick_buttons.remove(&joystick);
        self.joystick_axes.retain(|(id, _), _| *id != joystick);
    }

    /// Get current mouse position
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}

impl InputSource for InputState {
    fn key_down(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.pressed_mouse_buttons.contains(&button)
    }

    fn mouse_wheel_delta(&self) -> f32 {
        self.wheel_delta
    }

    fn joystick_button_down(&self, joystick: JoystickId, button: u32) -> bool {
        self.joystick_buttons
            .get(&joystick)
            .is_some_and(|held| held.contains(&button))
    }

    fn joystick_axis(&self, joystick: JoystickId, axis: GamepadAxis) -> f32 {
        self.joystick_axes
            .get(&(joystick, axis))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_state() {
        let mut input = InputState::new();

        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        assert!(input.key_down(KeyCode::Space));

        input.process_keyboard(KeyCode::Space, ElementState::Released);
        assert!(!input.key_down(KeyCode::Space));
    }

    #[test]
    fn test_wheel_cleared_at_end_of_frame() {
        let mut input = InputState::new();

        input.process_scroll(1.0);
        input.process_scroll(0.5);
        assert_eq!(input.mouse_wheel_delta(), 1.5);

        input.end_frame();
        assert_eq!(input.mouse_wheel_delta(), 0.0);
    }

    #[test]
    fn test_joystick_state() {
        let mut input = InputState::new();

        input.set_joystick_button(1, 3, true);
        input.set_joystick_axis(1, GamepadAxis::LeftX, 2.0);

        assert!(input.joystick_button_down(1, 3));
        assert!(!input.joystick_button_down(0, 3));
        assert_eq!(input.joystick_axis(1, GamepadAxis::LeftX), 1.0);

        input.remove_joystick(1);
        assert!(!input.joystick_button_down(1, 3));
        assert_eq!(input.joystick_axis(1, GamepadAxis::LeftX), 0.0);
    }

    #[test]
    fn test_mouse_buttons() {
        let mut input = InputState::new();

        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.mouse_button_down(MouseButton::Left));
        assert!(!input.mouse_button_down(MouseButton::Right));
    }
}
