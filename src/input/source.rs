//! Physical input queries consumed by buttons and axes

use serde::{Deserialize, Serialize};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Joystick/gamepad slot
pub type JoystickId = u32;

/// Analog axes of a gamepad, each in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
    DPadX,
    DPadY,
}

/// Mouse wheel direction bound to a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelDirection {
    /// Positive wheel delta (scrolling away from the user)
    Up,
    /// Negative wheel delta
    Down,
}

/// Frame-coherent view of the physical devices.
///
/// Implementations must answer consistently for the whole tick; buttons and
/// axes sample it once per update.
pub trait InputSource {
    /// Check if a key is held
    fn key_down(&self, key: KeyCode) -> bool;

    /// Check if a mouse button is held
    fn mouse_button_down(&self, button: MouseButton) -> bool;

    /// Wheel movement this tick, positive is up
    fn mouse_wheel_delta(&self) -> f32;

    /// Check if a joystick button is held
    fn joystick_button_down(&self, joystick: JoystickId, button: u32) -> bool;

    /// Raw analog value of a joystick axis
    fn joystick_axis(&self, joystick: JoystickId, axis: GamepadAxis) -> f32;
}
