//! Input module
//!
//! Logical buttons and axes sampled from physical devices once per tick, and
//! controllers that group them by name for recording and playback.

mod axis;
mod button;
mod controller;
mod recording;
mod source;
mod state;

pub use axis::{Axis, DEFAULT_DEAD_ZONE, KeySet};
pub use button::Button;
pub use controller::{Controller, InputError, names};
pub use recording::{Recording, RecordingError};
pub use source::{GamepadAxis, InputSource, JoystickId, WheelDirection};
pub use state::InputState;
