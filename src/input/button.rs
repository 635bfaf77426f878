//! Boolean input merged from several physical sources

use rustc_hash::FxHashMap;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use super::source::{InputSource, JoystickId, WheelDirection};

/// A logical button.
///
/// Keys, joystick buttons, mouse buttons and wheel directions are OR-ed into
/// a single state once per tick. Edges are derived from the previous tick.
#[derive(Debug, Clone)]
pub struct Button {
    keys: Vec<KeyCode>,
    joystick_buttons: FxHashMap<JoystickId, Vec<u32>>,
    mouse_buttons: Vec<MouseButton>,
    wheel: Vec<WheelDirection>,
    current: bool,
    previous: bool,
    forced: Option<bool>,
    held_ticks: u32,
    /// A disabled button always reads as up
    pub enabled: bool,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            joystick_buttons: FxHashMap::default(),
            mouse_buttons: Vec::new(),
            wheel: Vec::new(),
            current: false,
            previous: false,
            forced: None,
            held_ticks: 0,
            enabled: true,
        }
    }
}

impl Button {
    /// Create a button with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a keyboard key
    pub fn add_key(&mut self, key: KeyCode) -> &mut Self {
        self.keys.push(key);
        self
    }

    /// Bind buttons of one joystick
    pub fn add_joystick_button(
        &mut self,
        joystick: JoystickId,
        buttons: impl IntoIterator<Item = u32>,
    ) -> &mut Self {
        self.joystick_buttons
            .entry(joystick)
            .or_default()
            .extend(buttons);
        self
    }

    /// Bind a mouse button
    pub fn add_mouse_button(&mut self, button: MouseButton) -> &mut Self {
        self.mouse_buttons.push(button);
        self
    }

    /// Bind a wheel direction
    pub fn add_wheel(&mut self, direction: WheelDirection) -> &mut Self {
        self.wheel.push(direction);
        self
    }

    /// Check if any source is held
    pub fn sample(&self, source: &impl InputSource) -> bool {
        let wheel = source.mouse_wheel_delta();
        self.keys.iter().any(|&k| source.key_down(k))
            || self
                .joystick_buttons
                .iter()
                .any(|(&id, buttons)| buttons.iter().any(|&b| source.joystick_button_down(id, b)))
            || self.mouse_buttons.iter().any(|&b| source.mouse_button_down(b))
            || self.wheel.iter().any(|direction| match direction {
                WheelDirection::Up => wheel > 0.0,
                WheelDirection::Down => wheel < 0.0,
            })
    }

    /// Advance one tick, sampling sources unless forced
    pub fn update(&mut self, source: &impl InputSource) {
        let down = match self.forced {
            Some(state) => state,
            None => self.sample(source),
        };
        self.apply(down);
    }

    /// Advance one tick with an externally computed state.
    ///
    /// A forced state still wins over `down`.
    pub fn update_with_state(&mut self, down: bool) {
        self.apply(self.forced.unwrap_or(down));
    }

    fn apply(&mut self, down: bool) {
        self.previous = self.current;
        self.current = down && self.enabled;
        self.held_ticks = if self.current {
            self.held_ticks.saturating_add(1)
        } else {
            0
        };
    }

    /// Went down this tick
    pub fn pressed(&self) -> bool {
        self.current && !self.previous
    }

    /// Went up this tick
    pub fn released(&self) -> bool {
        !self.current && self.previous
    }

    /// Currently held
    pub fn down(&self) -> bool {
        self.current
    }

    /// Currently not held
    pub fn up(&self) -> bool {
        !self.current
    }

    /// Consecutive ticks held, including this one
    pub fn held_ticks(&self) -> u32 {
        self.held_ticks
    }

    /// Ignore sources and report `down` from the next update on
    pub fn force_state(&mut self, down: bool) {
        self.forced = Some(down);
    }

    /// Return to sampling sources
    pub fn release_state(&mut self) {
        self.forced = None;
    }

    pub fn is_forced(&self) -> bool {
        self.forced.is_some()
    }
}
