//! Two-dimensional input merged from keys and analog sticks

use glam::Vec2;
use winit::keyboard::KeyCode;

use super::InputError;
use super::button::Button;
use super::source::{GamepadAxis, InputSource, JoystickId};

/// Default analog dead zone
pub const DEFAULT_DEAD_ZONE: f32 = 0.15;

/// Axis value at which the direction buttons go down
const BUTTON_THRESHOLD: f32 = 0.5;

/// Keys for one direction set, in up, right, down, left order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySet {
    pub up: KeyCode,
    pub right: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
}

impl KeySet {
    fn sample(&self, source: &impl InputSource) -> Vec2 {
        let mut value = Vec2::ZERO;
        if source.key_down(self.up) {
            value.y -= 1.0;
        }
        if source.key_down(self.down) {
            value.y += 1.0;
        }
        if source.key_down(self.left) {
            value.x -= 1.0;
        }
        if source.key_down(self.right) {
            value.x += 1.0;
        }
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StickBinding {
    joystick: JoystickId,
    x: GamepadAxis,
    y: GamepadAxis,
}

/// A logical 2D axis with each component in [-1, 1].
///
/// Negative y is up. Four synthetic buttons follow the value so an axis can
/// also be read as a d-pad.
#[derive(Debug, Clone)]
pub struct Axis {
    keys: Vec<KeySet>,
    sticks: Vec<StickBinding>,
    dead_zone: f32,
    /// Rescale [dead_zone, 1] to [0, 1] so output starts at 0 past the dead zone
    pub remap_range: bool,
    current: Vec2,
    previous: Vec2,
    forced: Option<Vec2>,
    up: Button,
    down: Button,
    left: Button,
    right: Button,
    /// A disabled axis always reads as neutral
    pub enabled: bool,
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            sticks: Vec::new(),
            dead_zone: DEFAULT_DEAD_ZONE,
            remap_range: true,
            current: Vec2::ZERO,
            previous: Vec2::ZERO,
            forced: None,
            up: Button::new(),
            down: Button::new(),
            left: Button::new(),
            right: Button::new(),
            enabled: true,
        }
    }
}

impl Axis {
    /// Create an axis with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind keys given as consecutive (up, right, down, left) quadruples
    ///
    /// # Errors
    ///
    /// Returns [`InputError::MalformedKeys`] unless the length is a non-zero
    /// multiple of four. Nothing is bound on error.
    pub fn add_keys(&mut self, keys: &[KeyCode]) -> Result<&mut Self, InputError> {
        if keys.is_empty() || keys.len() % 4 != 0 {
            return Err(InputError::MalformedKeys(keys.len()));
        }
        for quad in keys.chunks_exact(4) {
            self.keys.push(KeySet {
                up: quad[0],
                right: quad[1],
                down: quad[2],
                left: quad[3],
            });
        }
        Ok(self)
    }

    /// Bind one key set
    pub fn add_key_set(&mut self, keys: KeySet) -> &mut Self {
        self.keys.push(keys);
        self
    }

    /// Bind a pair of analog axes of one joystick
    pub fn add_joy_axes(
        &mut self,
        joystick: JoystickId,
        x: GamepadAxis,
        y: GamepadAxis,
    ) -> &mut Self {
        self.sticks.push(StickBinding { joystick, x, y });
        self
    }

    pub fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    /// Set the analog dead zone
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidDeadZone`] unless `0 <= dead_zone < 1`
    pub fn set_dead_zone(&mut self, dead_zone: f32) -> Result<(), InputError> {
        if !(0.0..1.0).contains(&dead_zone) {
            return Err(InputError::InvalidDeadZone(dead_zone));
        }
        self.dead_zone = dead_zone;
        Ok(())
    }

    /// Apply the dead zone to one analog component
    pub fn filter(&self, raw: f32) -> f32 {
        let magnitude = raw.abs().min(1.0);
        if magnitude <= self.dead_zone {
            return 0.0;
        }
        let magnitude = if self.remap_range {
            (magnitude - self.dead_zone) / (1.0 - self.dead_zone)
        } else {
            magnitude
        };
        magnitude.copysign(raw)
    }

    /// Sum of all sources, clamped
    pub fn sample(&self, source: &impl InputSource) -> Vec2 {
        let keys: Vec2 = self.keys.iter().map(|set| set.sample(source)).sum();
        let sticks: Vec2 = self
            .sticks
            .iter()
            .map(|stick| {
                Vec2::new(
                    self.filter(source.joystick_axis(stick.joystick, stick.x)),
                    self.filter(source.joystick_axis(stick.joystick, stick.y)),
                )
            })
            .sum();
        (keys + sticks).clamp(Vec2::NEG_ONE, Vec2::ONE)
    }

    /// Advance one tick, sampling sources unless forced
    pub fn update(&mut self, source: &impl InputSource) {
        let value = match self.forced {
            Some(value) => value,
            None => self.sample(source),
        };
        self.apply(value);
    }

    /// Advance one tick with an externally computed value
    pub fn update_with_value(&mut self, value: Vec2) {
        self.apply(self.forced.unwrap_or(value));
    }

    fn apply(&mut self, value: Vec2) {
        self.previous = self.current;
        self.current = if self.enabled {
            value.clamp(Vec2::NEG_ONE, Vec2::ONE)
        } else {
            Vec2::ZERO
        };

        self.up.update_with_state(self.current.y <= -BUTTON_THRESHOLD);
        self.down.update_with_state(self.current.y >= BUTTON_THRESHOLD);
        self.left.update_with_state(self.current.x <= -BUTTON_THRESHOLD);
        self.right.update_with_state(self.current.x >= BUTTON_THRESHOLD);
    }

    pub fn value(&self) -> Vec2 {
        self.current
    }

    pub fn x(&self) -> f32 {
        self.current.x
    }

    pub fn y(&self) -> f32 {
        self.current.y
    }

    /// Value from the previous tick
    pub fn previous(&self) -> Vec2 {
        self.previous
    }

    /// Check if the axis is centered
    pub fn neutral(&self) -> bool {
        self.current == Vec2::ZERO
    }

    /// Check if the value differs from the previous tick
    pub fn changed(&self) -> bool {
        self.current != self.previous
    }

    pub fn up(&self) -> &Button {
        &self.up
    }

    pub fn down(&self) -> &Button {
        &self.down
    }

    pub fn left(&self) -> &Button {
        &self.left
    }

    pub fn right(&self) -> &Button {
        &self.right
    }

    /// Ignore sources and report `value` from the next update on
    pub fn force_state(&mut self, value: Vec2) {
        self.forced = Some(value.clamp(Vec2::NEG_ONE, Vec2::ONE));
    }

    /// Return to sampling sources
    pub fn release_state(&mut self) {
        self.forced = None;
    }

    pub fn is_forced(&self) -> bool {
        self.forced.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use winit::event::ElementState;

    const WASD: [KeyCode; 4] = [KeyCode::KeyW, KeyCode::KeyD, KeyCode::KeyS, KeyCode::KeyA];

    #[test]
    fn test_malformed_keys_rejected() {
        let mut axis = Axis::new();
        assert_eq!(
            axis.add_keys(&WASD[..3]).err(),
            Some(InputError::MalformedKeys(3))
        );
        assert_eq!(axis.add_keys(&[]).err(), Some(InputError::MalformedKeys(0)));
        assert!(axis.add_keys(&WASD).is_ok());
    }

    #[test]
    fn test_key_directions() {
        let mut input = InputState::new();
        let mut axis = Axis::new();
        axis.add_keys(&WASD).unwrap();

        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        axis.update(&input);

        assert_eq!(axis.value(), Vec2::new(1.0, -1.0));
        assert!(axis.up().pressed());
        assert!(axis.right().down());
        assert!(axis.left().up());
        assert!(axis.changed());
    }

    #[test]
    fn test_sources_clamped() {
        let mut input = InputState::new();
        let mut axis = Axis::new();
        axis.add_keys(&WASD)
            .unwrap()
            .add_joy_axes(0, GamepadAxis::LeftX, GamepadAxis::LeftY);

        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        input.set_joystick_axis(0, GamepadAxis::LeftX, 0.8);
        axis.update(&input);

        assert_eq!(axis.x(), 1.0);
    }

    #[test]
    fn test_dead_zone_continuity() {
        let mut axis = Axis::new();
        axis.set_dead_zone(0.25).unwrap();

        assert_eq!(axis.filter(0.25), 0.0);
        assert_eq!(axis.filter(-0.25), 0.0);

        let just_above = axis.filter(0.26);
        assert!(just_above > 0.0 && just_above < 0.02);
        assert!(axis.filter(-0.26) < 0.0);
        assert_eq!(axis.filter(1.0), 1.0);
        assert_eq!(axis.filter(-1.0), -1.0);

        axis.remap_range = false;
        assert_eq!(axis.filter(0.5), 0.5);
    }

    #[test]
    fn test_invalid_dead_zone() {
        let mut axis = Axis::new();
        assert_eq!(
            axis.set_dead_zone(1.0),
            Err(InputError::InvalidDeadZone(1.0))
        );
        assert!(axis.set_dead_zone(-0.1).is_err());
        assert_eq!(axis.dead_zone(), DEFAULT_DEAD_ZONE);
    }

    #[test]
    fn test_direction_buttons_threshold() {
        let mut axis = Axis::new();

        axis.update_with_value(Vec2::new(0.49, 0.5));
        assert!(axis.right().up());
        assert!(axis.down().pressed());

        axis.update_with_value(Vec2::new(-0.5, 0.0));
        assert!(axis.left().pressed());
        assert!(axis.down().released());
    }

    #[test]
    fn test_forced_axis() {
        let input = InputState::new();
        let mut axis = Axis::new();

        axis.force_state(Vec2::new(0.0, 2.0));
        axis.update(&input);
        assert_eq!(axis.value(), Vec2::new(0.0, 1.0));
        assert!(!axis.neutral());

        axis.release_state();
        axis.update(&input);
        assert!(axis.neutral());
        assert_eq!(axis.previous(), Vec2::new(0.0, 1.0));
    }
}
