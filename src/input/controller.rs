//! Named buttons and axes with record and playback

use std::fmt;
use std::fs;
use std::path::Path;

use glam::Vec2;
use rustc_hash::FxHashMap;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use super::axis::{Axis, KeySet};
use super::button::Button;
use super::recording::{RESERVED_CHARS, Recording, RecordingError};
use super::source::{GamepadAxis, InputSource};

/// Input error types
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// No button registered under that name
    UnknownButton(String),
    /// No axis registered under that name
    UnknownAxis(String),
    /// Axis keys must come in (up, right, down, left) groups
    MalformedKeys(usize),
    /// Dead zone outside [0, 1)
    InvalidDeadZone(f32),
    /// Name is empty or contains a recording delimiter
    InvalidName(String),
    /// Name already registered
    DuplicateName(String),
    /// Recording and playback cannot run at the same time
    Busy,
    /// Recording could not be encoded or decoded
    Recording(RecordingError),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownButton(name) => write!(f, "Unknown button: {name}"),
            Self::UnknownAxis(name) => write!(f, "Unknown axis: {name}"),
            Self::MalformedKeys(len) => {
                write!(f, "Axis keys must be groups of up, right, down, left; got {len} keys")
            }
            Self::InvalidDeadZone(dz) => write!(f, "Dead zone must be in [0, 1), got {dz}"),
            Self::InvalidName(name) => write!(f, "Invalid input name: '{name}'"),
            Self::DuplicateName(name) => write!(f, "Input name already registered: {name}"),
            Self::Busy => write!(f, "Controller is already recording or playing back"),
            Self::Recording(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Recording(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordingError> for InputError {
    fn from(e: RecordingError) -> Self {
        Self::Recording(e)
    }
}

/// Button names used by [`Controller::with_defaults`]
pub mod names {
    pub const MOVE: &str = "move";
    pub const AIM: &str = "aim";
    pub const JUMP: &str = "jump";
    pub const ACTION: &str = "action";
    pub const CANCEL: &str = "cancel";
    pub const START: &str = "start";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Button(usize),
    Axis(usize),
}

#[derive(Debug)]
enum Mode {
    Idle,
    Recording {
        recording: Recording,
        tick: u32,
        /// Last logged state per button, for edge detection across ticks
        buttons: Vec<bool>,
        axes: Vec<Vec2>,
    },
    Playback {
        recording: Recording,
        tick: u32,
    },
}

/// A set of named inputs sampled together each tick.
///
/// Names are shared between buttons and axes so they stay unambiguous in
/// recordings. Anything implementing `AsRef<str>` can be used as a name,
/// which lets games key inputs by their own enum.
#[derive(Debug)]
pub struct Controller {
    buttons: Vec<(String, Button)>,
    axes: Vec<(String, Axis)>,
    index: FxHashMap<String, Slot>,
    mode: Mode,
    last_recording: Option<Recording>,
    /// Disabled controllers still sample and keep the recording clock running,
    /// but log no events
    pub enabled: bool,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            axes: Vec::new(),
            index: FxHashMap::default(),
            mode: Mode::Idle,
            last_recording: None,
            enabled: true,
        }
    }
}

impl Controller {
    /// Create an empty controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard and first-gamepad layout for a typical action game
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.bind_defaults();
        controller
    }

    fn bind_defaults(&mut self) {
        use KeyCode::*;

        // Registration cannot fail with the fixed names below
        if let Ok(axis) = self.add_axis(names::MOVE) {
            axis.add_key_set(KeySet {
                up: KeyW,
                right: KeyD,
                down: KeyS,
                left: KeyA,
            })
            .add_key_set(KeySet {
                up: ArrowUp,
                right: ArrowRight,
                down: ArrowDown,
                left: ArrowLeft,
            })
            .add_joy_axes(0, GamepadAxis::LeftX, GamepadAxis::LeftY)
            .add_joy_axes(0, GamepadAxis::DPadX, GamepadAxis::DPadY);
        }
        if let Ok(axis) = self.add_axis(names::AIM) {
            axis.add_key_set(KeySet {
                up: KeyI,
                right: KeyL,
                down: KeyK,
                left: KeyJ,
            })
            .add_joy_axes(0, GamepadAxis::RightX, GamepadAxis::RightY);
        }
        if let Ok(button) = self.add_button(names::JUMP) {
            button.add_key(Space).add_key(KeyZ).add_joystick_button(0, [0]);
        }
        if let Ok(button) = self.add_button(names::ACTION) {
            button
                .add_key(KeyX)
                .add_mouse_button(MouseButton::Left)
                .add_joystick_button(0, [2]);
        }
        if let Ok(button) = self.add_button(names::CANCEL) {
            button
                .add_key(KeyC)
                .add_mouse_button(MouseButton::Right)
                .add_joystick_button(0, [1]);
        }
        if let Ok(button) = self.add_button(names::START) {
            button.add_key(Enter).add_joystick_button(0, [7]);
        }
    }

    fn register(&mut self, name: &str, slot: Slot) -> Result<(), InputError> {
        if name.is_empty() || name.contains(RESERVED_CHARS) {
            return Err(InputError::InvalidName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(InputError::DuplicateName(name.to_string()));
        }
        self.index.insert(name.to_string(), slot);
        Ok(())
    }

    /// Register a new button and return it for binding
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidName`] or [`InputError::DuplicateName`]
    pub fn add_button(&mut self, name: impl AsRef<str>) -> Result<&mut Button, InputError> {
        let name = name.as_ref();
        self.register(name, Slot::Button(self.buttons.len()))?;
        self.buttons.push((name.to_string(), Button::new()));
        let (_, button) = self
            .buttons
            .last_mut()
            .ok_or_else(|| InputError::UnknownButton(name.to_string()))?;
        Ok(button)
    }

    /// Register a new axis and return it for binding
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidName`] or [`InputError::DuplicateName`]
    pub fn add_axis(&mut self, name: impl AsRef<str>) -> Result<&mut Axis, InputError> {
        let name = name.as_ref();
        self.register(name, Slot::Axis(self.axes.len()))?;
        self.axes.push((name.to_string(), Axis::new()));
        let (_, axis) = self
            .axes
            .last_mut()
            .ok_or_else(|| InputError::UnknownAxis(name.to_string()))?;
        Ok(axis)
    }

    fn button_index(&self, name: &str) -> Result<usize, InputError> {
        match self.index.get(name) {
            Some(Slot::Button(i)) => Ok(*i),
            _ => Err(InputError::UnknownButton(name.to_string())),
        }
    }

    fn axis_index(&self, name: &str) -> Result<usize, InputError> {
        match self.index.get(name) {
            Some(Slot::Axis(i)) => Ok(*i),
            _ => Err(InputError::UnknownAxis(name.to_string())),
        }
    }

    /// Look up a button
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownButton`] if no button has that name
    pub fn button(&self, name: impl AsRef<str>) -> Result<&Button, InputError> {
        let i = self.button_index(name.as_ref())?;
        Ok(&self.buttons[i].1)
    }

    /// Look up a button mutably
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownButton`] if no button has that name
    pub fn button_mut(&mut self, name: impl AsRef<str>) -> Result<&mut Button, InputError> {
        let i = self.button_index(name.as_ref())?;
        Ok(&mut self.buttons[i].1)
    }

    /// Look up an axis
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownAxis`] if no axis has that name
    pub fn axis(&self, name: impl AsRef<str>) -> Result<&Axis, InputError> {
        let i = self.axis_index(name.as_ref())?;
        Ok(&self.axes[i].1)
    }

    /// Look up an axis mutably
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownAxis`] if no axis has that name
    pub fn axis_mut(&mut self, name: impl AsRef<str>) -> Result<&mut Axis, InputError> {
        let i = self.axis_index(name.as_ref())?;
        Ok(&mut self.axes[i].1)
    }

    /// Registered button names in registration order
    pub fn button_names(&self) -> impl Iterator<Item = &str> {
        self.buttons.iter().map(|(name, _)| name.as_str())
    }

    /// Registered axis names in registration order
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.mode, Mode::Recording { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, Mode::Playback { .. })
    }

    /// Sample every input for this tick, then record or play back.
    ///
    /// Call once per tick before anything reads the controller.
    pub fn update_first(&mut self, source: &impl InputSource) {
        if let Mode::Playback { recording, tick } = &self.mode {
            if *tick >= recording.duration() {
                log::info!("Playback finished after {tick} ticks");
                self.stop();
            } else {
                self.apply_playback_tick();
            }
        }

        for (_, button) in &mut self.buttons {
            button.update(source);
        }
        for (_, axis) in &mut self.axes {
            axis.update(source);
        }

        match &mut self.mode {
            Mode::Recording { tick, .. } if !self.enabled => *tick += 1,
            Mode::Recording {
                recording,
                tick,
                buttons,
                axes,
            } => {
                for ((name, button), logged) in self.buttons.iter().zip(buttons.iter_mut()) {
                    if button.down() != *logged {
                        *logged = button.down();
                        recording
                            .buttons
                            .entry(*tick)
                            .or_default()
                            .push((name.clone(), button.down()));
                    }
                }
                for (((_, axis), logged), timeline) in self
                    .axes
                    .iter()
                    .zip(axes.iter_mut())
                    .zip(recording.axes.iter_mut())
                {
                    if axis.value() != *logged {
                        *logged = axis.value();
                        timeline.insert(*tick, axis.value());
                    }
                }
                *tick += 1;
            }
            Mode::Playback { tick, .. } => *tick += 1,
            Mode::Idle => {}
        }
    }

    fn apply_playback_tick(&mut self) {
        let Mode::Playback { recording, tick } = &self.mode else {
            return;
        };
        if let Some(events) = recording.buttons.get(tick) {
            for (name, down) in events {
                if let Some(Slot::Button(i)) = self.index.get(name) {
                    self.buttons[*i].1.force_state(*down);
                }
            }
        }
        for ((_, axis), timeline) in self.axes.iter_mut().zip(&recording.axes) {
            if let Some(value) = timeline.get(tick) {
                axis.force_state(*value);
            }
        }
    }

    /// Start recording from the next update
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`] while playing back
    pub fn record(&mut self) -> Result<(), InputError> {
        if self.is_playing() {
            return Err(InputError::Busy);
        }
        if self.is_recording() {
            log::warn!("Restarting input recording");
        } else {
            log::info!("Recording input");
        }
        self.mode = Mode::Recording {
            recording: Recording::new(self.axes.len()),
            tick: 0,
            buttons: vec![false; self.buttons.len()],
            axes: vec![Vec2::ZERO; self.axes.len()],
        };
        Ok(())
    }

    /// Play back a compressed recording from the next update.
    ///
    /// Every input is held neutral for ticks the recording says nothing
    /// about; live input returns once playback ends or [`Controller::stop`]
    /// is called.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`] while recording, or a recording error if
    /// the data is corrupt or names inputs this controller lacks
    pub fn playback(&mut self, data: &str) -> Result<(), InputError> {
        if self.is_recording() {
            return Err(InputError::Busy);
        }
        let recording = Recording::decompress(data)?;
        self.playback_recording(recording)
    }

    /// Play back an already decoded recording
    ///
    /// # Errors
    ///
    /// Same as [`Controller::playback`], minus decoding
    pub fn playback_recording(&mut self, recording: Recording) -> Result<(), InputError> {
        if self.is_recording() {
            return Err(InputError::Busy);
        }
        for events in recording.buttons.values() {
            for (name, _) in events {
                if !matches!(self.index.get(name), Some(Slot::Button(_))) {
                    return Err(RecordingError::UnknownButton(name.clone()).into());
                }
            }
        }
        if recording.axes.len() > self.axes.len() {
            return Err(RecordingError::UnknownAxis(self.axes.len()).into());
        }

        for (_, button) in &mut self.buttons {
            button.force_state(false);
        }
        for (_, axis) in &mut self.axes {
            axis.force_state(Vec2::ZERO);
        }
        log::info!("Playing back {} ticks of input", recording.duration());
        self.mode = Mode::Playback { recording, tick: 0 };
        Ok(())
    }

    /// Stop recording or playback and return every input to live sampling
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Recording {
                mut recording,
                tick,
                ..
            } => {
                recording.ticks = tick;
                log::info!("Recorded {tick} ticks of input");
                self.last_recording = Some(recording);
            }
            Mode::Playback { tick, .. } => log::debug!("Playback stopped at tick {tick}"),
            Mode::Idle => {}
        }
        for (_, button) in &mut self.buttons {
            button.release_state();
        }
        for (_, axis) in &mut self.axes {
            axis.release_state();
        }
    }

    /// The most recent finished recording
    pub fn last_recording(&self) -> Option<&Recording> {
        self.last_recording.as_ref()
    }

    /// The most recent finished recording in its compressed string form
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::NoRecording`] before anything was recorded
    pub fn last_recorded_string(&self) -> Result<String, RecordingError> {
        self.last_recording
            .as_ref()
            .ok_or(RecordingError::NoRecording)?
            .compress()
    }

    /// Write the most recent recording to a file
    ///
    /// # Errors
    ///
    /// Fails if nothing was recorded or the file cannot be written
    pub fn save_recording(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let path = path.as_ref();
        let data = self.last_recorded_string()?;
        fs::write(path, data).map_err(|e| RecordingError::Io(e.to_string()))?;
        log::debug!("Saved recording to {}", path.display());
        Ok(())
    }

    /// Play back a recording file written by [`Controller::save_recording`]
    ///
    /// # Errors
    ///
    /// Same as [`Controller::playback`], plus IO failures
    pub fn playback_file(&mut self, path: impl AsRef<Path>) -> Result<(), InputError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| RecordingError::Io(e.to_string()))?;
        log::debug!("Loaded recording from {}", path.display());
        self.playback(&data)
    }
}
