//! Keyed State Machine with a push/pop stack
//!
//! States are registered under a key (usually a fieldless enum) as a bundle of
//! optional enter/update/exit callbacks. Callbacks never touch the machine
//! directly: they receive a [`StateContext`] whose requests are committed at
//! the start of the next [`StateMachine::update`], so the stack can't change
//! underneath a running callback.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Mode { Walk, Menu }
//!
//! let mut fsm = StateMachine::<Mode, Game>::new();
//! fsm.add_state(Mode::Walk, State::new().on_update(|game, sm| {
//!     if game.pause_pressed {
//!         sm.push_state(Mode::Menu);
//!     }
//! }));
//! fsm.add_state(Mode::Menu, State::new());
//! fsm.change_state(Mode::Walk, &mut game)?;
//! fsm.update(&mut game)?; // Walk requests Menu
//! fsm.update(&mut game)?; // Menu entered, then updated
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

// ============================================================================
// Errors
// ============================================================================

/// State machine error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Key was never registered and auto-population is off
    NoSuchState(String),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchState(key) => write!(f, "No state registered for {key}"),
        }
    }
}

impl std::error::Error for StateError {}

// ============================================================================
// State
// ============================================================================

/// Callback run with the user context and a handle for requesting transitions
pub type StateCallback<K, Ctx> = Box<dyn FnMut(&mut Ctx, &mut StateContext<'_, K>)>;

/// Enter/update/exit callbacks for one state. Missing callbacks are no-ops.
pub struct State<K, Ctx> {
    enter: Option<StateCallback<K, Ctx>>,
    update: Option<StateCallback<K, Ctx>>,
    exit: Option<StateCallback<K, Ctx>>,
}

impl<K, Ctx> Default for State<K, Ctx> {
    fn default() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }
}

impl<K, Ctx> State<K, Ctx> {
    /// Create a state with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when the state becomes active
    #[must_use]
    pub fn on_enter(mut self, f: impl FnMut(&mut Ctx, &mut StateContext<'_, K>) + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Called every update while the state is on top of the stack
    #[must_use]
    pub fn on_update(
        mut self,
        f: impl FnMut(&mut Ctx, &mut StateContext<'_, K>) + 'static,
    ) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    /// Called once when the state is left or popped
    #[must_use]
    pub fn on_exit(mut self, f: impl FnMut(&mut Ctx, &mut StateContext<'_, K>) + 'static) -> Self {
        self.exit = Some(Box::new(f));
        self
    }
}

impl<K, Ctx> fmt::Debug for State<K, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("enter", &self.enter.is_some())
            .field("update", &self.update.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}

/// Key types that can list all their values, for bulk registration
pub trait StateKeys: Sized + 'static {
    const ALL: &'static [Self];
}

// ============================================================================
// State Context
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOp<K> {
    Push(K),
    Pop,
}

/// Handle given to callbacks.
///
/// Requests made here are deferred to the start of the next update: one
/// pending change (the last request wins), then pushes and pops in the order
/// they were made. A change discards pushes and pops requested before it.
pub struct StateContext<'a, K> {
    current: K,
    timer: u32,
    pending: &'a mut Option<K>,
    queue: &'a mut Vec<StackOp<K>>,
}

impl<K: Copy> StateContext<'_, K> {
    /// The state whose callback is running
    pub fn current(&self) -> K {
        self.current
    }

    /// Ticks the running state has been updated
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Request a change to `key`, clearing the stack
    pub fn change_state(&mut self, key: K) {
        // A change drops the stack, so earlier pushes and pops are moot
        self.queue.clear();
        *self.pending = Some(key);
    }

    /// Request pushing `key` on top of the stack
    pub fn push_state(&mut self, key: K) {
        self.queue.push(StackOp::Push(key));
    }

    /// Request popping the top of the stack
    pub fn pop_state(&mut self) {
        self.queue.push(StackOp::Pop);
    }
}

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Hook {
    Enter,
    Update,
    Exit,
}

/// A stack of keyed states with per-depth timers.
///
/// # Type Parameters
///
/// - `K`: State key, usually a fieldless enum
/// - `Ctx`: Context passed to every callback (game world, entity data)
pub struct StateMachine<K, Ctx = ()> {
    states: FxHashMap<K, State<K, Ctx>>,
    transitions: FxHashMap<(K, K), StateCallback<K, Ctx>>,
    /// Active states, top is current
    stack: Vec<K>,
    /// Saved timers of the states below the top
    timers: Vec<u32>,
    timer: u32,
    pending: Option<K>,
    queue: Vec<StackOp<K>>,
    /// Register an empty state for unknown keys instead of failing
    pub auto_populate: bool,
}

impl<K, Ctx> Default for StateMachine<K, Ctx> {
    fn default() -> Self {
        Self {
            states: FxHashMap::default(),
            transitions: FxHashMap::default(),
            stack: Vec::new(),
            timers: Vec::new(),
            timer: 0,
            pending: None,
            queue: Vec::new(),
            auto_populate: false,
        }
    }
}

impl<K, Ctx> StateMachine<K, Ctx>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    /// Create an idle state machine with no states
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the callbacks for `key`
    pub fn add_state(&mut self, key: K, state: State<K, Ctx>) -> &mut Self {
        self.states.insert(key, state);
        self
    }

    /// Register every key of `K`, building each state with `f`
    pub fn populate(&mut self, mut f: impl FnMut(K) -> State<K, Ctx>) -> &mut Self
    where
        K: StateKeys,
    {
        for &key in K::ALL {
            self.states.insert(key, f(key));
        }
        self
    }

    /// Run `f` whenever the current state goes from `from` to `to`
    pub fn on_transition(
        &mut self,
        from: K,
        to: K,
        f: impl FnMut(&mut Ctx, &mut StateContext<'_, K>) + 'static,
    ) -> &mut Self {
        self.transitions.insert((from, to), Box::new(f));
        self
    }

    pub fn has_state(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    /// Current state, `None` while idle
    #[must_use]
    pub fn current(&self) -> Option<K> {
        self.stack.last().copied()
    }

    #[must_use]
    pub fn is_in(&self, key: K) -> bool {
        self.current() == Some(key)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Active states from bottom to top
    pub fn stack(&self) -> &[K] {
        &self.stack
    }

    /// Ticks the current state has been updated since it was entered
    #[must_use]
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Check if callbacks have requested transitions not yet applied
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || !self.queue.is_empty()
    }

    fn ensure(&mut self, key: K) -> Result<(), StateError> {
        if self.states.contains_key(&key) {
            return Ok(());
        }
        if self.auto_populate {
            log::trace!("Auto-populating state {key:?}");
            self.states.insert(key, State::default());
            return Ok(());
        }
        Err(StateError::NoSuchState(format!("{key:?}")))
    }

    fn invoke(&mut self, key: K, hook: Hook, ctx: &mut Ctx) {
        let Self {
            states,
            timer,
            pending,
            queue,
            ..
        } = self;
        let Some(state) = states.get_mut(&key) else {
            return;
        };
        let callback = match hook {
            Hook::Enter => state.enter.as_mut(),
            Hook::Update => state.update.as_mut(),
            Hook::Exit => state.exit.as_mut(),
        };
        if let Some(callback) = callback {
            let mut handle = StateContext {
                current: key,
                timer: *timer,
                pending,
                queue,
            };
            callback(ctx, &mut handle);
        }
    }

    fn fire_transition(&mut self, from: K, to: K, ctx: &mut Ctx) {
        let Self {
            transitions,
            timer,
            pending,
            queue,
            ..
        } = self;
        if let Some(callback) = transitions.get_mut(&(from, to)) {
            let mut handle = StateContext {
                current: to,
                timer: *timer,
                pending,
                queue,
            };
            callback(ctx, &mut handle);
        }
    }

    /// Leave the current state and the whole stack, then enter `key`.
    ///
    /// Changing to the state that is already current does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoSuchState`] for an unregistered key
    pub fn change_state(&mut self, key: K, ctx: &mut Ctx) -> Result<(), StateError> {
        self.ensure(key)?;
        let from = self.current();
        if from == Some(key) {
            return Ok(());
        }

        if let Some(from) = from {
            self.invoke(from, Hook::Exit, ctx);
        }
        self.stack.clear();
        self.timers.clear();
        self.stack.push(key);
        self.timer = 0;
        log::debug!("State change {from:?} -> {key:?}");

        self.invoke(key, Hook::Enter, ctx);
        if let Some(from) = from {
            self.fire_transition(from, key, ctx);
        }
        Ok(())
    }

    /// Enter `key` on top of the current state, saving its timer.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoSuchState`] for an unregistered key
    pub fn push_state(&mut self, key: K, ctx: &mut Ctx) -> Result<(), StateError> {
        self.ensure(key)?;
        let from = self.current();
        if from.is_some() {
            self.timers.push(self.timer);
        }
        self.stack.push(key);
        self.timer = 0;
        log::debug!("State push {from:?} -> {key:?} (depth {})", self.stack.len());

        self.invoke(key, Hook::Enter, ctx);
        if let Some(from) = from {
            self.fire_transition(from, key, ctx);
        }
        Ok(())
    }

    /// Exit the top state and resume the one below with its saved timer.
    ///
    /// Popping the last state leaves the machine idle.
    pub fn pop_state(&mut self, ctx: &mut Ctx) {
        let Some(top) = self.current() else {
            log::warn!("pop_state on an empty state stack");
            return;
        };

        self.invoke(top, Hook::Exit, ctx);
        self.stack.pop();
        let resumed = self.current();
        self.timer = match resumed {
            Some(_) => self.timers.pop().unwrap_or(0),
            None => 0,
        };
        log::debug!("State pop {top:?} -> {resumed:?}");

        if let Some(resumed) = resumed {
            self.fire_transition(top, resumed, ctx);
        }
    }

    /// Apply requests made by callbacks since the last update.
    ///
    /// Requests made while applying wait for the following update.
    fn flush(&mut self, ctx: &mut Ctx) -> Result<(), StateError> {
        let pending = self.pending.take();
        let queue = std::mem::take(&mut self.queue);

        if let Some(key) = pending {
            self.change_state(key, ctx)?;
        }
        for op in queue {
            match op {
                StackOp::Push(key) => self.push_state(key, ctx)?,
                StackOp::Pop => self.pop_state(ctx),
            }
        }
        Ok(())
    }

    /// Apply deferred requests, then update the current state.
    ///
    /// Idle machines only apply requests.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoSuchState`] if a deferred request named an
    /// unregistered key. Requests after the failing one are dropped.
    pub fn update(&mut self, ctx: &mut Ctx) -> Result<(), StateError> {
        self.flush(ctx)?;

        if let Some(key) = self.current() {
            self.invoke(key, Hook::Update, ctx);
            self.timer = self.timer.saturating_add(1);
        }
        Ok(())
    }
}

impl<K: fmt::Debug, Ctx> fmt::Debug for StateMachine<K, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("stack", &self.stack)
            .field("timer", &self.timer)
            .field("states", &self.states.len())
            .field("pending", &self.pending)
            .field("queue", &self.queue)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
