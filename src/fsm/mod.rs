//! State machine module
//!
//! Keyed hierarchical state machine with deferred transitions.

mod machine;

pub use machine::{State, StateCallback, StateContext, StateError, StateKeys, StateMachine};
