//! A 2D gameplay core built in Rust
//!
//! This crate provides:
//! - Tile-grid and box colliders with tag-filtered queries
//! - Pixel-stepping movement with sub-pixel buffers, top-down and platformer
//! - Button/axis input with deterministic record and playback
//! - Keyed state machines with push/pop and deferred transitions
//! - hecs integration that ticks all of the above per entity

pub mod collision;
pub mod core;
pub mod ecs;
pub mod fsm;
pub mod input;
pub mod movement;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::collision::{
        ColliderHandle, CollisionQuery, CollisionWorld, GridCollider, OutOfBounds, Rect, Tag,
    };
    pub use crate::core::{ConfigError, ConfigFile};
    pub use crate::ecs::{ColliderRef, Controls, Name, Position, World};
    pub use crate::fsm::{State, StateContext, StateKeys, StateMachine};
    pub use crate::input::{Axis, Button, Controller, InputSource, InputState, names};
    pub use crate::movement::{
        BasicConfig, BasicMovement, MovementConfig, PlatformInput, PlatformingConfig,
        PlatformingMovement,
    };
    pub use glam::{IVec2, Vec2};
    pub use winit::keyboard::KeyCode;
}
