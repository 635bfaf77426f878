//! Common ECS components

use glam::IVec2;

use crate::collision::ColliderHandle;
use crate::input::names;

/// Pixel position of an entity's origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position(pub IVec2);

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self(IVec2::new(x, y))
    }
}

/// Collider owned by the entity, kept at its [`Position`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColliderRef(pub ColliderHandle);

/// Which of the entity's controller inputs drive its movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    /// Axis name for direction
    pub movement: String,
    /// Button name for jumping
    pub jump: String,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            movement: names::MOVE.to_string(),
            jump: names::JUMP.to_string(),
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
