//! Movement module
//!
//! Pixel-stepping movers: the generic sweep plus top-down and platformer bodies.

mod basic;
mod mover;
mod platforming;

pub use basic::{BasicConfig, BasicMovement};
pub use mover::{DEFAULT_SPEED_SCALE, MoveResponse, MovementConfig, Mover};
pub use platforming::{AccelType, PlatformInput, PlatformingConfig, PlatformingMovement};
