//! Collision module
//!
//! Tile grids, box colliders and the tag-filtered queries movement runs against.

mod grid;
mod rect;
mod world;

pub use grid::{CollisionError, GridCollider, OutOfBounds};
pub use rect::Rect;
pub use world::{Collider, ColliderHandle, CollisionQuery, CollisionWorld, Shape, Tag, Tags};
