//! Entity Component System module
//!
//! Built on top of the hecs ECS library. Entities carry movers, controllers
//! and positions; [`World::step`] runs the systems once per tick.

mod components;
pub mod systems;
mod world;

pub use components::{ColliderRef, Controls, Name, Position};
pub use world::World;
