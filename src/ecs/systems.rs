//! Per-tick systems over entity components

use glam::Vec2;

use super::components::{ColliderRef, Controls, Position};
use crate::collision::CollisionWorld;
use crate::input::{Controller, InputError, InputSource};
use crate::movement::{BasicMovement, PlatformingMovement};

/// Sample input for every controller
pub fn update_controllers(world: &mut hecs::World, source: &impl InputSource) {
    for (_, controller) in world.query_mut::<&mut Controller>() {
        controller.update_first(source);
    }
}

/// Move every platformer, reading its own controller when it has one
///
/// # Errors
///
/// Returns the lookup error if [`Controls`] names an input the controller lacks
pub fn update_platformers(
    world: &mut hecs::World,
    collisions: &CollisionWorld,
) -> Result<(), InputError> {
    for (_, (movement, position, input)) in world.query_mut::<(
        &mut PlatformingMovement,
        &mut Position,
        Option<(&Controller, &Controls)>,
    )>() {
        match input {
            Some((controller, controls)) => {
                let jump = controller.button(&controls.jump)?;
                let axis = controller.axis(&controls.movement)?;
                movement.update(jump, axis, &mut position.0, collisions);
            }
            None => movement.update_with(Default::default(), &mut position.0, collisions),
        }
    }
    Ok(())
}

/// Move every top-down body, reading its own controller when it has one
///
/// # Errors
///
/// Returns the lookup error if [`Controls`] names an axis the controller lacks
pub fn update_basic_movers(
    world: &mut hecs::World,
    collisions: &CollisionWorld,
) -> Result<(), InputError> {
    for (_, (movement, position, input)) in world.query_mut::<(
        &mut BasicMovement,
        &mut Position,
        Option<(&Controller, &Controls)>,
    )>() {
        let direction = match input {
            Some((controller, controls)) => controller.axis(&controls.movement)?.value(),
            None => Vec2::ZERO,
        };
        movement.update_with(direction, &mut position.0, collisions);
    }
    Ok(())
}

/// Move owned colliders to their entity's position
pub fn sync_colliders(world: &mut hecs::World, collisions: &mut CollisionWorld) {
    for (entity, (position, collider)) in world.query_mut::<(&Position, &ColliderRef)>() {
        if !collisions.set_position(collider.0, position.0) {
            log::warn!("Entity {entity:?} refers to a removed collider");
        }
    }
}
