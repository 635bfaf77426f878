//! World wrapper around hecs and the shared collision world

use hecs::Entity;

use super::components::ColliderRef;
use super::systems;
use crate::collision::CollisionWorld;
use crate::input::{InputError, InputSource};

/// Game world: entities plus the colliders they move against
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
    /// Colliders shared by every mover
    pub collisions: CollisionWorld,
    tick: u64,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
            collisions: CollisionWorld::new(),
            tick: 0,
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity and remove the collider it owns
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        let owned = self.inner.get::<&ColliderRef>(entity).ok().map(|c| c.0);
        self.inner.despawn(entity)?;
        if let Some(handle) = owned {
            self.collisions.remove(handle);
        }
        Ok(())
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Ticks stepped so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one fixed tick: input, movement, then collider sync
    ///
    /// # Errors
    ///
    /// Returns an input lookup error from a misconfigured entity. Systems
    /// after the failing one do not run this tick.
    pub fn step(&mut self, source: &impl InputSource) -> Result<(), InputError> {
        systems::update_controllers(&mut self.inner, source);
        systems::update_platformers(&mut self.inner, &self.collisions)?;
        systems::update_basic_movers(&mut self.inner, &self.collisions)?;
        systems::sync_colliders(&mut self.inner, &mut self.collisions);
        self.tick += 1;
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;
    use winit::event::ElementState;
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::collision::{GridCollider, Rect};
    use crate::ecs::{Controls, Name, Position};
    use crate::input::{Controller, InputState, names};
    use crate::movement::{
        BasicConfig, BasicMovement, MovementConfig, PlatformingConfig, PlatformingMovement,
    };

    const SOLID: u32 = 1;

    fn level(world: &mut World) {
        let grid = GridCollider::from_str_rows(
            "\
            ........
            ........
            ........
            ########",
            16,
            16,
        )
        .unwrap();
        world.collisions.add_grid(IVec2::ZERO, grid, [SOLID]);
    }

    fn platformer() -> PlatformingMovement {
        PlatformingMovement::new(&PlatformingConfig {
            movement: MovementConfig::default()
                .with_hitbox(Rect::from_size(8, 8))
                .with_solid_tags([SOLID]),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_platformer_falls_to_floor() {
        let mut world = World::new();
        level(&mut world);
        let player = world.spawn((Name::new("player"), Position::new(4, 0), platformer()));

        let input = InputState::new();
        for _ in 0..60 {
            world.step(&input).unwrap();
        }

        // Floor row starts at y = 48
        assert_eq!(world.get::<Position>(player).unwrap().0.y, 40);
        assert!(world.get::<PlatformingMovement>(player).unwrap().on_ground());
        assert_eq!(world.tick(), 60);
    }

    #[test]
    fn test_controller_drives_basic_mover() {
        let mut world = World::new();
        let mover = BasicMovement::new(&BasicConfig {
            movement: MovementConfig::default().with_hitbox(Rect::from_size(8, 8)),
            max_speed: 100.0,
            acceleration: 100.0,
        })
        .unwrap();
        let entity = world.spawn((
            Position::default(),
            mover,
            Controller::with_defaults(),
            Controls::default(),
        ));

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        for _ in 0..3 {
            world.step(&input).unwrap();
        }

        assert_eq!(world.get::<Position>(entity).unwrap().0, IVec2::new(3, 0));
        assert!(
            world
                .get::<Controller>(entity)
                .unwrap()
                .axis(names::MOVE)
                .unwrap()
                .right()
                .down()
        );
    }

    #[test]
    fn test_bad_controls_reported() {
        let mut world = World::new();
        world.spawn((
            Position::default(),
            platformer(),
            Controller::new(),
            Controls::default(),
        ));

        assert!(world.step(&InputState::new()).is_err());
    }

    #[test]
    fn test_collider_follows_and_despawns() {
        let mut world = World::new();
        let handle = world.collisions.add_box(IVec2::ZERO, 16, 4, [SOLID]);
        let platform = world.spawn((Position::new(32, 64), ColliderRef(handle)));

        world.step(&InputState::new()).unwrap();
        assert_eq!(
            world.collisions.get(handle).map(|c| c.position),
            Some(IVec2::new(32, 64))
        );

        world.despawn(platform).unwrap();
        assert!(world.collisions.get(handle).is_none());
        assert!(world.is_empty());
    }
}
