//! Top-down movement driven by an axis

use std::f32::consts::FRAC_1_SQRT_2;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::mover::{MoveResponse, MovementConfig, Mover, approach_f32};
use crate::collision::{ColliderHandle, CollisionQuery};
use crate::core::{ConfigError, ConfigFile};
use crate::input::Axis;

/// Tuning for [`BasicMovement`]. Speeds are in buffer units per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub movement: MovementConfig,
    /// Top speed on each axis
    pub max_speed: f32,
    /// Speed change per tick toward the target
    pub acceleration: f32,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            movement: MovementConfig::default(),
            max_speed: 200.0,
            acceleration: 20.0,
        }
    }
}

impl ConfigFile for BasicConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;
        if self.max_speed < 0.0 || self.acceleration < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_speed and acceleration must not be negative, got {} and {}",
                self.max_speed, self.acceleration
            )));
        }
        Ok(())
    }
}

/// Zeroes the speed component of the blocked axis
struct StopOnCollide<'a>(&'a mut Vec2);

impl MoveResponse for StopOnCollide<'_> {
    fn collide_x(&mut self, _hit: ColliderHandle) {
        self.0.x = 0.0;
    }

    fn collide_y(&mut self, _hit: ColliderHandle) {
        self.0.y = 0.0;
    }
}

/// Eight-way movement with acceleration
#[derive(Debug, Clone)]
pub struct BasicMovement {
    pub mover: Mover,
    /// Current speed in buffer units per tick
    pub speed: Vec2,
    /// Speed being accelerated toward
    pub target_speed: Vec2,
    pub max_speed: f32,
    pub acceleration: f32,
}

impl BasicMovement {
    /// Create from config
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config fails validation
    pub fn new(config: &BasicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            mover: Mover::new(&config.movement)?,
            speed: Vec2::ZERO,
            target_speed: Vec2::ZERO,
            max_speed: config.max_speed,
            acceleration: config.acceleration,
        })
    }

    /// Advance one tick using an axis for direction
    pub fn update<W: CollisionQuery + ?Sized>(
        &mut self,
        axis: &Axis,
        position: &mut IVec2,
        world: &W,
    ) {
        self.update_with(axis.value(), position, world);
    }

    /// Advance one tick toward `direction` (each component in [-1, 1])
    pub fn update_with<W: CollisionQuery + ?Sized>(
        &mut self,
        direction: Vec2,
        position: &mut IVec2,
        world: &W,
    ) {
        let mut target = direction * self.max_speed;
        // Saturated diagonals would otherwise be √2 faster than cardinals
        if direction.x.abs() >= 1.0 && direction.y.abs() >= 1.0 {
            target *= FRAC_1_SQRT_2;
        }
        self.target_speed = target;

        self.speed.x = approach_f32(self.speed.x, target.x, self.acceleration);
        self.speed.y = approach_f32(self.speed.y, target.y, self.acceleration);

        let delta = self.speed.as_ivec2();
        self.mover
            .move_xy(delta, position, world, &mut StopOnCollide(&mut self.speed));
    }
}

impl Default for BasicMovement {
    fn default() -> Self {
        let config = BasicConfig::default();
        Self {
            mover: Mover::default(),
            speed: Vec2::ZERO,
            target_speed: Vec2::ZERO,
            max_speed: config.max_speed,
            acceleration: config.acceleration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, Rect, Tag};

    const SOLID: Tag = 1;

    fn basic(max_speed: f32, acceleration: f32) -> BasicMovement {
        BasicMovement::new(&BasicConfig {
            movement: MovementConfig::default()
                .with_hitbox(Rect::from_size(8, 8))
                .with_solid_tags([SOLID]),
            max_speed,
            acceleration,
        })
        .unwrap()
    }

    #[test]
    fn test_basic_accelerates_without_overshoot() {
        let world = CollisionWorld::new();
        let mut movement = basic(100.0, 30.0);
        let mut position = IVec2::ZERO;

        let mut speeds = Vec::new();
        for _ in 0..5 {
            movement.update_with(Vec2::X, &mut position, &world);
            speeds.push(movement.speed.x);
        }

        assert_eq!(speeds, vec![30.0, 60.0, 90.0, 100.0, 100.0]);
        // 380 buffer units travelled
        assert_eq!(position.x, 3);
        assert_eq!(movement.mover.buffer_x(), 80);
    }

    #[test]
    fn test_basic_diagonal_normalized() {
        let world = CollisionWorld::new();
        let mut movement = basic(100.0, 1_000.0);
        let mut position = IVec2::ZERO;

        movement.update_with(Vec2::new(1.0, -1.0), &mut position, &world);

        let expected = 100.0 * FRAC_1_SQRT_2;
        assert!((movement.speed.x - expected).abs() < 1e-4);
        assert!((movement.speed.y + expected).abs() < 1e-4);
        assert!((movement.speed.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_basic_partial_diagonal_not_normalized() {
        let world = CollisionWorld::new();
        let mut movement = basic(100.0, 1_000.0);
        let mut position = IVec2::ZERO;

        movement.update_with(Vec2::new(1.0, 0.5), &mut position, &world);
        assert_eq!(movement.speed, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_basic_collision_stops_axis() {
        let mut world = CollisionWorld::new();
        world.add_box(IVec2::new(9, -100), 10, 200, [SOLID]);
        let mut movement = basic(300.0, 1_000.0);
        let mut position = IVec2::ZERO;

        movement.update_with(Vec2::new(1.0, 0.0), &mut position, &world);

        assert_eq!(position.x, 1);
        assert_eq!(movement.speed.x, 0.0);
        assert_eq!(movement.mover.buffer_x(), 0);
    }
}
