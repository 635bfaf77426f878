//! Side-view platformer movement
//!
//! Adds gravity, jumping and ground detection on top of [`Mover`]:
//!
//! - **Jump buffer**: a press is remembered for `jump_buffer_max` ticks, so a
//!   jump pressed just before landing fires on the landing tick.
//! - **Ledge buffer** (coyote time): for `ledge_buffer_max` ticks after walking
//!   off a ledge the ground jump is still available.
//! - **Variable height**: releasing jump while rising damps upward speed once.
//! - **Jump-through platforms**: solid from above only; down + jump drops
//!   through them.
//!
//! Coordinates are screen-style, positive Y points down.

use glam::{IVec2, Vec2};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::mover::{MoveResponse, MovementConfig, Mover, approach_f32};
use crate::collision::{ColliderHandle, CollisionQuery};
use crate::core::{ConfigError, ConfigFile};
use crate::input::{Axis, Button};

/// Which acceleration applies this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccelType {
    Ground,
    Air,
}

/// Tuning for [`PlatformingMovement`]. Speeds are in buffer units per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformingConfig {
    pub movement: MovementConfig,
    /// Horizontal run speed (x) and terminal fall speed (y)
    pub max_speed: Vec2,
    /// Upward speed applied by a jump
    pub jump_strength: f32,
    /// Speed added per airborne tick
    pub gravity: f32,
    pub gravity_multiplier: f32,
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    /// Jumps available before touching ground again
    pub jumps_max: u32,
    /// Ticks a jump press stays buffered
    pub jump_buffer_max: u32,
    /// Ticks after leaving ground during which the ground jump is kept
    pub ledge_buffer_max: u32,
    /// Factor applied to upward speed when jump is released early
    pub jump_dampening: f32,
    /// Decay per tick of `extra_speed`
    pub extra_speed_decay: f32,
}

impl Default for PlatformingConfig {
    fn default() -> Self {
        Self {
            movement: MovementConfig::default(),
            max_speed: Vec2::new(300.0, 1_000.0),
            jump_strength: 900.0,
            gravity: 50.0,
            gravity_multiplier: 1.0,
            ground_acceleration: 40.0,
            air_acceleration: 20.0,
            jumps_max: 1,
            jump_buffer_max: 5,
            ledge_buffer_max: 5,
            jump_dampening: 0.5,
            extra_speed_decay: 10.0,
        }
    }
}

impl ConfigFile for PlatformingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;

        let non_negative = [
            ("max_speed.x", self.max_speed.x),
            ("max_speed.y", self.max_speed.y),
            ("jump_strength", self.jump_strength),
            ("gravity_multiplier", self.gravity_multiplier),
            ("ground_acceleration", self.ground_acceleration),
            ("air_acceleration", self.air_acceleration),
            ("extra_speed_decay", self.extra_speed_decay),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.jump_dampening) {
            return Err(ConfigError::Invalid(format!(
                "jump_dampening must be within 0..=1, got {}",
                self.jump_dampening
            )));
        }
        Ok(())
    }
}

/// One tick of platformer input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformInput {
    /// Movement direction, each component in [-1, 1]
    pub direction: Vec2,
    pub jump_pressed: bool,
    pub jump_released: bool,
}

impl PlatformInput {
    /// Sample a jump button and a movement axis
    #[must_use]
    pub fn from_controls(jump: &Button, axis: &Axis) -> Self {
        Self {
            direction: axis.value(),
            jump_pressed: jump.pressed(),
            jump_released: jump.released(),
        }
    }

    /// Holding down on the axis
    #[must_use]
    pub fn down(&self) -> bool {
        self.direction.y > 0.5
    }
}

/// Zeroes blocked speed, including any external push
struct StopOnCollide<'a> {
    speed: &'a mut Vec2,
    extra_speed: &'a mut Vec2,
}

impl MoveResponse for StopOnCollide<'_> {
    fn collide_x(&mut self, _hit: ColliderHandle) {
        self.speed.x = 0.0;
        self.extra_speed.x = 0.0;
    }

    fn collide_y(&mut self, _hit: ColliderHandle) {
        self.speed.y = 0.0;
        self.extra_speed.y = 0.0;
    }
}

/// Platformer body
#[derive(Debug, Clone)]
pub struct PlatformingMovement {
    pub mover: Mover,
    /// Self-driven speed
    pub speed: Vec2,
    /// External push added on top of `speed`, decays toward zero
    pub extra_speed: Vec2,
    pub max_speed: Vec2,
    pub jump_strength: f32,
    pub gravity: f32,
    pub gravity_multiplier: f32,
    pub acceleration: FxHashMap<AccelType, f32>,
    pub jumps_max: u32,
    pub jump_buffer_max: u32,
    pub ledge_buffer_max: u32,
    pub jump_dampening: f32,
    pub extra_speed_decay: f32,
    pub apply_gravity: bool,
    pub jump_enabled: bool,

    jumps_left: u32,
    jump_buffer: u32,
    ledge_buffer: u32,
    on_ground: bool,
    was_on_ground: bool,
    /// Standing on a jump-through platform with no solid underneath
    on_jump_through: bool,
    has_jumped: bool,
    just_jumped: bool,
}

impl PlatformingMovement {
    /// Create from config
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config fails validation
    pub fn new(config: &PlatformingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_mover(config, Mover::new(&config.movement)?))
    }

    fn with_mover(config: &PlatformingConfig, mover: Mover) -> Self {
        let mut acceleration = FxHashMap::default();
        acceleration.insert(AccelType::Ground, config.ground_acceleration);
        acceleration.insert(AccelType::Air, config.air_acceleration);

        Self {
            mover,
            speed: Vec2::ZERO,
            extra_speed: Vec2::ZERO,
            max_speed: config.max_speed,
            jump_strength: config.jump_strength,
            gravity: config.gravity,
            gravity_multiplier: config.gravity_multiplier,
            acceleration,
            jumps_max: config.jumps_max,
            jump_buffer_max: config.jump_buffer_max,
            ledge_buffer_max: config.ledge_buffer_max,
            jump_dampening: config.jump_dampening,
            extra_speed_decay: config.extra_speed_decay,
            apply_gravity: true,
            jump_enabled: true,
            jumps_left: config.jumps_max,
            jump_buffer: 0,
            ledge_buffer: 0,
            on_ground: false,
            was_on_ground: false,
            on_jump_through: false,
            has_jumped: false,
            just_jumped: false,
        }
    }

    /// Standing on something this tick
    #[must_use]
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Landed this tick
    #[must_use]
    pub fn just_landed(&self) -> bool {
        self.on_ground && !self.was_on_ground
    }

    /// Airborne because of a jump rather than a fall
    #[must_use]
    pub fn has_jumped(&self) -> bool {
        self.has_jumped
    }

    /// Jumped during the last update
    #[must_use]
    pub fn just_jumped(&self) -> bool {
        self.just_jumped
    }

    #[must_use]
    pub fn jumps_left(&self) -> u32 {
        self.jumps_left
    }

    #[must_use]
    pub fn jump_buffer(&self) -> u32 {
        self.jump_buffer
    }

    #[must_use]
    pub fn ledge_buffer(&self) -> u32 {
        self.ledge_buffer
    }

    /// Re-probe the ground under a body at `position`
    pub fn check_ground<W: CollisionQuery + ?Sized>(&mut self, position: IVec2, world: &W) {
        let below = position + IVec2::Y;
        let solid = self.mover.solid_at(below, world).is_some();
        let platform = self
            .mover
            .jump_through_entering(position, below, world)
            .is_some();

        self.on_ground = solid || platform;
        self.on_jump_through = platform && !solid;
    }

    /// Jump now, regardless of buffers
    pub fn jump(&mut self) {
        self.speed.y = -self.jump_strength;
        self.jumps_left = self.jumps_left.saturating_sub(1);
        self.jump_buffer = 0;
        self.ledge_buffer = 0;
        self.has_jumped = true;
        self.just_jumped = true;
        self.on_ground = false;
        log::trace!("jump, {} left", self.jumps_left);
    }

    /// Advance one tick reading a jump button and movement axis
    pub fn update<W: CollisionQuery + ?Sized>(
        &mut self,
        jump: &Button,
        axis: &Axis,
        position: &mut IVec2,
        world: &W,
    ) {
        self.update_with(PlatformInput::from_controls(jump, axis), position, world);
    }

    /// Advance one tick with explicit input
    pub fn update_with<W: CollisionQuery + ?Sized>(
        &mut self,
        input: PlatformInput,
        position: &mut IVec2,
        world: &W,
    ) {
        self.just_jumped = false;
        if self.mover.freeze {
            return;
        }

        self.was_on_ground = self.on_ground;
        self.check_ground(*position, world);
        self.update_buffers();
        self.update_jump(input, position);
        self.update_horizontal(input, *position, world);
        self.update_gravity();

        let velocity = self.speed + self.extra_speed;
        self.mover.move_xy(
            velocity.as_ivec2(),
            position,
            world,
            &mut StopOnCollide {
                speed: &mut self.speed,
                extra_speed: &mut self.extra_speed,
            },
        );

        self.extra_speed.x = approach_f32(self.extra_speed.x, 0.0, self.extra_speed_decay);
        self.extra_speed.y = approach_f32(self.extra_speed.y, 0.0, self.extra_speed_decay);
    }

    fn update_buffers(&mut self) {
        if self.on_ground {
            self.jumps_left = self.jumps_max;
            self.ledge_buffer = self.ledge_buffer_max;
            self.has_jumped = false;
            return;
        }

        self.ledge_buffer = self.ledge_buffer.saturating_sub(1);
        // Walked off a ledge and coyote time ran out: the ground jump is gone
        if self.ledge_buffer == 0 && !self.has_jumped && self.jumps_left == self.jumps_max {
            self.jumps_left = self.jumps_left.saturating_sub(1);
        }
    }

    fn update_jump(&mut self, input: PlatformInput, position: &mut IVec2) {
        if input.jump_pressed {
            self.jump_buffer = self.jump_buffer_max;
        }

        if input.jump_released {
            self.jump_buffer = 0;
            if self.has_jumped && self.speed.y < 0.0 {
                self.speed.y *= self.jump_dampening;
            }
        }

        if self.jump_enabled && self.jump_buffer > 0 && self.jumps_left > 0 {
            if input.down() && self.on_jump_through {
                // Step into the platform so it stops counting as ground
                position.y += 1;
                self.jump_buffer = 0;
                self.ledge_buffer = 0;
                self.on_ground = false;
                self.on_jump_through = false;
                self.mover.clear_buffer_y();
                log::trace!("dropped through platform");
            } else {
                self.jump();
            }
        }

        self.jump_buffer = self.jump_buffer.saturating_sub(1);
    }

    fn update_horizontal<W: CollisionQuery + ?Sized>(
        &mut self,
        input: PlatformInput,
        position: IVec2,
        world: &W,
    ) {
        let accel_type = if self.on_ground {
            AccelType::Ground
        } else {
            AccelType::Air
        };
        let accel = self.acceleration.get(&accel_type).copied().unwrap_or(0.0);

        let target = input.direction.x * self.max_speed.x;
        self.speed.x = approach_f32(self.speed.x, target, accel);

        if self.speed.x != 0.0 {
            let side = IVec2::new(self.speed.x.signum() as i32, 0);
            if self.mover.solid_at(position + side, world).is_some() {
                self.speed.x = 0.0;
                self.mover.clear_buffer_x();
            }
        }
    }

    fn update_gravity(&mut self) {
        if !self.on_ground && self.apply_gravity {
            self.speed.y =
                (self.speed.y + self.gravity * self.gravity_multiplier).min(self.max_speed.y);
        } else if self.on_ground && self.speed.y > 0.0 {
            self.speed.y = 0.0;
        }
    }
}

impl Default for PlatformingMovement {
    fn default() -> Self {
        Self::with_mover(&PlatformingConfig::default(), Mover::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, Rect, Tag};

    const SOLID: Tag = 1;
    const PLATFORM: Tag = 2;

    fn config() -> PlatformingConfig {
        PlatformingConfig {
            movement: MovementConfig::default()
                .with_hitbox(Rect::from_size(8, 8))
                .with_solid_tags([SOLID])
                .with_jump_through_tags([PLATFORM]),
            max_speed: Vec2::new(300.0, 10_000.0),
            gravity: 100.0,
            jump_buffer_max: 4,
            ..Default::default()
        }
    }

    fn press() -> PlatformInput {
        PlatformInput {
            jump_pressed: true,
            ..Default::default()
        }
    }

    /// Floor whose top edge is at y = 8, so a body at y = 0 stands on it
    fn floor(world: &mut CollisionWorld, tag: Tag) -> ColliderHandle {
        world.add_box(IVec2::new(-100, 8), 200, 10, [tag])
    }

    /// Drop from y = 0 onto a floor at y = 100, pressing jump on `press_at`.
    /// Returns the first grounded tick and the first jump tick.
    fn fall(press_at: Option<u32>) -> (Option<u32>, Option<u32>) {
        let mut world = CollisionWorld::new();
        world.add_box(IVec2::new(-100, 100), 200, 10, [SOLID]);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        let (mut landed, mut jumped) = (None, None);
        for tick in 0..40 {
            let input = if press_at == Some(tick) {
                press()
            } else {
                PlatformInput::default()
            };
            body.update_with(input, &mut position, &world);

            if body.on_ground() && landed.is_none() {
                landed = Some(tick);
            }
            if body.just_jumped() && jumped.is_none() {
                jumped = Some(tick);
            }
        }
        (landed, jumped)
    }

    #[test]
    fn test_jump_buffered_until_landing() {
        let (landed, jumped) = fall(None);
        let landed = landed.expect("body never landed");
        assert!(landed >= 4);
        assert_eq!(jumped, None);

        // Pressed three ticks early, fires on the landing tick
        assert_eq!(fall(Some(landed - 3)).1, Some(landed));
        // Pressed four ticks early, the buffer has expired
        assert_eq!(fall(Some(landed - 4)).1, None);
    }

    #[test]
    fn test_jump_from_ground() {
        let mut world = CollisionWorld::new();
        floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(press(), &mut position, &world);

        assert!(body.just_jumped());
        assert!(body.has_jumped());
        assert_eq!(body.jumps_left(), 0);
        assert!(position.y < 0);
        assert_eq!(body.speed.y, -800.0);
    }

    #[test]
    fn test_ledge_buffer_allows_late_jump() {
        let mut world = CollisionWorld::new();
        let ground = floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&PlatformingConfig {
            jump_buffer_max: 1,
            ..config()
        })
        .unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(PlatformInput::default(), &mut position, &world);
        assert!(body.on_ground());
        world.set_enabled(ground, false);

        for _ in 0..3 {
            body.update_with(PlatformInput::default(), &mut position, &world);
        }
        body.update_with(press(), &mut position, &world);
        assert!(body.just_jumped());
    }

    #[test]
    fn test_ledge_buffer_expires() {
        let mut world = CollisionWorld::new();
        let ground = floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&PlatformingConfig {
            jump_buffer_max: 1,
            ..config()
        })
        .unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(PlatformInput::default(), &mut position, &world);
        world.set_enabled(ground, false);

        for _ in 0..4 {
            body.update_with(PlatformInput::default(), &mut position, &world);
        }
        body.update_with(press(), &mut position, &world);
        assert!(!body.just_jumped());
        assert_eq!(body.jumps_left(), 0);
    }

    #[test]
    fn test_release_damps_jump_once() {
        let mut world = CollisionWorld::new();
        floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(press(), &mut position, &world);
        assert_eq!(body.speed.y, -800.0);

        let release = PlatformInput {
            jump_released: true,
            ..Default::default()
        };
        body.update_with(release, &mut position, &world);
        assert_eq!(body.speed.y, -300.0);

        // Only the release edge damps
        body.update_with(PlatformInput::default(), &mut position, &world);
        assert_eq!(body.speed.y, -200.0);
    }

    #[test]
    fn test_double_jump() {
        let mut world = CollisionWorld::new();
        floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&PlatformingConfig {
            jumps_max: 2,
            ..config()
        })
        .unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(press(), &mut position, &world);
        assert_eq!(body.jumps_left(), 1);

        body.update_with(PlatformInput::default(), &mut position, &world);
        body.update_with(press(), &mut position, &world);
        assert!(body.just_jumped());
        assert_eq!(body.jumps_left(), 0);
    }

    #[test]
    fn test_stands_on_jump_through() {
        let mut world = CollisionWorld::new();
        floor(&mut world, PLATFORM);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        for _ in 0..3 {
            body.update_with(PlatformInput::default(), &mut position, &world);
        }
        assert!(body.on_ground());
        assert_eq!(position, IVec2::ZERO);
    }

    #[test]
    fn test_down_jump_drops_through_platform() {
        let mut world = CollisionWorld::new();
        floor(&mut world, PLATFORM);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        let drop = PlatformInput {
            direction: Vec2::Y,
            jump_pressed: true,
            ..Default::default()
        };
        body.update_with(drop, &mut position, &world);

        assert!(!body.just_jumped());
        assert_eq!(body.jump_buffer(), 0);
        assert_eq!(position.y, 2);

        body.update_with(PlatformInput::default(), &mut position, &world);
        assert!(!body.on_ground());
        assert!(position.y > 2);
    }

    #[test]
    fn test_down_jump_on_solid_jumps() {
        let mut world = CollisionWorld::new();
        floor(&mut world, SOLID);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        let input = PlatformInput {
            direction: Vec2::Y,
            jump_pressed: true,
            ..Default::default()
        };
        body.update_with(input, &mut position, &world);
        assert!(body.just_jumped());
    }

    #[test]
    fn test_wall_zeroes_horizontal_speed() {
        let mut world = CollisionWorld::new();
        floor(&mut world, SOLID);
        world.add_box(IVec2::new(8, -50), 10, 58, [SOLID]);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(
            PlatformInput {
                direction: Vec2::X,
                ..Default::default()
            },
            &mut position,
            &world,
        );

        assert_eq!(body.speed.x, 0.0);
        assert_eq!(body.mover.buffer_x(), 0);
        assert_eq!(position, IVec2::ZERO);
    }

    #[test]
    fn test_air_acceleration_used_when_airborne() {
        let world = CollisionWorld::new();
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;

        body.update_with(
            PlatformInput {
                direction: Vec2::X,
                ..Default::default()
            },
            &mut position,
            &world,
        );
        assert_eq!(body.speed.x, 20.0);
    }

    #[test]
    fn test_extra_speed_decays() {
        let world = CollisionWorld::new();
        let mut body = PlatformingMovement::new(&config()).unwrap();
        body.apply_gravity = false;
        body.extra_speed = Vec2::new(25.0, 0.0);
        let mut position = IVec2::ZERO;

        body.update_with(PlatformInput::default(), &mut position, &world);
        assert_eq!(body.extra_speed.x, 15.0);
        assert_eq!(body.mover.buffer_x(), 25);
    }

    #[test]
    fn test_config_validation_and_ron() {
        let bad = PlatformingConfig {
            jump_dampening: 1.5,
            ..Default::default()
        };
        assert!(PlatformingMovement::new(&bad).is_err());

        let ron_str =
            ron::ser::to_string_pretty(&config(), ron::ser::PrettyConfig::default()).unwrap();
        let loaded = PlatformingConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config());

        let partial = PlatformingConfig::from_ron_str("(jumps_max: 3)").unwrap();
        assert_eq!(partial.jumps_max, 3);
        assert_eq!(partial.gravity, PlatformingConfig::default().gravity);
    }

    #[test]
    fn test_update_reads_button_and_axis() {
        let mut world = CollisionWorld::new();
        floor(&mut world, PLATFORM);
        let mut body = PlatformingMovement::new(&config()).unwrap();
        let mut position = IVec2::ZERO;
        let mut jump = Button::new();
        let mut axis = Axis::new();

        body.update(&jump, &axis, &mut position, &world);
        assert!(body.on_ground());

        jump.update_with_state(true);
        axis.update_with_value(Vec2::new(0.0, 1.0));
        assert!(PlatformInput::from_controls(&jump, &axis).down());

        body.update(&jump, &axis, &mut position, &world);
        assert!(!body.just_jumped());
        assert!(position.y > 0);
    }
}
