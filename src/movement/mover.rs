//! Sweeping pixel mover with sub-pixel buffers
//!
//! Motion is accumulated into integer buffers where `speed_scale` units make one
//! pixel. Whole pixels are applied one at a time, checking the hitbox against
//! the collision world before every step. A blocked step discards whatever is
//! left in the buffer.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::collision::{ColliderHandle, CollisionQuery, Rect, Tag, Tags};
use crate::core::{ConfigError, ConfigFile};

/// Buffer units per pixel unless configured otherwise
pub const DEFAULT_SPEED_SCALE: i32 = 100;

/// Move `value` toward `target` by at most `amount`, never overshooting.
pub(crate) fn approach(value: i32, target: i32, amount: i32) -> i32 {
    if value < target {
        (value + amount).min(target)
    } else {
        (value - amount).max(target)
    }
}

/// Float version of [`approach`]
pub(crate) fn approach_f32(value: f32, target: f32, amount: f32) -> f32 {
    if value < target {
        (value + amount).min(target)
    } else {
        (value - amount).max(target)
    }
}

/// Reaction to a blocked step.
///
/// The sweep calls this after zeroing the buffer of the blocked axis. The unit
/// type ignores collisions.
pub trait MoveResponse {
    /// A horizontal step was blocked by `hit`
    fn collide_x(&mut self, _hit: ColliderHandle) {}

    /// A vertical step was blocked by `hit`
    fn collide_y(&mut self, _hit: ColliderHandle) {}
}

impl MoveResponse for () {}

/// Tuning shared by every mover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Buffer units per pixel
    pub speed_scale: i32,
    /// Hitbox relative to the body position. `None` disables collision.
    pub hitbox: Option<Rect>,
    /// Tags that block movement on every side
    pub solid_tags: Vec<Tag>,
    /// Tags that only block downward movement from above
    pub jump_through_tags: Vec<Tag>,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed_scale: DEFAULT_SPEED_SCALE,
            hitbox: None,
            solid_tags: Vec::new(),
            jump_through_tags: Vec::new(),
        }
    }
}

impl MovementConfig {
    /// Set the hitbox
    #[must_use]
    pub fn with_hitbox(mut self, hitbox: Rect) -> Self {
        self.hitbox = Some(hitbox);
        self
    }

    /// Set the solid tags
    #[must_use]
    pub fn with_solid_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.solid_tags = tags.into_iter().collect();
        self
    }

    /// Set the jump-through tags
    #[must_use]
    pub fn with_jump_through_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.jump_through_tags = tags.into_iter().collect();
        self
    }

    /// Set the speed scale
    #[must_use]
    pub fn with_speed_scale(mut self, speed_scale: i32) -> Self {
        self.speed_scale = speed_scale;
        self
    }
}

impl ConfigFile for MovementConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.speed_scale <= 0 {
            return Err(ConfigError::Invalid(format!(
                "speed_scale must be positive, got {}",
                self.speed_scale
            )));
        }
        if let Some(hitbox) = self.hitbox
            && (hitbox.width < 0 || hitbox.height < 0)
        {
            return Err(ConfigError::Invalid(format!(
                "hitbox size must not be negative, got {}x{}",
                hitbox.width, hitbox.height
            )));
        }
        Ok(())
    }
}

/// Generic sweeping mover
#[derive(Debug, Clone)]
pub struct Mover {
    /// Buffer units per pixel
    speed_scale: i32,
    /// Hitbox relative to the body position
    pub hitbox: Option<Rect>,
    /// Tags that block on every side
    pub solid_tags: Tags,
    /// Tags that block only downward motion into them from above
    pub jump_through_tags: Tags,
    /// While frozen, move calls are ignored and nothing accumulates
    pub freeze: bool,
    buffer_x: i32,
    buffer_y: i32,
}

impl Default for Mover {
    fn default() -> Self {
        Self {
            speed_scale: DEFAULT_SPEED_SCALE,
            hitbox: None,
            solid_tags: Tags::new(),
            jump_through_tags: Tags::new(),
            freeze: false,
            buffer_x: 0,
            buffer_y: 0,
        }
    }
}

impl Mover {
    /// Create a mover from its config
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config fails validation
    pub fn new(config: &MovementConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            speed_scale: config.speed_scale,
            hitbox: config.hitbox,
            solid_tags: config.solid_tags.iter().copied().collect(),
            jump_through_tags: config.jump_through_tags.iter().copied().collect(),
            ..Self::default()
        })
    }

    /// Buffer units per pixel
    #[must_use]
    pub fn speed_scale(&self) -> i32 {
        self.speed_scale
    }

    /// Pending horizontal sub-pixel motion
    #[must_use]
    pub fn buffer_x(&self) -> i32 {
        self.buffer_x
    }

    /// Pending vertical sub-pixel motion
    #[must_use]
    pub fn buffer_y(&self) -> i32 {
        self.buffer_y
    }

    /// Drop pending horizontal motion
    pub fn clear_buffer_x(&mut self) {
        self.buffer_x = 0;
    }

    /// Drop pending vertical motion
    pub fn clear_buffer_y(&mut self) {
        self.buffer_y = 0;
    }

    /// Hitbox in world space for a body at `position`
    #[must_use]
    pub fn hitbox_at(&self, position: IVec2) -> Option<Rect> {
        self.hitbox.map(|h| h.translate(position))
    }

    /// Solid collider under the hitbox at `position`, if any
    pub fn solid_at<W: CollisionQuery + ?Sized>(
        &self,
        position: IVec2,
        world: &W,
    ) -> Option<ColliderHandle> {
        let area = self.hitbox_at(position)?;
        world.find_blocking(&area, &self.solid_tags)
    }

    /// Jump-through collider the hitbox would enter by moving from `from` to `to`.
    ///
    /// Platforms the hitbox already overlaps at `from` are ignored, which is what
    /// lets bodies rise through them and stand on them afterwards.
    pub fn jump_through_entering<W: CollisionQuery + ?Sized>(
        &self,
        from: IVec2,
        to: IVec2,
        world: &W,
    ) -> Option<ColliderHandle> {
        let current = self.hitbox_at(from)?;
        let next = self.hitbox_at(to)?;
        world.find_blocking_where(&next, &self.jump_through_tags, &|h| {
            !world.overlaps(h, &current)
        })
    }

    fn blocking<W: CollisionQuery + ?Sized>(
        &self,
        position: IVec2,
        step: IVec2,
        world: &W,
    ) -> Option<ColliderHandle> {
        let next = position + step;
        self.solid_at(next, world).or_else(|| {
            if step.y > 0 {
                self.jump_through_entering(position, next, world)
            } else {
                None
            }
        })
    }

    /// Sweep horizontally by `delta` buffer units.
    ///
    /// Returns the collider that stopped the sweep, if any.
    pub fn move_x<W, R>(
        &mut self,
        delta: i32,
        position: &mut IVec2,
        world: &W,
        response: &mut R,
    ) -> Option<ColliderHandle>
    where
        W: CollisionQuery + ?Sized,
        R: MoveResponse + ?Sized,
    {
        if self.freeze {
            return None;
        }

        self.buffer_x += delta;
        while self.buffer_x.abs() >= self.speed_scale {
            let step = IVec2::new(self.buffer_x.signum(), 0);
            if let Some(hit) = self.blocking(*position, step, world) {
                self.buffer_x = 0;
                response.collide_x(hit);
                return Some(hit);
            }
            *position += step;
            self.buffer_x = approach(self.buffer_x, 0, self.speed_scale);
        }
        None
    }

    /// Sweep vertically by `delta` buffer units.
    ///
    /// Returns the collider that stopped the sweep, if any.
    pub fn move_y<W, R>(
        &mut self,
        delta: i32,
        position: &mut IVec2,
        world: &W,
        response: &mut R,
    ) -> Option<ColliderHandle>
    where
        W: CollisionQuery + ?Sized,
        R: MoveResponse + ?Sized,
    {
        if self.freeze {
            return None;
        }

        self.buffer_y += delta;
        while self.buffer_y.abs() >= self.speed_scale {
            let step = IVec2::new(0, self.buffer_y.signum());
            if let Some(hit) = self.blocking(*position, step, world) {
                self.buffer_y = 0;
                response.collide_y(hit);
                return Some(hit);
            }
            *position += step;
            self.buffer_y = approach(self.buffer_y, 0, self.speed_scale);
        }
        None
    }

    /// Sweep X to completion, then Y.
    pub fn move_xy<W, R>(
        &mut self,
        delta: IVec2,
        position: &mut IVec2,
        world: &W,
        response: &mut R,
    ) -> (Option<ColliderHandle>, Option<ColliderHandle>)
    where
        W: CollisionQuery + ?Sized,
        R: MoveResponse + ?Sized,
    {
        let hit_x = self.move_x(delta.x, position, world, response);
        let hit_y = self.move_y(delta.y, position, world, response);
        (hit_x, hit_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, GridCollider};

    const SOLID: Tag = 1;
    const PLATFORM: Tag = 2;

    fn mover() -> Mover {
        Mover::new(
            &MovementConfig::default()
                .with_hitbox(Rect::from_size(8, 8))
                .with_solid_tags([SOLID])
                .with_jump_through_tags([PLATFORM]),
        )
        .unwrap()
    }

    #[derive(Default)]
    struct Hits {
        x: Vec<ColliderHandle>,
        y: Vec<ColliderHandle>,
    }

    impl MoveResponse for Hits {
        fn collide_x(&mut self, hit: ColliderHandle) {
            self.x.push(hit);
        }

        fn collide_y(&mut self, hit: ColliderHandle) {
            self.y.push(hit);
        }
    }

    #[test]
    fn test_approach() {
        assert_eq!(approach(250, 0, 100), 150);
        assert_eq!(approach(50, 0, 100), 0);
        assert_eq!(approach(-250, 0, 100), -150);
        assert_eq!(approach_f32(1.0, 3.0, 0.5), 1.5);
        assert_eq!(approach_f32(2.9, 3.0, 0.5), 3.0);
    }

    #[test]
    fn test_buffer_conservation_without_collisions() {
        let world = CollisionWorld::new();
        let mut mover = mover();
        let mut position = IVec2::ZERO;

        let deltas = [30, 75, 120, 5, 260, 99];
        for delta in deltas {
            mover.move_x(delta, &mut position, &world, &mut ());
            assert!(mover.buffer_x().abs() < mover.speed_scale());
        }

        let total: i32 = deltas.iter().sum();
        assert_eq!(position.x, total / 100);
        assert_eq!(mover.buffer_x(), total % 100);
    }

    #[test]
    fn test_collision_zeroes_buffer() {
        let mut world = CollisionWorld::new();
        let wall = world.add_box(IVec2::new(10, 0), 10, 10, [SOLID]);
        let mut mover = mover();
        let mut position = IVec2::ZERO;
        let mut hits = Hits::default();

        // Two pixels of room, ten requested
        let hit = mover.move_x(1_050, &mut position, &world, &mut hits);

        assert_eq!(hit, Some(wall));
        assert_eq!(position.x, 2);
        assert_eq!(mover.buffer_x(), 0);
        assert_eq!(hits.x, vec![wall]);
        assert!(hits.y.is_empty());
    }

    #[test]
    fn test_no_hitbox_moves_unconditionally() {
        let mut world = CollisionWorld::new();
        world.add_box(IVec2::new(2, 0), 10, 10, [SOLID]);
        let mut mover = Mover::default();
        let mut position = IVec2::ZERO;

        assert!(mover.move_x(500, &mut position, &world, &mut ()).is_none());
        assert_eq!(position.x, 5);
    }

    #[test]
    fn test_empty_tags_never_block() {
        let mut world = CollisionWorld::new();
        world.add_box(IVec2::new(2, 0), 10, 10, [SOLID]);
        let mut mover = Mover::new(&MovementConfig::default().with_hitbox(Rect::from_size(1, 1)))
            .unwrap();
        let mut position = IVec2::ZERO;

        mover.move_x(500, &mut position, &world, &mut ());
        assert_eq!(position.x, 5);
    }

    #[test]
    fn test_freeze_ignores_motion() {
        let world = CollisionWorld::new();
        let mut mover = mover();
        mover.freeze = true;
        let mut position = IVec2::ZERO;

        mover.move_x(550, &mut position, &world, &mut ());
        assert_eq!(position, IVec2::ZERO);
        assert_eq!(mover.buffer_x(), 0);
    }

    #[test]
    fn test_jump_through_blocks_only_from_above() {
        let mut world = CollisionWorld::new();
        let platform = world.add_box(IVec2::new(0, 20), 32, 4, [PLATFORM]);
        let mut mover = mover();

        // Falling onto the platform stops on its top edge
        let mut position = IVec2::new(4, 0);
        let hit = mover.move_y(3_000, &mut position, &world, &mut ());
        assert_eq!(hit, Some(platform));
        assert_eq!(position.y, 12);

        // Rising from below passes through
        let mut position = IVec2::new(4, 30);
        assert!(mover.move_y(-3_000, &mut position, &world, &mut ()).is_none());
        assert_eq!(position.y, 0);

        // Already inside it, falling continues through
        let mut position = IVec2::new(4, 13);
        assert!(mover.move_y(2_000, &mut position, &world, &mut ()).is_none());
        assert_eq!(position.y, 33);

        // Sideways never blocks
        let mut position = IVec2::new(-20, 18);
        assert!(mover.move_x(3_000, &mut position, &world, &mut ()).is_none());
    }

    #[test]
    fn test_x_resolves_before_y() {
        let mut grid = GridCollider::new(4, 4, 8, 8).unwrap();
        grid.set(1, 1, true);
        let mut world = CollisionWorld::new();
        world.add_grid(IVec2::ZERO, grid, [SOLID]);

        let mut mover = mover();
        let mut position = IVec2::ZERO;
        let mut hits = Hits::default();

        // Diagonal into the block's corner: X runs freely above it, then Y hits it
        mover.move_xy(IVec2::new(800, 800), &mut position, &world, &mut hits);

        assert_eq!(position, IVec2::new(8, 0));
        assert!(hits.x.is_empty());
        assert_eq!(hits.y.len(), 1);
    }

    #[test]
    fn test_invalid_speed_scale() {
        assert!(Mover::new(&MovementConfig::default().with_speed_scale(0)).is_err());
    }
}
