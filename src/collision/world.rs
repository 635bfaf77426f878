//! Collider storage and tag-filtered overlap queries

use glam::IVec2;
use smallvec::SmallVec;

use super::grid::GridCollider;
use super::rect::Rect;

/// Collision category. Game enums convert into tags with `as u32` or `From`.
pub type Tag = u32;

/// Tag set stored inline for the common case of a few categories
pub type Tags = SmallVec<[Tag; 4]>;

/// Handle to a collider in a [`CollisionWorld`].
///
/// Handles carry a generation so a handle to a removed collider never aliases
/// a collider inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle {
    index: u32,
    generation: u32,
}

/// Geometry of a collider, relative to its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Solid box with its top-left corner at the collider position
    Box { width: i32, height: i32 },
    /// Tile grid with its top-left corner at the collider position
    Grid(GridCollider),
}

/// A placed, tagged collider
#[derive(Debug, Clone)]
pub struct Collider {
    /// Shape geometry
    pub shape: Shape,
    /// World position of the shape's top-left corner
    pub position: IVec2,
    /// Categories this collider belongs to
    pub tags: Tags,
    /// Disabled colliders are skipped by every query
    pub enabled: bool,
}

impl Collider {
    /// Create an enabled collider
    pub fn new(shape: Shape, position: IVec2, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            shape,
            position,
            tags: tags.into_iter().collect(),
            enabled: true,
        }
    }

    /// Check if the collider belongs to any of the given categories
    #[must_use]
    pub fn matches(&self, tags: &[Tag]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }

    /// Check if any solid part of the collider lies under a world rectangle
    #[must_use]
    pub fn overlaps(&self, area: &Rect) -> bool {
        match &self.shape {
            Shape::Box { width, height } => {
                Rect::new(self.position.x, self.position.y, *width, *height).intersects(area)
            }
            Shape::Grid(grid) => grid.overlaps(&area.translate(-self.position)),
        }
    }

    /// Grid shape, if this collider is a grid
    #[must_use]
    pub fn grid(&self) -> Option<&GridCollider> {
        match &self.shape {
            Shape::Grid(grid) => Some(grid),
            Shape::Box { .. } => None,
        }
    }

    /// Mutable grid shape, if this collider is a grid
    pub fn grid_mut(&mut self) -> Option<&mut GridCollider> {
        match &mut self.shape {
            Shape::Grid(grid) => Some(grid),
            Shape::Box { .. } => None,
        }
    }
}

/// Read-only collision queries consumed by the movement engine.
///
/// Queries never mutate, so any number of movers can probe the same level
/// in one tick. An empty tag filter matches nothing.
pub trait CollisionQuery {
    /// First enabled collider with a matching tag that overlaps `area` and
    /// passes `filter`.
    fn find_blocking_where(
        &self,
        area: &Rect,
        tags: &[Tag],
        filter: &dyn Fn(ColliderHandle) -> bool,
    ) -> Option<ColliderHandle>;

    /// Check if a specific collider overlaps `area`
    fn overlaps(&self, handle: ColliderHandle, area: &Rect) -> bool;

    /// First enabled collider with a matching tag that overlaps `area`
    fn find_blocking(&self, area: &Rect, tags: &[Tag]) -> Option<ColliderHandle> {
        self.find_blocking_where(area, tags, &|_| true)
    }

    /// Check if anything with a matching tag overlaps `area`
    fn blocked(&self, area: &Rect, tags: &[Tag]) -> bool {
        self.find_blocking(area, tags).is_some()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    collider: Option<Collider>,
}

/// Collection of colliders making up a level
#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl CollisionWorld {
    /// Create an empty world
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider and return its handle
    pub fn insert(&mut self, collider: Collider) -> ColliderHandle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.collider = Some(collider);
            return ColliderHandle {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            collider: Some(collider),
        });
        ColliderHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Add a box collider
    pub fn add_box(
        &mut self,
        position: IVec2,
        width: i32,
        height: i32,
        tags: impl IntoIterator<Item = Tag>,
    ) -> ColliderHandle {
        self.insert(Collider::new(Shape::Box { width, height }, position, tags))
    }

    /// Add a grid collider
    pub fn add_grid(
        &mut self,
        position: IVec2,
        grid: GridCollider,
        tags: impl IntoIterator<Item = Tag>,
    ) -> ColliderHandle {
        self.insert(Collider::new(Shape::Grid(grid), position, tags))
    }

    /// Remove a collider, returning it if the handle was live
    pub fn remove(&mut self, handle: ColliderHandle) -> Option<Collider> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        let collider = slot.collider.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(collider)
    }

    /// Get a collider
    #[must_use]
    pub fn get(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.collider.as_ref())
    }

    /// Get a collider mutably
    pub fn get_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.collider.as_mut())
    }

    /// Move a collider. Returns `false` for stale handles.
    pub fn set_position(&mut self, handle: ColliderHandle, position: IVec2) -> bool {
        self.get_mut(handle)
            .map(|c| c.position = position)
            .is_some()
    }

    /// Enable or disable a collider. Returns `false` for stale handles.
    pub fn set_enabled(&mut self, handle: ColliderHandle, enabled: bool) -> bool {
        self.get_mut(handle).map(|c| c.enabled = enabled).is_some()
    }

    /// Number of live colliders
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the world has no colliders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live colliders
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.collider.as_ref().map(|c| {
                (
                    ColliderHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    c,
                )
            })
        })
    }

    /// Every enabled collider with a matching tag that overlaps `area`
    #[must_use]
    pub fn find_all(&self, area: &Rect, tags: &[Tag]) -> Vec<ColliderHandle> {
        self.iter()
            .filter(|(_, c)| c.enabled && c.matches(tags) && c.overlaps(area))
            .map(|(h, _)| h)
            .collect()
    }
}

impl CollisionQuery for CollisionWorld {
    fn find_blocking_where(
        &self,
        area: &Rect,
        tags: &[Tag],
        filter: &dyn Fn(ColliderHandle) -> bool,
    ) -> Option<ColliderHandle> {
        if tags.is_empty() {
            return None;
        }

        self.iter()
            .find(|(h, c)| c.enabled && c.matches(tags) && c.overlaps(area) && filter(*h))
            .map(|(h, _)| h)
    }

    fn overlaps(&self, handle: ColliderHandle, area: &Rect) -> bool {
        self.get(handle).is_some_and(|c| c.enabled && c.overlaps(area))
    }
}
