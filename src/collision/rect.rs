//! Integer rectangles used for hitboxes and overlap queries

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in whole pixels.
///
/// `x`/`y` is the top-left corner, the right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// A rectangle with no area never overlaps anything
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Move the rectangle by an offset
    #[must_use]
    pub fn translate(self, offset: IVec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..self
        }
    }

    /// Check if two rectangles share at least one pixel
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Check if a point is inside the rectangle
    #[must_use]
    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0, 0, 10, 10);

        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        // Touching edges do not overlap
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(!a.intersects(&Rect::new(0, 10, 5, 5)));
        assert!(!a.intersects(&Rect::new(2, 2, 0, 5)));
    }

    #[test]
    fn test_rect_translate_and_contains() {
        let rect = Rect::from_size(4, 4).translate(IVec2::new(10, -2));

        assert_eq!(rect, Rect::new(10, -2, 4, 4));
        assert!(rect.contains(IVec2::new(13, 1)));
        assert!(!rect.contains(IVec2::new(14, 1)));
    }
}
