//! Axis-aligned rectangles for tokens, slots and buttons
//!
//! Screen space: origin top-left, y grows downward. Containment is
//! half-open (left/top inclusive, right/bottom exclusive) so two
//! rectangles sharing an edge never both claim the same point.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Rectangle of the given size with its top-left corner at `min`
    pub fn at(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Bottom-right corner (exclusive)
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    /// Move so that the rectangle is centered on `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.min = center - self.size / 2.0;
    }

    /// Check if a point lies inside the rectangle
    pub fn contains_point(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x < max.x && p.y >= self.min.y && p.y < max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_point_half_open() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(r.contains_point(Vec2::new(10.0, 20.0)));
        assert!(r.contains_point(Vec2::new(109.9, 69.9)));
        assert!(!r.contains_point(Vec2::new(110.0, 30.0)));
        assert!(!r.contains_point(Vec2::new(50.0, 70.0)));
        assert!(!r.contains_point(Vec2::new(9.0, 30.0)));
    }

    #[test]
    fn test_rect_set_center() {
        let mut r = Rect::new(0.0, 0.0, 100.0, 50.0);
        r.set_center(Vec2::new(200.0, 200.0));
        assert_eq!(r.min, Vec2::new(150.0, 175.0));
        assert_eq!(r.center(), Vec2::new(200.0, 200.0));
    }
}
