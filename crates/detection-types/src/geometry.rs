//! Bounding boxes and points in frame pixel coordinates

use serde::{Deserialize, Serialize};

/// 2D point (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Axis-aligned bounding box, `x,y` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Center of the box
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Longest side
    pub fn longest_side(&self) -> f32 {
        self.w.max(self.h)
    }

    /// Width over height, `None` for a degenerate box
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.h > 0.0 {
            Some(self.w / self.h)
        } else {
            None
        }
    }

    /// Distance between the centers of two boxes
    pub fn center_distance(&self, other: &BBox) -> f32 {
        self.center().distance(&other.center())
    }

    /// Whether all components are finite and the box has positive area
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite())
            && self.w > 0.0
            && self.h > 0.0
    }
}
