#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// Tolerance for positional equality, in canvas units.
pub const EPSILON: f64 = 1e-9;

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Equality within [`EPSILON`].
    #[inline]
    #[must_use]
    pub fn approx_eq(&self, other: &Position) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

/// An axis-aligned rectangle in canvas coordinates.
///
/// Origin at top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a position is inside the rectangle (right/bottom exclusive).
    #[inline]
    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// The smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Equality within [`EPSILON`] on every edge.
    #[must_use]
    pub fn approx_eq(&self, other: &Bounds) -> bool {
        (self.x - other.x).abs() <= EPSILON
            && (self.y - other.y).abs() <= EPSILON
            && (self.width - other.width).abs() <= EPSILON
            && (self.height - other.height).abs() <= EPSILON
    }
}
