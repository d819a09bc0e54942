#![forbid(unsafe_code)]

//! Geometric primitives in canvas (viewport) space.

use serde::{Deserialize, Serialize};

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset this point by a vector.
    #[inline]
    pub fn offset(self, by: CanvasVector) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// Vector pointing from `origin` to this point.
    #[inline]
    pub fn delta_from(self, origin: CanvasPoint) -> CanvasVector {
        CanvasVector::new(self.x - origin.x, self.y - origin.y)
    }

    /// Both coordinates are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A displacement on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasVector {
    pub x: f64,
    pub y: f64,
}

impl CanvasVector {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan length.
    #[inline]
    pub fn manhattan_length(self) -> f64 {
        self.x.abs() + self.y.abs()
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Keep only the dominant axis; ties keep the horizontal component.
    #[must_use]
    pub fn lock_to_dominant_axis(self) -> Self {
        if self.x.abs() >= self.y.abs() {
            Self::new(self.x, 0.0)
        } else {
            Self::new(0.0, self.y)
        }
    }
}

impl std::ops::Add for CanvasVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Offset `point` by `vector`.
#[inline]
pub fn offset_point(point: CanvasPoint, vector: CanvasVector) -> CanvasPoint {
    point.offset(vector)
}

/// An axis-aligned rectangle on the canvas.
///
/// Containment is half-open: the left and top edges are inside, the right
/// and bottom edges are not.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasRect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
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
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    pub fn center(&self) -> CanvasPoint {
        CanvasPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> CanvasPoint {
        CanvasPoint::new(self.x, self.y)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains_point(&self, point: CanvasPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &CanvasRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Move the rectangle by a vector.
    #[inline]
    #[must_use]
    pub fn translate(&self, by: CanvasVector) -> CanvasRect {
        CanvasRect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    pub fn intersection(&self, other: &CanvasRect) -> Option<CanvasRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(CanvasRect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// The smallest rectangle that contains both.
    pub fn union(&self, other: &CanvasRect) -> CanvasRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        CanvasRect::new(x, y, right - x, bottom - y)
    }

    /// Bounding rectangle of a set of rectangles.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a CanvasRect>) -> Option<CanvasRect> {
        rects
            .into_iter()
            .fold(None, |acc: Option<CanvasRect>, rect| match acc {
                Some(acc) => Some(acc.union(rect)),
                None => Some(*rect),
            })
    }
}

/// A measured frame, or the sentinel for "not yet measured".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaybeInfiniteRect {
    Finite(CanvasRect),
    Infinite,
}

impl MaybeInfiniteRect {
    #[inline]
    pub const fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// The measured rectangle, if any.
    #[inline]
    pub const fn as_finite(&self) -> Option<CanvasRect> {
        match self {
            Self::Finite(rect) => Some(*rect),
            Self::Infinite => None,
        }
    }
}

impl Default for MaybeInfiniteRect {
    fn default() -> Self {
        Self::Infinite
    }
}

impl From<CanvasRect> for MaybeInfiniteRect {
    fn from(rect: CanvasRect) -> Self {
        Self::Finite(rect)
    }
}
