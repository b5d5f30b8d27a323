//! Planar geometry in board internal units.
//!
//! The board Y axis points down. Positive angles rotate counter-clockwise as
//! seen on screen, so a quarter turn maps `(x, y)` to `(y, -x)`.

use serde::{Deserialize, Serialize};

use super::units::{area_to_mm2, to_mm, Coord};

/// A point on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (mm in documents, nm in memory).
    #[serde(with = "super::units::mm")]
    pub x: Coord,
    /// Y coordinate (mm in documents, nm in memory).
    #[serde(with = "super::units::mm")]
    pub y: Coord,
}

impl Point {
    /// Creates a point from internal units.
    #[must_use]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Creates a point from millimetre coordinates.
    #[must_use]
    pub fn from_mm(x: f64, y: f64) -> Self {
        Self::new(super::units::from_mm(x), super::units::from_mm(y))
    }

    /// Returns the coordinates in millimetres.
    #[must_use]
    pub fn to_mm(self) -> (f64, f64) {
        (to_mm(self.x), to_mm(self.y))
    }

    /// Euclidean distance to `other` in millimetres.
    #[must_use]
    pub fn distance_mm(self, other: Self) -> f64 {
        let (dx, dy) = (to_mm(other.x - self.x), to_mm(other.y - self.y));
        dx.hypot(dy)
    }

    /// Returns this point translated by `offset`.
    #[must_use]
    pub const fn offset(self, offset: Self) -> Self {
        Self::new(self.x.saturating_add(offset.x), self.y.saturating_add(offset.y))
    }

    /// Rotates this point (relative to the origin) by `degrees`.
    ///
    /// Quarter turns are computed exactly; other angles are rounded to the
    /// nearest nanometre.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn rotated(self, degrees: f64) -> Self {
        match quarter_turns(degrees) {
            Some(0) => self,
            Some(1) => Self::new(self.y, -self.x),
            Some(2) => Self::new(-self.x, -self.y),
            Some(3) => Self::new(-self.y, self.x),
            _ => {
                let (sin, cos) = degrees.to_radians().sin_cos();
                let (x, y) = (self.x as f64, self.y as f64);
                Self::new(
                    x.mul_add(cos, y * sin).round() as Coord,
                    (-x).mul_add(sin, y * cos).round() as Coord,
                )
            }
        }
    }
}

/// Normalises an angle in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Returns the number of quarter turns if `degrees` is an exact multiple of 90.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let normalized = normalize_degrees(degrees);
    let turns = normalized / 90.0;
    if (turns - turns.round()).abs() < 1e-9 {
        Some((turns.round() as u8) % 4)
    } else {
        None
    }
}

/// An axis-aligned rectangle.
///
/// `(x, y)` is the minimum corner; `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Minimum X.
    pub x: Coord,
    /// Minimum Y.
    pub y: Coord,
    /// Extent along X.
    pub width: Coord,
    /// Extent along Y.
    pub height: Coord,
}

impl Rect {
    /// Creates a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Creates a rectangle centred on `center`.
    #[must_use]
    pub fn from_center(center: Point, width: Coord, height: Coord) -> Self {
        let (width, height) = (width.abs(), height.abs());
        Self {
            x: center.x.saturating_sub(width / 2),
            y: center.y.saturating_sub(height / 2),
            width,
            height,
        }
    }

    /// Returns the smallest rectangle covering all `points`, if any.
    pub fn bounding<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        points
            .into_iter()
            .map(|p| Self::from_corners(p, p))
            .reduce(|acc, r| acc.merge(&r))
    }

    /// Right edge.
    #[must_use]
    pub const fn right(&self) -> Coord {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> Coord {
        self.y.saturating_add(self.height)
    }

    /// Minimum corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Maximum corner.
    #[must_use]
    pub const fn end(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Centre point.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// The four corners, clockwise from the minimum corner.
    #[must_use]
    pub const fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Returns true if `inner` lies entirely within this rectangle.
    #[must_use]
    pub const fn contains(&self, inner: &Self) -> bool {
        inner.x >= self.x
            && inner.y >= self.y
            && inner.right() <= self.right()
            && inner.bottom() <= self.bottom()
    }

    /// Returns true if the rectangles overlap on both axes. Touching edges
    /// count as intersecting.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Expands the rectangle by `margin` on every side.
    ///
    /// A negative margin shrinks it, never below zero size. Edges saturate
    /// at the coordinate range instead of wrapping.
    #[must_use]
    pub fn inflate(&self, margin: Coord) -> Self {
        let grow = margin.saturating_mul(2);
        let width = self.width.saturating_add(grow).max(0);
        let height = self.height.saturating_add(grow).max(0);
        let center = self.center();
        if width == 0 || height == 0 {
            return Self::from_center(center, width, height);
        }
        Self {
            x: self.x.saturating_sub(margin),
            y: self.y.saturating_sub(margin),
            width,
            height,
        }
    }

    /// Returns the smallest rectangle covering both.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()).saturating_sub(x),
            height: self.bottom().max(other.bottom()).saturating_sub(y),
        }
    }

    /// Returns this rectangle translated by `offset`.
    #[must_use]
    pub const fn translated(&self, offset: Point) -> Self {
        Self {
            x: self.x.saturating_add(offset.x),
            y: self.y.saturating_add(offset.y),
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the axis-aligned hull of this rectangle rotated about the
    /// origin by `degrees`.
    #[must_use]
    pub fn rotated(&self, degrees: f64) -> Self {
        Self::bounding(self.corners().map(|c| c.rotated(degrees)))
            .unwrap_or(*self)
    }

    /// Width and height in millimetres.
    #[must_use]
    pub fn size_mm(&self) -> (f64, f64) {
        (to_mm(self.width), to_mm(self.height))
    }

    /// Area in square millimetres.
    #[must_use]
    pub fn area_mm2(&self) -> f64 {
        area_to_mm2(self.width, self.height)
    }
}

/// Counter-clockwise orientation predicate for three points.
///
/// True when `a -> b -> c` turns one way, false for the other way and for
/// collinear points. Only meaningful as a building block for segment
/// crossing tests.
pub(crate) fn ccw(a: Point, b: Point, c: Point) -> bool {
    let lhs = i128::from(c.y - a.y) * i128::from(b.x - a.x);
    let rhs = i128::from(b.y - a.y) * i128::from(c.x - a.x);
    lhs > rhs
}
