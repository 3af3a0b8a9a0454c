use crate::core::geo::Point;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in view or screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    min: Point,
    max: Point,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = MapError;

    fn try_from(raw: RawBounds) -> Result<Self> {
        Bounds::try_new(raw.min, raw.max)
    }
}

impl From<Bounds> for RawBounds {
    fn from(bounds: Bounds) -> Self {
        RawBounds {
            min: bounds.min,
            max: bounds.max,
        }
    }
}

impl Bounds {
    /// Creates new bounds from two points.
    ///
    /// # Panics
    ///
    /// Panics if `min` exceeds `max` on either axis. Use [`Bounds::try_new`]
    /// or [`Bounds::from_corners`] when the corner order is not known.
    pub fn new(min: Point, max: Point) -> Self {
        assert!(
            min.x <= max.x && min.y <= max.y,
            "bounds min {} exceeds max {}",
            min,
            max
        );
        Self { min, max }
    }

    pub fn try_new(min: Point, max: Point) -> Result<Self> {
        if min.x <= max.x && min.y <= max.y {
            Ok(Self { min, max })
        } else {
            Err(MapError::InvalidBounds(format!(
                "min {} exceeds max {}",
                min, max
            )))
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates bounds from two opposite corners given in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Bounds of an interleaved `x0, y0, x1, y1, ...` coordinate list
    pub fn from_extents(coordinates: &[f64]) -> Option<Self> {
        let points: Vec<Point> = coordinates
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        Self::from_points(&points)
    }

    /// Creates empty bounds that become valid once a point is added
    pub fn empty() -> Self {
        Self {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    /// Gets the four corner points, clockwise from `min`
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Extends the bounds to include another bounds
    pub fn extend_bounds(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.extend(&other.min);
        self.extend(&other.max);
    }

    /// Whether the point lies inside or on the edge
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether `other` lies completely within these bounds
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Whether these bounds lie completely within `other`
    pub fn inside(&self, other: &Bounds) -> bool {
        other.contains_bounds(self)
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    /// Scales both corners about the origin
    pub fn scale(&mut self, factor: f64) {
        let (a, b) = (self.min * factor, self.max * factor);
        *self = Self::from_corners(a, b);
    }

    pub fn translate(&mut self, delta: Point) {
        self.min = self.min + delta;
        self.max = self.max + delta;
    }

    /// Grows the bounds by `amount` on every side
    pub fn expand(&mut self, amount: f64) {
        self.expand_xy(amount, amount);
    }

    /// Grows the bounds by `dx` horizontally and `dy` vertically on each side
    pub fn expand_xy(&mut self, dx: f64, dy: f64) {
        self.min.x -= dx;
        self.min.y -= dy;
        self.max.x += dx;
        self.max.y += dy;
        if self.min.x > self.max.x {
            let mid = (self.min.x + self.max.x) / 2.0;
            self.min.x = mid;
            self.max.x = mid;
        }
        if self.min.y > self.max.y {
            let mid = (self.min.y + self.max.y) / 2.0;
            self.min.y = mid;
            self.max.y = mid;
        }
    }

    /// Returns a new bounds expanded by the given amount
    pub fn expanded(&self, amount: f64) -> Bounds {
        let mut expanded = *self;
        expanded.expand(amount);
        expanded
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}
