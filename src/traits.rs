//! Shared trait abstractions
//!
//! Interpolation for animated values and the seam through which the
//! embedding application draws tiles.

use crate::core::geo::{Point, TileIndex};
use crate::core::viewport::ViewportSnapshot;
use nalgebra::Matrix3;

/// Values that can be interpolated by an animation entry
pub trait Lerp {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}

impl<A: Lerp, B: Lerp> Lerp for (A, B) {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        (self.0.lerp(&other.0, t), self.1.lerp(&other.1, t))
    }
}

/// External renderer invoked once per visible tile.
///
/// `matrix` maps tile-local coordinates in `[0,1]×[0,1]` to screen pixels.
pub trait TileRenderer {
    fn begin_frame(&mut self, _snapshot: &ViewportSnapshot) {}

    fn draw_tile(&mut self, tile: TileIndex, matrix: &Matrix3<f64>);

    fn end_frame(&mut self) {}
}
