use crate::core::bounds::Bounds;
use crate::core::config::ViewportConfig;
use crate::core::geo::{GeoBox, GeoPoint, Point, TileIndex};
use crate::core::projection::{Epsg3857, Projection};
use crate::{MapError, Result};
use nalgebra::Matrix3;
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

/// Slack, in tile units, when snapping the bounding box to tile edges
const TILE_EDGE_EPSILON: f64 = 1e-9;

/// Viewport property carried by change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportProperty {
    Size,
    Center,
    Scale,
    Rotation,
}

pub type ViewportListener = Box<dyn FnMut(ViewportProperty) + Send>;

/// Handle returned by [`Viewport::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Read-only view of the camera taken at draw time
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSnapshot {
    pub width: f64,
    pub height: f64,
    pub center: Point,
    pub scale: f64,
    pub rotation: f64,
    pub zoom_level: u8,
    pub view_to_screen: Matrix3<f64>,
    /// Visible tiles with the matrix mapping their `[0,1]` local space to screen pixels
    pub tiles: Vec<(TileIndex, Matrix3<f64>)>,
}

/// The map camera.
///
/// The center lives in the `[-1,1]` projected plane with `y` pointing south,
/// the scale is `2^zoom` and the rotation is in degrees within `(-180, 180]`.
/// A screen point maps to view space as
/// `center + R(rotation) · (screen - screen_center) · 2 / (scale · tile_size)`.
///
/// Mutation is reserved for the crate; outside code moves the camera through
/// [`crate::core::navigator::Navigator`].
pub struct Viewport {
    config: ViewportConfig,
    projection: Epsg3857,
    width: f64,
    height: f64,
    center: Point,
    scale: f64,
    rotation: f64,
    zoom_level: u8,
    tiles: OnceCell<Vec<TileIndex>>,
    listeners: BTreeMap<ListenerId, ViewportListener>,
    next_listener: u64,
    needs_redraw: bool,
}

/// Wraps an angle in degrees to `(-180, 180]`
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Integer zoom level of a scale, `floor(log2(scale))`
pub fn zoom_level_for(scale: f64) -> u8 {
    let mut level = scale.log2().floor().max(0.0) as i32;
    // log2 may round across a power of two
    if scale < 2f64.powi(level) {
        level -= 1;
    } else if scale >= 2f64.powi(level + 1) {
        level += 1;
    }
    level.max(0) as u8
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(ViewportConfig::default(), width, height)
    }

    pub fn with_config(config: ViewportConfig, width: f64, height: f64) -> Self {
        let scale = config.min_scale();
        Self {
            config,
            projection: Epsg3857,
            width: width.max(0.0),
            height: height.max(0.0),
            center: Point::ZERO,
            scale,
            rotation: 0.0,
            zoom_level: zoom_level_for(scale),
            tiles: OnceCell::new(),
            listeners: BTreeMap::new(),
            next_listener: 0,
            needs_redraw: true,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn min_scale(&self) -> f64 {
        self.config.min_scale()
    }

    pub fn max_scale(&self) -> f64 {
        self.config.max_scale()
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    /// Fractional zoom, `log2(scale)`
    pub fn zoom(&self) -> f64 {
        self.scale.log2()
    }

    /// Scale relative to the current integer zoom level, in `[1, 2)`
    pub fn zoom_scale(&self) -> f64 {
        self.scale / 2f64.powi(self.zoom_level as i32)
    }

    /// Pixels per projected unit
    pub fn tile_scale_factor(&self) -> f64 {
        self.scale * self.config.tile_size as f64 / 2.0
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn latitude(&self) -> f64 {
        self.projection.y_to_latitude(self.center.y)
    }

    pub fn longitude(&self) -> f64 {
        self.projection.x_to_longitude(self.center.x)
    }

    pub fn center_geo(&self) -> GeoPoint {
        GeoPoint::unproject(self.center, &self.projection)
    }

    pub fn projection(&self) -> &dyn Projection {
        &self.projection
    }

    /// Registers a listener for property changes
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(ViewportProperty) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    /// Whether anything changed since the last [`Viewport::clear_redraw`]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn clear_redraw(&mut self) {
        self.needs_redraw = false;
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    fn changed(&mut self, property: ViewportProperty) {
        self.tiles.take();
        self.needs_redraw = true;
        for listener in self.listeners.values_mut() {
            listener(property);
        }
    }

    /// Updates the drawing surface size in pixels
    pub fn size_changed(&mut self, width: f64, height: f64) {
        let (width, height) = (width.max(0.0), height.max(0.0));
        if width == self.width && height == self.height {
            return;
        }
        log::debug!("viewport resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.changed(ViewportProperty::Size);
    }

    pub(crate) fn set_center(&mut self, center: Point) {
        assert!(center.is_finite(), "viewport center must be finite, got {}", center);
        let center = Point::new(center.x.clamp(-1.0, 1.0), center.y.clamp(-1.0, 1.0));
        if center != self.center {
            self.center = center;
            self.changed(ViewportProperty::Center);
        }
    }

    pub(crate) fn set_center_geo(&mut self, point: GeoPoint) {
        let projected = point.project(&self.projection);
        self.set_center(projected);
    }

    pub(crate) fn set_scale(&mut self, scale: f64) {
        assert!(!scale.is_nan(), "viewport scale must not be NaN");
        let scale = scale.clamp(self.min_scale(), self.max_scale());
        if scale != self.scale {
            self.scale = scale;
            self.zoom_level = zoom_level_for(scale);
            self.changed(ViewportProperty::Scale);
        }
    }

    pub(crate) fn set_rotation(&mut self, degrees: f64) {
        assert!(degrees.is_finite(), "viewport rotation must be finite, got {}", degrees);
        let rotation = wrap_degrees(degrees);
        if rotation != self.rotation {
            self.rotation = rotation;
            self.changed(ViewportProperty::Rotation);
        }
    }

    /// Applies a new scale and rotation while the view point under `pivot` stays put
    pub(crate) fn transform_about(&mut self, pivot: Point, scale: f64, rotation: f64) {
        let pivot_view = self.screen_to_view(pivot);
        self.set_scale(scale);
        self.set_rotation(rotation);
        let offset = (pivot - self.screen_center()).rotate(self.rotation.to_radians())
            / self.tile_scale_factor();
        self.set_center(pivot_view - offset);
    }

    /// Fits a geographic box into a `width`×`height` pixel area and resets the rotation
    pub(crate) fn set_by_bounding_box(
        &mut self,
        geo_box: &GeoBox,
        width: f64,
        height: f64,
    ) -> Result<()> {
        if !(width > 0.0 && height > 0.0) {
            return Err(MapError::InvalidCoordinates(format!(
                "cannot fit a box into a {}x{} area",
                width, height
            )));
        }
        let north_west = GeoPoint::new(geo_box.max_latitude(), geo_box.min_longitude())
            .project(&self.projection);
        let south_east = GeoPoint::new(geo_box.min_latitude(), geo_box.max_longitude())
            .project(&self.projection);
        let span = south_east - north_west;
        let tile_size = self.config.tile_size as f64;
        let scale_x = 2.0 * width / (tile_size * span.x.abs());
        let scale_y = 2.0 * height / (tile_size * span.y.abs());

        self.set_rotation(0.0);
        self.set_scale(scale_x.min(scale_y));
        self.set_center(north_west.midpoint(&south_east));
        Ok(())
    }

    /// Maps a screen pixel to view space
    pub fn screen_to_view(&self, screen: Point) -> Point {
        let offset = (screen - self.screen_center()).rotate(self.rotation.to_radians());
        self.center + offset / self.tile_scale_factor()
    }

    /// Maps a view-space point to screen pixels
    pub fn view_to_screen(&self, view: Point) -> Point {
        let offset = (view - self.center) * self.tile_scale_factor();
        self.screen_center() + offset.rotate(-self.rotation.to_radians())
    }

    /// Homogeneous screen-to-view transform
    pub fn screen_to_view_matrix(&self) -> Matrix3<f64> {
        let sc = self.screen_center();
        let k = 1.0 / self.tile_scale_factor();
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let to_center = Matrix3::new(1.0, 0.0, -sc.x, 0.0, 1.0, -sc.y, 0.0, 0.0, 1.0);
        let rotate = Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0);
        let scale = Matrix3::new(k, 0.0, 0.0, 0.0, k, 0.0, 0.0, 0.0, 1.0);
        let translate = Matrix3::new(
            1.0,
            0.0,
            self.center.x,
            0.0,
            1.0,
            self.center.y,
            0.0,
            0.0,
            1.0,
        );
        translate * scale * rotate * to_center
    }

    /// Homogeneous view-to-screen transform, the inverse of [`Viewport::screen_to_view_matrix`].
    ///
    /// # Panics
    ///
    /// Panics if the transform is not invertible.
    pub fn view_to_screen_matrix(&self) -> Matrix3<f64> {
        match self.screen_to_view_matrix().try_inverse() {
            Some(inverse) => inverse,
            None => panic!(
                "viewport transform is not invertible (scale {}, size {}x{})",
                self.scale, self.width, self.height
            ),
        }
    }

    /// Axis-aligned bounds of the visible area in view space, rotation included
    pub fn bounding_box(&self) -> Bounds {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(self.width, self.height),
            Point::new(0.0, self.height),
        ]
        .map(|corner| self.screen_to_view(corner));
        let mut bounds = Bounds::empty();
        for corner in &corners {
            bounds.extend(corner);
        }
        bounds
    }

    /// Visible tiles at the current zoom level, row by row from the north-west
    pub fn tiles(&self) -> &[TileIndex] {
        self.tiles.get_or_init(|| self.compute_tiles())
    }

    fn compute_tiles(&self) -> Vec<TileIndex> {
        let bounds = self.bounding_box();
        if bounds.min.y > 1.0 || bounds.max.y < -1.0 {
            return Vec::new();
        }
        let n = (1u64 << self.zoom_level) as f64;
        let to_tile = |v: f64| n * (1.0 + v) / 2.0;
        let to_tile_min = |v: f64| (to_tile(v) + TILE_EDGE_EPSILON).floor().clamp(0.0, n) as u32;
        let to_tile_max = |v: f64| (to_tile(v) - TILE_EDGE_EPSILON).ceil().clamp(0.0, n) as u32;

        let (min_x, max_x) = (to_tile_min(bounds.min.x), to_tile_max(bounds.max.x));
        let (min_y, max_y) = (to_tile_min(bounds.min.y), to_tile_max(bounds.max.y));

        let mut tiles = Vec::with_capacity(
            (max_x.saturating_sub(min_x) as usize) * (max_y.saturating_sub(min_y) as usize),
        );
        for y in min_y..max_y {
            for x in min_x..max_x {
                tiles.push(TileIndex::new(x, y, self.zoom_level));
            }
        }
        log::trace!(
            "viewport tiles at zoom {}: x {}..{}, y {}..{}",
            self.zoom_level,
            min_x,
            max_x,
            min_y,
            max_y
        );
        tiles
    }

    /// Matrix mapping the tile's `[0,1]` local coordinates to screen pixels
    pub fn matrix_for_tile(&self, tile: &TileIndex) -> Matrix3<f64> {
        self.tile_matrix(tile, &self.view_to_screen_matrix())
    }

    fn tile_matrix(&self, tile: &TileIndex, view_to_screen: &Matrix3<f64>) -> Matrix3<f64> {
        let size = 2.0 / tile.tiles_per_axis() as f64;
        let origin_x = -1.0 + tile.x as f64 * size;
        let origin_y = -1.0 + tile.y as f64 * size;
        let tile_to_view = Matrix3::new(size, 0.0, origin_x, 0.0, size, origin_y, 0.0, 0.0, 1.0);
        view_to_screen * tile_to_view
    }

    /// Captures everything a renderer needs for one frame
    pub fn snapshot(&self) -> ViewportSnapshot {
        let view_to_screen = self.view_to_screen_matrix();
        let tiles = self
            .tiles()
            .iter()
            .map(|tile| (*tile, self.tile_matrix(tile, &view_to_screen)))
            .collect();
        ViewportSnapshot {
            width: self.width,
            height: self.height,
            center: self.center,
            scale: self.scale,
            rotation: self.rotation,
            zoom_level: self.zoom_level,
            view_to_screen,
            tiles,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("center", &self.center)
            .field("scale", &self.scale)
            .field("rotation", &self.rotation)
            .field("zoom_level", &self.zoom_level)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Viewport center {} zoom {} ({}), rotation {}°",
            self.center,
            self.zoom_level,
            self.center_geo(),
            self.rotation
        )
    }
}
