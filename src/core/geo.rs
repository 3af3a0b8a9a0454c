use crate::core::constants::{
    CONVERSION_FACTOR, EQUATORIAL_RADIUS, INVERSE_FLATTENING, LATITUDE_MAX, LATITUDE_MIN,
    LONGITUDE_MAX, LONGITUDE_MIN, POLAR_RADIUS, VINCENTY_MAX_ITERATIONS, VINCENTY_TOLERANCE,
};
use crate::core::bounds::Bounds;
use crate::core::projection::Projection;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Immutable geographic coordinate in degrees, clamped to the projectable range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGeoPoint", into = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl From<RawGeoPoint> for GeoPoint {
    fn from(raw: RawGeoPoint) -> Self {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        RawGeoPoint {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

impl GeoPoint {
    /// Creates a new point, clamping latitude to ±85.0511° and longitude to ±180°
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.clamp(LATITUDE_MIN, LATITUDE_MAX),
            longitude: longitude.clamp(LONGITUDE_MIN, LONGITUDE_MAX),
        }
    }

    /// Creates a point from integer microdegrees
    pub fn from_microdegrees(latitude_e6: i32, longitude_e6: i32) -> Self {
        Self::new(
            latitude_e6 as f64 / CONVERSION_FACTOR,
            longitude_e6 as f64 / CONVERSION_FACTOR,
        )
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude_e6(&self) -> i32 {
        (self.latitude * CONVERSION_FACTOR) as i32
    }

    pub fn longitude_e6(&self) -> i32 {
        (self.longitude * CONVERSION_FACTOR) as i32
    }

    /// Degrees of latitude spanned by the given distance along a meridian
    pub fn latitude_distance(meters: f64) -> f64 {
        (meters * 360.0) / (2.0 * PI * EQUATORIAL_RADIUS)
    }

    /// Degrees of longitude spanned by the given distance at a latitude
    pub fn longitude_distance(meters: f64, latitude: f64) -> f64 {
        (meters * 360.0) / (2.0 * PI * EQUATORIAL_RADIUS * latitude.to_radians().cos())
    }

    /// Initial bearing towards another point in degrees, normalized to [0, 360)
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let delta_lon = (other.longitude - self.longitude).to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// Point reached by travelling `distance` meters along a great circle with the given bearing
    pub fn destination_point(&self, distance: f64, bearing: f64) -> GeoPoint {
        let theta = bearing.to_radians();
        let delta = distance / EQUATORIAL_RADIUS;
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

        GeoPoint::new(phi2.to_degrees(), lambda2.to_degrees())
    }

    /// Planar distance in degrees, useful only for comparisons
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        (self.longitude - other.longitude).hypot(self.latitude - other.latitude)
    }

    /// Great-circle distance in meters using the Haversine formula
    pub fn spherical_distance(&self, other: &GeoPoint) -> f64 {
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EQUATORIAL_RADIUS * c
    }

    /// Ellipsoidal distance in meters using the inverse Vincenty formula.
    ///
    /// Returns `0.0` for coincident points and when the iteration fails to
    /// converge (nearly antipodal points).
    pub fn vincenty_distance(&self, other: &GeoPoint) -> f64 {
        let f = 1.0 / INVERSE_FLATTENING;
        let l = (other.longitude - self.longitude).to_radians();
        let u1 = ((1.0 - f) * self.latitude.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * other.latitude.to_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut converged = false;
        let mut cos_sq_alpha = 0.0;
        let mut sin_sigma = 0.0;
        let mut cos_sigma = 0.0;
        let mut cos_2_sigma_m = 0.0;
        let mut sigma = 0.0;

        for _ in 0..VINCENTY_MAX_ITERATIONS {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                return 0.0;
            }
            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial line: cos_sq_alpha is zero
            cos_2_sigma_m = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let previous = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2_sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m * cos_2_sigma_m)));
            if (lambda - previous).abs() <= VINCENTY_TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            log::debug!("vincenty distance did not converge between {} and {}", self, other);
            return 0.0;
        }

        let u_sq = cos_sq_alpha * (EQUATORIAL_RADIUS.powi(2) - POLAR_RADIUS.powi(2))
            / POLAR_RADIUS.powi(2);
        let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = b
            * sin_sigma
            * (cos_2_sigma_m
                + b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m * cos_2_sigma_m)
                        - b / 6.0
                            * cos_2_sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2_sigma_m * cos_2_sigma_m)));

        POLAR_RADIUS * a * (sigma - delta_sigma)
    }

    /// Projects the point into the plane of the given projection
    pub fn project(&self, projection: &dyn Projection) -> Point {
        Point::new(
            projection.longitude_to_x(self.longitude),
            projection.latitude_to_y(self.latitude),
        )
    }

    /// Inverse of [`GeoPoint::project`]
    pub fn unproject(point: Point, projection: &dyn Projection) -> GeoPoint {
        GeoPoint::new(
            projection.y_to_latitude(point.y),
            projection.x_to_longitude(point.x),
        )
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat={}/Lon={}", self.latitude, self.longitude)
    }
}

impl From<GeoPoint> for geo_types::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo_types::Point::new(point.longitude, point.latitude)
    }
}

impl From<geo_types::Point<f64>> for GeoPoint {
    fn from(point: geo_types::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

/// Immutable latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoBox", into = "RawGeoBox")]
pub struct GeoBox {
    min_latitude: f64,
    min_longitude: f64,
    max_latitude: f64,
    max_longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawGeoBox {
    min_latitude: f64,
    min_longitude: f64,
    max_latitude: f64,
    max_longitude: f64,
}

impl TryFrom<RawGeoBox> for GeoBox {
    type Error = MapError;

    fn try_from(raw: RawGeoBox) -> Result<Self> {
        GeoBox::try_new(
            raw.min_latitude,
            raw.min_longitude,
            raw.max_latitude,
            raw.max_longitude,
        )
    }
}

impl From<GeoBox> for RawGeoBox {
    fn from(geo_box: GeoBox) -> Self {
        RawGeoBox {
            min_latitude: geo_box.min_latitude,
            min_longitude: geo_box.min_longitude,
            max_latitude: geo_box.max_latitude,
            max_longitude: geo_box.max_longitude,
        }
    }
}

impl GeoBox {
    /// Creates a box from its corners.
    ///
    /// # Panics
    ///
    /// Panics when a minimum exceeds its maximum. Use [`GeoBox::try_new`] for
    /// untrusted input.
    pub fn new(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Self {
        match Self::try_new(min_latitude, min_longitude, max_latitude, max_longitude) {
            Ok(geo_box) => geo_box,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_new(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Result<Self> {
        if !(min_latitude <= max_latitude && min_longitude <= max_longitude) {
            return Err(MapError::InvalidBounds(format!(
                "geo box min ({}, {}) exceeds max ({}, {})",
                min_latitude, min_longitude, max_latitude, max_longitude
            )));
        }
        Ok(Self {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        })
    }

    /// Smallest box enclosing all points, `None` when the slice is empty
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut geo_box = Self::new(
            first.latitude,
            first.longitude,
            first.latitude,
            first.longitude,
        );
        for point in &points[1..] {
            geo_box = geo_box.extend_coordinates(point);
        }
        Some(geo_box)
    }

    pub fn min_latitude(&self) -> f64 {
        self.min_latitude
    }

    pub fn min_longitude(&self) -> f64 {
        self.min_longitude
    }

    pub fn max_latitude(&self) -> f64 {
        self.max_latitude
    }

    pub fn max_longitude(&self) -> f64 {
        self.max_longitude
    }

    pub fn latitude_span(&self) -> f64 {
        self.max_latitude - self.min_latitude
    }

    pub fn longitude_span(&self) -> f64 {
        self.max_longitude - self.min_longitude
    }

    pub fn center_point(&self) -> GeoPoint {
        GeoPoint::new(
            self.min_latitude + self.latitude_span() / 2.0,
            self.min_longitude + self.longitude_span() / 2.0,
        )
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude <= self.max_latitude
            && point.latitude >= self.min_latitude
            && point.longitude <= self.max_longitude
            && point.longitude >= self.min_longitude
    }

    pub fn intersects(&self, other: &GeoBox) -> bool {
        self.max_latitude >= other.min_latitude
            && self.max_longitude >= other.min_longitude
            && self.min_latitude <= other.max_latitude
            && self.min_longitude <= other.max_longitude
    }

    /// Fast test whether an area given as rings of points may intersect the box.
    ///
    /// Errs on the side of `true`: the rings' own bounding box is used once no
    /// vertex lies inside.
    pub fn intersects_area(&self, rings: &[Vec<GeoPoint>]) -> bool {
        if rings.iter().flatten().any(|point| self.contains(point)) {
            return true;
        }
        let points: Vec<GeoPoint> = rings.iter().flatten().copied().collect();
        match GeoBox::from_points(&points) {
            Some(area) => self.intersects(&area),
            None => false,
        }
    }

    /// Union of two boxes
    pub fn extend_box(&self, other: &GeoBox) -> GeoBox {
        GeoBox {
            min_latitude: self.min_latitude.min(other.min_latitude),
            min_longitude: self.min_longitude.min(other.min_longitude),
            max_latitude: self.max_latitude.max(other.max_latitude),
            max_longitude: self.max_longitude.max(other.max_longitude),
        }
    }

    /// Smallest box containing this box and the point
    pub fn extend_coordinates(&self, point: &GeoPoint) -> GeoBox {
        if self.contains(point) {
            return *self;
        }
        GeoBox {
            min_latitude: self.min_latitude.min(point.latitude),
            min_longitude: self.min_longitude.min(point.longitude),
            max_latitude: self.max_latitude.max(point.latitude),
            max_longitude: self.max_longitude.max(point.longitude),
        }
    }

    /// Grows the box by the given number of degrees on each side
    pub fn extend_degrees(&self, vertical: f64, horizontal: f64) -> Result<GeoBox> {
        if vertical.is_nan() || horizontal.is_nan() || vertical < 0.0 || horizontal < 0.0 {
            return Err(MapError::InvalidExtension(format!(
                "cannot extend by {} / {} degrees",
                vertical, horizontal
            )));
        }
        Ok(self.grow(vertical, horizontal))
    }

    /// Scales the box spans by `margin` around its center
    pub fn extend_margin(&self, margin: f64) -> Result<GeoBox> {
        if margin.is_nan() || margin <= 0.0 {
            return Err(MapError::InvalidExtension(format!(
                "margin must be positive, got {}",
                margin
            )));
        }
        if margin == 1.0 {
            return Ok(*self);
        }
        let vertical = (self.latitude_span() * margin - self.latitude_span()) * 0.5;
        let horizontal = (self.longitude_span() * margin - self.longitude_span()) * 0.5;
        Ok(self.grow(vertical, horizontal))
    }

    /// Grows the box by a distance in meters on each side
    pub fn extend_meters(&self, meters: f64) -> Result<GeoBox> {
        if meters.is_nan() || meters < 0.0 {
            return Err(MapError::InvalidExtension(format!(
                "cannot extend by {} meters",
                meters
            )));
        }
        if meters == 0.0 {
            return Ok(*self);
        }
        let vertical = GeoPoint::latitude_distance(meters);
        let horizontal = GeoPoint::longitude_distance(
            meters,
            self.min_latitude.abs().max(self.max_latitude.abs()),
        );
        Ok(self.grow(vertical, horizontal))
    }

    // Shrinking margins (< 1) may cross over; the midpoint keeps min <= max.
    fn grow(&self, vertical: f64, horizontal: f64) -> GeoBox {
        let mut min_latitude = (self.min_latitude - vertical).max(LATITUDE_MIN);
        let mut max_latitude = (self.max_latitude + vertical).min(LATITUDE_MAX);
        let mut min_longitude = (self.min_longitude - horizontal).max(LONGITUDE_MIN);
        let mut max_longitude = (self.max_longitude + horizontal).min(LONGITUDE_MAX);
        if min_latitude > max_latitude {
            let mid = (min_latitude + max_latitude) / 2.0;
            min_latitude = mid;
            max_latitude = mid;
        }
        if min_longitude > max_longitude {
            let mid = (min_longitude + max_longitude) / 2.0;
            min_longitude = mid;
            max_longitude = mid;
        }
        GeoBox {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        }
    }

    /// Comma separated `minLat,minLon,maxLat,maxLon`
    pub fn format(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_latitude, self.min_longitude, self.max_latitude, self.max_longitude
        )
    }
}

impl fmt::Display for GeoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoBox [{},{} {},{}]",
            self.min_latitude, self.min_longitude, self.max_latitude, self.max_longitude
        )
    }
}

/// A point in view or screen space.
///
/// A point that may be absent is written `Option<Point>`; there is no
/// separate "defined" flag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Rotates the vector by `radians`, screen orientation (y down, clockwise positive)
    pub fn rotate(&self, radians: f64) -> Point {
        let (sin, cos) = radians.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A tile in the standard quad-tree scheme, `y` counted from the north edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileIndex {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this zoom level, saturating past 2^63
    pub fn tiles_per_axis(&self) -> u64 {
        1u64.checked_shl(u32::from(self.zoom)).unwrap_or(u64::MAX)
    }

    /// Gets the parent tile at a lower zoom level
    pub fn parent(&self) -> Option<TileIndex> {
        if self.zoom == 0 {
            None
        } else {
            Some(TileIndex::new(self.x / 2, self.y / 2, self.zoom - 1))
        }
    }

    /// Gets the four child tiles at the next zoom level
    pub fn children(&self) -> [TileIndex; 4] {
        let (x, y, z) = (self.x * 2, self.y * 2, self.zoom + 1);
        [
            TileIndex::new(x, y, z),
            TileIndex::new(x + 1, y, z),
            TileIndex::new(x, y + 1, z),
            TileIndex::new(x + 1, y + 1, z),
        ]
    }

    pub fn is_valid(&self) -> bool {
        let max_coord = self.tiles_per_axis();
        (self.x as u64) < max_coord && (self.y as u64) < max_coord
    }

    /// Area covered by the tile in the `[-1,1]` projected plane
    pub fn view_bounds(&self) -> Bounds {
        let size = 2.0 / self.tiles_per_axis() as f64;
        let min = Point::new(-1.0 + self.x as f64 * size, -1.0 + self.y as f64 * size);
        Bounds::new(min, min + Point::new(size, size))
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
