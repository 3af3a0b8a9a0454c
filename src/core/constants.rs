//! Engine-wide constants for projection, zoom limits and gesture thresholds.
//! Keeping them in a single place makes it easier to tweak the magic numbers
//! shared by the viewport, recognizer and navigator.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest supported integer zoom level.
pub const MIN_ZOOM_LEVEL: u8 = 0;

/// Highest supported integer zoom level.
pub const MAX_ZOOM_LEVEL: u8 = 24;

/// Latitude limit of the Web Mercator projection in degrees.
pub const LATITUDE_MAX: f64 = 85.051_128_779_806_59;
pub const LATITUDE_MIN: f64 = -LATITUDE_MAX;

pub const LONGITUDE_MAX: f64 = 180.0;
pub const LONGITUDE_MIN: f64 = -LONGITUDE_MAX;

/// Number of microdegrees in one degree.
pub const CONVERSION_FACTOR: f64 = 1_000_000.0;

/// Equatorial radius of the WGS84 ellipsoid in meters.
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// Polar radius of the WGS84 ellipsoid in meters.
pub const POLAR_RADIUS: f64 = 6_356_752.314_2;

/// Flattening of the WGS84 ellipsoid.
pub const INVERSE_FLATTENING: f64 = 298.257_223_563;

/// Iteration cap and convergence tolerance of the Vincenty inverse formula.
pub const VINCENTY_MAX_ITERATIONS: usize = 100;
pub const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Screen distance a pointer may travel before it counts as moving.
pub const DEFAULT_MAX_MOVE_DISTANCE: f64 = 4.0;

/// Delay after a press until it becomes a long press.
pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 500;

/// Window in which a second tap turns into a double tap.
pub const DEFAULT_DOUBLE_TAP_DELAY_MS: u64 = 320;

/// Release speed in px/s above which a pan ends as a swipe.
pub const DEFAULT_SWIPE_VELOCITY_THRESHOLD: f64 = 200.0;

/// Sliding window used by the velocity tracker.
pub const DEFAULT_VELOCITY_WINDOW_MS: u64 = 250;
pub const DEFAULT_VELOCITY_MAX_SAMPLES: usize = 20;

/// Rotation (degrees) that must accumulate before a snapped map starts turning.
pub const DEFAULT_UNSNAP_ROTATION: f64 = 10.0;

/// Distance (degrees) from north at which a rotated map snaps back.
pub const DEFAULT_RESNAP_ROTATION: f64 = 5.0;

/// Swipes slower than this (px/s) are treated as noise.
pub const DEFAULT_MIN_SWIPE_VELOCITY: f64 = 100.0;
pub const DEFAULT_MIN_SWIPE_DURATION_MS: u64 = 16;
pub const DEFAULT_SWIPE_MAX_DURATION_MS: u64 = 500;

/// Mouse wheel zoom factors per notch.
pub const DEFAULT_WHEEL_ZOOM_IN: f64 = 1.1;
pub const DEFAULT_WHEEL_ZOOM_OUT: f64 = 0.9;

/// Wheel delta reported for one physical notch.
pub const DEFAULT_WHEEL_DELTA_PER_NOTCH: f64 = 120.0;
