//! # vtnav
//!
//! Interactive navigation core for vector-tile map viewers.
//!
//! This library keeps the camera state of a map view, converts between
//! geographic, projected, view and screen coordinates, recognizes multi-touch
//! gestures and drives animated camera transitions. Decoding and drawing tiles
//! is left to the embedding application through [`traits::TileRenderer`].

pub mod animation;
pub mod core;
pub mod input;
pub mod prelude;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::NavigationConfig,
    geo::{GeoBox, GeoPoint, Point, TileIndex},
    map::{Map, MapCommand},
    navigator::Navigator,
    viewport::{Viewport, ViewportProperty, ViewportSnapshot},
};

pub use animation::{AnimationScheduler, EasingFunction};

pub use input::{Gesture, GestureHandler, GestureRecognizer, PointerEvent};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;
