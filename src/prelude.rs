//! Prelude module for common vtnav types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use vtnav::prelude::*;`

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use crate::core::{
    bounds::Bounds,
    clock::{Clock, ManualClock, SystemClock},
    config::{GestureConfig, NavigationConfig, NavigatorConfig, ViewportConfig},
    geo::{GeoBox, GeoPoint, Point, TileIndex},
    map::{Map, MapCommand},
    navigator::{AnimationKind, Navigator},
    projection::{Epsg3857, Projection, WebMercator},
    viewport::{Viewport, ViewportProperty, ViewportSnapshot},
};

pub use crate::animation::{
    Animation, AnimationEntry, AnimationId, AnimationScheduler, EasingFunction, Progress,
};

pub use crate::input::{
    EventHandled, Gesture, GestureController, GestureHandler, GestureRecognizer, PointerAction,
    PointerEvent, PointerId,
};

pub use crate::traits::{Lerp, TileRenderer};

pub use crate::{MapError, Result};
