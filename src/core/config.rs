//! Configuration for viewport limits, gesture recognition and navigator behavior
//!
//! Every section can be built in code, taken from `Default`, or loaded from
//! JSON where missing fields fall back to their defaults. Durations are kept
//! as plain millisecond counts so the files stay readable.

use crate::core::constants::*;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub viewport: ViewportConfig,
    pub gestures: GestureConfig,
    pub navigator: NavigatorConfig,
}

impl NavigationConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: NavigationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.viewport.validate()?;
        self.gestures.validate()?;
        self.navigator.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub tile_size: u32,
    pub min_zoom_level: u8,
    pub max_zoom_level: u8,
}

impl ViewportConfig {
    pub fn min_scale(&self) -> f64 {
        2f64.powi(self.min_zoom_level as i32)
    }

    pub fn max_scale(&self) -> f64 {
        2f64.powi(self.max_zoom_level as i32)
    }

    fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(MapError::InvalidConfig("tile_size must be positive".into()));
        }
        if self.min_zoom_level > self.max_zoom_level {
            return Err(MapError::InvalidConfig(format!(
                "min_zoom_level {} exceeds max_zoom_level {}",
                self.min_zoom_level, self.max_zoom_level
            )));
        }
        if self.max_zoom_level > 30 {
            return Err(MapError::InvalidConfig(format!(
                "max_zoom_level {} is out of range",
                self.max_zoom_level
            )));
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            min_zoom_level: MIN_ZOOM_LEVEL,
            max_zoom_level: MAX_ZOOM_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub max_move_distance: f64,
    pub long_press_delay_ms: u64,
    pub double_tap_delay_ms: u64,
    pub swipe_velocity_threshold: f64,
    pub velocity_window_ms: u64,
    pub velocity_max_samples: usize,
}

impl GestureConfig {
    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_delay_ms)
    }

    pub fn double_tap_delay(&self) -> Duration {
        Duration::from_millis(self.double_tap_delay_ms)
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.long_press_delay_ms == 0 || self.double_tap_delay_ms == 0 {
            return Err(MapError::InvalidConfig(
                "gesture delays must be positive".into(),
            ));
        }
        if self.velocity_window_ms == 0 || self.velocity_max_samples < 2 {
            return Err(MapError::InvalidConfig(
                "velocity tracking needs a positive window and at least two samples".into(),
            ));
        }
        if self.max_move_distance < 0.0 || self.swipe_velocity_threshold < 0.0 {
            return Err(MapError::InvalidConfig(
                "gesture thresholds must not be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_move_distance: DEFAULT_MAX_MOVE_DISTANCE,
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            double_tap_delay_ms: DEFAULT_DOUBLE_TAP_DELAY_MS,
            swipe_velocity_threshold: DEFAULT_SWIPE_VELOCITY_THRESHOLD,
            velocity_window_ms: DEFAULT_VELOCITY_WINDOW_MS,
            velocity_max_samples: DEFAULT_VELOCITY_MAX_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub unsnap_rotation: f64,
    pub resnap_rotation: f64,
    pub min_swipe_velocity: f64,
    pub min_swipe_duration_ms: u64,
    pub swipe_max_duration_ms: u64,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    pub wheel_delta_per_notch: f64,
}

impl NavigatorConfig {
    /// Scale factor for a wheel delta, positive deltas zoom in
    pub fn wheel_scale_factor(&self, delta: f64) -> f64 {
        let notches = delta / self.wheel_delta_per_notch;
        if delta > 0.0 {
            self.wheel_zoom_in.powf(notches)
        } else {
            self.wheel_zoom_out.powf(-notches)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.unsnap_rotation < 0.0 || self.resnap_rotation < 0.0 {
            return Err(MapError::InvalidConfig(
                "snap thresholds must not be negative".into(),
            ));
        }
        if self.wheel_zoom_in <= 0.0
            || self.wheel_zoom_out <= 0.0
            || self.wheel_delta_per_notch <= 0.0
        {
            return Err(MapError::InvalidConfig(
                "wheel zoom factors must be positive".into(),
            ));
        }
        if self.min_swipe_duration_ms > self.swipe_max_duration_ms {
            return Err(MapError::InvalidConfig(format!(
                "min_swipe_duration_ms {} exceeds swipe_max_duration_ms {}",
                self.min_swipe_duration_ms, self.swipe_max_duration_ms
            )));
        }
        Ok(())
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            unsnap_rotation: DEFAULT_UNSNAP_ROTATION,
            resnap_rotation: DEFAULT_RESNAP_ROTATION,
            min_swipe_velocity: DEFAULT_MIN_SWIPE_VELOCITY,
            min_swipe_duration_ms: DEFAULT_MIN_SWIPE_DURATION_MS,
            swipe_max_duration_ms: DEFAULT_SWIPE_MAX_DURATION_MS,
            wheel_zoom_in: DEFAULT_WHEEL_ZOOM_IN,
            wheel_zoom_out: DEFAULT_WHEEL_ZOOM_OUT,
            wheel_delta_per_notch: DEFAULT_WHEEL_DELTA_PER_NOTCH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavigationConfig::default();
        assert_eq!(config.viewport.tile_size, 256);
        assert_eq!(config.viewport.max_scale(), 16_777_216.0);
        assert_eq!(config.gestures.long_press_delay(), Duration::from_millis(500));
        assert_eq!(config.gestures.double_tap_delay(), Duration::from_millis(320));
        assert_eq!(config.navigator.unsnap_rotation, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            NavigationConfig::from_json(r#"{ "gestures": { "double_tap_delay_ms": 250 } }"#)
                .unwrap();
        assert_eq!(config.gestures.double_tap_delay_ms, 250);
        assert_eq!(config.gestures.long_press_delay_ms, 500);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = NavigationConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(NavigationConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            NavigationConfig::from_json("{ not json"),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            NavigationConfig::from_json(
                r#"{ "viewport": { "min_zoom_level": 10, "max_zoom_level": 2 } }"#
            ),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            NavigationConfig::from_json(r#"{ "gestures": { "long_press_delay_ms": 0 } }"#),
            Err(MapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_wheel_scale_factor() {
        let config = NavigatorConfig::default();
        assert!((config.wheel_scale_factor(120.0) - 1.1).abs() < 1e-12);
        assert!((config.wheel_scale_factor(-240.0) - 0.81).abs() < 1e-12);
    }
}
