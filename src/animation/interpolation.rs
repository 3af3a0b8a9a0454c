use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing curves applied to the normalized progress of an animation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -(((PI * t).cos() - 1.0) / 2.0),
        }
    }

    /// Share of the motion still ahead at `t`, used to decay a velocity to rest
    pub fn remaining(&self, t: f64) -> f64 {
        1.0 - self.apply(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingFunction; 10] = [
        EasingFunction::Linear,
        EasingFunction::EaseInQuad,
        EasingFunction::EaseOutQuad,
        EasingFunction::EaseInOutQuad,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
        EasingFunction::EaseInOutCubic,
        EasingFunction::EaseInSine,
        EasingFunction::EaseOutSine,
        EasingFunction::EaseInOutSine,
    ];

    #[test]
    fn test_easing_functions() {
        assert_eq!(EasingFunction::Linear.apply(0.5), 0.5);
        assert!(EasingFunction::EaseInQuad.apply(0.5) < 0.5);
        assert!(EasingFunction::EaseOutQuad.apply(0.5) > 0.5);
        assert!(EasingFunction::EaseInSine.apply(0.5) < 0.5);
    }

    #[test]
    fn test_endpoints_and_monotonicity() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-12, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{:?}", easing);
            let mut previous = 0.0;
            for step in 1..=20 {
                let value = easing.apply(step as f64 / 20.0);
                assert!(value >= previous - 1e-12, "{:?} not monotonic", easing);
                previous = value;
            }
        }
    }

    #[test]
    fn test_remaining_decays_to_zero() {
        let easing = EasingFunction::EaseInSine;
        assert_eq!(easing.remaining(0.0), 1.0);
        assert!(easing.remaining(0.5) > easing.remaining(0.9));
        assert!(easing.remaining(1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EasingFunction::EaseInOutSine).unwrap();
        assert_eq!(json, "\"ease_in_out_sine\"");
        let parsed: EasingFunction = serde_json::from_str("\"ease_out_cubic\"").unwrap();
        assert_eq!(parsed, EasingFunction::EaseOutCubic);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(EasingFunction::Linear.apply(-1.0), 0.0);
        assert_eq!(EasingFunction::Linear.apply(2.0), 1.0);
    }
}
