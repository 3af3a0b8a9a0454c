use crate::core::navigator::Navigator;
use crate::input::events::{EventHandled, Gesture};
use std::time::Duration;

/// Default mapping from gestures to navigator calls.
///
/// Touch down stops running animations, a one-finger pan drags the map, a
/// pinch moves, rotates and scales around its midpoint, a fling keeps the map
/// gliding and the wheel zooms around the cursor.
#[derive(Debug, Clone)]
pub struct GestureController {
    pub enabled: bool,
    swipe_max_duration: Duration,
}

impl GestureController {
    pub fn new(swipe_max_duration: Duration) -> Self {
        Self {
            enabled: true,
            swipe_max_duration,
        }
    }

    /// Applies a gesture to the navigator
    pub fn apply(&mut self, gesture: &Gesture, navigator: &mut Navigator) -> EventHandled {
        if !self.enabled {
            return EventHandled::NotHandled;
        }
        match gesture {
            Gesture::TouchDown(_) => {
                navigator.cancel_animations();
                EventHandled::NotHandled
            }
            Gesture::Panning(pan) => {
                navigator.move_by(pan.delta());
                EventHandled::Handled
            }
            Gesture::Pinching(pinch) => {
                navigator.move_rotate_scale_by(
                    pinch.translation,
                    -pinch.rotation,
                    pinch.scale,
                    Some(pinch.midpoint),
                );
                EventHandled::Handled
            }
            Gesture::Swiped(swipe) => {
                navigator.swipe_with(swipe.velocity, self.swipe_max_duration);
                EventHandled::Handled
            }
            Gesture::WheelChanged(wheel) => {
                let factor = navigator.config().wheel_scale_factor(wheel.delta);
                navigator.scale_by(factor, Some(wheel.position));
                EventHandled::Handled
            }
            _ => EventHandled::NotHandled,
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::constants::DEFAULT_SWIPE_MAX_DURATION_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;
    use crate::core::viewport::Viewport;
    use crate::input::events::{PanInfo, PinchInfo, PointerId, WheelInfo, MouseButton};

    fn navigator() -> Navigator {
        let mut navigator = Navigator::new(Viewport::new(400.0, 400.0));
        navigator.scale_to(8.0, None, Duration::ZERO);
        navigator
    }

    #[test]
    fn test_pan_drags_map() {
        let mut controller = GestureController::default();
        let mut navigator = navigator();
        let grabbed = navigator.viewport().screen_to_view(Point::new(100.0, 100.0));
        let pan = Gesture::Panning(PanInfo {
            previous: Point::new(100.0, 100.0),
            position: Point::new(140.0, 90.0),
        });
        assert!(controller.apply(&pan, &mut navigator).is_handled());
        let now_under = navigator.viewport().screen_to_view(Point::new(140.0, 90.0));
        assert!(now_under.distance_to(&grabbed) < 1e-12);
    }

    #[test]
    fn test_wheel_zooms_around_cursor() {
        let mut controller = GestureController::default();
        let mut navigator = navigator();
        let cursor = Point::new(300.0, 50.0);
        let before = navigator.viewport().screen_to_view(cursor);
        let wheel = Gesture::WheelChanged(WheelInfo {
            pointer: PointerId(0),
            position: cursor,
            delta: 120.0,
            button: MouseButton::None,
        });
        controller.apply(&wheel, &mut navigator);
        assert!((navigator.viewport().scale() - 8.8).abs() < 1e-9);
        assert!(navigator.viewport().screen_to_view(cursor).distance_to(&before) < 1e-12);
    }

    #[test]
    fn test_pinch_scales_about_midpoint() {
        let mut controller = GestureController::default();
        let mut navigator = navigator();
        let midpoint = Point::new(250.0, 150.0);
        let before = navigator.viewport().screen_to_view(midpoint);
        let pinch = Gesture::Pinching(PinchInfo {
            pivot: Point::new(200.0, 150.0),
            midpoint,
            translation: Point::ZERO,
            rotation: 0.0,
            scale: 1.5,
            total_rotation: 0.0,
            total_scale: 1.5,
        });
        controller.apply(&pinch, &mut navigator);
        assert_eq!(navigator.viewport().scale(), 12.0);
        assert!(navigator.viewport().screen_to_view(midpoint).distance_to(&before) < 1e-12);
    }

    #[test]
    fn test_disabled_controller_ignores_gestures() {
        let mut controller = GestureController::default();
        controller.enabled = false;
        let mut navigator = navigator();
        let center = navigator.viewport().center();
        let pan = Gesture::Panning(PanInfo {
            previous: Point::ZERO,
            position: Point::new(50.0, 50.0),
        });
        assert!(!controller.apply(&pan, &mut navigator).is_handled());
        assert_eq!(navigator.viewport().center(), center);
    }
}
