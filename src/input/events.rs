use crate::core::geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pointer (finger, mouse, pen) for as long as it is down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PointerId(pub u64);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}

/// Raw pointer actions delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerAction {
    Entered,
    Pressed,
    Moved,
    Released,
    Cancelled,
    Exited,
    WheelChanged,
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Kind of device that produced a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceType {
    #[default]
    Touch,
    Mouse,
    Pen,
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventHandled {
    Handled,
    #[default]
    NotHandled,
}

impl EventHandled {
    pub fn is_handled(self) -> bool {
        self == EventHandled::Handled
    }
}

/// A raw pointer event in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub id: PointerId,
    pub action: PointerAction,
    pub position: Point,
    pub button: MouseButton,
    pub device: DeviceType,
    pub in_contact: bool,
    pub pressure: f32,
    /// Wheel delta, positive away from the user; zero for other actions
    pub wheel_delta: f64,
}

impl PointerEvent {
    pub fn new(id: u64, action: PointerAction, position: Point) -> Self {
        Self {
            id: PointerId(id),
            action,
            position,
            button: MouseButton::None,
            device: DeviceType::Touch,
            in_contact: matches!(action, PointerAction::Pressed | PointerAction::Moved),
            pressure: if matches!(action, PointerAction::Pressed | PointerAction::Moved) {
                1.0
            } else {
                0.0
            },
            wheel_delta: 0.0,
        }
    }

    pub fn pressed(id: u64, x: f64, y: f64) -> Self {
        Self::new(id, PointerAction::Pressed, Point::new(x, y))
    }

    pub fn moved(id: u64, x: f64, y: f64) -> Self {
        Self::new(id, PointerAction::Moved, Point::new(x, y))
    }

    pub fn released(id: u64, x: f64, y: f64) -> Self {
        Self::new(id, PointerAction::Released, Point::new(x, y))
    }

    pub fn cancelled(id: u64, x: f64, y: f64) -> Self {
        Self::new(id, PointerAction::Cancelled, Point::new(x, y))
    }

    pub fn exited(id: u64, x: f64, y: f64) -> Self {
        Self::new(id, PointerAction::Exited, Point::new(x, y))
    }

    pub fn wheel(x: f64, y: f64, delta: f64) -> Self {
        Self {
            device: DeviceType::Mouse,
            wheel_delta: delta,
            ..Self::new(0, PointerAction::WheelChanged, Point::new(x, y))
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.device = device;
        self
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapInfo {
    pub pointer: PointerId,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanInfo {
    pub previous: Point,
    pub position: Point,
}

impl PanInfo {
    pub fn delta(&self) -> Point {
        self.position - self.previous
    }
}

/// Two-pointer manipulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchInfo {
    /// Position of the pointer that stayed put during this step
    pub pivot: Point,
    /// Midpoint of both pointers after this step
    pub midpoint: Point,
    /// Movement of the midpoint during this step
    pub translation: Point,
    /// Rotation of this step in degrees, clockwise on screen
    pub rotation: f64,
    /// Scale ratio of this step
    pub scale: f64,
    /// Rotation accumulated since the pinch started, in radians within `[-2π, 2π]`
    pub total_rotation: f64,
    /// Scale accumulated since the pinch started
    pub total_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeInfo {
    pub position: Point,
    /// Release velocity in pixels per second
    pub velocity: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInfo {
    pub pointer: PointerId,
    pub position: Point,
    pub delta: f64,
    pub button: MouseButton,
}

/// Events emitted by [`crate::input::GestureRecognizer`]
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Raw press, delivered before default processing
    TouchDown(PointerEvent),
    /// Raw move, delivered before default processing
    TouchMove(PointerEvent),
    /// Raw release, delivered before default processing
    TouchUp(PointerEvent),
    /// A tap that may still turn into a double tap
    Tapping(TapInfo),
    SingleTapped(TapInfo),
    DoubleTapped(TapInfo),
    /// The pointer is still down after the long press delay
    LongPressing(TapInfo),
    /// Released after the long press delay without moving
    LongPressed(TapInfo),
    Panning(PanInfo),
    Panned(PanInfo),
    Pinching(PinchInfo),
    Pinched(PinchInfo),
    Swiped(SwipeInfo),
    WheelChanged(WheelInfo),
}

impl Gesture {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::TouchDown(_) => "touch-down",
            Gesture::TouchMove(_) => "touch-move",
            Gesture::TouchUp(_) => "touch-up",
            Gesture::Tapping(_) => "tapping",
            Gesture::SingleTapped(_) => "single-tapped",
            Gesture::DoubleTapped(_) => "double-tapped",
            Gesture::LongPressing(_) => "long-pressing",
            Gesture::LongPressed(_) => "long-pressed",
            Gesture::Panning(_) => "panning",
            Gesture::Panned(_) => "panned",
            Gesture::Pinching(_) => "pinching",
            Gesture::Pinched(_) => "pinched",
            Gesture::Swiped(_) => "swiped",
            Gesture::WheelChanged(_) => "wheel-changed",
        }
    }

    /// Gets the primary screen position associated with this gesture
    pub fn position(&self) -> Point {
        match self {
            Gesture::TouchDown(event) | Gesture::TouchMove(event) | Gesture::TouchUp(event) => {
                event.position
            }
            Gesture::Tapping(tap)
            | Gesture::SingleTapped(tap)
            | Gesture::DoubleTapped(tap)
            | Gesture::LongPressing(tap)
            | Gesture::LongPressed(tap) => tap.position,
            Gesture::Panning(pan) | Gesture::Panned(pan) => pan.position,
            Gesture::Pinching(pinch) | Gesture::Pinched(pinch) => pinch.midpoint,
            Gesture::Swiped(swipe) => swipe.position,
            Gesture::WheelChanged(wheel) => wheel.position,
        }
    }

    pub fn is_tap(&self) -> bool {
        matches!(
            self,
            Gesture::Tapping(_)
                | Gesture::SingleTapped(_)
                | Gesture::DoubleTapped(_)
                | Gesture::LongPressing(_)
                | Gesture::LongPressed(_)
        )
    }
}

/// Consumer of recognized gestures.
///
/// Answering [`EventHandled::Handled`] stops the recognizer's default
/// processing of the raw event that produced the gesture.
pub trait GestureHandler {
    fn on_gesture(&mut self, gesture: &Gesture) -> EventHandled;
}

/// Collects every gesture without handling any
impl GestureHandler for Vec<Gesture> {
    fn on_gesture(&mut self, gesture: &Gesture) -> EventHandled {
        self.push(gesture.clone());
        EventHandled::NotHandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_constructors() {
        let press = PointerEvent::pressed(3, 10.0, 20.0);
        assert_eq!(press.id, PointerId(3));
        assert_eq!(press.action, PointerAction::Pressed);
        assert!(press.in_contact);

        let release = PointerEvent::released(3, 10.0, 20.0);
        assert!(!release.in_contact);

        let wheel = PointerEvent::wheel(5.0, 6.0, -120.0);
        assert_eq!(wheel.action, PointerAction::WheelChanged);
        assert_eq!(wheel.device, DeviceType::Mouse);
        assert_eq!(wheel.wheel_delta, -120.0);
    }

    #[test]
    fn test_gesture_position() {
        let tap = Gesture::SingleTapped(TapInfo {
            pointer: PointerId(1),
            position: Point::new(1.0, 2.0),
        });
        assert_eq!(tap.position(), Point::new(1.0, 2.0));
        assert!(tap.is_tap());
        assert_eq!(tap.name(), "single-tapped");

        let pan = Gesture::Panning(PanInfo {
            previous: Point::new(0.0, 0.0),
            position: Point::new(3.0, 4.0),
        });
        assert!(!pan.is_tap());
        if let Gesture::Panning(info) = pan {
            assert_eq!(info.delta(), Point::new(3.0, 4.0));
        }
    }
}
