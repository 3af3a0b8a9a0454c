pub mod controller;
pub mod events;
pub mod gestures;
pub mod velocity;

pub use controller::GestureController;
pub use events::{
    DeviceType, EventHandled, Gesture, GestureHandler, MouseButton, PanInfo, PinchInfo,
    PointerAction, PointerEvent, PointerId, SwipeInfo, TapInfo, WheelInfo,
};
pub use gestures::{GestureRecognizer, TouchInfo};
pub use velocity::VelocityTracker;
