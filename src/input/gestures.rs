use crate::core::clock::{Clock, SystemClock};
use crate::core::config::GestureConfig;
use crate::core::geo::Point;
use crate::input::events::{
    EventHandled, Gesture, GestureHandler, PanInfo, PinchInfo, PointerAction, PointerEvent,
    PointerId, SwipeInfo, TapInfo, WheelInfo,
};
use crate::input::velocity::VelocityTracker;
use instant::Instant;
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};
use std::sync::Arc;

/// Tracking state of one pointer while it is down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInfo {
    /// Where the pointer went down
    pub origin: Point,
    /// Position before the event currently being processed
    pub previous: Point,
    pub current: Point,
    /// Set once the pointer strays further than the move threshold; never cleared
    pub moving: bool,
}

impl TouchInfo {
    fn new(position: Point) -> Self {
        Self {
            origin: position,
            previous: position,
            current: position,
            moving: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due: Instant,
    tap: TapInfo,
}

/// Turns a stream of raw pointer events into gestures.
///
/// Single-shot timers (long press, deferred single tap) are deadlines checked
/// by [`GestureRecognizer::tick`] and at the start of every processed event,
/// so everything runs on the caller's thread.
pub struct GestureRecognizer {
    config: GestureConfig,
    clock: Arc<dyn Clock>,
    touches: BTreeMap<PointerId, TouchInfo>,
    velocity: VelocityTracker,
    pressed_at: Option<Instant>,
    last_tap: Option<Instant>,
    long_press: Option<Timer>,
    pending_tap: Option<Timer>,
    /// A second pointer joined the current gesture, so it can no longer be a tap
    multi_touch: bool,
    rotation: f64,
    scale: f64,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::with_config(GestureConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_config(config: GestureConfig, clock: Arc<dyn Clock>) -> Self {
        let velocity = VelocityTracker::new(config.velocity_window(), config.velocity_max_samples);
        Self {
            config,
            clock,
            touches: BTreeMap::new(),
            velocity,
            pressed_at: None,
            last_tap: None,
            long_press: None,
            pending_tap: None,
            multi_touch: false,
            rotation: 0.0,
            scale: 1.0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn active_pointers(&self) -> usize {
        self.touches.len()
    }

    pub fn touch(&self, id: PointerId) -> Option<&TouchInfo> {
        self.touches.get(&id)
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.long_press, self.pending_tap) {
            (Some(a), Some(b)) => Some(a.due.min(b.due)),
            (Some(timer), None) | (None, Some(timer)) => Some(timer.due),
            (None, None) => None,
        }
    }

    /// Drops every tracked pointer and pending timer
    pub fn reset(&mut self) {
        self.touches.clear();
        self.velocity.clear();
        self.pressed_at = None;
        self.last_tap = None;
        self.long_press = None;
        self.pending_tap = None;
        self.multi_touch = false;
        self.rotation = 0.0;
        self.scale = 1.0;
    }

    /// Fires timers that are due
    pub fn tick(&mut self, handler: &mut dyn GestureHandler) {
        let now = self.clock.now();
        self.fire_timers(now, handler);
    }

    fn fire_timers(&mut self, now: Instant, handler: &mut dyn GestureHandler) {
        if let Some(timer) = self.long_press {
            if now >= timer.due {
                self.long_press = None;
                let still_down = self.touches.len() == 1
                    && self
                        .touches
                        .get(&timer.tap.pointer)
                        .map_or(false, |touch| !touch.moving);
                if still_down {
                    log::debug!("long pressing at {}", timer.tap.position);
                    handler.on_gesture(&Gesture::LongPressing(timer.tap));
                }
            }
        }
        if let Some(timer) = self.pending_tap {
            if now >= timer.due {
                self.pending_tap = None;
                log::debug!("single tap at {}", timer.tap.position);
                handler.on_gesture(&Gesture::SingleTapped(timer.tap));
            }
        }
    }

    /// Processes one raw event.
    ///
    /// Returns [`EventHandled::Handled`] when the event was consumed, either by
    /// the recognizer or by a handler vetoing default processing.
    pub fn process(
        &mut self,
        event: &PointerEvent,
        handler: &mut dyn GestureHandler,
    ) -> EventHandled {
        let now = self.clock.now();
        self.fire_timers(now, handler);

        match event.action {
            PointerAction::Entered => EventHandled::NotHandled,
            PointerAction::Pressed => {
                if handler.on_gesture(&Gesture::TouchDown(*event)).is_handled() {
                    return EventHandled::Handled;
                }
                self.pressed(event, now, handler);
                EventHandled::Handled
            }
            PointerAction::Moved => {
                if handler.on_gesture(&Gesture::TouchMove(*event)).is_handled() {
                    return EventHandled::Handled;
                }
                self.moved(event, now, handler)
            }
            PointerAction::Released => {
                if handler.on_gesture(&Gesture::TouchUp(*event)).is_handled() {
                    return EventHandled::Handled;
                }
                self.released(event, now, handler)
            }
            PointerAction::Cancelled | PointerAction::Exited => {
                self.long_press = None;
                if self.touches.remove(&event.id).is_none() {
                    return EventHandled::NotHandled;
                }
                log::debug!("{} dropped ({:?})", event.id, event.action);
                self.velocity.remove(event.id);
                EventHandled::Handled
            }
            PointerAction::WheelChanged => {
                handler.on_gesture(&Gesture::WheelChanged(WheelInfo {
                    pointer: event.id,
                    position: event.position,
                    delta: event.wheel_delta,
                    button: event.button,
                }));
                EventHandled::Handled
            }
        }
    }

    fn pressed(&mut self, event: &PointerEvent, now: Instant, handler: &mut dyn GestureHandler) {
        if self.touches.is_empty() {
            self.touches.insert(event.id, TouchInfo::new(event.position));
            self.pressed_at = Some(now);
            self.multi_touch = false;
            self.long_press = Some(Timer {
                due: now + self.config.long_press_delay(),
                tap: TapInfo {
                    pointer: event.id,
                    position: event.position,
                },
            });
        } else {
            // A second pointer ends the single-pointer pan
            if self.touches.len() == 1 {
                if let Some(touch) = self.touches.values().next().filter(|touch| touch.moving) {
                    let pan = PanInfo {
                        previous: touch.previous,
                        position: touch.current,
                    };
                    handler.on_gesture(&Gesture::Panned(pan));
                }
            }
            self.touches.insert(event.id, TouchInfo::new(event.position));
            self.multi_touch = true;
            self.long_press = None;
            self.rotation = 0.0;
            self.scale = 1.0;
        }
        self.velocity.add(event.id, event.position, now);
    }

    fn moved(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        handler: &mut dyn GestureHandler,
    ) -> EventHandled {
        let max_move_distance = self.config.max_move_distance;
        let Some(touch) = self.touches.get_mut(&event.id) else {
            log::trace!("move for untracked {}", event.id);
            return EventHandled::NotHandled;
        };
        touch.current = event.position;
        if !touch.moving && touch.origin.distance_to(&event.position) > max_move_distance {
            touch.moving = true;
            self.long_press = None;
        }
        self.velocity.add(event.id, event.position, now);
        self.detect_pan_and_pinch(event.id, false, now, handler);
        if let Some(touch) = self.touches.get_mut(&event.id) {
            touch.previous = touch.current;
        }
        EventHandled::Handled
    }

    fn released(
        &mut self,
        event: &PointerEvent,
        now: Instant,
        handler: &mut dyn GestureHandler,
    ) -> EventHandled {
        let Some(touch) = self.touches.get_mut(&event.id) else {
            log::warn!("release for untracked {}", event.id);
            return EventHandled::NotHandled;
        };
        touch.current = event.position;
        self.long_press = None;
        self.detect_taps(event.id, now, handler);
        self.detect_pan_and_pinch(event.id, true, now, handler);
        self.touches.remove(&event.id);
        self.velocity.remove(event.id);
        EventHandled::Handled
    }

    fn detect_taps(&mut self, id: PointerId, now: Instant, handler: &mut dyn GestureHandler) {
        if self.touches.len() != 1 || self.multi_touch {
            return;
        }
        let Some(touch) = self.touches.get(&id) else {
            return;
        };
        if touch.moving {
            return;
        }
        let tap = TapInfo {
            pointer: id,
            position: touch.previous,
        };
        let last_tap = self.last_tap.replace(now);

        if handler.on_gesture(&Gesture::Tapping(tap)).is_handled() {
            return;
        }

        let double_tap_delay = self.config.double_tap_delay();
        let long_press_delay = self.config.long_press_delay();
        let double_tap = last_tap
            .map_or(false, |last| now.saturating_duration_since(last) < double_tap_delay);
        let long_press = self
            .pressed_at
            .map_or(false, |pressed| now.saturating_duration_since(pressed) >= long_press_delay);

        if double_tap {
            self.last_tap = None;
            self.pending_tap = None;
            log::debug!("double tap at {}", tap.position);
            handler.on_gesture(&Gesture::DoubleTapped(tap));
        } else if long_press {
            log::debug!("long press at {}", tap.position);
            handler.on_gesture(&Gesture::LongPressed(tap));
        } else {
            self.pending_tap = Some(Timer {
                due: now + self.config.double_tap_delay(),
                tap,
            });
        }
    }

    fn detect_pan_and_pinch(
        &mut self,
        id: PointerId,
        released: bool,
        now: Instant,
        handler: &mut dyn GestureHandler,
    ) {
        let touches: Vec<TouchInfo> = self.touches.values().take(2).copied().collect();
        match touches.as_slice() {
            [touch] => {
                if !touch.moving {
                    return;
                }
                let pan = PanInfo {
                    previous: touch.previous,
                    position: touch.current,
                };
                if !released {
                    handler.on_gesture(&Gesture::Panning(pan));
                    return;
                }
                // A finger left over from a pinch carries the pinch's speed
                let velocity = self.velocity.velocity(id, now);
                if !self.multi_touch && velocity.length() > self.config.swipe_velocity_threshold {
                    log::debug!("swipe from {} with {} px/s", touch.current, velocity);
                    handler.on_gesture(&Gesture::Swiped(SwipeInfo {
                        position: touch.current,
                        velocity,
                    }));
                } else {
                    handler.on_gesture(&Gesture::Panned(pan));
                }
            }
            [first, second] => {
                let Some(pinch) = self.pinch_step(first, second) else {
                    return;
                };
                if released {
                    log::debug!(
                        "pinch finished, rotation {:.3} rad, scale {:.3}",
                        pinch.total_rotation,
                        pinch.total_scale
                    );
                    handler.on_gesture(&Gesture::Pinched(pinch));
                } else {
                    handler.on_gesture(&Gesture::Pinching(pinch));
                }
            }
            _ => {}
        }
    }

    fn pinch_step(&mut self, first: &TouchInfo, second: &TouchInfo) -> Option<PinchInfo> {
        let previous_mid = first.previous.midpoint(&second.previous);
        let midpoint = first.current.midpoint(&second.current);

        // The pointer that did not move in this step anchors the rotation
        let (pivot, other) = if first.current == first.previous {
            (first, second)
        } else {
            (second, first)
        };
        let old_vector = other.previous - pivot.current;
        let new_vector = other.current - pivot.current;
        if old_vector.length() == 0.0 || new_vector.length() == 0.0 {
            return None;
        }

        let mut rotation = new_vector.y.atan2(new_vector.x) - old_vector.y.atan2(old_vector.x);
        if rotation > PI {
            rotation -= TAU;
        } else if rotation <= -PI {
            rotation += TAU;
        }
        let scale = new_vector.length() / old_vector.length();

        self.rotation += rotation;
        while self.rotation > TAU {
            self.rotation -= TAU;
        }
        while self.rotation < -TAU {
            self.rotation += TAU;
        }
        self.scale *= scale;

        Some(PinchInfo {
            pivot: pivot.current,
            midpoint,
            translation: midpoint - previous_mid,
            rotation: rotation.to_degrees(),
            scale,
            total_rotation: self.rotation,
            total_scale: self.scale,
        })
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GestureRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureRecognizer")
            .field("touches", &self.touches)
            .field("long_press_pending", &self.long_press.is_some())
            .field("single_tap_pending", &self.pending_tap.is_some())
            .finish()
    }
}
