//! Camera navigation on top of [`Viewport`].
//!
//! Every operation keeps a screen pivot fixed: the view-space point under the
//! pivot is the same before and after a rotation or scale. Animated variants
//! run on the navigator's own [`AnimationScheduler`] and each kind of
//! operation owns one animation slot, so a new move replaces a running move
//! while a running rotation keeps going.

use crate::animation::{
    Animation, AnimationEntry, AnimationId, AnimationScheduler, EasingFunction, Progress,
};
use crate::core::clock::Clock;
use crate::core::config::{NavigatorConfig, ViewportConfig};
use crate::core::geo::{GeoBox, GeoPoint, Point};
use crate::core::viewport::{wrap_degrees, Viewport};
use crate::prelude::HashMap;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Animation slots owned by a [`Navigator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Move,
    Rotate,
    Scale,
    Swipe,
}

/// Moves the center so the content follows a screen-space drag of `delta`
fn translate_by_pixels(viewport: &mut Viewport, delta: Point) {
    let target = viewport.screen_to_view(viewport.screen_center() - delta);
    viewport.set_center(target);
}

pub struct Navigator {
    viewport: Viewport,
    config: NavigatorConfig,
    scheduler: AnimationScheduler<Viewport>,
    slots: HashMap<AnimationKind, AnimationId>,
    /// Rotation absorbed while the map is held at north-up
    unsnapped: f64,
}

impl Navigator {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_config(viewport, NavigatorConfig::default(), AnimationScheduler::new())
    }

    pub fn with_config(
        viewport: Viewport,
        config: NavigatorConfig,
        scheduler: AnimationScheduler<Viewport>,
    ) -> Self {
        Self {
            viewport,
            config,
            scheduler,
            slots: HashMap::default(),
            unsnapped: 0.0,
        }
    }

    /// Navigator over a fresh viewport, timed by `clock`
    pub fn with_clock(
        viewport_config: ViewportConfig,
        config: NavigatorConfig,
        clock: Arc<dyn Clock>,
        width: f64,
        height: f64,
    ) -> Self {
        Self::with_config(
            Viewport::with_config(viewport_config, width, height),
            config,
            AnimationScheduler::with_clock(clock),
        )
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable access for size changes, listeners and the redraw flag
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &AnimationScheduler<Viewport> {
        &self.scheduler
    }

    fn pivot_or_center(&self, pivot: Option<Point>) -> Point {
        pivot.unwrap_or_else(|| self.viewport.screen_center())
    }

    /// Advances running animations; returns whether any ran
    pub fn tick(&mut self) -> bool {
        let ticked = self.scheduler.tick(&mut self.viewport);
        if ticked {
            let scheduler = &self.scheduler;
            self.slots.retain(|_, id| scheduler.is_running(*id));
        }
        ticked
    }

    pub fn is_animating(&self) -> bool {
        self.slots.values().any(|id| self.scheduler.is_running(*id))
    }

    pub fn is_animating_kind(&self, kind: AnimationKind) -> bool {
        self.slots
            .get(&kind)
            .map_or(false, |id| self.scheduler.is_running(*id))
    }

    /// Stops every navigator animation where it is
    pub fn cancel_animations(&mut self) {
        for (kind, id) in self.slots.drain() {
            if self.scheduler.cancel(id) {
                log::debug!("cancelled {:?} {}", kind, id);
            }
        }
    }

    fn cancel_kind(&mut self, kind: AnimationKind) {
        if let Some(id) = self.slots.remove(&kind) {
            self.scheduler.stop(id, false, &mut self.viewport);
        }
    }

    fn start_kind(&mut self, kind: AnimationKind, animation: Animation<Viewport>) -> AnimationId {
        self.cancel_kind(kind);
        let id = self.scheduler.start(animation);
        self.slots.insert(kind, id);
        id
    }

    /// Pans by a screen-space delta in pixels
    pub fn move_by(&mut self, delta: Point) {
        if !delta.is_finite() {
            log::warn!("ignoring non-finite move {}", delta);
            return;
        }
        translate_by_pixels(&mut self.viewport, delta);
    }

    /// Centers on a view-space point, animated linearly when `duration` is non-zero
    pub fn move_to(&mut self, target: Point, duration: Duration) -> Option<AnimationId> {
        if !target.is_finite() {
            log::warn!("ignoring non-finite move target {}", target);
            return None;
        }
        if duration.is_zero() {
            self.cancel_kind(AnimationKind::Move);
            self.viewport.set_center(target);
            return None;
        }
        let entry = AnimationEntry::tween(
            self.viewport.center(),
            target,
            EasingFunction::Linear,
            |viewport: &mut Viewport, center: Point| viewport.set_center(center),
        );
        Some(self.start_kind(
            AnimationKind::Move,
            Animation::new(duration).with_entry(entry),
        ))
    }

    pub fn move_to_geo(&mut self, target: GeoPoint, duration: Duration) -> Option<AnimationId> {
        let projected = target.project(self.viewport.projection());
        self.move_to(projected, duration)
    }

    /// Rotates by `degrees` around `pivot`, holding the map at north-up until
    /// the gesture has turned past the unsnap threshold.
    pub fn rotate_by(&mut self, degrees: f64, pivot: Option<Point>) {
        if !degrees.is_finite() {
            log::warn!("ignoring non-finite rotation {}", degrees);
            return;
        }
        let pivot = self.pivot_or_center(pivot);
        let current = self.viewport.rotation();
        let target = if current == 0.0 {
            self.unsnapped = wrap_degrees(self.unsnapped + degrees);
            if self.unsnapped.abs() < self.config.unsnap_rotation {
                return;
            }
            let excess = self.unsnapped - self.unsnapped.signum() * self.config.unsnap_rotation;
            self.unsnapped = 0.0;
            log::debug!("rotation unsnapped by {:.2}°", excess);
            excess
        } else {
            let target = wrap_degrees(current + degrees);
            if target.abs() < self.config.resnap_rotation && target.abs() < current.abs() {
                log::debug!("rotation snapped back to north-up");
                0.0
            } else {
                target
            }
        };
        let scale = self.viewport.scale();
        self.viewport.transform_about(pivot, scale, target);
    }

    /// Rotates to an absolute angle along the shortest path.
    ///
    /// The last frame lands on the wrapped target exactly.
    pub fn rotate_to(
        &mut self,
        degrees: f64,
        pivot: Option<Point>,
        duration: Duration,
    ) -> Option<AnimationId> {
        if !degrees.is_finite() {
            log::warn!("ignoring non-finite rotation target {}", degrees);
            return None;
        }
        let pivot = self.pivot_or_center(pivot);
        let target = wrap_degrees(degrees);
        self.unsnapped = 0.0;
        if duration.is_zero() {
            self.cancel_kind(AnimationKind::Rotate);
            let scale = self.viewport.scale();
            self.viewport.transform_about(pivot, scale, target);
            return None;
        }
        let start = self.viewport.rotation();
        let end = start + wrap_degrees(target - start);
        let entry = AnimationEntry::tween(
            start,
            end,
            EasingFunction::Linear,
            move |viewport: &mut Viewport, rotation: f64| {
                let scale = viewport.scale();
                viewport.transform_about(pivot, scale, rotation);
            },
        )
        .with_final(move |viewport: &mut Viewport| {
            let scale = viewport.scale();
            viewport.transform_about(pivot, scale, target);
        });
        Some(self.start_kind(
            AnimationKind::Rotate,
            Animation::new(duration).with_entry(entry),
        ))
    }

    pub fn scale_by(&mut self, factor: f64, pivot: Option<Point>) {
        if !(factor.is_finite() && factor > 0.0) {
            log::warn!("ignoring scale factor {}", factor);
            return;
        }
        let pivot = self.pivot_or_center(pivot);
        let (scale, rotation) = (self.viewport.scale(), self.viewport.rotation());
        self.viewport.transform_about(pivot, scale * factor, rotation);
    }

    pub fn scale_to(
        &mut self,
        scale: f64,
        pivot: Option<Point>,
        duration: Duration,
    ) -> Option<AnimationId> {
        if !(scale.is_finite() && scale > 0.0) {
            log::warn!("ignoring scale target {}", scale);
            return None;
        }
        let pivot = self.pivot_or_center(pivot);
        if duration.is_zero() {
            self.cancel_kind(AnimationKind::Scale);
            let rotation = self.viewport.rotation();
            self.viewport.transform_about(pivot, scale, rotation);
            return None;
        }
        let entry = AnimationEntry::tween(
            self.viewport.scale(),
            scale,
            EasingFunction::Linear,
            move |viewport: &mut Viewport, scale: f64| {
                let rotation = viewport.rotation();
                viewport.transform_about(pivot, scale, rotation);
            },
        );
        Some(self.start_kind(
            AnimationKind::Scale,
            Animation::new(duration).with_entry(entry),
        ))
    }

    /// Pan, rotation and scale of one pinch step
    pub fn move_rotate_scale_by(
        &mut self,
        delta: Point,
        degrees: f64,
        factor: f64,
        pivot: Option<Point>,
    ) {
        self.move_by(delta);
        self.rotate_by(degrees, pivot);
        self.scale_by(factor, pivot);
    }

    /// Keeps panning after a fling, decelerating to rest.
    ///
    /// `velocity` is in pixels per second; slow flings are ignored.
    pub fn swipe_with(&mut self, velocity: Point, max_duration: Duration) -> Option<AnimationId> {
        self.cancel_kind(AnimationKind::Swipe);
        self.cancel_kind(AnimationKind::Move);

        let speed = velocity.length();
        if !speed.is_finite() || speed < self.config.min_swipe_velocity {
            log::debug!("swipe of {:.1} px/s discarded", speed);
            return None;
        }
        let millis = speed / 10.0;
        if millis < self.config.min_swipe_duration_ms as f64 {
            log::debug!("swipe of {:.1} px/s too short to animate", speed);
            return None;
        }
        let millis = millis.min(max_duration.as_millis() as f64);
        let seconds = millis / 1000.0;

        let mut last_overall = 0.0;
        let entry = AnimationEntry::new(
            EasingFunction::EaseInSine,
            move |viewport: &mut Viewport, progress: Progress| {
                let dt = (progress.overall - last_overall) * seconds;
                last_overall = progress.overall;
                let remaining = EasingFunction::EaseInSine.remaining(progress.local);
                let movement = velocity * (remaining * dt);
                if !movement.is_finite() || movement == Point::ZERO {
                    return;
                }
                translate_by_pixels(viewport, movement);
            },
        );
        Some(self.start_kind(
            AnimationKind::Swipe,
            Animation::new(Duration::from_secs_f64(seconds)).with_entry(entry),
        ))
    }

    /// Fits a geographic box into the current viewport size
    pub fn fit_box(&mut self, geo_box: &GeoBox) -> Result<()> {
        self.cancel_animations();
        self.unsnapped = 0.0;
        let (width, height) = (self.viewport.width(), self.viewport.height());
        self.viewport.set_by_bounding_box(geo_box, width, height)
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("viewport", &self.viewport)
            .field("animations", &self.slots)
            .field("unsnapped", &self.unsnapped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn navigator() -> (Navigator, ManualClock) {
        let clock = ManualClock::new();
        let mut navigator = Navigator::with_clock(
            ViewportConfig::default(),
            NavigatorConfig::default(),
            Arc::new(clock.clone()),
            800.0,
            600.0,
        );
        navigator.scale_to(16.0, None, Duration::ZERO);
        (navigator, clock)
    }

    fn assert_close(a: Point, b: Point, tolerance: f64) {
        assert!(a.distance_to(&b) < tolerance, "{} != {}", a, b);
    }

    #[test]
    fn test_move_by_follows_drag() {
        let (mut navigator, _) = navigator();
        let grabbed = navigator.viewport().screen_to_view(Point::new(100.0, 100.0));
        navigator.move_by(Point::new(30.0, -20.0));
        let under_finger = navigator.viewport().screen_to_view(Point::new(130.0, 80.0));
        assert_close(under_finger, grabbed, 1e-12);
    }

    #[test]
    fn test_move_by_respects_rotation() {
        let (mut navigator, _) = navigator();
        navigator.rotate_to(90.0, None, Duration::ZERO);
        let grabbed = navigator.viewport().screen_to_view(Point::new(400.0, 300.0));
        navigator.move_by(Point::new(50.0, 0.0));
        assert_close(
            navigator.viewport().screen_to_view(Point::new(450.0, 300.0)),
            grabbed,
            1e-12,
        );
    }

    #[test]
    fn test_scale_to_at_center_keeps_center() {
        let (mut navigator, _) = navigator();
        navigator.move_to(Point::new(0.2, -0.3), Duration::ZERO);
        let center = navigator.viewport().center();
        let scale = navigator.viewport().scale();
        let pivot = navigator.viewport().screen_center();
        navigator.scale_to(scale * 2.0, Some(pivot), Duration::ZERO);
        assert_eq!(navigator.viewport().scale(), scale * 2.0);
        assert_eq!(navigator.viewport().center(), center);
    }

    #[test]
    fn test_scale_by_preserves_pivot() {
        let (mut navigator, _) = navigator();
        navigator.rotate_to(35.0, None, Duration::ZERO);
        for (pivot, factor) in [
            (Point::new(10.0, 20.0), 2.0),
            (Point::new(790.0, 590.0), 0.5),
            (Point::new(400.0, 0.0), 1.37),
        ] {
            let before = navigator.viewport().screen_to_view(pivot);
            navigator.scale_by(factor, Some(pivot));
            assert_close(navigator.viewport().screen_to_view(pivot), before, 1e-12);
        }
    }

    #[test]
    fn test_rotation_snap() {
        let (mut navigator, _) = navigator();
        navigator.rotate_by(4.0, None);
        navigator.rotate_by(5.0, None);
        assert_eq!(navigator.viewport().rotation(), 0.0);

        navigator.rotate_by(3.0, None);
        assert!((navigator.viewport().rotation() - 2.0).abs() < 1e-9);

        navigator.rotate_by(20.0, None);
        assert!((navigator.viewport().rotation() - 22.0).abs() < 1e-9);

        navigator.rotate_by(-18.0, None);
        assert_eq!(navigator.viewport().rotation(), 0.0);
    }

    #[test]
    fn test_unsnap_in_either_direction() {
        let (mut navigator, _) = navigator();
        navigator.rotate_by(-12.0, None);
        assert!((navigator.viewport().rotation() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_by_full_turns() {
        let (mut navigator, _) = navigator();
        navigator.rotate_to(40.0, None, Duration::ZERO);
        for _ in 0..5 {
            navigator.rotate_by(360.0, None);
        }
        assert!((navigator.viewport().rotation() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_by_preserves_pivot() {
        let (mut navigator, _) = navigator();
        navigator.rotate_to(30.0, None, Duration::ZERO);
        let pivot = Point::new(120.0, 480.0);
        let before = navigator.viewport().screen_to_view(pivot);
        navigator.rotate_by(45.0, Some(pivot));
        assert_close(navigator.viewport().screen_to_view(pivot), before, 1e-12);
    }

    #[test]
    fn test_animated_rotation_takes_short_path() {
        let (mut navigator, clock) = navigator();
        navigator.rotate_to(170.0, None, Duration::ZERO);
        navigator.rotate_to(-170.0, None, Duration::from_millis(100));
        clock.advance_ms(50);
        navigator.tick();
        assert!((navigator.viewport().rotation() - 180.0).abs() < 1e-9);
        clock.advance_ms(60);
        navigator.tick();
        assert_eq!(navigator.viewport().rotation(), -170.0);
        assert!(!navigator.is_animating());
    }

    #[test]
    fn test_animated_rotation_lands_on_target() {
        let (mut navigator, clock) = navigator();
        navigator.rotate_to(-77.7, None, Duration::ZERO);
        navigator.rotate_to(151.1, None, Duration::from_millis(100));
        clock.advance_ms(120);
        navigator.tick();
        assert_eq!(navigator.viewport().rotation(), 151.1);
    }

    #[test]
    fn test_non_finite_targets_are_ignored() {
        let (mut navigator, _) = navigator();
        navigator.rotate_to(30.0, None, Duration::ZERO);
        let center = navigator.viewport().center();

        assert!(navigator.rotate_to(f64::NAN, None, Duration::from_millis(100)).is_none());
        assert!(navigator.rotate_to(f64::INFINITY, None, Duration::ZERO).is_none());
        assert!(navigator.scale_to(f64::NAN, None, Duration::ZERO).is_none());
        assert!(navigator.scale_to(-2.0, None, Duration::from_millis(100)).is_none());
        assert!(navigator.move_to(Point::new(f64::NAN, 0.0), Duration::ZERO).is_none());

        assert_eq!(navigator.viewport().rotation(), 30.0);
        assert_eq!(navigator.viewport().scale(), 16.0);
        assert_eq!(navigator.viewport().center(), center);
        assert!(!navigator.is_animating());
    }

    #[test]
    fn test_animated_move_reaches_target() {
        let (mut navigator, clock) = navigator();
        let target = Point::new(0.5, 0.25);
        navigator.move_to(target, Duration::from_millis(200));
        clock.advance_ms(100);
        navigator.tick();
        assert_close(navigator.viewport().center(), Point::new(0.25, 0.125), 1e-12);
        clock.advance_ms(150);
        navigator.tick();
        assert_eq!(navigator.viewport().center(), target);
    }

    #[test]
    fn test_one_slot_per_kind() {
        let (mut navigator, clock) = navigator();
        let first = navigator.move_to(Point::new(0.5, 0.0), Duration::from_millis(100));
        let rotate = navigator.rotate_to(90.0, None, Duration::from_millis(100));
        let second = navigator.move_to(Point::new(-0.5, 0.0), Duration::from_millis(100));
        let scheduler = navigator.scheduler();
        assert!(!scheduler.is_running(first.unwrap()));
        assert!(scheduler.is_running(second.unwrap()));
        assert!(scheduler.is_running(rotate.unwrap()));

        clock.advance_ms(100);
        navigator.tick();
        assert_eq!(navigator.viewport().rotation(), 90.0);
        assert!(!navigator.is_animating());
    }

    #[test]
    fn test_cancel_animations_stops_in_place() {
        let (mut navigator, clock) = navigator();
        navigator.move_to(Point::new(0.5, 0.0), Duration::from_millis(100));
        clock.advance_ms(50);
        navigator.tick();
        navigator.cancel_animations();
        let center = navigator.viewport().center();
        clock.advance_ms(100);
        assert!(!navigator.tick());
        assert_eq!(navigator.viewport().center(), center);
        assert!(center.x < 0.5);
    }

    #[test]
    fn test_swipe_decays() {
        let (mut navigator, clock) = navigator();
        let start = navigator.viewport().center();
        let id = navigator.swipe_with(Point::new(1000.0, 0.0), Duration::from_millis(500));
        assert!(id.is_some());
        assert!(navigator.is_animating_kind(AnimationKind::Swipe));

        let mut previous = start;
        let mut steps = Vec::new();
        for _ in 0..7 {
            clock.advance_ms(16);
            navigator.tick();
            let center = navigator.viewport().center();
            steps.push(previous.x - center.x);
            previous = center;
        }
        // Content follows the fling to the right, so the center moves left
        assert!(steps.iter().all(|step| *step >= 0.0));
        assert!(steps[0] > steps[5]);
        clock.advance_ms(100);
        navigator.tick();
        assert!(!navigator.is_animating());
    }

    #[test]
    fn test_slow_swipe_is_ignored() {
        let (mut navigator, _) = navigator();
        assert!(navigator
            .swipe_with(Point::new(60.0, 50.0), Duration::from_millis(500))
            .is_none());
        assert!(!navigator.is_animating());
    }

    #[test]
    fn test_fit_box() {
        let (mut navigator, _) = navigator();
        navigator.fit_box(&GeoBox::new(40.0, -10.0, 50.0, 10.0)).unwrap();
        let center = navigator.viewport().center_geo();
        assert!(center.longitude().abs() < 1e-9);
        assert!(center.latitude() > 40.0 && center.latitude() < 50.0);
    }

    #[test]
    fn test_move_to_geo() {
        let (mut navigator, _) = navigator();
        navigator.move_to_geo(GeoPoint::new(52.52, 13.405), Duration::ZERO);
        assert!((navigator.viewport().latitude() - 52.52).abs() < 1e-9);
        assert!((navigator.viewport().longitude() - 13.405).abs() < 1e-9);
    }
}
