//! Time-driven animation scheduler.
//!
//! An [`Animation`] is a duration, a loop flag and a list of
//! [`AnimationEntry`] values. Each entry is active during a sub-window of the
//! animation's overall progress and receives a context (`&mut C`) on every
//! tick, typically the viewport it animates. Animations are registered with an
//! [`AnimationScheduler`], which is driven by an external fixed-rate tick and
//! measures progress against its [`Clock`], so delayed or skipped ticks never
//! stretch an animation.
//!
//! The registry is guarded by a mutex that is never held while callbacks run.
//! A cancel that arrives while an animation is being ticked is recorded and
//! applied when the tick merges its results back.

use crate::animation::interpolation::EasingFunction;
use crate::core::clock::{Clock, SystemClock};
use crate::prelude::HashMap;
use crate::traits::Lerp;
use instant::Instant;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub type TickFn<C> = Box<dyn FnMut(&mut C, Progress) + Send>;
pub type FinalFn<C> = Box<dyn FnMut(&mut C) + Send>;

/// Progress handed to an entry's tick callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Progress of the whole animation in `[0,1]`
    pub overall: f64,
    /// Progress within the entry's own window in `[0,1]`
    pub local: f64,
    /// `local` passed through the entry's easing function
    pub eased: f64,
}

pub struct AnimationEntry<C> {
    window_start: f64,
    window_end: f64,
    easing: EasingFunction,
    tick: TickFn<C>,
    on_final: Option<FinalFn<C>>,
}

impl<C> AnimationEntry<C> {
    /// Entry active for the whole animation
    pub fn new(
        easing: EasingFunction,
        tick: impl FnMut(&mut C, Progress) + Send + 'static,
    ) -> Self {
        Self {
            window_start: 0.0,
            window_end: 1.0,
            easing,
            tick: Box::new(tick),
            on_final: None,
        }
    }

    /// Interpolates from `from` to `to` and hands each value to `apply`.
    ///
    /// The final callback applies `to` exactly, so float drift never leaves the
    /// target short.
    pub fn tween<T>(
        from: T,
        to: T,
        easing: EasingFunction,
        apply: impl FnMut(&mut C, T) + Send + 'static,
    ) -> Self
    where
        T: Lerp + Clone + Send + 'static,
        C: 'static,
    {
        let apply = Arc::new(Mutex::new(apply));
        let tick_apply = Arc::clone(&apply);
        let target = to.clone();
        Self::new(easing, move |ctx: &mut C, progress: Progress| {
            let value = from.lerp(&to, progress.eased);
            let mut apply = tick_apply.lock().unwrap_or_else(PoisonError::into_inner);
            (*apply)(ctx, value);
        })
        .with_final(move |ctx: &mut C| {
            let mut apply = apply.lock().unwrap_or_else(PoisonError::into_inner);
            (*apply)(ctx, target.clone());
        })
    }

    /// Restricts the entry to the `[start, end]` part of the animation.
    ///
    /// # Panics
    ///
    /// Panics unless `0 <= start <= end <= 1`.
    pub fn with_window(mut self, start: f64, end: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&start) && (0.0..=1.0).contains(&end) && start <= end,
            "animation entry window [{}, {}] is not inside [0, 1]",
            start,
            end
        );
        self.window_start = start;
        self.window_end = end;
        self
    }

    pub fn with_final(mut self, on_final: impl FnMut(&mut C) + Send + 'static) -> Self {
        self.on_final = Some(Box::new(on_final));
        self
    }

    pub fn easing(&self) -> EasingFunction {
        self.easing
    }

    pub fn window(&self) -> (f64, f64) {
        (self.window_start, self.window_end)
    }

    fn contains(&self, overall: f64) -> bool {
        overall >= self.window_start && overall <= self.window_end
    }

    fn tick(&mut self, ctx: &mut C, overall: f64) {
        let width = self.window_end - self.window_start;
        let local = if width > 0.0 {
            ((overall - self.window_start) / width).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let progress = Progress {
            overall,
            local,
            eased: self.easing.apply(local),
        };
        (self.tick)(ctx, progress);
    }

    fn finish(&mut self, ctx: &mut C) {
        if let Some(on_final) = self.on_final.as_mut() {
            on_final(ctx);
        }
    }
}

impl<C> fmt::Debug for AnimationEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationEntry")
            .field("window_start", &self.window_start)
            .field("window_end", &self.window_end)
            .field("easing", &self.easing)
            .field("has_final", &self.on_final.is_some())
            .finish()
    }
}

/// A set of entries sharing one duration
#[derive(Debug)]
pub struct Animation<C> {
    duration: Duration,
    looping: bool,
    entries: Vec<AnimationEntry<C>>,
}

impl<C> Animation<C> {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            looping: false,
            entries: Vec::new(),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_entry(mut self, entry: AnimationEntry<C>) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push(&mut self, entry: AnimationEntry<C>) {
        self.entries.push(entry);
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        }
    }

    fn finish(&mut self, ctx: &mut C) {
        for entry in &mut self.entries {
            entry.finish(ctx);
        }
    }
}

/// Handle of a registered animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animation#{}", self.0)
    }
}

struct Running<C> {
    id: AnimationId,
    started: Instant,
    animation: Animation<C>,
}

struct Registry<C> {
    next_id: u64,
    active: Vec<Running<C>>,
    ticking: bool,
    /// Stops requested for animations currently being ticked, with their snap flag
    pending_stops: HashMap<AnimationId, bool>,
}

/// Registry of running animations, ticked with a context of type `C`
pub struct AnimationScheduler<C> {
    clock: Arc<dyn Clock>,
    registry: Mutex<Registry<C>>,
}

impl<C> AnimationScheduler<C> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            registry: Mutex::new(Registry {
                next_id: 1,
                active: Vec::new(),
                ticking: false,
                pending_stops: HashMap::default(),
            }),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn registry(&self) -> MutexGuard<'_, Registry<C>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an animation and starts its clock
    pub fn start(&self, animation: Animation<C>) -> AnimationId {
        let started = self.clock.now();
        let mut registry = self.registry();
        let id = AnimationId(registry.next_id);
        registry.next_id += 1;
        log::debug!(
            "starting {} ({:?}, {} entries, looping: {})",
            id,
            animation.duration,
            animation.entries.len(),
            animation.looping
        );
        registry.active.push(Running {
            id,
            started,
            animation,
        });
        id
    }

    /// Deregisters an animation without running its final callbacks
    pub fn cancel(&self, id: AnimationId) -> bool {
        let mut registry = self.registry();
        if let Some(index) = registry.active.iter().position(|running| running.id == id) {
            registry.active.remove(index);
            log::debug!("cancelled {}", id);
            true
        } else if registry.ticking {
            registry.pending_stops.entry(id).or_insert(false);
            true
        } else {
            false
        }
    }

    /// Deregisters an animation, running its final callbacks when `snap_to_end` is set
    pub fn stop(&self, id: AnimationId, snap_to_end: bool, ctx: &mut C) -> bool {
        let removed = {
            let mut registry = self.registry();
            match registry.active.iter().position(|running| running.id == id) {
                Some(index) => Some(registry.active.remove(index)),
                None => {
                    if registry.ticking {
                        let pending = registry.pending_stops.entry(id).or_insert(false);
                        *pending |= snap_to_end;
                        return true;
                    }
                    None
                }
            }
        };
        match removed {
            Some(mut running) => {
                log::debug!("stopped {} (snap to end: {})", id, snap_to_end);
                if snap_to_end {
                    running.animation.finish(ctx);
                }
                true
            }
            None => false,
        }
    }

    /// Cancels every registered animation
    pub fn cancel_all(&self) {
        let mut registry = self.registry();
        registry.active.clear();
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.registry().active.iter().any(|running| running.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.registry().active.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }

    /// Advances every registered animation to the current time.
    ///
    /// Returns `true` when at least one animation was processed.
    pub fn tick(&self, ctx: &mut C) -> bool {
        let now = self.clock.now();
        let mut in_flight = {
            let mut registry = self.registry();
            if registry.active.is_empty() {
                return false;
            }
            registry.ticking = true;
            std::mem::take(&mut registry.active)
        };

        let mut finished = Vec::new();
        in_flight.retain_mut(|running| {
            let elapsed = now.saturating_duration_since(running.started);
            let mut progress = running.animation.progress(elapsed);
            if progress >= 1.0 {
                if !running.animation.looping {
                    finished.push(running.id);
                    running.animation.finish(ctx);
                    return false;
                }
                running.started = now;
                progress = 0.0;
            }
            log::trace!("ticking {} at {:.3}", running.id, progress);
            for entry in &mut running.animation.entries {
                if entry.contains(progress) {
                    entry.tick(ctx, progress);
                }
            }
            true
        });

        for id in finished {
            log::debug!("finished {}", id);
        }

        let stopped = {
            let mut registry = self.registry();
            registry.ticking = false;
            let pending = std::mem::take(&mut registry.pending_stops);
            let mut stopped = Vec::new();
            // Animations started by another thread during the tick keep their place after ours
            let started_meanwhile = std::mem::take(&mut registry.active);
            for running in in_flight {
                match pending.get(&running.id) {
                    Some(snap) => stopped.push((running, *snap)),
                    None => registry.active.push(running),
                }
            }
            registry.active.extend(started_meanwhile);
            stopped
        };

        for (mut running, snap) in stopped {
            log::debug!("stopped {} after tick (snap to end: {})", running.id, snap);
            if snap {
                running.animation.finish(ctx);
            }
        }
        true
    }
}

impl<C> Default for AnimationScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for AnimationScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("active", &self.active_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<f64>,
        finals: usize,
        value: f64,
    }

    fn recording_entry() -> AnimationEntry<Recorder> {
        AnimationEntry::new(EasingFunction::Linear, |recorder: &mut Recorder, progress| {
            recorder.ticks.push(progress.overall)
        })
        .with_final(|recorder: &mut Recorder| recorder.finals += 1)
    }

    fn scheduler() -> (AnimationScheduler<Recorder>, ManualClock) {
        let clock = ManualClock::new();
        (AnimationScheduler::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_tick_final_and_removal() {
        let (scheduler, clock) = scheduler();
        let mut recorder = Recorder::default();
        let id = scheduler.start(Animation::from_millis(1000).with_entry(recording_entry()));

        clock.set_elapsed(Duration::from_millis(500));
        assert!(scheduler.tick(&mut recorder));
        assert_eq!(recorder.ticks.len(), 1);
        assert!((recorder.ticks[0] - 0.5).abs() < 1e-9);
        assert_eq!(recorder.finals, 0);

        clock.set_elapsed(Duration::from_millis(1100));
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.finals, 1);
        assert!(!scheduler.is_running(id));
        assert_eq!(scheduler.active_count(), 0);

        clock.set_elapsed(Duration::from_millis(1200));
        assert!(!scheduler.tick(&mut recorder));
        assert_eq!(recorder.finals, 1);
        assert_eq!(recorder.ticks.len(), 1);
    }

    #[test]
    fn test_entry_windows() {
        let (scheduler, clock) = scheduler();
        let mut recorder = Recorder::default();
        let late = AnimationEntry::new(EasingFunction::Linear, |recorder: &mut Recorder, progress| {
            recorder.value = progress.local
        })
        .with_window(0.5, 1.0);
        scheduler.start(Animation::from_millis(1000).with_entry(late));

        clock.advance_ms(250);
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.value, 0.0);

        clock.advance_ms(500);
        scheduler.tick(&mut recorder);
        assert!((recorder.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tween_reaches_exact_target() {
        let (scheduler, clock) = scheduler();
        let mut recorder = Recorder::default();
        let tween = AnimationEntry::tween(
            0.0,
            3.0,
            EasingFunction::EaseInOutSine,
            |recorder: &mut Recorder, value| recorder.value = value,
        );
        scheduler.start(Animation::from_millis(300).with_entry(tween));

        clock.advance_ms(100);
        scheduler.tick(&mut recorder);
        assert!(recorder.value > 0.0 && recorder.value < 3.0);

        clock.advance_ms(500);
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.value, 3.0);
    }

    #[test]
    fn test_looping_restarts() {
        let (scheduler, clock) = scheduler();
        let mut recorder = Recorder::default();
        let id = scheduler.start(
            Animation::from_millis(100)
                .looping(true)
                .with_entry(recording_entry()),
        );

        clock.advance_ms(150);
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.ticks, vec![0.0]);
        assert_eq!(recorder.finals, 0);
        assert!(scheduler.is_running(id));

        clock.advance_ms(50);
        scheduler.tick(&mut recorder);
        assert!((recorder.ticks[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_and_stop() {
        let (scheduler, _clock) = scheduler();
        let mut recorder = Recorder::default();

        let cancelled = scheduler.start(Animation::from_millis(100).with_entry(recording_entry()));
        assert!(scheduler.cancel(cancelled));
        assert!(!scheduler.cancel(cancelled));

        let snapped = scheduler.start(Animation::from_millis(100).with_entry(recording_entry()));
        assert!(scheduler.stop(snapped, true, &mut recorder));
        assert_eq!(recorder.finals, 1);

        let dropped = scheduler.start(Animation::from_millis(100).with_entry(recording_entry()));
        assert!(scheduler.stop(dropped, false, &mut recorder));
        assert_eq!(recorder.finals, 1);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let (scheduler, _clock) = scheduler();
        let mut recorder = Recorder::default();
        scheduler.start(Animation::new(Duration::ZERO).with_entry(recording_entry()));
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.finals, 1);
        assert!(recorder.ticks.is_empty());
    }

    #[test]
    fn test_start_and_cancel_from_another_thread() {
        let (scheduler, clock) = scheduler();
        let scheduler = Arc::new(scheduler);
        let mut recorder = Recorder::default();
        let id = scheduler.start(Animation::from_millis(1000).with_entry(recording_entry()));

        let remote = Arc::clone(&scheduler);
        std::thread::spawn(move || {
            remote.cancel(id);
            remote.start(Animation::from_millis(1000));
        })
        .join()
        .unwrap();

        clock.advance_ms(10);
        scheduler.tick(&mut recorder);
        assert!(recorder.ticks.is_empty());
        assert_eq!(scheduler.active_count(), 1);
    }
}
