//! Release velocity estimation from recent pointer samples.

use crate::core::geo::Point;
use crate::input::events::PointerId;
use crate::prelude::HashMap;
use instant::Instant;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Instant,
    position: Point,
}

/// Sliding window of timestamped positions per pointer
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    window: Duration,
    max_samples: usize,
    samples: HashMap<PointerId, VecDeque<Sample>>,
}

impl VelocityTracker {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            window,
            max_samples: max_samples.max(2),
            samples: HashMap::default(),
        }
    }

    pub fn add(&mut self, pointer: PointerId, position: Point, time: Instant) {
        let samples = self.samples.entry(pointer).or_default();
        if let Some(last) = samples.back_mut() {
            if time <= last.time {
                last.position = position;
                return;
            }
        }
        samples.push_back(Sample { time, position });
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
        while let Some(first) = samples.front() {
            if time.saturating_duration_since(first.time) > self.window {
                samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Velocity in pixels per second at `now`.
    ///
    /// Zero when fewer than two samples fall inside the window or the pointer
    /// has rested longer than the window before `now`.
    pub fn velocity(&self, pointer: PointerId, now: Instant) -> Point {
        let Some(samples) = self.samples.get(&pointer) else {
            return Point::ZERO;
        };
        let Some(newest) = samples.back() else {
            return Point::ZERO;
        };
        if now.saturating_duration_since(newest.time) > self.window {
            return Point::ZERO;
        }
        let Some(oldest) = samples
            .iter()
            .find(|sample| newest.time.saturating_duration_since(sample.time) <= self.window)
        else {
            return Point::ZERO;
        };
        let seconds = newest.time.saturating_duration_since(oldest.time).as_secs_f64();
        if seconds <= 0.0 {
            return Point::ZERO;
        }
        (newest.position - oldest.position) / seconds
    }

    pub fn remove(&mut self, pointer: PointerId) {
        self.samples.remove(&pointer);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn sample_count(&self, pointer: PointerId) -> usize {
        self.samples.get(&pointer).map_or(0, VecDeque::len)
    }
}
