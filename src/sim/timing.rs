//! Frame timing: host timestamps in, bounded simulation steps out
//!
//! The host calls once per display refresh with its own clock (milliseconds,
//! e.g. the `requestAnimationFrame` timestamp). A backgrounded tab or a long
//! GC pause can produce a gap of several seconds; simulating that in one step
//! would let hazards jump straight over the player, so every step is capped.

use serde::{Deserialize, Serialize};

use crate::clamp_lenient;
use crate::consts::MAX_FRAME_DT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingController {
    /// Largest step handed to the simulation (seconds)
    pub max_dt: f32,
    /// Last host timestamp seen (ms)
    last_timestamp: Option<f64>,
    /// Simulated seconds since the last spawn event
    spawn_accumulator: f32,
    /// Total simulated seconds since reset
    elapsed: f64,
}

impl Default for TimingController {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl TimingController {
    /// `max_dt` must be finite and non-negative; anything else falls back to
    /// [`MAX_FRAME_DT`].
    pub fn new(max_dt: f32) -> Self {
        let max_dt = if max_dt.is_finite() && max_dt >= 0.0 {
            max_dt
        } else {
            log::warn!("max_dt {} invalid, using {}", max_dt, MAX_FRAME_DT);
            MAX_FRAME_DT
        };
        Self {
            max_dt,
            last_timestamp: None,
            spawn_accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Consume a host timestamp and return the step to simulate (seconds).
    ///
    /// The first timestamp after a reset yields 0. Timestamps that go
    /// backwards yield 0 as well.
    pub fn advance(&mut self, timestamp_ms: f64) -> f32 {
        let raw_ms = match self.last_timestamp {
            Some(last) => timestamp_ms - last,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        // `max_dt` is public, so tolerate a bad value set after construction
        let dt = clamp_lenient((raw_ms / 1000.0) as f32, 0.0, self.max_dt).max(0.0);
        if raw_ms > 0.0 && dt < (raw_ms / 1000.0) as f32 {
            log::trace!("Frame gap {:.1}ms clamped to {:.1}ms", raw_ms, dt * 1000.0);
        }

        self.spawn_accumulator += dt;
        self.elapsed += dt as f64;
        dt
    }

    /// Record a timestamp without producing simulated time (paused frames)
    pub fn observe(&mut self, timestamp_ms: f64) {
        self.last_timestamp = Some(timestamp_ms);
    }

    /// True (and the accumulator restarts) once more than `interval`
    /// simulated seconds have built up since the last spawn.
    pub fn spawn_due(&mut self, interval: f32) -> bool {
        if self.spawn_accumulator > interval {
            self.spawn_accumulator = 0.0;
            true
        } else {
            false
        }
    }

    /// Add simulated time directly (for hosts that drive `dt` themselves)
    pub fn accumulate(&mut self, dt: f32) {
        self.spawn_accumulator += dt;
        self.elapsed += dt as f64;
    }

    pub fn spawn_accumulator(&self) -> f32 {
        self.spawn_accumulator
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.spawn_accumulator = 0.0;
        self.elapsed = 0.0;
    }
}
