//! Time management utilities

use std::time::Instant;

/// Default upper bound for a single frame's delta time, in seconds
pub const DEFAULT_MAX_DELTA_TIME: f32 = 0.1;

/// Frame clock driving the engine loop
///
/// Measures wall-clock time between ticks and clamps it into
/// `[0, max_delta_time]` so a stall (debugger break, window drag, slow disk)
/// never feeds a huge step into simulation code.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
    max_delta_time: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA_TIME)
    }
}

impl FrameClock {
    /// Create a new clock with the given delta clamp
    pub fn new(max_delta_time: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            max_delta_time: max_delta_time.max(0.0),
        }
    }

    /// Restart timing from now, zeroing delta, total time and frame count
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// Restart timing from the given instant
    pub fn reset_at(&mut self, now: Instant) {
        self.last_frame = now;
        self.delta_time = 0.0;
        self.total_time = 0.0;
        self.frame_count = 0;
    }

    /// Advance the clock to the current instant and return the clamped delta
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advance the clock to `now` and return the clamped delta
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed.as_secs_f32())
    }

    /// Advance the clock by a caller-provided delta, clamped like a measured one
    ///
    /// Does not touch the wall-clock reference point.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.delta_time = self.clamp_delta(raw_delta);
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }

    /// Clamp a raw delta into `[0, max_delta_time]`
    pub fn clamp_delta(&self, raw_delta: f32) -> f32 {
        if raw_delta.is_nan() {
            return 0.0;
        }
        raw_delta.clamp(0.0, self.max_delta_time)
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total clamped time accumulated since the last reset
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the number of ticks since the last reset
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Upper bound applied to every delta
    pub fn max_delta_time(&self) -> f32 {
        self.max_delta_time
    }

    /// Change the delta clamp
    pub fn set_max_delta_time(&mut self, max_delta_time: f32) {
        self.max_delta_time = max_delta_time.max(0.0);
    }
}
