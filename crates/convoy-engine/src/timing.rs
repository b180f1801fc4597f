//! Fixed timestep accumulator.
//!
//! Converts variable frame deltas into a whole number of fixed physics
//! ticks. The recorder and followers only ever see the fixed delta.

/// Default physics rate (Hz).
pub const DEFAULT_TICK_RATE: u32 = 50;

/// Fixed timestep manager.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Fixed timestep delta (seconds)
    fixed_dt: f32,
    /// Unconsumed frame time
    accumulator: f32,
    /// Maximum frame delta accepted, prevents spiral of death
    max_dt: f32,
    /// Maximum ticks run for a single frame
    max_updates: u32,
    /// Fixed ticks handed out so far
    ticks: u64,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl FixedTimestep {
    /// Create a timestep running at `tick_rate` Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            fixed_dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            max_dt: 0.25, // Max 250ms delta
            max_updates: 10,
            ticks: 0,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Number of fixed ticks handed out since creation or reset.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time covered by the ticks handed out so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * f64::from(self.fixed_dt)
    }

    /// Accumulate a frame delta.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }

        self.accumulator += frame_dt.min(self.max_dt);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < self.max_updates {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // If we're still behind, drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.ticks += u64::from(count);
        count
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }

    /// Reset timing (call after pause or loading).
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_timestep_creation() {
        let timing = FixedTimestep::new(50);
        assert!((timing.fixed_dt() - 0.02).abs() < 1e-6);
        assert_eq!(timing.ticks(), 0);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let timing = FixedTimestep::new(0);
        assert!((timing.fixed_dt() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_accumulate_counts_ticks() {
        let mut timing = FixedTimestep::new(50);

        // 45ms frame covers two 20ms ticks with 5ms left over
        assert_eq!(timing.accumulate(0.045), 2);
        assert!((timing.alpha() - 0.25).abs() < 1e-3);
        assert_eq!(timing.accumulate(0.02), 1);
        assert_eq!(timing.ticks(), 3);
    }

    #[test]
    fn test_accumulate_spiral_prevention() {
        let mut timing = FixedTimestep::new(60);

        // Simulate huge lag spike
        let updates = timing.accumulate(1.0);

        // Should be capped to prevent spiral of death
        assert!(updates <= 10);
        assert!(timing.alpha() <= 1.0);
    }

    #[test]
    fn test_accumulate_ignores_bad_deltas() {
        let mut timing = FixedTimestep::new(50);
        assert_eq!(timing.accumulate(-1.0), 0);
        assert_eq!(timing.accumulate(f32::NAN), 0);
        assert_eq!(timing.ticks(), 0);
    }

    #[test]
    fn test_sixty_fps_frames_feed_fifty_hz() {
        let mut timing = FixedTimestep::new(50);
        let total: u32 = (0..600).map(|_| timing.accumulate(1.0 / 60.0)).sum();

        // 10 simulated seconds
        assert!((499..=500).contains(&total));
        assert!((timing.elapsed() - 10.0).abs() < 0.05);
    }

    #[test]
    fn test_reset_timing() {
        let mut timing = FixedTimestep::new(50);
        timing.accumulate(0.05);

        timing.reset();

        assert_eq!(timing.ticks(), 0);
        assert_eq!(timing.alpha(), 0.0);
    }
}
