//! Arc-length path recorder for the leader entity.
//!
//! The recorder keeps a ring buffer of recently visited positions together
//! with, for every slot, the length of the recorded path from that slot
//! forward to the newest sample. Followers use it to ask for "the point
//! `d` meters behind the leader" without caring how fast the leader moved.
//!
//! Samples are committed at most once per fixed tick and only when the
//! leader moved at least `min_sample_spacing` since the last commit, so the
//! buffer resolution is decoupled from the tick rate and a standing leader
//! does not flood the history.

use convoy_common::{lerp_clamped, ConfigError, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::trail::TrailSource;

/// Smallest ring buffer accepted by the recorder.
pub const MIN_CAPACITY: usize = 16;

/// Default ring buffer size, large enough for long companion trails.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Default minimum movement before a new sample is committed.
pub const DEFAULT_MIN_SAMPLE_SPACING: f32 = 0.02;

/// Path recorder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Number of ring buffer slots
    pub capacity: usize,
    /// Minimum distance the leader must move before a sample is committed
    pub min_sample_spacing: f32,
    /// Whether the recorder starts out recording
    pub start_recording: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            min_sample_spacing: DEFAULT_MIN_SAMPLE_SPACING,
            start_recording: true,
        }
    }
}

impl RecorderConfig {
    /// Checks the configuration without modifying it.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.capacity < MIN_CAPACITY {
            return Err(ConfigError::CapacityTooSmall {
                requested: self.capacity,
                minimum: MIN_CAPACITY,
            });
        }
        if !self.min_sample_spacing.is_finite() || self.min_sample_spacing < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "min_sample_spacing",
                value: self.min_sample_spacing,
            });
        }
        Ok(())
    }

    /// Clamps values to usable ranges.
    pub fn validate(&mut self) {
        if self.capacity < MIN_CAPACITY {
            warn!(
                "Recorder capacity {} below minimum, using {MIN_CAPACITY}",
                self.capacity
            );
            self.capacity = MIN_CAPACITY;
        }
        if !self.min_sample_spacing.is_finite() || self.min_sample_spacing < 0.0 {
            warn!(
                "Invalid min_sample_spacing {}, using {DEFAULT_MIN_SAMPLE_SPACING}",
                self.min_sample_spacing
            );
            self.min_sample_spacing = DEFAULT_MIN_SAMPLE_SPACING;
        }
    }
}

/// Ring buffer of leader positions indexed by distance behind the newest sample.
#[derive(Debug, Clone)]
pub struct PathRecorder {
    /// Recorded positions
    positions: Vec<Vec2>,
    /// Path length from each slot forward to the newest sample
    distance_to_newest: Vec<f32>,
    /// Next slot to write
    write_index: usize,
    /// Number of valid slots, saturating at capacity
    filled: usize,
    /// Last position actually written
    last_committed: Vec2,
    /// Minimum movement before committing a sample
    min_sample_spacing: f32,
    /// Whether `sample` commits anything
    recording: bool,
}

impl PathRecorder {
    /// Creates a recorder seeded with `origin`.
    ///
    /// Out-of-range configuration values are clamped (with a warning) rather
    /// than rejected. Use [`PathRecorder::try_new`] to reject them instead.
    #[must_use]
    pub fn new(config: &RecorderConfig, origin: Vec2) -> Self {
        let mut config = config.clone();
        config.validate();
        Self::build(&config, origin)
    }

    /// Creates a recorder, rejecting invalid configuration.
    pub fn try_new(config: &RecorderConfig, origin: Vec2) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self::build(config, origin))
    }

    fn build(config: &RecorderConfig, origin: Vec2) -> Self {
        let mut recorder = Self {
            positions: vec![origin; config.capacity],
            distance_to_newest: vec![0.0; config.capacity],
            write_index: 0,
            filled: 1,
            last_committed: origin,
            min_sample_spacing: config.min_sample_spacing,
            recording: config.start_recording,
        };
        recorder.reset(origin);
        recorder
    }

    /// Offers the leader's current position for this tick.
    ///
    /// Returns `true` if a new sample was committed. Sampling is driven by
    /// distance moved, so `_dt` does not affect the result.
    pub fn sample(&mut self, position: Vec2, _dt: f32) -> bool {
        if !self.recording {
            return false;
        }

        let moved = position.distance(self.last_committed);
        if moved.is_nan() || moved < self.min_sample_spacing || moved <= 0.0 {
            return false;
        }

        let capacity = self.capacity();
        // Only the filled slots carry history; the rest must stay untouched.
        for i in 0..self.filled {
            let idx = (self.write_index + capacity - 1 - i) % capacity;
            self.distance_to_newest[idx] += moved;
        }

        self.positions[self.write_index] = position;
        self.distance_to_newest[self.write_index] = 0.0;

        self.write_index = (self.write_index + 1) % capacity;
        if self.filled < capacity {
            self.filled += 1;
        }
        self.last_committed = position;

        trace!(
            x = position.x,
            y = position.y,
            moved,
            filled = self.filled,
            "Committed path sample"
        );
        true
    }

    /// Returns the point `meters_back` along the recorded path behind the newest sample.
    ///
    /// Offsets at or beyond [`PathRecorder::total_recorded_distance`] clamp to
    /// the oldest retained sample, which after eviction is no longer the
    /// leader's very first position.
    #[must_use]
    pub fn query_at_distance_behind(&self, meters_back: f32) -> Vec2 {
        let newest = self.newest_slot();
        if meters_back.is_nan() || meters_back <= 0.0 || self.filled <= 1 {
            return self.positions[newest];
        }

        if meters_back >= self.total_recorded_distance() {
            return self.positions[self.oldest_slot()];
        }

        for step in 1..self.filled {
            let b = self.slot_back(step);
            let dist_b = self.distance_to_newest[b];
            if dist_b < meters_back {
                continue;
            }

            let a = self.slot_back(step - 1);
            let dist_a = self.distance_to_newest[a];
            let span = dist_b - dist_a;
            if span <= f32::EPSILON {
                return self.positions[b];
            }

            let t = (meters_back - dist_a) / span;
            return lerp_clamped(self.positions[a], self.positions[b], t);
        }

        self.positions[self.oldest_slot()]
    }

    /// Path length from the oldest retained sample to the newest, 0 with a single sample.
    #[must_use]
    pub fn total_recorded_distance(&self) -> f32 {
        if self.filled <= 1 {
            return 0.0;
        }
        self.distance_to_newest[self.oldest_slot()]
    }

    /// Clears the history and refills every slot with `position`.
    pub fn reset(&mut self, position: Vec2) {
        self.positions.fill(position);
        self.distance_to_newest.fill(0.0);
        self.write_index = 0;
        self.filled = 1;
        self.last_committed = position;
        debug!(x = position.x, y = position.y, "Path recorder reset");
    }

    /// Returns the ring buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of valid samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Always false: a recorder holds at least its seed sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Returns the slot the next sample will be written to.
    #[must_use]
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Returns the minimum sample spacing.
    #[must_use]
    pub fn min_sample_spacing(&self) -> f32 {
        self.min_sample_spacing
    }

    /// Returns the last committed position.
    #[must_use]
    pub fn last_committed(&self) -> Vec2 {
        self.last_committed
    }

    /// Returns the newest sample.
    #[must_use]
    pub fn newest(&self) -> Vec2 {
        self.positions[self.newest_slot()]
    }

    /// Returns the oldest retained sample.
    #[must_use]
    pub fn oldest(&self) -> Vec2 {
        self.positions[self.oldest_slot()]
    }

    /// Returns whether samples are being committed.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Turns sample commits on or off. History is kept either way.
    pub fn set_recording(&mut self, recording: bool) {
        if self.recording != recording {
            debug!(recording, "Path recording toggled");
        }
        self.recording = recording;
    }

    /// Iterates `(position, distance_to_newest)` from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        (0..self.filled).map(move |step| {
            let idx = self.slot_back(step);
            (self.positions[idx], self.distance_to_newest[idx])
        })
    }

    fn slot_back(&self, step: usize) -> usize {
        let capacity = self.capacity();
        (self.write_index + capacity - 1 - step) % capacity
    }

    fn newest_slot(&self) -> usize {
        self.slot_back(0)
    }

    fn oldest_slot(&self) -> usize {
        self.slot_back(self.filled - 1)
    }
}

impl TrailSource for PathRecorder {
    fn sample_count(&self) -> usize {
        self.len()
    }

    fn position_at_distance_behind(&self, meters_back: f32) -> Vec2 {
        self.query_at_distance_behind(meters_back)
    }

    fn recorded_distance(&self) -> Option<f32> {
        Some(self.total_recorded_distance())
    }
}
