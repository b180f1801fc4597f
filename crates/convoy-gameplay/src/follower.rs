//! Trailing companions that walk the leader's recorded path.
//!
//! Each active follower is given a rank when it joins the convoy. The rank
//! fixes how far behind the leader it walks and how lazily it eases toward
//! its spot, so the convoy stretches out like a queue instead of clumping.

use ahash::AHashMap;
use convoy_common::{smooth_damp, Facing, FollowerId, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::trail::TrailSource;

/// Errors that can occur when managing followers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FollowerError {
    /// Follower not registered
    #[error("Follower not found: {0}")]
    NotFound(FollowerId),
}

/// Result type for follower operations.
pub type FollowerResult<T> = Result<T, FollowerError>;

/// Spacing, smoothing, and presentation parameters for a follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Distance behind the leader for rank 0 (meters)
    pub initial_distance: f32,
    /// Extra distance per rank (meters)
    pub spacing: f32,
    /// Smoothing time for rank 0 (seconds)
    pub base_smooth_time: f32,
    /// Extra smoothing time per rank (seconds)
    pub extra_smooth_per_index: f32,
    /// Upper bound on smoothing time (seconds)
    pub max_smooth_time: f32,
    /// Speed cap (meters per second)
    pub max_speed: f32,
    /// Distance at which the follower stops and holds position
    pub arrive_distance: f32,
    /// Push strength applied between overlapping followers
    pub separation_strength: f32,
    /// Separation radius as a fraction of `spacing`
    pub separation_radius_factor: f32,
    /// Horizontal movement below this does not change facing
    pub flip_deadzone: f32,
    /// Whether the sprite art faces left when unmirrored
    pub art_faces_left: bool,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            initial_distance: 1.2,
            spacing: 1.0,
            base_smooth_time: 0.12,
            extra_smooth_per_index: 0.06,
            max_smooth_time: 0.8,
            max_speed: 8.0,
            arrive_distance: 0.08,
            separation_strength: 0.5,
            separation_radius_factor: 0.6,
            flip_deadzone: 0.05,
            art_faces_left: true,
        }
    }
}

impl FollowerConfig {
    /// Distance behind the leader assigned to `index`.
    #[must_use]
    pub fn target_distance_behind(&self, index: u32) -> f32 {
        self.initial_distance + index as f32 * self.spacing
    }

    /// Smoothing time assigned to `index`.
    #[must_use]
    pub fn smoothing_time(&self, index: u32) -> f32 {
        self.max_smooth_time
            .min(self.base_smooth_time + index as f32 * self.extra_smooth_per_index)
    }

    /// Radius inside which other followers push this one away.
    #[must_use]
    pub fn separation_radius(&self) -> f32 {
        self.spacing * self.separation_radius_factor
    }

    /// Clamps values to usable ranges.
    pub fn validate(&mut self) {
        let non_negative = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.initial_distance = non_negative(self.initial_distance);
        self.spacing = non_negative(self.spacing);
        self.base_smooth_time = non_negative(self.base_smooth_time);
        self.extra_smooth_per_index = non_negative(self.extra_smooth_per_index);
        self.max_smooth_time = non_negative(self.max_smooth_time);
        self.max_speed = non_negative(self.max_speed);
        self.arrive_distance = non_negative(self.arrive_distance);
        self.separation_strength = non_negative(self.separation_strength);
        self.separation_radius_factor = non_negative(self.separation_radius_factor);
        self.flip_deadzone = non_negative(self.flip_deadzone);
    }
}

/// A companion that trails the leader at a fixed arc-length offset.
#[derive(Debug, Clone)]
pub struct TrailFollower {
    id: FollowerId,
    config: FollowerConfig,
    position: Vec2,
    /// Smoothing integrator state
    velocity: Vec2,
    /// Rank in the active set, `None` while inactive
    offset_index: Option<u32>,
    /// Per-follower follow flag
    following: bool,
    /// Speed over the last tick, drives the walk animation
    speed: f32,
    facing: Facing,
}

impl TrailFollower {
    /// Creates an inactive follower at `position`.
    #[must_use]
    pub fn new(id: FollowerId, config: FollowerConfig, position: Vec2) -> Self {
        Self {
            id,
            config,
            position,
            velocity: Vec2::ZERO,
            offset_index: None,
            following: false,
            speed: 0.0,
            facing: Facing::default(),
        }
    }

    /// Returns the follower's ID.
    #[must_use]
    pub fn id(&self) -> FollowerId {
        self.id
    }

    /// Returns the follower's configuration.
    #[must_use]
    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports the follower, discarding motion state.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.speed = 0.0;
    }

    /// Returns the smoothing integrator velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Returns the assigned rank, if active.
    #[must_use]
    pub fn offset_index(&self) -> Option<u32> {
        self.offset_index
    }

    /// Distance behind the leader this follower aims for, if active.
    #[must_use]
    pub fn target_distance_behind(&self) -> Option<f32> {
        self.offset_index
            .map(|index| self.config.target_distance_behind(index))
    }

    /// Smoothing time for the assigned rank, if active.
    #[must_use]
    pub fn smoothing_time(&self) -> Option<f32> {
        self.offset_index.map(|index| self.config.smoothing_time(index))
    }

    /// Returns whether this follower's own follow flag is set.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Sets this follower's own follow flag.
    pub fn set_following(&mut self, following: bool) {
        self.following = following;
    }

    /// Speed over the last tick (meters per second).
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the renderer should mirror the sprite.
    #[must_use]
    pub fn flip_x(&self) -> bool {
        self.facing.needs_flip(self.config.art_faces_left)
    }

    /// Clears motion state and the follow flag. Rank is kept.
    pub fn reset_state(&mut self) {
        self.velocity = Vec2::ZERO;
        self.speed = 0.0;
        self.following = false;
    }

    /// Advances the follower one fixed tick.
    ///
    /// `peers` holds the positions of all active followers at the start of
    /// the tick; the entry for this follower is skipped. Returns `true` if
    /// the follower moved.
    pub fn tick<S: TrailSource + ?Sized>(
        &mut self,
        source: &S,
        peers: &[(FollowerId, Vec2)],
        dt: f32,
    ) -> bool {
        if !self.following {
            return false;
        }
        let Some(mut meters_back) = self.target_distance_behind() else {
            return false;
        };
        if source.sample_count() <= 1 {
            self.speed = 0.0;
            return false;
        }

        meters_back = meters_back.max(0.0);
        if let Some(total) = source.recorded_distance() {
            meters_back = meters_back.min(total.max(0.0));
        }

        let target = source.position_at_distance_behind(meters_back) + self.separation(peers) * 0.5;
        self.move_toward(target, dt)
    }

    fn separation(&self, peers: &[(FollowerId, Vec2)]) -> Vec2 {
        let radius = self.config.separation_radius();
        if radius <= 0.0 {
            return Vec2::ZERO;
        }

        peers
            .iter()
            .filter(|(id, _)| *id != self.id)
            .fold(Vec2::ZERO, |push, &(_, other)| {
                let diff = self.position - other;
                let d = diff.length();
                if d > 0.0 && d < radius {
                    push + diff / d * (self.config.separation_strength * (radius - d) / radius)
                } else {
                    push
                }
            })
    }

    fn move_toward(&mut self, target: Vec2, dt: f32) -> bool {
        let current = self.position;
        if current.distance(target) <= self.config.arrive_distance {
            self.velocity = Vec2::ZERO;
            self.speed = 0.0;
            return false;
        }

        let smooth_time = self.smoothing_time().unwrap_or(self.config.base_smooth_time);
        let next = smooth_damp(
            current,
            target,
            &mut self.velocity,
            smooth_time,
            self.config.max_speed,
            dt,
        );

        let delta = next - current;
        self.speed = if dt > 0.0 { delta.length() / dt } else { 0.0 };
        if let Some(facing) = Facing::from_horizontal_delta(delta.x, self.config.flip_deadzone) {
            self.facing = facing;
        }
        self.position = next;
        delta != Vec2::ZERO
    }
}

/// Registry of followers in a scene plus the ordered active set.
///
/// Replaces process-wide follower lists: a scene owns exactly one set and
/// drops it when the scene ends.
#[derive(Debug, Default)]
pub struct FollowerSet {
    followers: AHashMap<FollowerId, TrailFollower>,
    /// Active followers in activation order
    active: Vec<FollowerId>,
    /// Next rank to hand out, reset when the active set empties
    next_index: u32,
    next_id: u32,
    /// Scene-wide follow switch
    following_enabled: bool,
}

impl FollowerSet {
    /// Creates an empty set with following switched off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inactive follower and returns its ID.
    pub fn spawn(&mut self, config: FollowerConfig, position: Vec2) -> FollowerId {
        let mut config = config;
        config.validate();

        let id = FollowerId::from_raw(self.next_id);
        self.next_id += 1;
        self.followers
            .insert(id, TrailFollower::new(id, config, position));
        id
    }

    /// Removes a follower from the scene entirely.
    pub fn despawn(&mut self, id: FollowerId) -> Option<TrailFollower> {
        self.deactivate(id);
        self.followers.remove(&id)
    }

    /// Returns the number of registered followers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.followers.len()
    }

    /// Returns whether no followers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.followers.is_empty()
    }

    /// Gets a follower.
    #[must_use]
    pub fn get(&self, id: FollowerId) -> Option<&TrailFollower> {
        self.followers.get(&id)
    }

    /// Gets a follower mutably.
    pub fn get_mut(&mut self, id: FollowerId) -> Option<&mut TrailFollower> {
        self.followers.get_mut(&id)
    }

    /// Adds a follower to the active set and returns its rank.
    ///
    /// Activating an already active follower returns its existing rank.
    /// A newly activated follower inherits the scene-wide follow switch.
    pub fn activate(&mut self, id: FollowerId) -> FollowerResult<u32> {
        let follower = self
            .followers
            .get_mut(&id)
            .ok_or(FollowerError::NotFound(id))?;

        if let Some(index) = follower.offset_index {
            return Ok(index);
        }

        let index = self.next_index;
        self.next_index += 1;
        follower.offset_index = Some(index);
        follower.following = self.following_enabled;
        self.active.push(id);

        debug!(%id, index, "Follower activated");
        Ok(index)
    }

    /// Removes a follower from the active set.
    ///
    /// Other followers keep their ranks. Returns `false` if the follower was
    /// not active.
    pub fn deactivate(&mut self, id: FollowerId) -> bool {
        let Some(pos) = self.active.iter().position(|&a| a == id) else {
            return false;
        };
        self.active.remove(pos);

        if let Some(follower) = self.followers.get_mut(&id) {
            follower.offset_index = None;
            follower.velocity = Vec2::ZERO;
            follower.speed = 0.0;
        }
        if self.active.is_empty() {
            self.next_index = 0;
        }

        debug!(%id, remaining = self.active.len(), "Follower deactivated");
        true
    }

    /// Returns whether a follower is in the active set.
    #[must_use]
    pub fn is_active(&self, id: FollowerId) -> bool {
        self.active.contains(&id)
    }

    /// Active follower IDs in activation order.
    #[must_use]
    pub fn active_ids(&self) -> &[FollowerId] {
        &self.active
    }

    /// Iterates active followers in activation order.
    pub fn iter_active(&self) -> impl Iterator<Item = &TrailFollower> + '_ {
        self.active.iter().filter_map(|id| self.followers.get(id))
    }

    /// Returns the scene-wide follow switch.
    #[must_use]
    pub fn is_following_enabled(&self) -> bool {
        self.following_enabled
    }

    /// Flips the scene-wide follow switch and every active follower's own flag.
    pub fn set_following_enabled(&mut self, enabled: bool) {
        self.following_enabled = enabled;
        for id in &self.active {
            if let Some(follower) = self.followers.get_mut(id) {
                follower.following = enabled;
            }
        }
        debug!(enabled, "Follow switch changed");
    }

    /// Nearest active follower to `point` and its distance.
    #[must_use]
    pub fn nearest_active(&self, point: Vec2) -> Option<(FollowerId, f32)> {
        self.iter_active()
            .map(|f| (f.id, f.position.distance(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Whether any following follower stands within `radius` of `point`.
    #[must_use]
    pub fn any_following_within(&self, point: Vec2, radius: f32) -> bool {
        let radius_sq = radius * radius;
        self.iter_active()
            .any(|f| f.following && f.position.distance_squared(point) <= radius_sq)
    }

    /// Switches following off and clears every follower's motion state.
    pub fn reset_all(&mut self) {
        self.following_enabled = false;
        for follower in self.followers.values_mut() {
            follower.reset_state();
        }
    }

    /// Ticks every active follower against `source`.
    ///
    /// Does nothing while the follow switch is off or no source is bound.
    /// All followers see peer positions from the start of this pass.
    pub fn tick<S: TrailSource + ?Sized>(&mut self, source: Option<&S>, dt: f32) {
        if !self.following_enabled {
            return;
        }
        let Some(source) = source else {
            return;
        };

        let peers: Vec<(FollowerId, Vec2)> = self
            .iter_active()
            .map(|f| (f.id, f.position))
            .collect();

        for id in &self.active {
            if let Some(follower) = self.followers.get_mut(id) {
                follower.tick(source, &peers, dt);
            }
        }
    }
}
