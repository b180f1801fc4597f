//! Per-scene convoy state: the leader's recorder, the follower set, story
//! flags, and the follow/stay interaction.
//!
//! A [`SceneContext`] is created when a scene starts and dropped when it
//! ends. The host calls [`SceneContext::fixed_update`] once per physics tick
//! with the leader's position; the recorder is sampled before any follower
//! reads it.

use convoy_common::{FollowerId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{ConvoyEvent, EventBus};
use crate::flags::GameFlags;
use crate::follower::{FollowerConfig, FollowerResult, FollowerSet};
use crate::path_recorder::{PathRecorder, RecorderConfig};

/// Flag raised when the leader reaches the exit with a companion.
pub const FLAG_DELIVERED: &str = "day1_delivered_folks";

/// Follow/stay and exit zone parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// How close a follower must be for the leader to call it
    pub interact_radius: f32,
    /// How close a following companion must be when the leader exits
    pub companion_radius: f32,
    /// Start recording the leader's path when following starts
    pub toggle_recorder_on_follow: bool,
    /// Flag set on a successful exit
    pub exit_flag: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            interact_radius: 1.4,
            companion_radius: 1.6,
            toggle_recorder_on_follow: true,
            exit_flag: FLAG_DELIVERED.to_owned(),
        }
    }
}

impl InteractionConfig {
    /// Clamps values to usable ranges.
    pub fn validate(&mut self) {
        let non_negative = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.interact_radius = non_negative(self.interact_radius);
        self.companion_radius = non_negative(self.companion_radius);
    }
}

/// What an interact press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    /// Followers started following
    Follow,
    /// Followers were told to stay
    Stay,
    /// Not following and no follower in reach
    NothingInRange,
}

/// Convoy state for one scene.
#[derive(Debug)]
pub struct SceneContext {
    recorder: Option<PathRecorder>,
    followers: FollowerSet,
    flags: GameFlags,
    events: EventBus,
    interaction: InteractionConfig,
    ticks: u64,
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl SceneContext {
    /// Creates a scene with no bound leader.
    #[must_use]
    pub fn new(interaction: InteractionConfig) -> Self {
        let mut interaction = interaction;
        interaction.validate();
        Self {
            recorder: None,
            followers: FollowerSet::new(),
            flags: GameFlags::with_defaults(),
            events: EventBus::default(),
            interaction,
            ticks: 0,
        }
    }

    /// Binds a leader, starting a fresh recorder at its position.
    pub fn bind_leader(&mut self, config: &RecorderConfig, position: Vec2) {
        self.recorder = Some(PathRecorder::new(config, position));
        debug!(x = position.x, y = position.y, "Leader bound");
    }

    /// Unbinds the leader. Followers hold position until a leader is bound again.
    pub fn unbind_leader(&mut self) -> Option<PathRecorder> {
        self.recorder.take()
    }

    /// Returns the leader's recorder, if bound.
    #[must_use]
    pub fn recorder(&self) -> Option<&PathRecorder> {
        self.recorder.as_ref()
    }

    /// Returns the leader's recorder mutably, if bound.
    pub fn recorder_mut(&mut self) -> Option<&mut PathRecorder> {
        self.recorder.as_mut()
    }

    /// Returns the follower set.
    #[must_use]
    pub fn followers(&self) -> &FollowerSet {
        &self.followers
    }

    /// Returns the follower set mutably.
    pub fn followers_mut(&mut self) -> &mut FollowerSet {
        &mut self.followers
    }

    /// Returns the story flags.
    #[must_use]
    pub fn flags(&self) -> &GameFlags {
        &self.flags
    }

    /// Returns the story flags mutably.
    pub fn flags_mut(&mut self) -> &mut GameFlags {
        &mut self.flags
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the interaction settings.
    #[must_use]
    pub fn interaction(&self) -> &InteractionConfig {
        &self.interaction
    }

    /// Number of fixed ticks run since the scene started or was reset.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Registers an inactive follower.
    pub fn spawn_follower(&mut self, config: FollowerConfig, position: Vec2) -> FollowerId {
        self.followers.spawn(config, position)
    }

    /// Activates a follower and announces its rank.
    pub fn activate_follower(&mut self, id: FollowerId) -> FollowerResult<u32> {
        let was_active = self.followers.is_active(id);
        let index = self.followers.activate(id)?;
        if !was_active {
            self.events
                .publish(ConvoyEvent::FollowerActivated { follower: id, index });
        }
        Ok(index)
    }

    /// Deactivates a follower. Returns `false` if it was not active.
    pub fn deactivate_follower(&mut self, id: FollowerId) -> bool {
        let removed = self.followers.deactivate(id);
        if removed {
            self.events
                .publish(ConvoyEvent::FollowerDeactivated { follower: id });
        }
        removed
    }

    /// Switches following on or off for the whole scene.
    pub fn set_following(&mut self, enabled: bool) {
        self.followers.set_following_enabled(enabled);
        self.events.publish(ConvoyEvent::FollowToggled { enabled });
    }

    /// Runs one fixed tick: sample the leader, then move every follower.
    ///
    /// `leader` is `None` when the leader is absent this tick; followers
    /// still tick against the existing trail.
    pub fn fixed_update(&mut self, leader: Option<Vec2>, dt: f32) {
        if let (Some(recorder), Some(position)) = (self.recorder.as_mut(), leader) {
            recorder.sample(position, dt);
        }
        self.followers.tick(self.recorder.as_ref(), dt);
        self.ticks += 1;
    }

    /// Handles the leader pressing interact at `leader`.
    ///
    /// While following, any press tells everyone to stay. Otherwise the
    /// press starts following only if a follower is within reach.
    pub fn interact(&mut self, leader: Vec2) -> InteractOutcome {
        if self.followers.is_following_enabled() {
            self.set_following(false);
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.set_recording(false);
            }
            return InteractOutcome::Stay;
        }

        let in_reach = self
            .followers
            .nearest_active(leader)
            .is_some_and(|(_, d)| d <= self.interaction.interact_radius);
        if !in_reach {
            return InteractOutcome::NothingInRange;
        }

        self.set_following(true);
        if self.interaction.toggle_recorder_on_follow {
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.set_recording(true);
            }
        }
        InteractOutcome::Follow
    }

    /// Handles the leader entering an exit zone at `leader`.
    ///
    /// Succeeds if a following companion is within `companion_radius`, in
    /// which case the exit flag is raised.
    pub fn reach_exit(&mut self, leader: Vec2) -> bool {
        let with_companion = self
            .followers
            .any_following_within(leader, self.interaction.companion_radius);
        if with_companion {
            self.flags.set(&self.interaction.exit_flag, true);
            info!("Exit reached with companion");
        } else {
            info!("Exit reached without a companion in range");
        }
        self.events
            .publish(ConvoyEvent::ExitReached { with_companion });
        with_companion
    }

    /// Resets transient state on scene reload.
    ///
    /// Flags return to their defaults, following is switched off, every
    /// follower loses its motion state, and the recorder restarts at `leader`.
    pub fn reset(&mut self, leader: Option<Vec2>) {
        self.flags.clear();
        self.flags.apply_defaults();

        self.followers.reset_all();

        if let (Some(recorder), Some(position)) = (self.recorder.as_mut(), leader) {
            recorder.reset(position);
        }
        self.ticks = 0;

        self.events.publish(ConvoyEvent::SceneReset);
        info!(followers = self.followers.len(), "Scene state reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FLAG_CAN_ENEMY_SHOOT;

    const DT: f32 = 0.02;

    fn scene_with_leader() -> SceneContext {
        let mut scene = SceneContext::default();
        scene.bind_leader(&RecorderConfig::default(), Vec2::ZERO);
        scene
    }

    #[test]
    fn test_fixed_update_samples_before_followers() {
        let mut scene = scene_with_leader();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::ZERO);
        scene.activate_follower(id).expect("spawned");
        scene.set_following(true);

        // First committed sample gives 2 samples, so followers act in the same tick.
        scene.fixed_update(Some(Vec2::new(3.0, 0.0)), DT);

        let follower = scene.followers().get(id).expect("spawned");
        assert!(follower.position().x > 0.0);
        assert_eq!(scene.ticks(), 1);
    }

    #[test]
    fn test_followers_hold_without_leader() {
        let mut scene = SceneContext::default();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::new(1.0, 1.0));
        scene.activate_follower(id).expect("spawned");
        scene.set_following(true);

        for _ in 0..10 {
            scene.fixed_update(Some(Vec2::new(9.0, 0.0)), DT);
        }
        assert_eq!(
            scene.followers().get(id).map(|f| f.position()),
            Some(Vec2::new(1.0, 1.0))
        );
    }

    #[test]
    fn test_interact_requires_follower_in_reach() {
        let mut scene = scene_with_leader();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::new(5.0, 0.0));
        scene.activate_follower(id).expect("spawned");

        assert_eq!(scene.interact(Vec2::ZERO), InteractOutcome::NothingInRange);
        assert!(!scene.followers().is_following_enabled());

        assert_eq!(scene.interact(Vec2::new(4.0, 0.0)), InteractOutcome::Follow);
        assert!(scene.followers().is_following_enabled());
        assert!(scene.recorder().is_some_and(PathRecorder::is_recording));
    }

    #[test]
    fn test_interact_stay_from_anywhere() {
        let mut scene = scene_with_leader();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::new(1.0, 0.0));
        scene.activate_follower(id).expect("spawned");

        assert_eq!(scene.interact(Vec2::ZERO), InteractOutcome::Follow);
        assert_eq!(scene.interact(Vec2::new(50.0, 0.0)), InteractOutcome::Stay);
        assert!(!scene.followers().is_following_enabled());
        assert!(!scene.recorder().is_some_and(PathRecorder::is_recording));
    }

    #[test]
    fn test_interact_respects_recorder_toggle_setting() {
        let mut scene = SceneContext::new(InteractionConfig {
            toggle_recorder_on_follow: false,
            ..Default::default()
        });
        scene.bind_leader(
            &RecorderConfig {
                start_recording: false,
                ..Default::default()
            },
            Vec2::ZERO,
        );
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::new(1.0, 0.0));
        scene.activate_follower(id).expect("spawned");

        assert_eq!(scene.interact(Vec2::ZERO), InteractOutcome::Follow);
        assert!(!scene.recorder().is_some_and(PathRecorder::is_recording));
    }

    #[test]
    fn test_exit_needs_following_companion() {
        let mut scene = scene_with_leader();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::new(1.0, 0.0));
        scene.activate_follower(id).expect("spawned");

        assert!(!scene.reach_exit(Vec2::ZERO));
        assert!(!scene.flags().get(FLAG_DELIVERED));

        scene.set_following(true);
        assert!(scene.reach_exit(Vec2::ZERO));
        assert!(scene.flags().get(FLAG_DELIVERED));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut scene = scene_with_leader();
        let id = scene.spawn_follower(FollowerConfig::default(), Vec2::ZERO);
        scene.activate_follower(id).expect("spawned");
        scene.set_following(true);
        scene.flags_mut().set(FLAG_CAN_ENEMY_SHOOT, false);
        scene.flags_mut().set("door_open", true);

        for k in 1..50 {
            scene.fixed_update(Some(Vec2::new(k as f32 * 0.1, 0.0)), DT);
        }

        let spawn = Vec2::new(-3.0, 2.0);
        scene.reset(Some(spawn));

        assert!(scene.flags().get(FLAG_CAN_ENEMY_SHOOT));
        assert!(!scene.flags().get("door_open"));
        assert!(!scene.followers().is_following_enabled());
        assert_eq!(scene.recorder().map(PathRecorder::len), Some(1));
        assert_eq!(scene.recorder().map(PathRecorder::newest), Some(spawn));
        assert_eq!(scene.ticks(), 0);

        let follower = scene.followers().get(id).expect("spawned");
        assert_eq!(follower.velocity(), Vec2::ZERO);
        assert!(!follower.is_following());
    }

    #[test]
    fn test_events_published() {
        let mut scene = scene_with_leader();
        let a = scene.spawn_follower(FollowerConfig::default(), Vec2::ZERO);
        scene.activate_follower(a).expect("spawned");
        scene.activate_follower(a).expect("spawned");
        scene.set_following(true);
        scene.deactivate_follower(a);

        assert_eq!(
            scene.events().drain(),
            vec![
                ConvoyEvent::FollowerActivated {
                    follower: a,
                    index: 0
                },
                ConvoyEvent::FollowToggled { enabled: true },
                ConvoyEvent::FollowerDeactivated { follower: a },
            ]
        );
    }
}
