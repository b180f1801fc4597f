//! Headless scenario runner.
//!
//! Walks a scripted leader along a [`LeaderPath`], feeds render-rate frames
//! through the fixed timestep, and measures how far behind the leader each
//! follower settles.

use convoy_common::{FollowerId, Vec2};
use convoy_gameplay::SceneContext;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{LeaderPath, SimConfig};
use crate::timing::FixedTimestep;

impl LeaderPath {
    /// Leader position after walking `distance` meters from the origin.
    #[must_use]
    pub fn position_at(&self, distance: f32) -> Vec2 {
        match *self {
            Self::Straight => Vec2::new(distance, 0.0),
            Self::Zigzag { leg_length } => {
                let leg = (distance / leg_length).floor();
                let along = distance - leg * leg_length;
                let diagonal = std::f32::consts::FRAC_1_SQRT_2;
                // Odd legs head down-right, even legs up-right
                let rise = if leg as i64 % 2 == 0 { along } else { leg_length - along };
                Vec2::new(distance * diagonal, rise * diagonal)
            },
            Self::Circle { radius } => {
                let angle = distance / radius;
                Vec2::new(radius * angle.sin(), radius * (1.0 - angle.cos()))
            },
        }
    }
}

/// Trailing-gap statistics for one follower.
#[derive(Debug, Clone, Serialize)]
pub struct FollowerReport {
    /// Follower ID
    pub follower: FollowerId,
    /// Assigned rank
    pub index: u32,
    /// Distance behind the leader the follower aims for
    pub target_distance: f32,
    /// Smallest leader gap in the steady-state window
    pub min_gap: f32,
    /// Largest leader gap in the steady-state window
    pub max_gap: f32,
    /// Mean leader gap in the steady-state window
    pub mean_gap: f32,
    /// Final position
    pub final_position: [f32; 2],
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Fixed ticks simulated
    pub ticks: u64,
    /// Render frames fed into the timestep
    pub frames: u64,
    /// Samples held by the recorder at the end
    pub recorded_samples: usize,
    /// Trail length held by the recorder at the end
    pub recorded_distance: f32,
    /// Final leader position
    pub leader_position: [f32; 2],
    /// Whether the exit check at the end found a companion in range
    pub exit_with_companion: bool,
    /// Per-follower statistics, by rank
    pub followers: Vec<FollowerReport>,
}

#[derive(Debug, Default)]
struct GapStats {
    min: f32,
    max: f32,
    sum: f64,
    count: u32,
}

impl GapStats {
    fn push(&mut self, gap: f32) {
        if self.count == 0 {
            self.min = gap;
            self.max = gap;
        } else {
            self.min = self.min.min(gap);
            self.max = self.max.max(gap);
        }
        self.sum += f64::from(gap);
        self.count += 1;
    }

    fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / f64::from(self.count)) as f32
        }
    }
}

/// Runs the scenario described by `config`.
pub fn run(config: &SimConfig) -> ScenarioReport {
    let mut config = config.clone();
    config.validate();
    let scenario = &config.scenario;

    let mut timing = FixedTimestep::new(scenario.tick_rate);
    let dt = timing.fixed_dt();
    let total_ticks = (scenario.duration_secs * scenario.tick_rate as f32).round() as u64;
    let steady_from = total_ticks
        - ((total_ticks as f32 * scenario.steady_fraction).round() as u64).min(total_ticks);
    let frame_dt = 1.0 / scenario.frame_rate as f32;
    let log_every = (scenario.log_interval_secs * scenario.tick_rate as f32).round() as u64;

    let start = scenario.path.position_at(0.0);
    let mut scene = SceneContext::new(config.interaction.clone());
    scene.bind_leader(&config.recorder, start);

    let ids: Vec<FollowerId> = (0..scenario.follower_count)
        .map(|_| scene.spawn_follower(config.follower.clone(), start))
        .collect();
    for &id in &ids {
        if let Ok(index) = scene.activate_follower(id) {
            debug!(%id, index, "Scenario follower joined");
        }
    }
    scene.set_following(true);

    let mut stats: Vec<GapStats> = ids.iter().map(|_| GapStats::default()).collect();
    let mut leader = start;
    let mut frames = 0_u64;

    info!(
        ticks = total_ticks,
        followers = ids.len(),
        path = ?scenario.path,
        "Scenario starting"
    );

    while timing.ticks() < total_ticks {
        frames += 1;
        let due = timing.accumulate(frame_dt);
        for _ in 0..due {
            let tick = scene.ticks() + 1;
            if tick > total_ticks {
                break;
            }
            leader = scenario
                .path
                .position_at(scenario.leader_speed * tick as f32 * dt);
            scene.fixed_update(Some(leader), dt);

            if tick > steady_from {
                for (stat, &id) in stats.iter_mut().zip(&ids) {
                    if let Some(follower) = scene.followers().get(id) {
                        stat.push(follower.position().distance(leader));
                    }
                }
            }

            if log_every > 0 && tick % log_every == 0 {
                info!(
                    tick,
                    leader_x = leader.x,
                    leader_y = leader.y,
                    trail = scene.recorder().map_or(0.0, |r| r.total_recorded_distance()),
                    "Scenario progress"
                );
            }
        }
    }

    let exit_with_companion = scene.reach_exit(leader);
    let followers = ids
        .iter()
        .zip(&stats)
        .filter_map(|(&id, stat)| {
            let follower = scene.followers().get(id)?;
            Some(FollowerReport {
                follower: id,
                index: follower.offset_index()?,
                target_distance: follower.target_distance_behind()?,
                min_gap: stat.min,
                max_gap: stat.max,
                mean_gap: stat.mean(),
                final_position: follower.position().to_array(),
            })
        })
        .collect();

    let (recorded_samples, recorded_distance) = scene
        .recorder()
        .map_or((0, 0.0), |r| (r.len(), r.total_recorded_distance()));

    info!(ticks = scene.ticks(), frames, "Scenario finished");

    ScenarioReport {
        ticks: scene.ticks(),
        frames,
        recorded_samples,
        recorded_distance,
        leader_position: leader.to_array(),
        exit_with_companion,
        followers,
    }
}
