//! Simulation configuration.
//!
//! Bundles the recorder, follower, and interaction settings with the
//! scenario the headless driver plays. Configuration can be loaded from and
//! saved to a TOML file.

use convoy_common::{ConvoyError, ConvoyResult};
use convoy_gameplay::{FollowerConfig, InteractionConfig, RecorderConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::timing::DEFAULT_TICK_RATE;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "convoy.toml";

/// Shape of the path the scripted leader walks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaderPath {
    /// Straight line along +X
    #[default]
    Straight,
    /// Back-and-forth diagonal legs of `leg_length` meters
    Zigzag {
        /// Length of each leg
        leg_length: f32,
    },
    /// Counter-clockwise circle around the start point's left
    Circle {
        /// Circle radius
        radius: f32,
    },
}

/// Scripted scenario settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Physics ticks per second
    pub tick_rate: u32,
    /// Render frames per second fed into the fixed timestep
    pub frame_rate: u32,
    /// Simulated duration in seconds
    pub duration_secs: f32,
    /// Leader speed in meters per second
    pub leader_speed: f32,
    /// Number of followers spawned at the start point
    pub follower_count: u32,
    /// Fraction of the run, counted from the end, used for steady-state stats
    pub steady_fraction: f32,
    /// Seconds between progress log lines (0 = off)
    pub log_interval_secs: f32,
    /// Path the leader walks
    pub path: LeaderPath,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            frame_rate: 60,
            duration_secs: 10.0,
            leader_speed: 1.5,
            follower_count: 1,
            steady_fraction: 0.2,
            log_interval_secs: 1.0,
            path: LeaderPath::Straight,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Path recorder settings
    pub recorder: RecorderConfig,
    /// Follower settings, shared by every spawned follower
    pub follower: FollowerConfig,
    /// Follow/stay and exit settings
    pub interaction: InteractionConfig,
    /// Scenario settings
    pub scenario: ScenarioConfig,
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Parse configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> ConvoyResult<Self> {
        toml::from_str(contents).map_err(|e| ConvoyError::Serialization(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ConvoyResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConvoyError::Serialization(e.to_string()))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.recorder.validate();
        self.follower.validate();
        self.interaction.validate();

        let scenario = &mut self.scenario;
        scenario.tick_rate = scenario.tick_rate.clamp(1, 1000);
        scenario.frame_rate = scenario.frame_rate.clamp(1, 1000);
        scenario.follower_count = scenario.follower_count.min(64);
        if !scenario.duration_secs.is_finite() {
            scenario.duration_secs = 0.0;
        }
        scenario.duration_secs = scenario.duration_secs.clamp(0.0, 3600.0);
        if !scenario.leader_speed.is_finite() {
            scenario.leader_speed = 0.0;
        }
        scenario.leader_speed = scenario.leader_speed.clamp(0.0, 100.0);
        if !scenario.steady_fraction.is_finite() {
            scenario.steady_fraction = 0.2;
        }
        scenario.steady_fraction = scenario.steady_fraction.clamp(0.01, 1.0);
        scenario.log_interval_secs = scenario.log_interval_secs.max(0.0);

        match &mut scenario.path {
            LeaderPath::Straight => {},
            LeaderPath::Zigzag { leg_length } => *leg_length = leg_length.max(0.1),
            LeaderPath::Circle { radius } => *radius = radius.max(0.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.recorder.capacity, 2048);
        assert_eq!(config.scenario.tick_rate, 50);
        assert_eq!(config.scenario.path, LeaderPath::Straight);
        assert!((config.follower.initial_distance - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();

        config.recorder.capacity = 3;
        config.scenario.tick_rate = 0;
        config.scenario.leader_speed = -4.0;
        config.scenario.path = LeaderPath::Circle { radius: 0.0 };

        config.validate();

        assert_eq!(config.recorder.capacity, 16);
        assert_eq!(config.scenario.tick_rate, 1);
        assert_eq!(config.scenario.leader_speed, 0.0);
        assert_eq!(config.scenario.path, LeaderPath::Circle { radius: 0.1 });
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("convoy.toml");

        let mut config = SimConfig::default();
        config.recorder.min_sample_spacing = 0.05;
        config.follower.spacing = 1.5;
        config.scenario.follower_count = 3;
        config.scenario.path = LeaderPath::Zigzag { leg_length: 2.0 };

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/convoy.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "recorder = [[[").expect("Failed to write file");

        assert_eq!(SimConfig::load_from(&config_path), SimConfig::default());
    }

    #[test]
    fn test_parse_error_is_serialization() {
        let result = SimConfig::from_toml_str("scenario = 3");
        assert!(matches!(result, Err(ConvoyError::Serialization(_))));
    }

    #[test]
    fn test_save_into_file_parent_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").expect("Failed to write file");

        let result = SimConfig::default().save_to(blocker.join("convoy.toml"));
        assert!(matches!(result, Err(ConvoyError::Io(_))));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            [follower]
            spacing = 2.0

            [scenario]
            path = { kind = "circle", radius = 4.0 }
            "#,
        )
        .expect("Failed to parse");

        assert!((config.follower.spacing - 2.0).abs() < 1e-6);
        assert!((config.follower.initial_distance - 1.2).abs() < 1e-6);
        assert_eq!(config.scenario.path, LeaderPath::Circle { radius: 4.0 });
        assert_eq!(config.recorder, RecorderConfig::default());
    }

    #[test]
    fn test_config_toml_serialization() {
        let config = SimConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");

        assert!(toml_str.contains("min_sample_spacing"));
        assert!(toml_str.contains("arrive_distance"));
    }
}
