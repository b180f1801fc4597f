//! # Convoy Engine
//!
//! Headless driver for Convoy scenes.
//!
//! This crate ties the gameplay systems to a clock:
//! - Fixed timestep accumulator fed by render-rate frames
//! - TOML configuration for the recorder, followers, and scenario
//! - Scripted scenario runner that reports trailing-gap statistics

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod scenario;
pub mod timing;

pub use config::{LeaderPath, ScenarioConfig, SimConfig, CONFIG_FILE};
pub use scenario::{run, FollowerReport, ScenarioReport};
pub use timing::FixedTimestep;
