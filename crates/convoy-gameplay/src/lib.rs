//! # Convoy Gameplay
//!
//! Companion-trail gameplay for Convoy.
//!
//! This crate provides the CPU-side systems that let companions trail the
//! leader:
//! - Arc-length path recorder (ring buffer of leader positions)
//! - Trail source trait for distance-indexed lookups
//! - Trailing followers and the per-scene active set
//! - Scene context with story flags, follow/stay interaction, exit checks
//! - Event bus for notifying the host

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod events;
pub mod flags;
pub mod follower;
pub mod path_recorder;
pub mod scene;
pub mod trail;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::events::*;
    pub use crate::flags::*;
    pub use crate::follower::*;
    pub use crate::path_recorder::*;
    pub use crate::scene::*;
    pub use crate::trail::*;
}

pub use prelude::*;
