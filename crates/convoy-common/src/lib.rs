//! # Convoy Common
//!
//! Shared types for the Convoy companion-trail workspace:
//! - Geometry (`Vec2`, facing, critically-damped smoothing)
//! - Follower IDs
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follower_id_roundtrip() {
        let id = FollowerId::from_raw(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "follower#7");
    }

    #[test]
    fn test_config_error_converts() {
        let err: ConvoyError = ConfigError::CapacityTooSmall {
            requested: 4,
            minimum: 16,
        }
        .into();
        assert!(err.to_string().contains("below the minimum of 16"));
    }
}
