//! ID types for followers and other scene participants.

use serde::{Deserialize, Serialize};

/// Handle for a follower registered in a scene.
///
/// Ids are handed out by the owning scene, never by global state, so two
/// scenes may reuse the same raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FollowerId(u32);

impl FollowerId {
    /// Creates a follower ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FollowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "follower#{}", self.0)
    }
}
