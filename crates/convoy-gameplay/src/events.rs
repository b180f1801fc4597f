//! Event bus for telling the host what the convoy did this tick.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use convoy_common::FollowerId;

/// Events published by the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConvoyEvent {
    /// Follower joined the active set
    FollowerActivated {
        /// Follower ID
        follower: FollowerId,
        /// Assigned rank
        index: u32,
    },
    /// Follower left the active set
    FollowerDeactivated {
        /// Follower ID
        follower: FollowerId,
    },
    /// Scene-wide follow switch changed
    FollowToggled {
        /// New state
        enabled: bool,
    },
    /// Leader entered an exit zone
    ExitReached {
        /// Whether a following companion was close enough
        with_companion: bool,
    },
    /// Scene state was reset
    SceneReset,
}

/// Event bus for broadcasting events to the host.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<ConvoyEvent>,
    /// Receiver for collecting events
    receiver: Receiver<ConvoyEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: ConvoyEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<ConvoyEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
