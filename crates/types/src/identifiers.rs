//! Arena handles.
//!
//! Actors and actions live in arenas owned by the simulation; everything else
//! refers to them through these stable indexes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor handle (player, pet or target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

/// Action instance handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.0)
    }
}

/// Event creation id.
///
/// Monotonically increasing in creation order. Two events scheduled for the
/// same effective time fire in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl EventId {
    /// The id following this one.
    pub fn next(self) -> Self {
        EventId(self.0 + 1)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_ordering_follows_creation() {
        let first = EventId(7);
        let second = first.next();
        assert!(first < second);
        assert_eq!(second, EventId(8));
    }

    #[test]
    fn test_display() {
        assert_eq!(ActorId(3).to_string(), "Actor(3)");
        assert_eq!(ActionId(0).to_string(), "Action(0)");
        assert_eq!(EventId(42).to_string(), "Event(42)");
    }
}
