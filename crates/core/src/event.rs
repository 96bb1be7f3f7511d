//! Time-stamped units of deferred work.

use raidsim_types::{ActionId, ActorId, EventId};
use std::cmp::Ordering;
use std::time::Duration;

/// What an event does when the driver executes it.
///
/// The driver dispatches on this tag; schedulers never look inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Owning actor picks its next action.
    PlayerReady,

    /// Cast of an action completes and resolves.
    ActionExecute { action: ActionId },

    /// One periodic tick of an action.
    ActionTick { action: ActionId },

    /// Cancel the pending ticks of an action.
    ActionInterrupt { action: ActionId },

    /// A temporary aura on the owning actor runs out.
    AuraExpiry { aura: String },

    /// Periodic resource regeneration for every awake actor.
    Regen,

    /// Wake the owning (sleeping) actor and seed its readiness.
    Summon,

    /// Put the owning actor to sleep, cancelling its pending work.
    Dismiss,

    /// Collaborator-defined event, routed back to the owning actor's hooks.
    Custom { tag: u64 },
}

impl EventKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PlayerReady => "player-ready",
            EventKind::ActionExecute { .. } => "action-execute",
            EventKind::ActionTick { .. } => "action-tick",
            EventKind::ActionInterrupt { .. } => "action-interrupt",
            EventKind::AuraExpiry { .. } => "aura-expiry",
            EventKind::Regen => "regen",
            EventKind::Summon => "summon",
            EventKind::Dismiss => "dismiss",
            EventKind::Custom { .. } => "custom",
        }
    }
}

/// A scheduled event.
///
/// Owned by the scheduler from push to pop. Cancellation is cooperative: an
/// invalidated event is still popped in order, the driver just does not
/// execute it.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    time: Duration,
    reschedule_time: Option<Duration>,
    actor: Option<ActorId>,
    invalid: bool,
    kind: EventKind,
}

impl Event {
    /// Create an event scheduled at `time`.
    pub fn new(id: EventId, time: Duration, actor: Option<ActorId>, kind: EventKind) -> Self {
        Self {
            id,
            time,
            reschedule_time: None,
            actor,
            invalid: false,
            kind,
        }
    }

    /// Creation id.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Originally scheduled time.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Reschedule time, if one was set.
    pub fn reschedule_time(&self) -> Option<Duration> {
        self.reschedule_time
    }

    /// Effective time: the reschedule time when set and nonzero, otherwise
    /// the scheduled time.
    pub fn occurs(&self) -> Duration {
        match self.reschedule_time {
            Some(t) if !t.is_zero() => t,
            _ => self.time,
        }
    }

    /// Owning actor.
    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    /// Execute behaviour.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Whether the event was cancelled.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Cancel the event. It keeps its place in pop order.
    pub fn invalidate(&mut self) {
        self.invalid = true;
    }

    /// Move the event to a new effective time.
    ///
    /// Schedulers must re-derive the event's position after this; use
    /// [`crate::Scheduler::reschedule`] on live events.
    pub fn reschedule(&mut self, new_time: Duration) {
        self.reschedule_time = Some(new_time);
    }

    /// Ordering key at the current effective time.
    pub fn key(&self) -> EventKey {
        EventKey {
            time: self.occurs(),
            id: self.id,
        }
    }
}

/// Key for ordering events in a scheduler.
///
/// Events are ordered by:
/// 1. Effective time (earlier first)
/// 2. Creation id (earlier-created first)
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: Duration,
    /// Creation id for deterministic FIFO ordering.
    pub id: EventId,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        self.id.cmp(&other.id)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, millis: u64) -> Event {
        Event::new(
            EventId(id),
            Duration::from_millis(millis),
            None,
            EventKind::Regen,
        )
    }

    #[test]
    fn test_event_key_ordering() {
        let earlier = event(2, 1000).key();
        let later = event(1, 2000).key();
        assert!(earlier < later, "time dominates creation id");
    }

    #[test]
    fn test_id_breaks_ties_at_same_time() {
        let first = event(1, 1000).key();
        let second = event(2, 1000).key();
        assert!(first < second, "earlier-created event fires first");
    }

    #[test]
    fn test_reschedule_overrides_time() {
        let mut ev = event(1, 1000);
        assert_eq!(ev.occurs(), Duration::from_millis(1000));

        ev.reschedule(Duration::from_millis(2500));
        assert_eq!(ev.occurs(), Duration::from_millis(2500));
        assert_eq!(ev.time(), Duration::from_millis(1000));
        assert_eq!(ev.key().time, Duration::from_millis(2500));
    }

    #[test]
    fn test_zero_reschedule_time_is_ignored() {
        let mut ev = event(1, 1000);
        ev.reschedule(Duration::ZERO);
        assert_eq!(ev.occurs(), Duration::from_millis(1000));
    }

    #[test]
    fn test_invalidate() {
        let mut ev = event(1, 0);
        assert!(!ev.is_invalid());
        ev.invalidate();
        assert!(ev.is_invalid());
    }
}
