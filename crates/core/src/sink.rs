//! Scheduling front-end used by the driver and by collaborator hooks.

use crate::{Event, EventKind, Scheduler, SchedulerError};
use raidsim_types::{ActorId, EventId};
use std::time::Duration;
use tracing::trace;

/// Borrowed view of the active scheduler at the current virtual time.
///
/// Every event is created here so that creation ids stay monotonic across
/// the whole iteration regardless of who schedules.
pub struct EventSink<'a> {
    scheduler: &'a mut dyn Scheduler,
    next_id: &'a mut EventId,
    now: Duration,
}

impl<'a> EventSink<'a> {
    /// Wrap a scheduler and the id counter.
    pub fn new(scheduler: &'a mut dyn Scheduler, next_id: &'a mut EventId, now: Duration) -> Self {
        Self {
            scheduler,
            next_id,
            now,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule an event `delay` from now.
    pub fn schedule(
        &mut self,
        delay: Duration,
        actor: Option<ActorId>,
        kind: EventKind,
    ) -> Result<EventId, SchedulerError> {
        self.schedule_at(self.now + delay, actor, kind)
    }

    /// Schedule an event at an absolute time.
    pub fn schedule_at(
        &mut self,
        time: Duration,
        actor: Option<ActorId>,
        kind: EventKind,
    ) -> Result<EventId, SchedulerError> {
        let id = *self.next_id;
        *self.next_id = id.next();

        trace!(
            %id,
            time = ?time,
            kind = kind.name(),
            "Scheduling event"
        );

        self.scheduler.push(Event::new(id, time, actor, kind))?;
        Ok(id)
    }

    /// Cancel a pending event. Returns false if it is no longer pending.
    pub fn invalidate(&mut self, id: EventId) -> bool {
        self.scheduler.invalidate(id)
    }

    /// Move a pending event to a new time.
    pub fn reschedule(&mut self, id: EventId, new_time: Duration) -> Result<bool, SchedulerError> {
        self.scheduler.reschedule(id, new_time)
    }

    /// Whether a pending, non-invalidated event with this id exists.
    pub fn is_live(&self, id: EventId) -> bool {
        self.scheduler.get(id).is_some_and(|e| !e.is_invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapScheduler;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_ids_are_monotonic() {
        let mut scheduler = HeapScheduler::new();
        let mut next_id = EventId(0);
        let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::from_secs(1));

        let a = sink
            .schedule(Duration::ZERO, None, EventKind::Regen)
            .unwrap();
        let b = sink
            .schedule(Duration::from_secs(2), None, EventKind::Regen)
            .unwrap();
        assert!(a < b);
        assert!(sink.is_live(a));
        assert!(sink.invalidate(a));
        assert!(!sink.is_live(a));
        assert_eq!(next_id, EventId(2));
        assert_eq!(
            scheduler.get(b).map(|e| e.time()),
            Some(Duration::from_secs(3))
        );
        assert!(logs_contain("Scheduling event"));
    }
}
