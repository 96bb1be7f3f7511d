//! Sorted-list scheduler.
//!
//! O(n) push, O(1) pop. Simple enough to reason about when debugging
//! ordering, and fast when few events are pending.

use super::{Scheduler, SchedulerKind};
use crate::{Event, EventKey, SchedulerError};
use raidsim_types::EventId;
use std::collections::VecDeque;
use std::time::Duration;

/// Events kept in ascending key order.
#[derive(Debug, Default)]
pub struct SortedListScheduler {
    events: VecDeque<Event>,
}

impl SortedListScheduler {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the position that keeps the list sorted.
    ///
    /// New events are usually later than most pending ones, so scan from the
    /// back.
    fn insert_sorted(&mut self, event: Event) {
        let key = event.key();
        let pos = self
            .events
            .iter()
            .rposition(|e| e.key() < key)
            .map_or(0, |p| p + 1);
        self.events.insert(pos, event);
    }

    fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|e| e.id() == id)
    }

    /// Keys in pop order.
    pub fn keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.events.iter().map(Event::key)
    }
}

impl Scheduler for SortedListScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::SortedList
    }

    fn push(&mut self, event: Event) -> Result<(), SchedulerError> {
        self.insert_sorted(event);
        Ok(())
    }

    fn peek(&mut self) -> Option<&Event> {
        self.events.front()
    }

    fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn clear(&mut self) {
        self.events.clear();
    }

    fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    fn invalidate(&mut self, id: EventId) -> bool {
        match self.events.iter_mut().find(|e| e.id() == id) {
            Some(event) => {
                event.invalidate();
                true
            }
            None => false,
        }
    }

    fn reschedule(&mut self, id: EventId, new_time: Duration) -> Result<bool, SchedulerError> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        if let Some(mut event) = self.events.remove(pos) {
            event.reschedule(new_time);
            self.insert_sorted(event);
        }
        Ok(true)
    }
}
