//! Binary-heap scheduler. The general-purpose default.

use super::{Scheduler, SchedulerKind};
use crate::{Event, EventKey, SchedulerError};
use raidsim_types::EventId;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Min-heap of keys over an id-indexed event table.
///
/// Rescheduling pushes a fresh key and leaves the old one in the heap. A key
/// is stale once it no longer matches its event's current key (or the event
/// is gone); stale keys are discarded when they reach the top.
#[derive(Debug, Default)]
pub struct HeapScheduler {
    heap: BinaryHeap<Reverse<EventKey>>,
    events: HashMap<EventId, Event>,
}

impl HeapScheduler {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(&self, key: &EventKey) -> bool {
        self.events.get(&key.id).is_some_and(|e| e.key() == *key)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(key)) = self.heap.peek() {
            if self.is_live(key) {
                break;
            }
            self.heap.pop();
        }
    }

    /// Heap entries, stale keys included.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }
}

impl Scheduler for HeapScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::PriorityQueue
    }

    fn push(&mut self, event: Event) -> Result<(), SchedulerError> {
        self.heap.push(Reverse(event.key()));
        self.events.insert(event.id(), event);
        Ok(())
    }

    fn peek(&mut self) -> Option<&Event> {
        self.discard_stale();
        let Reverse(key) = self.heap.peek()?;
        self.events.get(&key.id)
    }

    fn pop(&mut self) -> Option<Event> {
        self.discard_stale();
        let Reverse(key) = self.heap.pop()?;
        self.events.remove(&key.id)
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.events.clear();
    }

    fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    fn invalidate(&mut self, id: EventId) -> bool {
        match self.events.get_mut(&id) {
            Some(event) => {
                event.invalidate();
                true
            }
            None => false,
        }
    }

    fn reschedule(&mut self, id: EventId, new_time: Duration) -> Result<bool, SchedulerError> {
        let Some(event) = self.events.get_mut(&id) else {
            return Ok(false);
        };
        event.reschedule(new_time);
        self.heap.push(Reverse(event.key()));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    fn ev(id: u64, millis: u64) -> Event {
        Event::new(
            EventId(id),
            Duration::from_millis(millis),
            None,
            EventKind::PlayerReady,
        )
    }

    #[test]
    fn test_stale_keys_are_skipped() {
        let mut heap = HeapScheduler::new();
        heap.push(ev(1, 10)).unwrap();
        heap.push(ev(2, 20)).unwrap();

        heap.reschedule(EventId(1), Duration::from_millis(30))
            .unwrap();
        assert_eq!(heap.heap_len(), 3, "old key stays until it surfaces");
        assert_eq!(heap.len(), 2);

        assert_eq!(heap.pop().map(|e| e.id()), Some(EventId(2)));
        let moved = heap.pop().unwrap();
        assert_eq!(moved.id(), EventId(1));
        assert_eq!(moved.occurs(), Duration::from_millis(30));
        assert!(heap.pop().is_none());
        assert_eq!(heap.heap_len(), 0);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut heap = HeapScheduler::new();
        heap.push(ev(1, 10)).unwrap();
        assert_eq!(heap.peek().map(|e| e.id()), Some(EventId(1)));
        assert_eq!(heap.len(), 1);
    }
}
