//! The scheduler interface and its three strategies.

mod heap;
mod list;
mod wheel;

pub use heap::HeapScheduler;
pub use list::SortedListScheduler;
pub use wheel::{WheelConfig, WheelScheduler};

use crate::{Event, SchedulerError};
use raidsim_types::EventId;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A time-ordered queue of pending events.
///
/// Every implementation pops in ascending `(effective time, creation id)`
/// order. Callers must not depend on which strategy is active.
pub trait Scheduler: Send {
    /// Which strategy this is.
    fn kind(&self) -> SchedulerKind;

    /// Insert an event in priority order.
    fn push(&mut self, event: Event) -> Result<(), SchedulerError>;

    /// The next event to pop, without removing it.
    ///
    /// Takes `&mut self` because backends re-derive order lazily.
    fn peek(&mut self) -> Option<&Event>;

    /// Remove and return the next event.
    fn pop(&mut self) -> Option<Event>;

    /// Number of pending events, invalidated ones included.
    fn len(&self) -> usize;

    /// Whether nothing is pending.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending event without executing it.
    fn clear(&mut self);

    /// Look up a pending event.
    fn get(&self, id: EventId) -> Option<&Event>;

    /// Set the invalidation flag of a pending event.
    ///
    /// Returns false if no such event is pending.
    fn invalidate(&mut self, id: EventId) -> bool;

    /// Move a pending event to a new effective time.
    ///
    /// A zero `new_time` clears any earlier reschedule, so the event fires at
    /// its scheduled time again. Returns `Ok(false)` if no such event is
    /// pending.
    fn reschedule(&mut self, id: EventId, new_time: Duration) -> Result<bool, SchedulerError>;
}

/// Scheduler strategy, chosen once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchedulerKind {
    /// Linear insert into a sorted list.
    SortedList,
    /// Binary heap.
    #[default]
    PriorityQueue,
    /// Fixed-resolution bucket wheel.
    Wheel,
}

impl SchedulerKind {
    /// All strategies.
    pub const ALL: [SchedulerKind; 3] = [
        SchedulerKind::SortedList,
        SchedulerKind::PriorityQueue,
        SchedulerKind::Wheel,
    ];

    /// Config-file name.
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerKind::SortedList => "list",
            SchedulerKind::PriorityQueue => "priorityq",
            SchedulerKind::Wheel => "wheel",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(SchedulerKind::SortedList),
            "priorityq" | "heap" => Ok(SchedulerKind::PriorityQueue),
            "wheel" => Ok(SchedulerKind::Wheel),
            other => Err(format!(
                "unknown scheduler '{}', expected list, priorityq or wheel",
                other
            )),
        }
    }
}

/// Build the scheduler for a strategy.
pub fn new_scheduler(kind: SchedulerKind, wheel: WheelConfig) -> Box<dyn Scheduler> {
    match kind {
        SchedulerKind::SortedList => Box::new(SortedListScheduler::new()),
        SchedulerKind::PriorityQueue => Box::new(HeapScheduler::new()),
        SchedulerKind::Wheel => Box::new(WheelScheduler::new(wheel)),
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
            EventKind::Regen,
        )
    }

    #[test]
    fn test_kind_parse() {
        for kind in SchedulerKind::ALL {
            assert_eq!(kind.as_str().parse::<SchedulerKind>(), Ok(kind));
        }
        assert!("fifo".parse::<SchedulerKind>().is_err());
    }

    #[test]
    fn test_new_scheduler_reports_kind() {
        for kind in SchedulerKind::ALL {
            let scheduler = new_scheduler(kind, WheelConfig::default());
            assert_eq!(scheduler.kind(), kind);
            assert!(scheduler.is_empty());
        }
    }

    #[test]
    fn test_every_backend_orders_ties_by_id() {
        for kind in SchedulerKind::ALL {
            let mut scheduler = new_scheduler(kind, WheelConfig::default());
            scheduler.push(ev(3, 100)).unwrap();
            scheduler.push(ev(1, 100)).unwrap();
            scheduler.push(ev(2, 50)).unwrap();

            let order: Vec<u64> = std::iter::from_fn(|| scheduler.pop())
                .map(|e| e.id().0)
                .collect();
            assert_eq!(order, vec![2, 1, 3], "backend {}", kind);
        }
    }

    #[test]
    fn test_every_backend_pops_invalidated_events() {
        for kind in SchedulerKind::ALL {
            let mut scheduler = new_scheduler(kind, WheelConfig::default());
            scheduler.push(ev(1, 10)).unwrap();
            scheduler.push(ev(2, 20)).unwrap();
            assert!(scheduler.invalidate(EventId(1)));
            assert!(!scheduler.invalidate(EventId(99)));

            let first = scheduler.pop().unwrap();
            assert_eq!(first.id(), EventId(1));
            assert!(first.is_invalid());
            assert!(!scheduler.pop().unwrap().is_invalid());
            assert!(scheduler.pop().is_none());
        }
    }

    #[test]
    fn test_every_backend_clear_discards_everything() {
        for kind in SchedulerKind::ALL {
            let mut scheduler = new_scheduler(kind, WheelConfig::default());
            for i in 0..10 {
                scheduler.push(ev(i, i * 10)).unwrap();
            }
            scheduler.clear();
            assert!(scheduler.is_empty());
            assert!(scheduler.peek().is_none());
            assert!(scheduler.pop().is_none());
        }
    }

    #[test]
    fn test_every_backend_reschedule_reorders() {
        for kind in SchedulerKind::ALL {
            let mut scheduler = new_scheduler(kind, WheelConfig::default());
            scheduler.push(ev(1, 10)).unwrap();
            scheduler.push(ev(2, 20)).unwrap();
            scheduler.push(ev(3, 30)).unwrap();

            assert!(scheduler
                .reschedule(EventId(1), Duration::from_millis(25))
                .unwrap());
            assert!(!scheduler
                .reschedule(EventId(42), Duration::from_millis(25))
                .unwrap());
            assert_eq!(scheduler.len(), 3, "backend {}", kind);
            assert_eq!(scheduler.peek().map(|e| e.id()), Some(EventId(2)));

            let order: Vec<u64> = std::iter::from_fn(|| scheduler.pop())
                .map(|e| e.id().0)
                .collect();
            assert_eq!(order, vec![2, 1, 3], "backend {}", kind);
        }
    }
}
