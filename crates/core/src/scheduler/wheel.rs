//! Timing-wheel scheduler.
//!
//! A fixed horizon is cut into equal-width buckets. An event lands in the
//! bucket for its absolute slot (`time / granularity`) modulo the bucket
//! count. Popping scans buckets forward from the cursor's slot and picks the
//! smallest key among entries whose absolute slot matches the slot being
//! scanned, so events one lap ahead that share a bucket are never taken early.
//!
//! Every event must lie within `horizon` of the cursor. Pushing one further
//! out is a configuration error.

use super::{Scheduler, SchedulerKind};
use crate::{Event, EventKey, SchedulerError};
use raidsim_types::EventId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Wheel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelConfig {
    /// Furthest an event may be scheduled ahead of the cursor.
    pub horizon: Duration,
    /// Bucket width.
    pub granularity: Duration,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            horizon: Duration::from_secs(600),
            granularity: Duration::from_millis(100),
        }
    }
}

impl WheelConfig {
    /// Number of buckets, at least one.
    pub fn bucket_count(&self) -> usize {
        let granularity = self.granularity.as_nanos().max(1);
        (self.horizon.as_nanos() / granularity).max(1) as usize
    }
}

/// Bucket-array scheduler.
#[derive(Debug)]
pub struct WheelScheduler {
    config: WheelConfig,
    buckets: Vec<Vec<EventKey>>,
    events: HashMap<EventId, Event>,
    /// Time of the most recent pop.
    cursor: Duration,
}

impl WheelScheduler {
    /// Create an empty wheel.
    pub fn new(config: WheelConfig) -> Self {
        Self {
            config,
            buckets: vec![Vec::new(); config.bucket_count()],
            events: HashMap::new(),
            cursor: Duration::ZERO,
        }
    }

    /// Current cursor time.
    pub fn cursor(&self) -> Duration {
        self.cursor
    }

    fn slot(&self, time: Duration) -> u64 {
        (time.as_nanos() / self.config.granularity.as_nanos().max(1)) as u64
    }

    fn bucket_index(&self, slot: u64) -> usize {
        (slot % self.buckets.len() as u64) as usize
    }

    fn check_range(&self, id: EventId, time: Duration) -> Result<(), SchedulerError> {
        if time < self.cursor {
            return Err(SchedulerError::EventInPast {
                id,
                time,
                now: self.cursor,
            });
        }
        if time - self.cursor > self.config.horizon {
            return Err(SchedulerError::BeyondHorizon {
                id,
                time,
                now: self.cursor,
                horizon: self.config.horizon,
            });
        }
        Ok(())
    }

    fn insert_key(&mut self, key: EventKey) {
        let index = self.bucket_index(self.slot(key.time));
        self.buckets[index].push(key);
    }

    /// Find the next live key, dropping stale entries on the way.
    fn next_key(&mut self) -> Option<EventKey> {
        if self.events.is_empty() {
            return None;
        }

        let start = self.slot(self.cursor);
        // An event up to one full horizon past the cursor can sit in the
        // cursor's own bucket, so scan one bucket past a full lap.
        for step in 0..=self.buckets.len() as u64 {
            let slot = start + step;
            let index = self.bucket_index(slot);
            let granularity = self.config.granularity.as_nanos().max(1);
            let events = &self.events;
            let bucket = &mut self.buckets[index];

            bucket.retain(|key| events.get(&key.id).is_some_and(|e| e.key() == *key));

            let found = bucket
                .iter()
                .filter(|key| (key.time.as_nanos() / granularity) as u64 == slot)
                .min()
                .copied();
            if found.is_some() {
                return found;
            }
        }

        // Unreachable while push enforces the horizon; fall back to a full scan
        // rather than losing events.
        warn!(pending = self.events.len(), "Wheel scan found no event in range");
        self.events.values().map(Event::key).min()
    }

    fn remove_key(&mut self, key: EventKey) {
        let index = self.bucket_index(self.slot(key.time));
        let bucket = &mut self.buckets[index];
        if let Some(pos) = bucket.iter().position(|k| *k == key) {
            bucket.swap_remove(pos);
        }
    }
}

impl Scheduler for WheelScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Wheel
    }

    fn push(&mut self, event: Event) -> Result<(), SchedulerError> {
        let key = event.key();
        self.check_range(key.id, key.time)?;
        self.insert_key(key);
        self.events.insert(key.id, event);
        Ok(())
    }

    fn peek(&mut self) -> Option<&Event> {
        let key = self.next_key()?;
        self.events.get(&key.id)
    }

    fn pop(&mut self) -> Option<Event> {
        let key = self.next_key()?;
        self.remove_key(key);
        self.cursor = self.cursor.max(key.time);
        self.events.remove(&key.id)
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.events.clear();
        self.cursor = Duration::ZERO;
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
        let Some(scheduled) = self.events.get(&id).map(Event::time) else {
            return Ok(false);
        };
        // Zero clears the override and falls back to the scheduled time.
        let effective = if new_time.is_zero() { scheduled } else { new_time };
        self.check_range(id, effective)?;
        let Some(event) = self.events.get_mut(&id) else {
            return Ok(false);
        };
        event.reschedule(new_time);
        let key = event.key();
        self.insert_key(key);
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
            EventKind::Regen,
        )
    }

    fn small_wheel() -> WheelScheduler {
        WheelScheduler::new(WheelConfig {
            horizon: Duration::from_secs(4),
            granularity: Duration::from_secs(1),
        })
    }

    #[test]
    fn test_bucket_count() {
        assert_eq!(small_wheel().buckets.len(), 4);
        assert_eq!(WheelConfig::default().bucket_count(), 6000);
    }

    #[test]
    fn test_next_lap_event_in_cursor_bucket_is_not_taken_early() {
        let mut wheel = small_wheel();
        wheel.push(ev(1, 500)).unwrap();
        assert_eq!(wheel.pop().map(|e| e.id()), Some(EventId(1)));
        assert_eq!(wheel.cursor(), Duration::from_millis(500));

        // 4.2s shares bucket 0 with the cursor but belongs to the next lap.
        wheel.push(ev(2, 4200)).unwrap();
        wheel.push(ev(3, 2000)).unwrap();

        assert_eq!(wheel.pop().map(|e| e.id()), Some(EventId(3)));
        assert_eq!(wheel.pop().map(|e| e.id()), Some(EventId(2)));
    }

    #[test]
    fn test_rejects_beyond_horizon() {
        let mut wheel = small_wheel();
        let err = wheel.push(ev(1, 4500)).unwrap_err();
        assert!(matches!(err, SchedulerError::BeyondHorizon { .. }));
        assert!(wheel.is_empty());
    }

    #[test]
    fn test_rejects_event_in_past() {
        let mut wheel = small_wheel();
        wheel.push(ev(1, 2000)).unwrap();
        wheel.pop().unwrap();

        let err = wheel.push(ev(2, 1000)).unwrap_err();
        assert!(matches!(err, SchedulerError::EventInPast { .. }));
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut wheel = small_wheel();
        wheel.push(ev(1, 3000)).unwrap();
        wheel.pop().unwrap();
        wheel.clear();
        assert_eq!(wheel.cursor(), Duration::ZERO);
        wheel.push(ev(2, 100)).unwrap();
        assert_eq!(wheel.pop().map(|e| e.id()), Some(EventId(2)));
    }

    #[test]
    fn test_reschedule_checks_horizon() {
        let mut wheel = small_wheel();
        wheel.push(ev(1, 1000)).unwrap();
        assert!(wheel.reschedule(EventId(1), Duration::from_secs(9)).is_err());
        assert!(wheel
            .reschedule(EventId(1), Duration::from_millis(3500))
            .unwrap());
        assert_eq!(wheel.pop().unwrap().occurs(), Duration::from_millis(3500));
    }
}
