//! Named buffs and debuffs with scheduled expiry.

use indexmap::IndexMap;
use raidsim_core::{EventKind, EventSink, SchedulerError};
use raidsim_types::{ActorId, EventId};
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AuraState {
    stacks: u32,
    /// Pending expiry event. `None` for permanent auras.
    expiry: Option<EventId>,
}

/// The auras currently on one actor, in application order.
///
/// A temporary aura owns exactly one live expiry event. Reapplying it
/// invalidates that event and schedules a fresh one, so a stale expiry can
/// never remove a refreshed aura.
#[derive(Debug, Clone, Default)]
pub struct Auras {
    active: IndexMap<String, AuraState>,
}

impl Auras {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply or refresh a temporary aura on `owner` for `duration`.
    ///
    /// A permanent aura of the same name is left as it is and `None` is
    /// returned. Otherwise returns the new expiry event.
    pub fn apply(
        &mut self,
        sink: &mut EventSink<'_>,
        owner: ActorId,
        name: &str,
        stacks: u32,
        duration: Duration,
    ) -> Result<Option<EventId>, SchedulerError> {
        match self.active.get(name) {
            Some(AuraState { expiry: None, .. }) => {
                trace!(%owner, aura = name, "Permanent aura kept");
                return Ok(None);
            }
            Some(AuraState {
                expiry: Some(previous),
                ..
            }) => {
                sink.invalidate(*previous);
            }
            None => {}
        }

        let expiry = sink.schedule(
            duration,
            Some(owner),
            EventKind::AuraExpiry {
                aura: name.to_string(),
            },
        )?;

        trace!(%owner, aura = name, stacks, %expiry, "Aura applied");
        self.active.insert(
            name.to_string(),
            AuraState {
                stacks,
                expiry: Some(expiry),
            },
        );
        Ok(Some(expiry))
    }

    /// Add an aura that only a reset removes.
    pub fn add_permanent(&mut self, name: &str, stacks: u32) {
        self.active.insert(
            name.to_string(),
            AuraState {
                stacks,
                expiry: None,
            },
        );
    }

    /// Remove an aura early, cancelling its expiry.
    pub fn remove(&mut self, sink: &mut EventSink<'_>, name: &str) -> bool {
        match self.active.shift_remove(name) {
            Some(state) => {
                if let Some(expiry) = state.expiry {
                    sink.invalidate(expiry);
                }
                true
            }
            None => false,
        }
    }

    /// Handle an expiry event. Only the aura's current expiry removes it.
    pub fn expire(&mut self, name: &str, event: EventId) -> bool {
        let current = self.active.get(name).and_then(|a| a.expiry);
        if current != Some(event) {
            return false;
        }
        self.active.shift_remove(name);
        true
    }

    /// Stack count, 0 when absent.
    pub fn stacks(&self, name: &str) -> u32 {
        self.active.get(name).map_or(0, |a| a.stacks)
    }

    pub fn is_up(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    /// The pending expiry event of a temporary aura.
    pub fn expiry(&self, name: &str) -> Option<EventId> {
        self.active.get(name).and_then(|a| a.expiry)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.active.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop every aura. Pending expiry events are left to the scheduler
    /// reset that accompanies this.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidsim_core::{HeapScheduler, Scheduler};
    use tracing_test::traced_test;

    const OWNER: ActorId = ActorId(1);

    #[test]
    #[traced_test]
    fn test_refresh_replaces_exactly_one_expiry() {
        let mut scheduler = HeapScheduler::new();
        let mut next_id = EventId(0);
        let mut auras = Auras::new();

        let first = {
            let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::ZERO);
            auras
                .apply(&mut sink, OWNER, "misery", 1, Duration::from_secs(24))
                .unwrap()
                .unwrap()
        };
        let second = {
            let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::from_secs(5));
            auras
                .apply(&mut sink, OWNER, "misery", 1, Duration::from_secs(24))
                .unwrap()
                .unwrap()
        };

        assert_ne!(first, second);
        assert!(scheduler.get(first).unwrap().is_invalid());
        assert!(!scheduler.get(second).unwrap().is_invalid());
        let live = [first, second]
            .iter()
            .filter(|id| scheduler.get(**id).is_some_and(|e| !e.is_invalid()))
            .count();
        assert_eq!(live, 1);
        assert_eq!(auras.expiry("misery"), Some(second));
        assert_eq!(
            scheduler.get(second).map(|e| e.time()),
            Some(Duration::from_secs(29))
        );
        assert!(logs_contain("Aura applied"));
    }

    #[test]
    fn test_stale_expiry_does_not_remove_refreshed_aura() {
        let mut scheduler = HeapScheduler::new();
        let mut next_id = EventId(0);
        let mut auras = Auras::new();
        let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::ZERO);

        let stale = auras
            .apply(&mut sink, OWNER, "bloodlust", 1, Duration::from_secs(10))
            .unwrap()
            .unwrap();
        let fresh = auras
            .apply(&mut sink, OWNER, "bloodlust", 1, Duration::from_secs(10))
            .unwrap()
            .unwrap();

        assert!(!auras.expire("bloodlust", stale));
        assert!(auras.is_up("bloodlust"));
        assert!(auras.expire("bloodlust", fresh));
        assert!(!auras.is_up("bloodlust"));
        assert!(!auras.expire("bloodlust", fresh), "expiry is idempotent");
    }

    #[test]
    fn test_permanent_and_remove() {
        let mut scheduler = HeapScheduler::new();
        let mut next_id = EventId(0);
        let mut auras = Auras::new();
        auras.add_permanent("moonkin-aura", 1);
        assert_eq!(auras.expiry("moonkin-aura"), None);
        assert_eq!(auras.stacks("moonkin-aura"), 1);

        let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::ZERO);
        let expiry = auras
            .apply(&mut sink, OWNER, "sunder", 5, Duration::from_secs(30))
            .unwrap()
            .unwrap();
        assert_eq!(auras.stacks("sunder"), 5);
        assert!(auras.remove(&mut sink, "sunder"));
        assert!(!sink.is_live(expiry));
        assert!(!auras.remove(&mut sink, "sunder"));
        assert_eq!(auras.names().collect::<Vec<_>>(), vec!["moonkin-aura"]);
    }

    #[test]
    #[traced_test]
    fn test_apply_keeps_permanent_aura() {
        let mut scheduler = HeapScheduler::new();
        let mut next_id = EventId(0);
        let mut auras = Auras::new();
        auras.add_permanent("curse_of_the_elements", 1);

        let mut sink = EventSink::new(&mut scheduler, &mut next_id, Duration::ZERO);
        let expiry = auras
            .apply(&mut sink, OWNER, "curse_of_the_elements", 3, Duration::from_secs(300))
            .unwrap();

        assert_eq!(expiry, None);
        assert_eq!(auras.expiry("curse_of_the_elements"), None);
        assert_eq!(auras.stacks("curse_of_the_elements"), 1);
        assert_eq!(next_id, EventId(0), "no expiry is scheduled");
        assert!(logs_contain("Permanent aura kept"));
    }
}
