//! Up/down tallies for tracked effects.

use indexmap::IndexMap;

/// Running up/down tally for one effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uptime {
    up: u64,
    down: u64,
}

impl Uptime {
    /// Count one observation.
    pub fn update(&mut self, is_up: bool) {
        if is_up {
            self.up += 1;
        } else {
            self.down += 1;
        }
    }

    /// Observations with the effect active.
    pub fn up(&self) -> u64 {
        self.up
    }

    /// Observations with the effect inactive.
    pub fn down(&self) -> u64 {
        self.down
    }

    /// `100 * up / (up + down)`, or 0 with no observations.
    pub fn percentage(&self) -> f64 {
        let total = self.up + self.down;
        if total == 0 {
            0.0
        } else {
            100.0 * self.up as f64 / total as f64
        }
    }

    pub(crate) fn merge(&mut self, other: &Uptime) {
        self.up += other.up;
        self.down += other.down;
    }
}

/// Uptime counters by effect name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Uptimes {
    counters: IndexMap<String, Uptime>,
}

impl Uptimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter for `name`, created on first use.
    pub fn register(&mut self, name: &str) -> &mut Uptime {
        self.counters.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Uptime> {
        self.counters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uptime)> {
        self.counters.iter().map(|(name, uptime)| (name.as_str(), uptime))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Add another set of tallies into this one.
    pub fn merge(&mut self, other: &Uptimes) {
        for (name, uptime) in &other.counters {
            self.register(name).merge(uptime);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_zero_without_observations() {
        assert_eq!(Uptime::default().percentage(), 0.0);
    }

    #[test]
    fn test_percentage_bounds() {
        let mut uptime = Uptime::default();
        uptime.update(true);
        assert_eq!(uptime.percentage(), 100.0);
        for _ in 0..3 {
            uptime.update(false);
        }
        assert_eq!(uptime.percentage(), 25.0);

        let mut never = Uptime::default();
        never.update(false);
        assert_eq!(never.percentage(), 0.0);
    }

    #[test]
    fn test_merge_by_name() {
        let mut a = Uptimes::new();
        a.register("shadow-weaving").update(true);
        let mut b = Uptimes::new();
        b.register("shadow-weaving").update(false);
        b.register("misery").update(true);

        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("shadow-weaving").map(Uptime::percentage), Some(50.0));
        assert_eq!(a.get("misery").map(Uptime::up), Some(1));
        assert!(a.get("unknown").is_none());
    }
}
