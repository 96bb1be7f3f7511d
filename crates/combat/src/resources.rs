//! Resource pools and the gain/loss ledger.

use crate::ResourceError;
use indexmap::IndexMap;
use raidsim_types::{ResourceKind, ResourceMap};

/// One actor's resource pools.
///
/// `base` is the configured maximum. `initial` is what every iteration starts
/// with. Gains and losses clamp the current amount to `[0, max]` and report
/// the amount actually applied.
#[derive(Debug, Clone)]
pub struct Resources {
    base: ResourceMap<f64>,
    initial: ResourceMap<f64>,
    current: ResourceMap<f64>,
    max: ResourceMap<f64>,
    infinite: ResourceMap<bool>,
    // Per iteration.
    gained: ResourceMap<f64>,
    lost: ResourceMap<f64>,
}

impl Default for Resources {
    fn default() -> Self {
        Self::new(ResourceMap::splat(0.0))
    }
}

impl Resources {
    /// Pools that start full.
    pub fn new(base: ResourceMap<f64>) -> Self {
        Self {
            base,
            initial: base,
            current: base,
            max: base,
            infinite: ResourceMap::splat(false),
            gained: ResourceMap::splat(0.0),
            lost: ResourceMap::splat(0.0),
        }
    }

    /// Override the starting amount of one pool. Clamped to the maximum.
    pub fn set_initial(&mut self, kind: ResourceKind, amount: f64) {
        self.initial[kind] = amount.clamp(0.0, self.base[kind]);
        self.current[kind] = self.initial[kind];
    }

    /// Change the maximum of one pool.
    pub fn set_base(&mut self, kind: ResourceKind, amount: f64) {
        let amount = amount.max(0.0);
        self.base[kind] = amount;
        self.max[kind] = amount;
        self.initial[kind] = self.initial[kind].min(amount);
        self.current[kind] = self.current[kind].min(amount);
    }

    /// Mark which pools never run out.
    pub fn set_infinite(&mut self, infinite: ResourceMap<bool>) {
        self.infinite = infinite;
    }

    /// Back to the starting amounts.
    pub fn reset(&mut self) {
        self.max = self.base;
        self.current = self.initial;
        self.gained = ResourceMap::splat(0.0);
        self.lost = ResourceMap::splat(0.0);
    }

    pub fn current(&self, kind: ResourceKind) -> f64 {
        self.current[kind]
    }

    pub fn max(&self, kind: ResourceKind) -> f64 {
        self.max[kind]
    }

    pub fn initial(&self, kind: ResourceKind) -> f64 {
        self.initial[kind]
    }

    pub fn is_infinite(&self, kind: ResourceKind) -> bool {
        self.infinite[kind]
    }

    /// Amount gained this iteration.
    pub fn gained(&self, kind: ResourceKind) -> f64 {
        self.gained[kind]
    }

    /// Amount lost this iteration.
    pub fn lost(&self, kind: ResourceKind) -> f64 {
        self.lost[kind]
    }

    /// Add up to `amount`, capped at the maximum. Returns what was added.
    pub fn gain(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.current[kind];
        self.current[kind] = (before + amount).min(self.max[kind]);
        let actual = self.current[kind] - before;
        self.gained[kind] += actual;
        actual
    }

    /// Remove up to `amount`, floored at zero. Returns what was removed.
    ///
    /// Infinite pools are never drained.
    pub fn loss(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        if amount <= 0.0 || self.infinite[kind] {
            return 0.0;
        }
        let before = self.current[kind];
        self.current[kind] = (before - amount).max(0.0);
        let actual = before - self.current[kind];
        self.lost[kind] += actual;
        actual
    }

    /// Whether `cost` can be paid.
    pub fn available(&self, kind: ResourceKind, cost: f64) -> bool {
        self.infinite[kind] || self.current[kind] >= cost
    }

    /// Pay `cost`, failing without side effects if it cannot be paid.
    pub fn consume(&mut self, kind: ResourceKind, cost: f64) -> Result<f64, ResourceError> {
        if !self.available(kind, cost) {
            return Err(ResourceError::Insufficient {
                kind,
                cost,
                available: self.current[kind],
            });
        }
        Ok(self.loss(kind, cost))
    }
}

/// Parse a resource name.
pub fn parse_resource(name: &str) -> Result<ResourceKind, ResourceError> {
    ResourceKind::parse(name).ok_or_else(|| ResourceError::Unknown(name.to_string()))
}

/// Cumulative amounts by (source, resource). Never reset between iterations.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: IndexMap<(String, ResourceKind), f64>,
}

impl Ledger {
    pub fn record(&mut self, source: &str, kind: ResourceKind, amount: f64) {
        if amount == 0.0 {
            return;
        }
        *self
            .entries
            .entry((source.to_string(), kind))
            .or_insert(0.0) += amount;
    }

    pub fn get(&self, source: &str, kind: ResourceKind) -> f64 {
        self.entries
            .get(&(source.to_string(), kind))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ResourceKind, f64)> {
        self.entries
            .iter()
            .map(|((source, kind), amount)| (source.as_str(), *kind, *amount))
    }

    pub fn merge(&mut self, other: &Ledger) {
        for (source, kind, amount) in other.iter() {
            self.record(source, kind, amount);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn mana_pool(max: f64) -> Resources {
        let mut base = ResourceMap::splat(0.0);
        base[ResourceKind::Mana] = max;
        Resources::new(base)
    }

    #[test]
    fn test_gain_and_loss_clamp() {
        let mut pool = mana_pool(100.0);
        assert_eq!(pool.gain(ResourceKind::Mana, 50.0), 0.0);
        assert_eq!(pool.loss(ResourceKind::Mana, 30.0), 30.0);
        assert_eq!(pool.gain(ResourceKind::Mana, 50.0), 30.0);
        assert_eq!(pool.loss(ResourceKind::Mana, 250.0), 100.0);
        assert_eq!(pool.current(ResourceKind::Mana), 0.0);
        assert_eq!(pool.gained(ResourceKind::Mana), 30.0);
        assert_eq!(pool.lost(ResourceKind::Mana), 130.0);
    }

    #[test]
    fn test_random_operations_stay_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut base = ResourceMap::splat(0.0);
        for (i, kind) in ResourceKind::ALL.into_iter().enumerate() {
            base[kind] = 50.0 * (i + 1) as f64;
        }
        let mut pool = Resources::new(base);

        for _ in 0..5_000 {
            let kind = ResourceKind::ALL[rng.gen_range(0..ResourceKind::COUNT)];
            let amount = rng.gen_range(-20.0..200.0);
            if rng.gen_bool(0.5) {
                pool.gain(kind, amount);
            } else {
                pool.loss(kind, amount);
            }
            for kind in ResourceKind::ALL {
                let current = pool.current(kind);
                assert!((0.0..=pool.max(kind)).contains(&current));
            }
        }
    }

    #[test]
    fn test_infinite_pool_is_always_available() {
        let mut pool = mana_pool(10.0);
        assert!(!pool.available(ResourceKind::Mana, 20.0));
        assert!(pool.consume(ResourceKind::Mana, 20.0).is_err());
        assert_eq!(pool.current(ResourceKind::Mana), 10.0);

        let mut infinite = ResourceMap::splat(false);
        infinite[ResourceKind::Mana] = true;
        pool.set_infinite(infinite);
        assert!(pool.available(ResourceKind::Mana, 20.0));
        assert_eq!(pool.consume(ResourceKind::Mana, 20.0), Ok(0.0));
        assert_eq!(pool.current(ResourceKind::Mana), 10.0);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut pool = mana_pool(100.0);
        pool.set_initial(ResourceKind::Mana, 40.0);
        pool.gain(ResourceKind::Mana, 60.0);
        pool.reset();
        assert_eq!(pool.current(ResourceKind::Mana), 40.0);
        assert_eq!(pool.gained(ResourceKind::Mana), 0.0);
    }

    #[test]
    fn test_ledger_accumulates_by_source() {
        let mut ledger = Ledger::default();
        ledger.record("mp5", ResourceKind::Mana, 10.0);
        ledger.record("mp5", ResourceKind::Mana, 5.0);
        ledger.record("spirit", ResourceKind::Mana, 0.0);
        assert_eq!(ledger.get("mp5", ResourceKind::Mana), 15.0);
        assert_eq!(ledger.iter().count(), 1);
        assert!(parse_resource("mana").is_ok());
        assert_eq!(
            parse_resource("gold"),
            Err(ResourceError::Unknown("gold".to_string()))
        );
    }
}
