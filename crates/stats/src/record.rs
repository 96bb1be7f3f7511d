//! Per-action statistics.

use raidsim_types::{ActorId, DamageKind, ResultKind};
use std::time::Duration;

/// Running count/min/max/sum for one result kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResultStats {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
}

impl ResultStats {
    fn add(&mut self, amount: f64) {
        if self.count == 0 {
            self.min = amount;
            self.max = amount;
        } else {
            self.min = self.min.min(amount);
            self.max = self.max.max(amount);
        }
        self.count += 1;
        self.total += amount;
    }

    fn merge(&mut self, other: &ResultStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count += other.count;
        self.total += other.total;
    }

    /// Mean amount, 0 when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Outcomes of one action of one actor, accumulated over every iteration.
#[derive(Debug, Clone)]
pub struct StatsRecord {
    name: String,
    actor: ActorId,
    channeled: bool,

    num_executes: u64,
    num_ticks: u64,
    total_execute_time: Duration,
    total_dmg: f64,

    execute_results: [ResultStats; ResultKind::COUNT],
    tick_results: [ResultStats; ResultKind::COUNT],

    /// Damage per one-second bucket of virtual time, summed over iterations.
    timeline_dmg: Vec<f64>,

    // Filled by analyze().
    dps: f64,
    dpe: f64,
    dpet: f64,
    timeline_dps: Vec<f64>,
}

impl StatsRecord {
    pub(crate) fn new(actor: ActorId, name: &str, channeled: bool) -> Self {
        Self {
            name: name.to_string(),
            actor,
            channeled,
            num_executes: 0,
            num_ticks: 0,
            total_execute_time: Duration::ZERO,
            total_dmg: 0.0,
            execute_results: [ResultStats::default(); ResultKind::COUNT],
            tick_results: [ResultStats::default(); ResultKind::COUNT],
            timeline_dmg: Vec::new(),
            dps: 0.0,
            dpe: 0.0,
            dpet: 0.0,
            timeline_dps: Vec::new(),
        }
    }

    /// Record one outcome sampled at virtual time `time`.
    pub(crate) fn add(&mut self, amount: f64, kind: DamageKind, result: ResultKind, time: Duration) {
        let bucket = match kind {
            DamageKind::Direct => {
                self.num_executes += 1;
                &mut self.execute_results[result.index()]
            }
            DamageKind::OverTime => {
                self.num_ticks += 1;
                &mut self.tick_results[result.index()]
            }
        };
        bucket.add(amount);
        self.total_dmg += amount;

        let second = time.as_secs() as usize;
        if self.timeline_dmg.len() <= second {
            self.timeline_dmg.resize(second + 1, 0.0);
        }
        self.timeline_dmg[second] += amount;
    }

    pub(crate) fn charge_time(&mut self, time: Duration) {
        self.total_execute_time += time;
    }

    pub(crate) fn merge(&mut self, other: &StatsRecord) {
        self.num_executes += other.num_executes;
        self.num_ticks += other.num_ticks;
        self.total_execute_time += other.total_execute_time;
        self.total_dmg += other.total_dmg;
        for (mine, theirs) in self.execute_results.iter_mut().zip(&other.execute_results) {
            mine.merge(theirs);
        }
        for (mine, theirs) in self.tick_results.iter_mut().zip(&other.tick_results) {
            mine.merge(theirs);
        }
        if self.timeline_dmg.len() < other.timeline_dmg.len() {
            self.timeline_dmg.resize(other.timeline_dmg.len(), 0.0);
        }
        for (mine, theirs) in self.timeline_dmg.iter_mut().zip(&other.timeline_dmg) {
            *mine += theirs;
        }
    }

    /// Compute the derived rates.
    ///
    /// `total_seconds` is virtual time summed over all iterations. Every
    /// divisor is guarded: an empty record analyzes to zeros.
    pub(crate) fn analyze(&mut self, total_seconds: f64, iterations: u64, window: usize) {
        self.dps = if total_seconds > 0.0 {
            self.total_dmg / total_seconds
        } else {
            0.0
        };
        self.dpe = if self.num_executes > 0 {
            self.total_dmg / self.num_executes as f64
        } else {
            0.0
        };
        let execute_secs = self.total_execute_time.as_secs_f64();
        self.dpet = if execute_secs > 0.0 {
            self.total_dmg / execute_secs
        } else {
            0.0
        };

        let window = window.max(1);
        let half = window / 2;
        let per_iteration = iterations.max(1) as f64;
        self.timeline_dps = (0..self.timeline_dmg.len())
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(self.timeline_dmg.len());
                let sum: f64 = self.timeline_dmg[lo..hi].iter().sum();
                sum / ((hi - lo) as f64 * per_iteration)
            })
            .collect();
    }

    /// Action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning actor.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Whether the action channels.
    pub fn channeled(&self) -> bool {
        self.channeled
    }

    /// Direct executions recorded.
    pub fn num_executes(&self) -> u64 {
        self.num_executes
    }

    /// Periodic ticks recorded.
    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Virtual time attributed to this action's executions.
    pub fn total_execute_time(&self) -> Duration {
        self.total_execute_time
    }

    /// Total damage over every iteration.
    pub fn total_dmg(&self) -> f64 {
        self.total_dmg
    }

    /// Direct-outcome bucket.
    pub fn execute_result(&self, result: ResultKind) -> &ResultStats {
        &self.execute_results[result.index()]
    }

    /// Tick-outcome bucket.
    pub fn tick_result(&self, result: ResultKind) -> &ResultStats {
        &self.tick_results[result.index()]
    }

    /// Damage per virtual second (after analyze).
    pub fn dps(&self) -> f64 {
        self.dps
    }

    /// Damage per execute (after analyze).
    pub fn dpe(&self) -> f64 {
        self.dpe
    }

    /// Damage per second of attributed execute time (after analyze).
    pub fn dpet(&self) -> f64 {
        self.dpet
    }

    /// Per-second damage summed over iterations.
    pub fn timeline_dmg(&self) -> &[f64] {
        &self.timeline_dmg
    }

    /// Smoothed per-iteration damage rate (after analyze).
    pub fn timeline_dps(&self) -> &[f64] {
        &self.timeline_dps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_buckets_by_kind_and_result() {
        let mut record = StatsRecord::new(ActorId(0), "fireball", false);
        record.add(100.0, DamageKind::Direct, ResultKind::Hit, Duration::ZERO);
        record.add(
            250.0,
            DamageKind::Direct,
            ResultKind::Crit,
            Duration::from_millis(1500),
        );
        record.add(
            0.0,
            DamageKind::Direct,
            ResultKind::Miss,
            Duration::from_secs(3),
        );
        record.add(
            20.0,
            DamageKind::OverTime,
            ResultKind::Hit,
            Duration::from_secs(3),
        );

        assert_eq!(record.num_executes(), 3);
        assert_eq!(record.num_ticks(), 1);
        assert_eq!(record.execute_result(ResultKind::Hit).count, 1);
        assert_eq!(record.execute_result(ResultKind::Crit).max, 250.0);
        assert_eq!(record.execute_result(ResultKind::Miss).count, 1);
        assert_eq!(record.tick_result(ResultKind::Hit).total, 20.0);
        assert_eq!(record.total_dmg(), 370.0);
        assert_eq!(record.timeline_dmg(), &[100.0, 250.0, 0.0, 20.0]);
    }

    #[test]
    fn test_result_stats_min_max() {
        let mut stats = ResultStats::default();
        for amount in [30.0, 10.0, 20.0] {
            stats.add(amount);
        }
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.average(), 20.0);
        assert_eq!(ResultStats::default().average(), 0.0);
    }

    #[test]
    fn test_analyze_empty_record_is_zero() {
        let mut record = StatsRecord::new(ActorId(0), "idle", false);
        record.analyze(0.0, 0, 10);
        assert_eq!(record.dps(), 0.0);
        assert_eq!(record.dpe(), 0.0);
        assert_eq!(record.dpet(), 0.0);
        assert!(record.timeline_dps().is_empty());
    }

    #[test]
    fn test_analyze_rates() {
        let mut record = StatsRecord::new(ActorId(0), "strike", false);
        record.add(100.0, DamageKind::Direct, ResultKind::Hit, Duration::ZERO);
        record.add(
            100.0,
            DamageKind::Direct,
            ResultKind::Hit,
            Duration::from_secs(2),
        );
        record.charge_time(Duration::from_secs(4));
        record.analyze(10.0, 1, 1);

        assert_eq!(record.dps(), 20.0);
        assert_eq!(record.dpe(), 100.0);
        assert_eq!(record.dpet(), 50.0);
        assert_eq!(record.timeline_dps(), &[100.0, 0.0, 100.0]);
    }
}
