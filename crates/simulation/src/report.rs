//! Read-only results of a run.

use indexmap::IndexMap;
use raidsim_combat::{Actor, Ledger};
use raidsim_stats::{ActorTotals, StatsAggregator, StatsRecord, Uptimes};
use raidsim_types::ActorId;
use std::time::Duration;

/// Why an iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationEnd {
    /// Nothing left to process.
    QueueEmpty,
    /// The next event lies past `max_time`.
    TimeLimit,
    /// The per-iteration event cap was hit.
    EventCap,
    /// The target's health reached zero.
    TargetDefeated,
}

/// Something abnormal that did not abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// Event processing stopped at the safety cap.
    EventCapReached { cap: u64, time: Duration },
}

/// Outcome of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSummary {
    pub index: u64,
    /// Virtual time credited to the iteration.
    pub end_time: Duration,
    /// Events popped, invalidated ones included.
    pub events_processed: u64,
    /// Invalidated events popped without executing.
    pub events_skipped: u64,
    pub end: IterationEnd,
    pub anomaly: Option<Anomaly>,
}

/// Per-actor totals over every iteration.
#[derive(Debug, Clone)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
    pub total_damage: f64,
    /// Mean damage per second over iterations.
    pub dps: f64,
    pub dps_min: f64,
    pub dps_max: f64,
    /// 95% confidence half-width of `dps`.
    pub dps_error: f64,
    pub gains: Ledger,
    pub losses: Ledger,
    pub procs: IndexMap<String, u64>,
}

impl ActorSummary {
    pub(crate) fn new(actor: &Actor, totals: Option<&ActorTotals>) -> Self {
        let mut summary = Self {
            id: actor.id(),
            name: actor.name().to_string(),
            total_damage: 0.0,
            dps: 0.0,
            dps_min: 0.0,
            dps_max: 0.0,
            dps_error: 0.0,
            gains: actor.gains().clone(),
            losses: actor.losses().clone(),
            procs: actor.procs().clone(),
        };
        summary.refresh(totals);
        summary
    }

    fn refresh(&mut self, totals: Option<&ActorTotals>) {
        let Some(totals) = totals else {
            return;
        };
        let dps = totals.dps_distribution();
        self.total_damage = totals.total_damage();
        self.dps = dps.mean;
        self.dps_min = dps.min;
        self.dps_max = dps.max;
        self.dps_error = dps.error;
    }

    fn merge(&mut self, other: &ActorSummary) {
        self.gains.merge(&other.gains);
        self.losses.merge(&other.losses);
        for (name, count) in &other.procs {
            *self.procs.entry(name.clone()).or_insert(0) += count;
        }
    }
}

/// Everything a run produced.
///
/// Formatting is left to the caller.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub iterations: u64,
    /// Virtual time summed over iterations.
    pub total_time: Duration,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub iteration_summaries: Vec<IterationSummary>,
    /// Players and pets, in creation order.
    pub actors: Vec<ActorSummary>,
    /// Analysed statistics.
    pub stats: StatsAggregator,
    pub uptimes: Uptimes,
}

impl SimulationReport {
    /// Iterations that recorded an anomaly.
    pub fn anomalies(&self) -> impl Iterator<Item = (u64, &Anomaly)> {
        self.iteration_summaries
            .iter()
            .filter_map(|s| s.anomaly.as_ref().map(|a| (s.index, a)))
    }

    /// Summary of a named actor.
    pub fn actor(&self, name: &str) -> Option<&ActorSummary> {
        self.actors.iter().find(|a| a.name == name)
    }

    /// Stats record of an actor's action, looked up by names.
    pub fn record(&self, actor: &str, action: &str) -> Option<&StatsRecord> {
        let id = self.actor(actor)?.id;
        self.stats.get(id, action)
    }

    /// Mean iteration length in seconds.
    pub fn mean_seconds(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() / self.iterations as f64
        }
    }

    /// Append another run of the same scenario.
    ///
    /// Iteration indexes of `other` continue after this report's. Statistics
    /// are re-analysed and DPS figures recomputed from the merged samples.
    pub fn merge(&mut self, other: SimulationReport) {
        let offset = self.iterations;
        self.iteration_summaries
            .extend(other.iteration_summaries.into_iter().map(|mut s| {
                s.index += offset;
                s
            }));
        self.iterations += other.iterations;
        self.total_time += other.total_time;
        self.events_processed += other.events_processed;
        self.events_skipped += other.events_skipped;

        self.stats.merge(&other.stats);
        self.stats.analyze();
        self.uptimes.merge(&other.uptimes);

        for theirs in &other.actors {
            match self.actors.iter_mut().find(|a| a.id == theirs.id) {
                Some(mine) => mine.merge(theirs),
                None => self.actors.push(theirs.clone()),
            }
        }
        for actor in &mut self.actors {
            let totals = self.stats.actor_totals(actor.id);
            actor.refresh(totals);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidsim_combat::{ActorConfig, ActorKind};
    use raidsim_types::{DamageKind, ResultKind};

    fn report(dps: &[f64]) -> SimulationReport {
        let actor = Actor::new(ActorId(1), ActorKind::Player, ActorConfig::new("mage"));
        let mut stats = StatsAggregator::default();
        let record = stats.register(actor.id(), "frostbolt", false);
        for &value in dps {
            stats.begin_iteration();
            stats.add(record, value * 10.0, DamageKind::Direct, ResultKind::Hit, Duration::ZERO);
            stats.end_iteration(Duration::from_secs(10), [(actor.id(), "mage", value * 10.0)]);
        }
        stats.analyze();
        let summary = ActorSummary::new(&actor, stats.actor_totals(actor.id()));
        SimulationReport {
            iterations: dps.len() as u64,
            total_time: Duration::from_secs(10 * dps.len() as u64),
            events_processed: 5,
            events_skipped: 1,
            iteration_summaries: (0..dps.len() as u64)
                .map(|index| IterationSummary {
                    index,
                    end_time: Duration::from_secs(10),
                    events_processed: 5,
                    events_skipped: 1,
                    end: IterationEnd::TimeLimit,
                    anomaly: None,
                })
                .collect(),
            actors: vec![summary],
            stats,
            uptimes: Uptimes::new(),
        }
    }

    #[test]
    fn test_actor_summary_from_totals() {
        let report = report(&[100.0, 200.0]);
        let mage = report.actor("mage").unwrap();
        assert_eq!(mage.total_damage, 3000.0);
        assert_eq!(mage.dps, 150.0);
        assert_eq!(mage.dps_min, 100.0);
        assert_eq!(mage.dps_max, 200.0);
        assert!(report.actor("priest").is_none());
        assert_eq!(report.record("mage", "frostbolt").unwrap().num_executes(), 2);
        assert!(report.record("mage", "fireball").is_none());
    }

    #[test]
    fn test_merge_recomputes_dps() {
        let mut merged = report(&[100.0]);
        merged.merge(report(&[300.0]));

        assert_eq!(merged.iterations, 2);
        assert_eq!(merged.events_processed, 10);
        let indexes: Vec<u64> = merged.iteration_summaries.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 1]);

        let mage = merged.actor("mage").unwrap();
        assert_eq!(mage.dps, 200.0);
        assert_eq!(mage.total_damage, 4000.0);
        assert_eq!(merged.record("mage", "frostbolt").unwrap().num_executes(), 2);
        assert_eq!(merged.mean_seconds(), 10.0);
    }

    #[test]
    fn test_anomalies_are_listed() {
        let mut report = report(&[100.0, 100.0]);
        report.iteration_summaries[1].anomaly = Some(Anomaly::EventCapReached {
            cap: 5,
            time: Duration::from_secs(3),
        });
        let anomalies: Vec<_> = report.anomalies().collect();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].0, 1);
    }
}
