//! Cumulative statistics across iterations.

use crate::{Distribution, StatsRecord};
use indexmap::IndexMap;
use raidsim_types::{ActorId, DamageKind, ResultKind};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Stable handle to a [`StatsRecord`] inside its aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(usize);

/// End of the most recent execution window of one actor.
#[derive(Debug, Clone, Copy)]
struct PacingWindow {
    record: RecordId,
    end: Duration,
}

/// Per-iteration damage of one actor.
#[derive(Debug, Clone, Default)]
pub struct ActorTotals {
    pub name: String,
    /// Damage dealt in each iteration.
    pub damage: Vec<f64>,
    /// Damage per second in each iteration.
    pub dps: Vec<f64>,
}

impl ActorTotals {
    pub fn total_damage(&self) -> f64 {
        self.damage.iter().sum()
    }

    pub fn dps_distribution(&self) -> Distribution {
        Distribution::from_samples(&self.dps)
    }
}

/// Every [`StatsRecord`] of a run plus the pacing-overlap tracker.
///
/// Records are keyed by (actor, action name) and kept in registration order.
/// Execution time for damage-per-execute-time is charged through
/// [`StatsAggregator::charge_execute`]: when an execution window starts before
/// the same actor's previous window has ended, only the part past the end of
/// the previous window is charged, so overlapping time counts once.
///
/// The tracker is scoped per actor and cleared by
/// [`StatsAggregator::begin_iteration`] rather than shared across the whole
/// run: actors pace independently, and virtual time restarts at zero each
/// iteration, so a window from an earlier iteration would wrongly absorb the
/// first execution of the next one.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    records: IndexMap<(ActorId, String), StatsRecord>,
    pacing: HashMap<ActorId, PacingWindow>,
    actors: IndexMap<ActorId, ActorTotals>,
    iterations: u64,
    total_time: Duration,
    timeline_window: usize,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl StatsAggregator {
    /// Create an empty aggregator smoothing timelines over `timeline_window`
    /// one-second buckets.
    pub fn new(timeline_window: usize) -> Self {
        Self {
            records: IndexMap::new(),
            pacing: HashMap::new(),
            actors: IndexMap::new(),
            iterations: 0,
            total_time: Duration::ZERO,
            timeline_window,
        }
    }

    /// Record for (actor, action), created on first use.
    pub fn register(&mut self, actor: ActorId, action: &str, channeled: bool) -> RecordId {
        let entry = self.records.entry((actor, action.to_string()));
        let index = entry.index();
        entry.or_insert_with(|| StatsRecord::new(actor, action, channeled));
        RecordId(index)
    }

    /// Handle of an existing record.
    pub fn find(&self, actor: ActorId, action: &str) -> Option<RecordId> {
        self.records
            .get_index_of(&(actor, action.to_string()))
            .map(RecordId)
    }

    pub fn record(&self, id: RecordId) -> Option<&StatsRecord> {
        self.records.get_index(id.0).map(|(_, record)| record)
    }

    /// Look up a record by actor and action name.
    pub fn get(&self, actor: ActorId, action: &str) -> Option<&StatsRecord> {
        self.records.get(&(actor, action.to_string()))
    }

    /// All records in registration order.
    pub fn records(&self) -> impl Iterator<Item = &StatsRecord> {
        self.records.values()
    }

    /// Records of one actor.
    pub fn records_of(&self, actor: ActorId) -> impl Iterator<Item = &StatsRecord> {
        self.records.values().filter(move |r| r.actor() == actor)
    }

    /// Record one outcome. Unknown handles are ignored.
    pub fn add(
        &mut self,
        id: RecordId,
        amount: f64,
        kind: DamageKind,
        result: ResultKind,
        time: Duration,
    ) {
        if let Some((_, record)) = self.records.get_index_mut(id.0) {
            record.add(amount, kind, result, time);
        }
    }

    /// Charge an execution window `[start, start + window)` to a record.
    pub fn charge_execute(&mut self, id: RecordId, start: Duration, window: Duration) {
        let Some((_, record)) = self.records.get_index_mut(id.0) else {
            return;
        };
        let actor = record.actor();
        let end = start + window;

        let charged = match self.pacing.get(&actor) {
            Some(last) if last.end > start => {
                trace!(
                    %actor,
                    overlap = ?(last.end.min(end) - start),
                    previous = last.record.0,
                    "Execution window overlaps previous one"
                );
                end.saturating_sub(last.end)
            }
            _ => window,
        };
        record.charge_time(charged);

        let end = match self.pacing.get(&actor) {
            Some(last) => last.end.max(end),
            None => end,
        };
        self.pacing.insert(actor, PacingWindow { record: id, end });
    }

    /// Start a new iteration. Virtual time restarts at zero.
    pub fn begin_iteration(&mut self) {
        self.pacing.clear();
    }

    /// Close an iteration of length `elapsed` with each actor's damage.
    pub fn end_iteration<'a>(
        &mut self,
        elapsed: Duration,
        damage: impl IntoIterator<Item = (ActorId, &'a str, f64)>,
    ) {
        self.iterations += 1;
        self.total_time += elapsed;
        let seconds = elapsed.as_secs_f64();
        for (actor, name, amount) in damage {
            let totals = self.actors.entry(actor).or_insert_with(|| ActorTotals {
                name: name.to_string(),
                ..ActorTotals::default()
            });
            totals.damage.push(amount);
            totals
                .dps
                .push(if seconds > 0.0 { amount / seconds } else { 0.0 });
        }
    }

    /// Compute derived rates on every record.
    pub fn analyze(&mut self) {
        let seconds = self.total_time.as_secs_f64();
        for record in self.records.values_mut() {
            record.analyze(seconds, self.iterations, self.timeline_window);
        }
        debug!(
            records = self.records.len(),
            iterations = self.iterations,
            seconds,
            "Stats analyzed"
        );
    }

    /// Fold another aggregator's results into this one.
    ///
    /// Records are matched by (actor, action); per-actor iteration samples are
    /// appended. Call [`StatsAggregator::analyze`] again afterwards.
    pub fn merge(&mut self, other: &StatsAggregator) {
        for ((actor, action), record) in &other.records {
            let id = self.register(*actor, action, record.channeled());
            if let Some((_, mine)) = self.records.get_index_mut(id.0) {
                mine.merge(record);
            }
        }
        for (actor, totals) in &other.actors {
            let mine = self.actors.entry(*actor).or_insert_with(|| ActorTotals {
                name: totals.name.clone(),
                ..ActorTotals::default()
            });
            mine.damage.extend_from_slice(&totals.damage);
            mine.dps.extend_from_slice(&totals.dps);
        }
        self.iterations += other.iterations;
        self.total_time += other.total_time;
    }

    pub fn actor_totals(&self, actor: ActorId) -> Option<&ActorTotals> {
        self.actors.get(&actor)
    }

    /// Iterations closed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Virtual time summed over all iterations.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
