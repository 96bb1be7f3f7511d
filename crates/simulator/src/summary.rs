//! Machine-readable digest of a run.

use hdrhistogram::Histogram;
use raidsim_simulation::{Anomaly, IterationEnd, SimulationReport};
use raidsim_types::ResultKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// DPS samples are recorded in hundredths.
const DPS_SCALE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub iterations: u64,
    pub mean_seconds: f64,
    pub events_processed: u64,
    pub events_skipped: u64,
    /// How many iterations ended for each reason.
    pub endings: BTreeMap<String, u64>,
    pub anomalies: Vec<AnomalySummary>,
    pub actors: Vec<ActorDigest>,
    /// Uptime percentage by aura.
    pub uptimes: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub iteration: u64,
    pub kind: &'static str,
    pub time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorDigest {
    pub name: String,
    pub total_damage: f64,
    pub dps: f64,
    pub dps_error: f64,
    pub dps_min: f64,
    pub dps_max: f64,
    pub dps_p50: f64,
    pub dps_p90: f64,
    pub dps_p99: f64,
    pub actions: Vec<ActionDigest>,
    /// `source:resource` to amount.
    pub gains: BTreeMap<String, f64>,
    pub procs: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDigest {
    pub name: String,
    pub executes: u64,
    pub ticks: u64,
    pub total_damage: f64,
    pub dps: f64,
    pub dpe: f64,
    pub dpet: f64,
    /// Count of every direct result that happened.
    pub results: BTreeMap<ResultKind, u64>,
}

impl RunSummary {
    pub fn new(seed: u64, report: &SimulationReport) -> Self {
        let mut endings = BTreeMap::new();
        for summary in &report.iteration_summaries {
            *endings.entry(ending_name(summary.end).to_string()).or_insert(0) += 1;
        }

        let anomalies = report
            .anomalies()
            .map(|(iteration, anomaly)| match anomaly {
                Anomaly::EventCapReached { time, .. } => AnomalySummary {
                    iteration,
                    kind: "event_cap_reached",
                    time_secs: time.as_secs_f64(),
                },
            })
            .collect();

        let actors = report
            .actors
            .iter()
            .map(|actor| {
                let samples = report
                    .stats
                    .actor_totals(actor.id)
                    .map(|t| t.dps.as_slice())
                    .unwrap_or_default();
                let [dps_p50, dps_p90, dps_p99] = percentiles(samples);

                let actions = report
                    .stats
                    .records_of(actor.id)
                    .map(|record| ActionDigest {
                        name: record.name().to_string(),
                        executes: record.num_executes(),
                        ticks: record.num_ticks(),
                        total_damage: record.total_dmg(),
                        dps: record.dps(),
                        dpe: record.dpe(),
                        dpet: record.dpet(),
                        results: ResultKind::ALL
                            .into_iter()
                            .map(|kind| (kind, record.execute_result(kind).count))
                            .filter(|(_, count)| *count > 0)
                            .collect(),
                    })
                    .collect();

                ActorDigest {
                    name: actor.name.clone(),
                    total_damage: actor.total_damage,
                    dps: actor.dps,
                    dps_error: actor.dps_error,
                    dps_min: actor.dps_min,
                    dps_max: actor.dps_max,
                    dps_p50,
                    dps_p90,
                    dps_p99,
                    actions,
                    gains: actor
                        .gains
                        .iter()
                        .map(|(source, kind, amount)| (format!("{}:{}", source, kind.as_str()), amount))
                        .collect(),
                    procs: actor.procs.iter().map(|(k, v)| (k.clone(), *v)).collect(),
                }
            })
            .collect();

        Self {
            seed,
            iterations: report.iterations,
            mean_seconds: report.mean_seconds(),
            events_processed: report.events_processed,
            events_skipped: report.events_skipped,
            endings,
            anomalies,
            actors,
            uptimes: report
                .uptimes
                .iter()
                .map(|(name, uptime)| (name.to_string(), uptime.percentage()))
                .collect(),
        }
    }
}

impl RunSummary {
    /// Print a human-readable report to stdout.
    pub fn print_summary(&self) {
        println!("\nSimulation Report");
        println!("=================\n");
        println!("  Seed: {}", self.seed);
        println!("  Iterations: {}", self.iterations);
        println!("  Mean fight length: {:.1}s", self.mean_seconds);
        println!(
            "  Events: {} ({} skipped)",
            self.events_processed, self.events_skipped
        );
        for (ending, count) in &self.endings {
            println!("  Ended by {}: {}", ending, count);
        }
        if !self.anomalies.is_empty() {
            println!("  Anomalies: {}", self.anomalies.len());
        }

        for actor in &self.actors {
            println!(
                "\n{}: {:.1} DPS (+/- {:.1}, min {:.1}, max {:.1})",
                actor.name, actor.dps, actor.dps_error, actor.dps_min, actor.dps_max
            );
            println!(
                "  p50 {:.1}  p90 {:.1}  p99 {:.1}",
                actor.dps_p50, actor.dps_p90, actor.dps_p99
            );
            for action in &actor.actions {
                println!(
                    "  {:<20} {:>10.1} dps {:>8} casts {:>8} ticks {:>10.1} dpet",
                    action.name, action.dps, action.executes, action.ticks, action.dpet
                );
            }
            for (name, count) in &actor.procs {
                println!("  proc {}: {}", name, count);
            }
        }

        if !self.uptimes.is_empty() {
            println!("\nUptimes:");
            for (aura, percentage) in &self.uptimes {
                println!("  {:<20} {:>5.1}%", aura, percentage);
            }
        }
        println!();
    }
}

fn ending_name(end: IterationEnd) -> &'static str {
    match end {
        IterationEnd::QueueEmpty => "queue_empty",
        IterationEnd::TimeLimit => "time_limit",
        IterationEnd::EventCap => "event_cap",
        IterationEnd::TargetDefeated => "target_defeated",
    }
}

/// p50, p90 and p99 of DPS samples. Zeros without samples.
fn percentiles(samples: &[f64]) -> [f64; 3] {
    let Ok(mut histogram) = Histogram::<u64>::new(3) else {
        return [0.0; 3];
    };
    for &dps in samples {
        // Out-of-range values only come from non-finite samples.
        let _ = histogram.record((dps.max(0.0) * DPS_SCALE).round() as u64);
    }
    if histogram.len() == 0 {
        return [0.0; 3];
    }
    [0.50, 0.90, 0.99].map(|q| histogram.value_at_quantile(q) as f64 / DPS_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        let [p50, p90, p99] = percentiles(&samples);

        assert!((p50 - 50.0).abs() < 0.1);
        assert!((p90 - 90.0).abs() < 0.1);
        assert!((p99 - 99.0).abs() < 0.1);
    }

    #[test]
    fn test_percentiles_without_samples() {
        assert_eq!(percentiles(&[]), [0.0; 3]);
    }

    #[test]
    fn test_ending_names() {
        assert_eq!(ending_name(IterationEnd::TimeLimit), "time_limit");
        assert_eq!(ending_name(IterationEnd::TargetDefeated), "target_defeated");
    }
}
