//! Spread iterations of one scenario over a thread pool.
//!
//! Every worker builds its own [`Simulation`] with a derived seed, so no
//! state is shared between threads. Reports are merged in worker order,
//! which keeps the merged result independent of scheduling.

use crate::{SimConfig, Simulation, SimulationError, SimulationReport};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

/// Iteration share and seed of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkerPlan {
    index: u64,
    iterations: u64,
    seed: u64,
}

/// Split `iterations` over at most `threads` workers.
///
/// Earlier workers take the remainder. Worker `i` runs with `seed + i`.
fn plan(iterations: u64, seed: u64, threads: usize) -> Vec<WorkerPlan> {
    let workers = (threads.max(1) as u64).min(iterations.max(1));
    let share = iterations / workers;
    let remainder = iterations % workers;
    (0..workers)
        .map(|index| WorkerPlan {
            index,
            iterations: share + u64::from(index < remainder),
            seed: seed.wrapping_add(index),
        })
        .collect()
}

/// Run `config.iterations` iterations on `threads` workers.
///
/// `build` creates the simulation for one worker from its share of the
/// configuration, adding the actors the scenario needs. It must not call
/// `init`.
pub fn run_parallel<F>(
    config: &SimConfig,
    threads: usize,
    build: F,
) -> Result<SimulationReport, SimulationError>
where
    F: Fn(SimConfig) -> Result<Simulation, SimulationError> + Sync,
{
    let plans = plan(config.iterations, config.seed, threads);
    info!(
        iterations = config.iterations,
        workers = plans.len(),
        "Starting parallel run"
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(plans.len())
        .build()
        .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;

    let reports: Vec<Result<SimulationReport, SimulationError>> = pool.install(|| {
        plans
            .into_par_iter()
            .map(|plan| {
                debug!(
                    worker = plan.index,
                    iterations = plan.iterations,
                    seed = plan.seed,
                    "Worker starting"
                );
                let worker_config = config
                    .clone()
                    .with_iterations(plan.iterations)
                    .with_seed(plan.seed);
                let mut sim = build(worker_config)?;
                sim.init()?;
                sim.run()
            })
            .collect()
    });

    let mut reports = reports.into_iter();
    let mut merged = match reports.next() {
        Some(first) => first?,
        None => return Err(SimulationError::ThreadPool("no workers planned".to_string())),
    };
    for report in reports {
        merged.merge(report?);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_splits_remainder_first() {
        let plans = plan(10, 7, 4);
        let shares: Vec<u64> = plans.iter().map(|p| p.iterations).collect();
        assert_eq!(shares, vec![3, 3, 2, 2]);
        let seeds: Vec<u64> = plans.iter().map(|p| p.seed).collect();
        assert_eq!(seeds, vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_plan_never_exceeds_iterations() {
        let plans = plan(2, 0, 8);
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.iterations == 1));
    }

    #[test]
    fn test_plan_zero_iterations_keeps_one_worker() {
        let plans = plan(0, 0, 4);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].iterations, 0);

        let plans = plan(5, 0, 0);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].iterations, 5);
    }
}
