//! Same seed, same results: across repeated runs, scheduler backends and
//! thread counts.

use raidsim_combat::ActionDef;
use raidsim_core::SchedulerKind;
use raidsim_simulation::{run_parallel, SimConfig, Simulation, SimulationError, SimulationReport};
use raidsim_test_helpers::{caster, dot, ScriptedActor};
use raidsim_types::{ResourceKind, School};
use std::time::Duration;

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn scenario_config(seed: u64) -> SimConfig {
    SimConfig::default()
        .with_iterations(20)
        .with_seed(seed)
        .with_max_time(secs(60.0))
}

/// A caster with a randomly rolled nuke and a rolled periodic spell.
fn build(config: SimConfig) -> Result<Simulation, SimulationError> {
    let shadow_bolt = ActionDef::spell("shadow_bolt", School::Shadow)
        .with_direct_damage(400.0, 600.0)
        .with_execute_time(secs(2.5))
        .with_cost(ResourceKind::Mana, 300.0);
    let behavior = ScriptedActor::new()
        .with_rolled_action(dot("corruption", 6, secs(3.0), 150.0))
        .with_rolled_action(shadow_bolt);

    let mut sim = Simulation::new(config);
    sim.add_player(
        caster("warlock", "corruption/shadow_bolt", 8000.0),
        behavior,
    )?;
    Ok(sim)
}

fn run(config: SimConfig) -> SimulationReport {
    let mut sim = build(config).unwrap();
    sim.init().unwrap();
    sim.run().unwrap()
}

/// Everything that depends on the random stream.
fn fingerprint(report: &SimulationReport) -> (Vec<(String, u64, u64, f64)>, Vec<f64>) {
    let records = report
        .stats
        .records()
        .map(|r| (r.name().to_string(), r.num_executes(), r.num_ticks(), r.total_dmg()))
        .collect();
    let dps = report.actors.iter().map(|a| a.dps).collect();
    (records, dps)
}

#[test]
fn test_same_seed_same_results() {
    let first = run(scenario_config(42));
    let second = run(scenario_config(42));

    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert_eq!(first.iteration_summaries, second.iteration_summaries);
}

#[test]
fn test_different_seed_different_results() {
    let first = run(scenario_config(1));
    let second = run(scenario_config(2));
    assert_ne!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn test_backends_agree() {
    let reports: Vec<SimulationReport> = SchedulerKind::ALL
        .iter()
        .map(|&kind| run(scenario_config(7).with_scheduler(kind)))
        .collect();

    let expected = fingerprint(&reports[0]);
    for report in &reports[1..] {
        assert_eq!(fingerprint(report), expected);
        assert_eq!(report.iteration_summaries, reports[0].iteration_summaries);
    }
}

#[test]
fn test_single_worker_matches_sequential_run() {
    let config = scenario_config(99);
    let sequential = run(config.clone());
    let parallel = run_parallel(&config, 1, build).unwrap();

    assert_eq!(fingerprint(&parallel), fingerprint(&sequential));
    assert_eq!(parallel.iterations, 20);
}

#[test]
fn test_parallel_runs_are_reproducible() {
    let config = scenario_config(5);
    let first = run_parallel(&config, 4, build).unwrap();
    let second = run_parallel(&config, 4, build).unwrap();

    assert_eq!(first.iterations, 20);
    assert_eq!(first.iteration_summaries.len(), 20);
    let indexes: Vec<u64> = first.iteration_summaries.iter().map(|s| s.index).collect();
    assert_eq!(indexes, (0..20).collect::<Vec<u64>>());
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn test_parallel_build_errors_propagate() {
    let config = scenario_config(5);
    let result = run_parallel(&config, 2, |config| {
        let mut sim = Simulation::new(config);
        sim.add_player(
            caster("warlock", "unknown_spell", 100.0),
            ScriptedActor::new(),
        )?;
        Ok(sim)
    });
    assert!(matches!(result, Err(SimulationError::Config(_))));
}
