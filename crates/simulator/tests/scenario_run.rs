//! Running the bundled scenarios end to end.

use raidsim_combat::OptionsError;
use raidsim_simulation::{run_parallel, ConfigError, SimulationError};
use raidsim_simulator::{RunSummary, Scenario, ScenarioError};
use std::path::PathBuf;
use tracing_test::traced_test;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
#[traced_test]
fn test_warlock_scenario_runs() {
    let scenario = Scenario::load(&scenario_path("warlock.toml")).unwrap();
    let (config, roster) = scenario.resolve().unwrap();
    let config = config.with_iterations(8).with_seed(3);

    let report = run_parallel(&config, 2, |config| roster.build(config)).unwrap();
    assert_eq!(report.iterations, 8);
    assert_eq!(report.anomalies().count(), 0);

    let warlock = report.actor("warlock").unwrap();
    assert!(warlock.dps > 0.0);
    let imp = report.actor("imp").unwrap();
    assert!(imp.dps > 0.0);

    assert!(report.record("warlock", "shadow_bolt").is_some());

    let summary = RunSummary::new(config.seed, &report);
    assert_eq!(summary.endings.get("time_limit"), Some(&8));
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["actors"][0]["name"], "warlock");
    assert_eq!(json["seed"], 3);
}

#[test]
fn test_same_seed_same_summary() {
    let scenario = Scenario::load(&scenario_path("warlock.toml")).unwrap();
    let (config, roster) = scenario.resolve().unwrap();
    let config = config.with_iterations(4).with_seed(11);

    let run = || {
        let report = run_parallel(&config, 2, |config| roster.build(config)).unwrap();
        RunSummary::new(config.seed, &report)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_missing_scenario_file() {
    let error = Scenario::load(&scenario_path("missing.toml")).unwrap_err();
    assert!(error.to_string().contains("Failed to read scenario file"));
}

fn mage(action_list: &str, cooldown: f64, proc_duration: f64, max_time_secs: f64) -> Scenario {
    let text = format!(
        r#"
        [sim]
        iterations = 2
        max_time_secs = {max_time_secs:e}

        [[player]]
        name = "mage"
        action_list = "{action_list}"
        resources = {{ mana = 5000.0 }}

        [[player.action]]
        name = "fire_blast"
        kind = "nuke"
        school = "fire"
        min = 400.0
        max = 450.0
        cooldown = {cooldown:e}

        [[player.proc]]
        name = "clearcasting"
        chance = 0.1
        aura = "clearcasting"
        duration = {proc_duration:e}
        "#
    );
    toml::from_str(&text).unwrap()
}

#[test]
fn test_huge_times_are_errors() {
    assert!(mage("fire_blast", 8.0, 15.0, 60.0).resolve().is_ok());

    assert!(matches!(
        mage("fire_blast", 8.0, 15.0, 1e30).resolve(),
        Err(ScenarioError::InvalidTime { name, .. }) if name == "max_time_secs"
    ));
    assert!(matches!(
        mage("fire_blast", 1e30, 15.0, 60.0).resolve(),
        Err(ScenarioError::ActionTable {
            source: OptionsError::InvalidValue { key, .. },
            ..
        }) if key == "cooldown"
    ));
    assert!(matches!(
        mage("fire_blast", 8.0, 1e30, 60.0).resolve(),
        Err(ScenarioError::ActionTable {
            source: OptionsError::InvalidValue { key, .. },
            ..
        }) if key == "duration"
    ));
}

#[test]
fn test_huge_action_list_override_fails_init() {
    let (config, roster) = mage("fire_blast,cooldown=1e30", 8.0, 15.0, 60.0)
        .resolve()
        .unwrap();
    let error = run_parallel(&config.with_seed(1), 1, |config| roster.build(config)).unwrap_err();
    assert!(matches!(
        error,
        SimulationError::Config(ConfigError::Options {
            source: OptionsError::InvalidValue { .. },
            ..
        })
    ));
}
