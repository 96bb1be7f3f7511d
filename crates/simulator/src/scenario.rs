//! Scenario files.
//!
//! A scenario is a TOML document describing the run settings, the target and
//! every player with its pets:
//!
//! ```toml
//! [sim]
//! iterations = 1000
//! max_time_secs = 300.0
//! scheduler = "wheel"
//!
//! [target]
//! level = 73
//! armor = 7700.0
//!
//! [[player]]
//! name = "warlock"
//! action_list = "corruption/shadow_bolt"
//! resources = { mana = 8000.0 }
//!
//! [[player.action]]
//! name = "shadow_bolt"
//! kind = "nuke"
//! min = 544.0
//! max = 607.0
//! cast_time = 2.5
//! cost = 420.0
//! ```

use crate::factory::{ActionTemplate, ProcTemplate, TableActor};
use anyhow::{Context, Result};
use raidsim_combat::{ActorConfig, OptionsError};
use raidsim_core::{SchedulerKind, WheelConfig};
use raidsim_simulation::{SimConfig, Simulation, SimulationError, TargetConfig};
use raidsim_types::{Patch, PatchParseError, ResourceKind, ResourceMap, School};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A scenario that parses but does not describe a runnable fight.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown school '{0}'")]
    UnknownSchool(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("{0}")]
    Scheduler(String),

    #[error("invalid patch: {0}")]
    Patch(#[from] PatchParseError),

    #[error("action '{action}' of '{actor}' has invalid min_patch: {source}")]
    ActionPatch {
        actor: String,
        action: String,
        #[source]
        source: PatchParseError,
    },

    #[error("actor '{actor}' has an invalid action table: {source}")]
    ActionTable {
        actor: String,
        #[source]
        source: OptionsError,
    },

    #[error("{name} must be a non-negative number of seconds, got {value}")]
    InvalidTime { name: String, value: f64 },

    #[error("duplicate actor name '{0}'")]
    DuplicateActor(String),

    #[error("scenario has no players")]
    NoPlayers,
}

/// Root of a scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub sim: SimSection,

    #[serde(default)]
    pub target: TargetSection,

    #[serde(default, rename = "player")]
    pub players: Vec<PlayerSection>,
}

/// Run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimSection {
    #[serde(default = "default_iterations")]
    pub iterations: u64,

    /// Random seed. Picked at random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// `list`, `priorityq` or `wheel`.
    #[serde(default = "default_scheduler")]
    pub scheduler: String,

    #[serde(default = "default_max_time_secs")]
    pub max_time_secs: f64,

    #[serde(default = "default_max_events")]
    pub max_events: u64,

    /// `arch.version.revision`.
    #[serde(default = "default_patch")]
    pub patch: String,

    #[serde(default = "default_lag_ms")]
    pub lag_ms: u64,

    #[serde(default = "default_regen_interval_ms")]
    pub regen_interval_ms: u64,

    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,

    #[serde(default)]
    pub average_damage: bool,

    /// Resources that never run out for players and pets.
    #[serde(default)]
    pub infinite_resources: Vec<String>,

    #[serde(default = "default_timeline_window")]
    pub timeline_window: usize,

    #[serde(default = "default_wheel_horizon_secs")]
    pub wheel_horizon_secs: f64,

    #[serde(default = "default_wheel_granularity_ms")]
    pub wheel_granularity_ms: u64,
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: None,
            scheduler: default_scheduler(),
            max_time_secs: default_max_time_secs(),
            max_events: default_max_events(),
            patch: default_patch(),
            lag_ms: default_lag_ms(),
            regen_interval_ms: default_regen_interval_ms(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            average_damage: false,
            infinite_resources: Vec::new(),
            timeline_window: default_timeline_window(),
            wheel_horizon_secs: default_wheel_horizon_secs(),
            wheel_granularity_ms: default_wheel_granularity_ms(),
        }
    }
}

fn default_iterations() -> u64 {
    1000
}

fn default_scheduler() -> String {
    "wheel".to_string()
}

fn default_max_time_secs() -> f64 {
    300.0
}

fn default_max_events() -> u64 {
    1_000_000
}

fn default_patch() -> String {
    "2.4.0".to_string()
}

fn default_lag_ms() -> u64 {
    100
}

fn default_regen_interval_ms() -> u64 {
    2000
}

fn default_ready_poll_interval_ms() -> u64 {
    100
}

fn default_timeline_window() -> usize {
    10
}

fn default_wheel_horizon_secs() -> f64 {
    600.0
}

fn default_wheel_granularity_ms() -> u64 {
    100
}

/// The enemy every action is aimed at.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSection {
    #[serde(default = "default_target_name")]
    pub name: String,

    #[serde(default = "default_target_level")]
    pub level: u32,

    /// Resistance by school name.
    #[serde(default)]
    pub resistances: BTreeMap<String, f64>,

    #[serde(default)]
    pub armor: f64,

    #[serde(default)]
    pub block_value: f64,

    /// Health pool. Unkillable when absent.
    #[serde(default)]
    pub health: Option<f64>,

    #[serde(default)]
    pub permanent_auras: Vec<String>,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            name: default_target_name(),
            level: default_target_level(),
            resistances: BTreeMap::new(),
            armor: 0.0,
            block_value: 0.0,
            health: None,
            permanent_auras: Vec::new(),
        }
    }
}

fn default_target_name() -> String {
    "target".to_string()
}

fn default_target_level() -> u32 {
    73
}

/// Combat ratings. Chances are fractions, so 5% hit is `0.05`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatsSection {
    pub gcd_ms: Option<u64>,
    pub haste_rating: f64,
    pub spell_hit: f64,
    pub spell_crit: f64,
    pub spell_power: f64,
    pub spell_penetration: f64,
    pub attack_hit: f64,
    pub attack_crit: f64,
    pub attack_power: f64,
    pub expertise: f64,
    pub crit_bonus: Option<f64>,
    pub spirit: f64,
    pub intellect: f64,
    pub mp5: f64,
}

/// Fields shared by players and pets.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorSection {
    pub name: String,

    #[serde(default)]
    pub level: Option<u32>,

    #[serde(default)]
    pub stats: StatsSection,

    /// Pool maxima by resource name.
    #[serde(default)]
    pub resources: BTreeMap<String, f64>,

    /// Starting amounts that differ from the maxima.
    #[serde(default)]
    pub initial_resources: BTreeMap<String, f64>,

    /// `/`-separated priority list, each entry `name` or `name,key=value`.
    #[serde(default)]
    pub action_list: String,

    #[serde(default)]
    pub permanent_auras: Vec<String>,

    #[serde(default)]
    pub tracked_auras: Vec<String>,

    #[serde(default, rename = "action")]
    pub actions: Vec<ActionTemplate>,

    #[serde(default, rename = "proc")]
    pub procs: Vec<ProcTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSection {
    #[serde(flatten)]
    pub actor: ActorSection,

    #[serde(default, rename = "pet")]
    pub pets: Vec<PetSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetSection {
    #[serde(flatten)]
    pub actor: ActorSection,

    /// Start every iteration dismissed.
    #[serde(default)]
    pub sleeping: bool,

    #[serde(default)]
    pub summon_at_secs: Option<f64>,

    #[serde(default)]
    pub dismiss_at_secs: Option<f64>,
}

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        let scenario: Scenario = toml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;
        Ok(scenario)
    }

    /// Check the scenario and turn it into driver configuration plus the
    /// actors to add to every simulation built from it.
    pub fn resolve(&self) -> Result<(SimConfig, Roster), ScenarioError> {
        let config = self.sim_config()?;

        if self.players.is_empty() {
            return Err(ScenarioError::NoPlayers);
        }
        let mut names: Vec<String> = vec![self.target.name.clone()];
        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let mut setup = ActorSetup::resolve(&player.actor, config.patch)?;
            for pet in &player.pets {
                let mut pet_setup = ActorSetup::resolve(&pet.actor, config.patch)?;
                pet_setup.config = pet_setup.config.with_sleeping(pet.sleeping);
                setup.pets.push(PetSetup {
                    actor: pet_setup,
                    summon_at: pet
                        .summon_at_secs
                        .map(|s| seconds("summon_at_secs", s))
                        .transpose()?,
                    dismiss_at: pet
                        .dismiss_at_secs
                        .map(|s| seconds("dismiss_at_secs", s))
                        .transpose()?,
                });
            }

            for name in std::iter::once(&setup.config.name)
                .chain(setup.pets.iter().map(|p| &p.actor.config.name))
            {
                if names.contains(name) {
                    return Err(ScenarioError::DuplicateActor(name.clone()));
                }
                names.push(name.clone());
            }
            players.push(setup);
        }

        debug!(
            players = players.len(),
            pets = players.iter().map(|p| p.pets.len()).sum::<usize>(),
            scheduler = %config.scheduler,
            "Scenario resolved"
        );
        Ok((config, Roster { players }))
    }

    fn sim_config(&self) -> Result<SimConfig, ScenarioError> {
        let sim = &self.sim;
        let scheduler: SchedulerKind = sim.scheduler.parse().map_err(ScenarioError::Scheduler)?;

        let mut config = SimConfig::default()
            .with_iterations(sim.iterations)
            .with_scheduler(scheduler)
            .with_wheel(WheelConfig {
                horizon: seconds("wheel_horizon_secs", sim.wheel_horizon_secs)?,
                granularity: Duration::from_millis(sim.wheel_granularity_ms),
            })
            .with_max_time(seconds("max_time_secs", sim.max_time_secs)?)
            .with_max_events(sim.max_events)
            .with_patch(sim.patch.parse::<Patch>()?)
            .with_lag(Duration::from_millis(sim.lag_ms))
            .with_regen_interval(Duration::from_millis(sim.regen_interval_ms))
            .with_ready_poll_interval(Duration::from_millis(sim.ready_poll_interval_ms))
            .with_average_damage(sim.average_damage)
            .with_timeline_window(sim.timeline_window)
            .with_target(self.target_config()?);
        if let Some(seed) = sim.seed {
            config = config.with_seed(seed);
        }
        for name in &sim.infinite_resources {
            config = config.with_infinite_resource(resource(name)?);
        }
        Ok(config)
    }

    fn target_config(&self) -> Result<TargetConfig, ScenarioError> {
        let section = &self.target;
        let mut target = TargetConfig {
            name: section.name.clone(),
            block_value: section.block_value,
            permanent_auras: section.permanent_auras.clone(),
            ..TargetConfig::default()
        }
        .with_level(section.level)
        .with_armor(section.armor);
        for (name, value) in &section.resistances {
            let school =
                School::parse(name).ok_or_else(|| ScenarioError::UnknownSchool(name.clone()))?;
            target = target.with_resistance(school, *value);
        }
        if let Some(health) = section.health {
            target = target.with_health(health);
        }
        Ok(target)
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration, ScenarioError> {
    Duration::try_from_secs_f64(value).map_err(|_| ScenarioError::InvalidTime {
        name: name.to_string(),
        value,
    })
}

fn resource(name: &str) -> Result<ResourceKind, ScenarioError> {
    ResourceKind::parse(name).ok_or_else(|| ScenarioError::UnknownResource(name.to_string()))
}

fn resource_map(values: &BTreeMap<String, f64>) -> Result<ResourceMap<f64>, ScenarioError> {
    let mut map = ResourceMap::splat(0.0);
    for (name, value) in values {
        map[resource(name)?] = *value;
    }
    Ok(map)
}

/// One resolved actor: its configuration and action tables.
#[derive(Debug, Clone)]
pub struct ActorSetup {
    pub config: ActorConfig,
    pub behavior: TableActor,
    pub pets: Vec<PetSetup>,
}

impl ActorSetup {
    fn resolve(section: &ActorSection, patch: Patch) -> Result<Self, ScenarioError> {
        for action in &section.actions {
            if let Some(min_patch) = &action.min_patch {
                min_patch
                    .parse::<Patch>()
                    .map_err(|source| ScenarioError::ActionPatch {
                        actor: section.name.clone(),
                        action: action.name.clone(),
                        source,
                    })?;
            }
        }

        let stats = &section.stats;
        let mut config = ActorConfig::new(section.name.clone())
            .with_action_list(section.action_list.clone());
        if let Some(level) = section.level {
            config = config.with_level(level);
        }
        if let Some(gcd) = stats.gcd_ms {
            config = config.with_gcd(Duration::from_millis(gcd));
        }
        config.haste_rating = stats.haste_rating;
        config.spell_hit = stats.spell_hit;
        config.spell_crit = stats.spell_crit;
        config.spell_power = stats.spell_power;
        config.spell_penetration = stats.spell_penetration;
        config.attack_hit = stats.attack_hit;
        config.attack_crit = stats.attack_crit;
        config.attack_power = stats.attack_power;
        config.expertise = stats.expertise;
        if let Some(crit_bonus) = stats.crit_bonus {
            config.crit_bonus = crit_bonus;
        }
        config.spirit = stats.spirit;
        config.intellect = stats.intellect;
        config.mp5 = stats.mp5;

        config.resources = resource_map(&section.resources)?;
        for (name, amount) in &section.initial_resources {
            config = config.with_initial_resource(resource(name)?, *amount);
        }
        config.permanent_auras = section.permanent_auras.clone();
        config.tracked_auras = section.tracked_auras.clone();

        Ok(Self {
            config,
            behavior: TableActor::new(&section.actions, &section.procs, patch).map_err(
                |source| ScenarioError::ActionTable {
                    actor: section.name.clone(),
                    source,
                },
            )?,
            pets: Vec::new(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PetSetup {
    pub actor: ActorSetup,
    pub summon_at: Option<Duration>,
    pub dismiss_at: Option<Duration>,
}

/// Every actor of a scenario, ready to be added to a [`Simulation`].
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub players: Vec<ActorSetup>,
}

impl Roster {
    /// Build a simulation holding every player and pet.
    ///
    /// Usable as the builder of [`raidsim_simulation::run_parallel`].
    pub fn build(&self, config: SimConfig) -> Result<Simulation, SimulationError> {
        let mut sim = Simulation::new(config);
        for player in &self.players {
            let owner = sim.add_player(player.config.clone(), player.behavior.clone())?;
            for pet in &player.pets {
                let id = sim.add_pet(owner, pet.actor.config.clone(), pet.actor.behavior.clone())?;
                if let Some(at) = pet.summon_at {
                    sim.schedule_summon(id, at)?;
                }
                if let Some(at) = pet.dismiss_at {
                    sim.schedule_dismiss(id, at)?;
                }
            }
        }
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARLOCK: &str = r#"
        [sim]
        iterations = 50
        seed = 7
        scheduler = "heap"
        max_time_secs = 120.0
        patch = "2.1.0"
        infinite_resources = ["mana"]

        [target]
        level = 73
        armor = 7700.0
        health = 250000.0
        resistances = { shadow = 75.0 }

        [[player]]
        name = "warlock"
        action_list = "corruption/shadow_bolt"
        resources = { mana = 8000.0, health = 9000.0 }
        tracked_auras = ["shadow_trance"]

        [player.stats]
        spell_power = 1200.0
        spell_crit = 0.15

        [[player.action]]
        name = "corruption"
        kind = "dot"
        ticks = 6
        tick_interval = 3.0
        tick_damage = 150.0

        [[player.action]]
        name = "shadow_bolt"
        kind = "nuke"
        min = 544.0
        max = 607.0
        cast_time = 2.5

        [[player.action]]
        name = "haunt"
        kind = "nuke"
        min_patch = "3.0.2"

        [[player.proc]]
        name = "shadow_trance"
        chance = 0.1
        aura = "shadow_trance"
        duration = 10.0

        [[player.pet]]
        name = "imp"
        sleeping = true
        summon_at_secs = 5.0
        action_list = "firebolt"

        [[player.pet.action]]
        name = "firebolt"
        kind = "nuke"
        school = "fire"
        min = 100.0
        max = 120.0
    "#;

    fn parse(text: &str) -> Scenario {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_resolve_full_scenario() {
        let (config, roster) = parse(WARLOCK).resolve().unwrap();

        assert_eq!(config.iterations, 50);
        assert_eq!(config.seed, 7);
        assert_eq!(config.scheduler, SchedulerKind::PriorityQueue);
        assert_eq!(config.max_time, Duration::from_secs(120));
        assert!(config.patch.before(2, 4, 0));
        assert!(config.infinite_resources[ResourceKind::Mana]);
        assert_eq!(config.target.initial_health, Some(250_000.0));
        assert_eq!(config.target.resistances[School::Shadow.index()], 75.0);

        let warlock = &roster.players[0];
        assert_eq!(warlock.config.resources[ResourceKind::Mana], 8000.0);
        assert_eq!(warlock.config.spell_power, 1200.0);
        assert_eq!(warlock.config.tracked_auras, vec!["shadow_trance"]);
        let names: Vec<&str> = warlock.behavior.action_names().collect();
        assert_eq!(names, vec!["corruption", "shadow_bolt"]);

        let imp = &warlock.pets[0];
        assert!(imp.actor.config.sleeping);
        assert_eq!(imp.summon_at, Some(Duration::from_secs(5)));
        assert_eq!(imp.dismiss_at, None);
    }

    #[test]
    fn test_defaults() {
        let scenario = parse(
            r#"
            [[player]]
            name = "rogue"
            "#,
        );
        let (config, _) = scenario.resolve().unwrap();
        let defaults = SimConfig::default();

        assert_eq!(config.iterations, defaults.iterations);
        assert_eq!(config.seed, defaults.seed);
        assert_eq!(config.scheduler, SchedulerKind::Wheel);
        assert_eq!(config.max_time, defaults.max_time);
        assert_eq!(config.lag, defaults.lag);
        assert_eq!(config.patch, defaults.patch);
        assert_eq!(config.target, defaults.target);
    }

    #[test]
    fn test_rejects_bad_names() {
        let bad_school = parse(
            r#"
            [target]
            resistances = { chaos = 10.0 }
            [[player]]
            name = "mage"
            "#,
        );
        assert!(matches!(
            bad_school.resolve(),
            Err(ScenarioError::UnknownSchool(name)) if name == "chaos"
        ));

        let bad_resource = parse(
            r#"
            [[player]]
            name = "mage"
            resources = { karma = 10.0 }
            "#,
        );
        assert!(matches!(
            bad_resource.resolve(),
            Err(ScenarioError::UnknownResource(name)) if name == "karma"
        ));

        let bad_scheduler = parse(
            r#"
            [sim]
            scheduler = "calendar"
            [[player]]
            name = "mage"
            "#,
        );
        assert!(matches!(
            bad_scheduler.resolve(),
            Err(ScenarioError::Scheduler(_))
        ));
    }

    #[test]
    fn test_rejects_bad_patches() {
        let scenario = parse(
            r#"
            [sim]
            patch = "two"
            [[player]]
            name = "mage"
            "#,
        );
        assert!(matches!(scenario.resolve(), Err(ScenarioError::Patch(_))));

        let scenario = parse(
            r#"
            [[player]]
            name = "mage"
            [[player.action]]
            name = "frostbolt"
            kind = "nuke"
            min_patch = "latest"
            "#,
        );
        assert!(matches!(
            scenario.resolve(),
            Err(ScenarioError::ActionPatch { action, .. }) if action == "frostbolt"
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_empty_rosters() {
        let scenario = parse(
            r#"
            [[player]]
            name = "mage"
            [[player]]
            name = "mage"
            "#,
        );
        assert!(matches!(
            scenario.resolve(),
            Err(ScenarioError::DuplicateActor(name)) if name == "mage"
        ));

        assert!(matches!(
            Scenario::default().resolve(),
            Err(ScenarioError::NoPlayers)
        ));
    }

    #[test]
    fn test_rejects_negative_times() {
        let scenario = parse(
            r#"
            [sim]
            max_time_secs = -1.0
            [[player]]
            name = "mage"
            "#,
        );
        assert!(matches!(
            scenario.resolve(),
            Err(ScenarioError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_roster_builds_players_and_pets() {
        let (config, roster) = parse(WARLOCK).resolve().unwrap();
        let sim = roster.build(config).unwrap();

        let warlock = sim.find_actor("warlock").unwrap();
        let imp = sim.find_actor("imp").unwrap();
        assert_eq!(sim.actor(imp).unwrap().owner(), Some(warlock));
        assert!(sim.actor(imp).unwrap().is_sleeping());
    }
}
