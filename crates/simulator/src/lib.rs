//! Scenario-driven combat simulator.
//!
//! Loads a TOML scenario, turns it into a [`raidsim_simulation::Simulation`]
//! per worker thread and digests the merged report.
//!
//! # Example
//!
//! ```ignore
//! use raidsim_simulator::{RunSummary, Scenario};
//! use raidsim_simulation::run_parallel;
//!
//! let scenario = Scenario::load(Path::new("scenarios/warlock.toml"))?;
//! let (config, roster) = scenario.resolve()?;
//! let report = run_parallel(&config, 4, |config| roster.build(config))?;
//!
//! RunSummary::new(config.seed, &report).print_summary();
//! ```

pub mod factory;
pub mod scenario;
pub mod summary;

pub use factory::{ActionTemplate, ProcTemplate, TableActor, TemplateKind};
pub use scenario::{ActorSetup, PetSetup, Roster, Scenario, ScenarioError};
pub use summary::{ActionDigest, ActorDigest, AnomalySummary, RunSummary};
