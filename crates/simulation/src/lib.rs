//! Deterministic combat simulation driver.
//!
//! Given the same seed and configuration, a run produces identical results
//! regardless of the scheduler backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Simulation                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Scheduler (list / heap / wheel)                │ │
//! │  │     Ordered by: time, creation id                  │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ pop                         │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     pipeline: ready → cast → execute → tick        │ │
//! │  │     actors: Vec<Actor>, actions: Vec<Action>       │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     StatsAggregator → SimulationReport             │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod parallel;
mod pipeline;
mod report;
mod runner;

pub use config::{SimConfig, TargetConfig};
pub use error::{ConfigError, SimulationError};
pub use parallel::run_parallel;
pub use report::{ActorSummary, Anomaly, IterationEnd, IterationSummary, SimulationReport};
pub use runner::{Phase, Simulation, TARGET};
