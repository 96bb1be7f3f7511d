//! Error types for the simulation driver.

use raidsim_combat::OptionsError;
use raidsim_core::SchedulerError;
use raidsim_types::{ActionId, ActorId, PatchParseError};
use std::time::Duration;
use thiserror::Error;

/// A configuration the driver refuses to run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_time must be greater than zero")]
    ZeroMaxTime,

    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("max_events_per_iteration must be greater than zero")]
    ZeroEventCap,

    #[error("wheel granularity {granularity:?} must be non-zero and no larger than horizon {horizon:?}")]
    InvalidWheel {
        horizon: Duration,
        granularity: Duration,
    },

    #[error("wheel horizon {horizon:?} is shorter than the driver's {name} of {required:?}")]
    WheelHorizonTooShort {
        horizon: Duration,
        name: &'static str,
        required: Duration,
    },

    #[error("invalid patch: {0}")]
    Patch(#[from] PatchParseError),

    #[error("actor '{actor}': {source}")]
    Options {
        actor: String,
        #[source]
        source: OptionsError,
    },

    #[error("actor '{actor}' has no action named '{action}'")]
    UnknownAction { actor: String, action: String },

    #[error("action '{action}' of actor '{actor}' defines no result resolution")]
    MissingResolution { actor: String, action: String },

    #[error("pet owner {0} is not a player")]
    InvalidOwner(ActorId),
}

/// Errors that abort initialisation or a run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("event at {event:?} popped after virtual time reached {now:?}")]
    TimeWentBackwards { now: Duration, event: Duration },

    #[error("simulation must be initialized before it runs")]
    NotInitialized,

    #[error("simulation was already initialized")]
    AlreadyInitialized,

    #[error("no such actor: {0}")]
    UnknownActor(ActorId),

    #[error("{kind} event has no owning actor")]
    MissingOwner { kind: &'static str },

    #[error("no such action: {0}")]
    UnknownAction(ActionId),

    #[error("thread pool: {0}")]
    ThreadPool(String),
}
