//! Combat model: the state an event touches when it executes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Actor                                                        │
//! │   config (static) ── Resources ── Auras ── timers ── ledgers │
//! └───────────────▲──────────────────────────────────────────────┘
//!                 │ owner
//! ┌───────────────┴───────────┐      ┌─────────────────────────┐
//! │ Action                    │      │ roll / damage           │
//! │   ActionDef + state       │─────▶│   RollTable, mitigation │
//! │   Box<dyn ActionBehavior> │      └─────────────────────────┘
//! └───────────────────────────┘
//! ```
//!
//! Actors and actions live in arenas owned by the simulation driver and refer
//! to each other by handle. Game-specific behaviour plugs in through
//! [`ActionBehavior`] and [`ActorBehavior`].

mod action;
mod actor;
mod auras;
mod behavior;
mod damage;
mod error;
mod options;
mod resources;
mod roll;

pub use action::{Action, ActionDef, ActionFlags, ActionState, AuraEffect, Modifiers};
pub use actor::{
    default_regen, Actor, ActorConfig, ActorKind, FIVE_SECOND_RULE, MIN_GCD, THINK_TIME,
};
pub use auras::Auras;
pub use behavior::{
    ActionBehavior, ActionContext, ActionOutcome, ActionSpec, ActorBehavior, DefaultBehavior,
    FixedResult, HookContext, HookResult, PassiveActor,
};
pub use damage::{
    apply_result, armor_reduction, mitigation, partial_resist, DamageChain, Defense,
    CRUSH_MULTIPLIER, GLANCE_MULTIPLIER, MAX_MITIGATION,
};
pub use error::{OptionsError, ResourceError};
pub use options::{parse_action_list, ActionEntry, Options};
pub use resources::{parse_resource, Ledger, Resources};
pub use roll::{spell_level_miss, OutcomeChances, Resolution, RollInput, RollTable};
