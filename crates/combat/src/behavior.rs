//! Collaborator hooks.
//!
//! Game-specific behaviour plugs into the engine through two traits:
//!
//! - [`ActionBehavior`]: one per concrete action; supplies its resolution
//!   model and the timing, cost and modifier phases.
//! - [`ActorBehavior`]: one per actor; supplies base stats, regeneration,
//!   the action factory and per-phase callbacks.
//!
//! The engine calls these at fixed points of the resolution pipeline and never
//! depends on what they do internally.

use crate::{default_regen, ActionDef, Actor, Modifiers, OptionsError, Resolution};
use raidsim_core::{EventSink, SchedulerError};
use raidsim_types::{ActionId, ActionType, DamageKind, ResultKind};
use rand::RngCore;
use std::time::Duration;

/// Result of a hook that may schedule events.
pub type HookResult = Result<(), SchedulerError>;

/// Read-only view for action phases.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub def: &'a ActionDef,
    pub actor: &'a Actor,
    pub target: &'a Actor,
    pub now: Duration,
}

/// Per-action behaviour.
pub trait ActionBehavior: Send {
    /// How this action rolls its result.
    ///
    /// `None` means the action cannot resolve, which `init()` rejects. The
    /// default derives the model from the action type; `Other` has none.
    fn resolution(&self, def: &ActionDef) -> Option<Resolution> {
        match def.action_type {
            ActionType::Spell => Some(Resolution::Spell),
            ActionType::Attack => Some(Resolution::Attack),
            ActionType::Other => None,
        }
    }

    /// Cast time, hasted by default.
    fn execute_time(&self, ctx: &ActionContext<'_>) -> Duration {
        ctx.def.execute_time.div_f64(ctx.actor.config().haste())
    }

    /// Resource cost.
    fn cost(&self, ctx: &ActionContext<'_>) -> f64 {
        ctx.def.base_cost
    }

    /// Extra readiness condition.
    fn ready(&self, _ctx: &ActionContext<'_>) -> bool {
        true
    }

    /// Adjustments from the acting actor's state. Evaluated at resolution.
    fn player_buff(&self, _ctx: &ActionContext<'_>) -> Modifiers {
        Modifiers::default()
    }

    /// Adjustments from the target's state. Evaluated at resolution.
    fn target_debuff(&self, _ctx: &ActionContext<'_>) -> Modifiers {
        Modifiers::default()
    }
}

/// The default behaviour: everything comes from the [`ActionDef`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl ActionBehavior for DefaultBehavior {}

/// Behaviour that always resolves to a fixed result.
#[derive(Debug, Clone, Copy)]
pub struct FixedResult(pub ResultKind);

impl Default for FixedResult {
    fn default() -> Self {
        Self(ResultKind::Hit)
    }
}

impl ActionBehavior for FixedResult {
    fn resolution(&self, _def: &ActionDef) -> Option<Resolution> {
        Some(Resolution::Fixed(self.0))
    }
}

/// An action produced by a factory.
pub struct ActionSpec {
    pub def: ActionDef,
    pub behavior: Box<dyn ActionBehavior>,
}

impl ActionSpec {
    pub fn new(def: ActionDef, behavior: impl ActionBehavior + 'static) -> Self {
        Self {
            def,
            behavior: Box::new(behavior),
        }
    }
}

/// What an action just did, as seen by hooks.
#[derive(Debug, Clone, Copy)]
pub struct ActionOutcome<'a> {
    pub action: ActionId,
    pub def: &'a ActionDef,
    pub result: ResultKind,
    pub kind: DamageKind,
    pub amount: f64,
}

/// Mutable access handed to actor hooks.
pub struct HookContext<'a> {
    pub actor: &'a mut Actor,
    pub target: &'a mut Actor,
    pub sink: EventSink<'a>,
    pub rng: &'a mut dyn RngCore,
}

impl HookContext<'_> {
    pub fn now(&self) -> Duration {
        self.sink.now()
    }

    /// Apply or refresh an aura on the acting actor.
    pub fn buff(&mut self, name: &str, stacks: u32, duration: Duration) -> HookResult {
        let owner = self.actor.id();
        self.actor
            .auras
            .apply(&mut self.sink, owner, name, stacks, duration)?;
        Ok(())
    }

    /// Apply or refresh an aura on the target.
    pub fn debuff(&mut self, name: &str, stacks: u32, duration: Duration) -> HookResult {
        let owner = self.target.id();
        self.target
            .auras
            .apply(&mut self.sink, owner, name, stacks, duration)?;
        Ok(())
    }
}

/// Per-actor behaviour.
///
/// Every method has a default so simple actors only implement the factory.
pub trait ActorBehavior: Send {
    /// Create the action named in the action list, or `None` if this actor
    /// does not know it.
    fn create_action(
        &self,
        _actor: &Actor,
        _name: &str,
        _options: &str,
    ) -> Result<Option<ActionSpec>, OptionsError> {
        Ok(None)
    }

    /// Derive base stats from configuration. Called once by `init()`.
    fn init_base(&mut self, _actor: &mut Actor) {}

    /// Reset collaborator state at iteration start.
    fn reset(&mut self, _actor: &mut Actor) {}

    /// Regenerate resources over `elapsed`.
    fn regen(&mut self, actor: &mut Actor, now: Duration, elapsed: Duration) {
        default_regen(actor, now, elapsed);
    }

    fn on_start(&mut self, _ctx: &mut HookContext<'_>, _action: ActionId, _def: &ActionDef) -> HookResult {
        Ok(())
    }

    fn on_miss(&mut self, _ctx: &mut HookContext<'_>, _outcome: &ActionOutcome<'_>) -> HookResult {
        Ok(())
    }

    fn on_hit(&mut self, _ctx: &mut HookContext<'_>, _outcome: &ActionOutcome<'_>) -> HookResult {
        Ok(())
    }

    fn on_tick(&mut self, _ctx: &mut HookContext<'_>, _outcome: &ActionOutcome<'_>) -> HookResult {
        Ok(())
    }

    /// Damage landed on the target.
    fn on_damage(&mut self, _ctx: &mut HookContext<'_>, _outcome: &ActionOutcome<'_>) -> HookResult {
        Ok(())
    }

    fn on_finish(&mut self, _ctx: &mut HookContext<'_>, _action: ActionId, _def: &ActionDef) -> HookResult {
        Ok(())
    }

    /// A [`raidsim_core::EventKind::Custom`] event owned by this actor fired.
    fn on_custom_event(&mut self, _ctx: &mut HookContext<'_>, _tag: u64) -> HookResult {
        Ok(())
    }
}

/// Actor with no extra behaviour and no actions of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveActor;

impl ActorBehavior for PassiveActor {}

#[cfg(test)]
mod tests {
    use super::*;
    use raidsim_types::School;

    #[test]
    fn test_default_resolution_by_type() {
        let behavior = DefaultBehavior;
        assert_eq!(
            behavior.resolution(&ActionDef::spell("smite", School::Holy)),
            Some(Resolution::Spell)
        );
        assert_eq!(
            behavior.resolution(&ActionDef::attack("slam")),
            Some(Resolution::Attack)
        );
        assert_eq!(
            behavior.resolution(&ActionDef::other("wand", School::Shadow)),
            None
        );
        assert_eq!(
            FixedResult::default().resolution(&ActionDef::other("wand", School::Shadow)),
            Some(Resolution::Fixed(ResultKind::Hit))
        );
    }
}
