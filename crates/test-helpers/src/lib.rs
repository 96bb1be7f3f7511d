//! Test helpers for raidsim.
//!
//! Scripted actors whose actions resolve to a fixed result, so integration
//! tests can predict every number the simulation produces.

use raidsim_combat::{
    ActionDef, ActionSpec, Actor, ActorBehavior, ActorConfig, AuraEffect, DefaultBehavior,
    FixedResult, OptionsError,
};
use raidsim_types::{ResourceKind, ResultKind, School};
use std::time::Duration;

/// How a scripted action rolls.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Roll {
    Fixed(ResultKind),
    Table,
}

/// An actor whose factory knows a fixed set of actions.
///
/// Option strings in the action list are ignored.
#[derive(Debug, Clone, Default)]
pub struct ScriptedActor {
    actions: Vec<(ActionDef, Roll)>,
}

impl ScriptedActor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action that always hits.
    pub fn with_action(self, def: ActionDef) -> Self {
        self.with_result(def, ResultKind::Hit)
    }

    /// Add an action that always resolves to `result`.
    pub fn with_result(mut self, def: ActionDef, result: ResultKind) -> Self {
        self.actions.push((def, Roll::Fixed(result)));
        self
    }

    /// Add an action that rolls on the regular tables.
    pub fn with_rolled_action(mut self, def: ActionDef) -> Self {
        self.actions.push((def, Roll::Table));
        self
    }
}

impl ActorBehavior for ScriptedActor {
    fn create_action(
        &self,
        _actor: &Actor,
        name: &str,
        _options: &str,
    ) -> Result<Option<ActionSpec>, OptionsError> {
        let Some((def, roll)) = self.actions.iter().find(|(def, _)| def.name == name) else {
            return Ok(None);
        };
        Ok(Some(match roll {
            Roll::Fixed(result) => ActionSpec::new(def.clone(), FixedResult(*result)),
            Roll::Table => ActionSpec::new(def.clone(), DefaultBehavior),
        }))
    }
}

/// Instant direct-damage spell with no cost and no global cooldown.
pub fn nuke(name: &str, damage: f64, cooldown: Duration) -> ActionDef {
    let mut def = ActionDef::spell(name, School::Fire)
        .with_direct_damage(damage, damage)
        .with_cooldown(cooldown);
    def.flags.trigger_gcd = false;
    def
}

/// Spell with a cast time and the global cooldown.
pub fn cast(name: &str, damage: f64, execute_time: Duration) -> ActionDef {
    ActionDef::spell(name, School::Shadow)
        .with_direct_damage(damage, damage)
        .with_execute_time(execute_time)
}

/// Instant periodic spell. Its debuff timer keeps it from being recast
/// while it ticks.
pub fn dot(name: &str, ticks: u32, interval: Duration, damage: f64) -> ActionDef {
    let mut def = ActionDef::spell(name, School::Shadow).with_ticks(ticks, interval, damage);
    def.debuff_group = Some(name.to_string());
    def.flags.trigger_gcd = false;
    def
}

/// Channeled periodic spell.
pub fn channel(name: &str, ticks: u32, interval: Duration, damage: f64) -> ActionDef {
    let mut def = ActionDef::spell(name, School::Shadow).with_ticks(ticks, interval, damage);
    def.flags.channeled = true;
    def.flags.trigger_gcd = false;
    def
}

/// Instant spell applying an aura to the target.
pub fn debuff(name: &str, aura: &str, duration: Duration, cooldown: Duration) -> ActionDef {
    let mut def = ActionDef::spell(name, School::Shadow)
        .with_cooldown(cooldown)
        .with_aura(AuraEffect {
            name: aura.to_string(),
            stacks: 1,
            duration,
            on_target: true,
        });
    def.flags.trigger_gcd = false;
    def
}

/// A player with the given action list and no resources.
pub fn player(name: &str, action_list: &str) -> ActorConfig {
    ActorConfig::new(name).with_action_list(action_list)
}

/// A player with a full mana pool.
pub fn caster(name: &str, action_list: &str, mana: f64) -> ActorConfig {
    player(name, action_list).with_resource(ResourceKind::Mana, mana)
}
