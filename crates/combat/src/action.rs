//! Action definitions and per-invocation state.

use crate::ActionBehavior;
use raidsim_types::{ActionId, ActionType, ActorId, EventId, ResourceKind, ResultKind, School};
use std::fmt;
use std::time::Duration;

/// Capability flags. Disabled outcomes are left out of the roll table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub may_miss: bool,
    pub may_resist: bool,
    pub may_dodge: bool,
    pub may_parry: bool,
    pub may_block: bool,
    pub may_glance: bool,
    pub may_crush: bool,
    pub may_crit: bool,
    pub tick_may_crit: bool,
    /// Binary spells are resisted in full or not at all.
    pub binary: bool,
    /// The actor is busy until the last tick.
    pub channeled: bool,
    /// Starts the actor's global pacing delay.
    pub trigger_gcd: bool,
    /// Never picked by the ready check; only fired by other effects.
    pub background: bool,
}

impl ActionFlags {
    /// Flags of a typical spell of `school`.
    pub fn spell(school: School) -> Self {
        Self {
            may_miss: true,
            may_resist: school != School::Physical,
            may_crit: true,
            trigger_gcd: true,
            ..Self::default()
        }
    }

    /// Flags of a typical melee attack.
    pub fn attack() -> Self {
        Self {
            may_miss: true,
            may_dodge: true,
            may_parry: true,
            may_block: true,
            may_glance: true,
            may_crit: true,
            trigger_gcd: true,
            ..Self::default()
        }
    }
}

/// An aura applied when the action lands.
#[derive(Debug, Clone, PartialEq)]
pub struct AuraEffect {
    pub name: String,
    pub stacks: u32,
    pub duration: Duration,
    /// Apply to the target rather than the acting actor.
    pub on_target: bool,
}

/// Static description of an action. Fixed after `init()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDef {
    pub name: String,
    pub action_type: ActionType,
    pub school: School,
    pub flags: ActionFlags,

    pub resource: ResourceKind,
    pub base_cost: f64,

    /// Cast time before the action resolves. Zero for instants.
    pub execute_time: Duration,
    pub tick_count: u32,
    pub tick_interval: Duration,

    pub cooldown: Duration,
    /// Shared cooldown timer name. Defaults to the action name.
    pub cooldown_group: Option<String>,
    /// Debuff timer gating reapplication. `None` disables the gate.
    pub debuff_group: Option<String>,
    /// Debuff timer length. Defaults to the tick span.
    pub debuff_duration: Option<Duration>,

    pub dd_min: f64,
    pub dd_max: f64,
    pub tick_damage: f64,
    pub direct_power_mod: f64,
    pub tick_power_mod: f64,
    pub base_multiplier: f64,
    pub base_hit: f64,
    pub base_crit: f64,
    pub base_penetration: f64,

    pub aura: Option<AuraEffect>,
}

impl ActionDef {
    fn with_type(name: &str, action_type: ActionType, school: School, flags: ActionFlags) -> Self {
        Self {
            name: name.to_string(),
            action_type,
            school,
            flags,
            resource: ResourceKind::Mana,
            base_cost: 0.0,
            execute_time: Duration::ZERO,
            tick_count: 0,
            tick_interval: Duration::ZERO,
            cooldown: Duration::ZERO,
            cooldown_group: None,
            debuff_group: None,
            debuff_duration: None,
            dd_min: 0.0,
            dd_max: 0.0,
            tick_damage: 0.0,
            direct_power_mod: 0.0,
            tick_power_mod: 0.0,
            base_multiplier: 1.0,
            base_hit: 0.0,
            base_crit: 0.0,
            base_penetration: 0.0,
            aura: None,
        }
    }

    /// A spell paid with mana.
    pub fn spell(name: &str, school: School) -> Self {
        Self::with_type(name, ActionType::Spell, school, ActionFlags::spell(school))
    }

    /// A physical attack paid with rage.
    pub fn attack(name: &str) -> Self {
        Self {
            resource: ResourceKind::Rage,
            ..Self::with_type(
                name,
                ActionType::Attack,
                School::Physical,
                ActionFlags::attack(),
            )
        }
    }

    /// An action with no default roll model.
    pub fn other(name: &str, school: School) -> Self {
        Self::with_type(name, ActionType::Other, school, ActionFlags::default())
    }

    pub fn with_cost(mut self, resource: ResourceKind, cost: f64) -> Self {
        self.resource = resource;
        self.base_cost = cost;
        self
    }

    pub fn with_execute_time(mut self, execute_time: Duration) -> Self {
        self.execute_time = execute_time;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_direct_damage(mut self, min: f64, max: f64) -> Self {
        self.dd_min = min;
        self.dd_max = max.max(min);
        self
    }

    pub fn with_ticks(mut self, count: u32, interval: Duration, damage: f64) -> Self {
        self.tick_count = count;
        self.tick_interval = interval;
        self.tick_damage = damage;
        self
    }

    pub fn with_flags(mut self, flags: ActionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_aura(mut self, aura: AuraEffect) -> Self {
        self.aura = Some(aura);
        self
    }

    /// Whether the action ticks.
    pub fn is_periodic(&self) -> bool {
        self.tick_count > 0 && !self.tick_interval.is_zero()
    }

    /// Whether a direct component exists.
    pub fn has_direct(&self) -> bool {
        self.dd_max > 0.0 || self.direct_power_mod > 0.0
    }

    /// Time from the first tick to the last.
    pub fn tick_span(&self) -> Duration {
        self.tick_interval * self.tick_count
    }

    /// Cooldown timer name.
    pub fn cooldown_group(&self) -> &str {
        self.cooldown_group.as_deref().unwrap_or(&self.name)
    }
}

/// Additive adjustments and one multiplier contributed by buffs or debuffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub hit: f64,
    pub crit: f64,
    pub crit_bonus: f64,
    pub power: f64,
    pub penetration: f64,
    pub multiplier: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            hit: 0.0,
            crit: 0.0,
            crit_bonus: 0.0,
            power: 0.0,
            penetration: 0.0,
            multiplier: 1.0,
        }
    }
}

impl Modifiers {
    /// Combine two sets: additive fields add, multipliers multiply.
    pub fn stack(self, other: Modifiers) -> Modifiers {
        Modifiers {
            hit: self.hit + other.hit,
            crit: self.crit + other.crit,
            crit_bonus: self.crit_bonus + other.crit_bonus,
            power: self.power + other.power,
            penetration: self.penetration + other.penetration,
            multiplier: self.multiplier * other.multiplier,
        }
    }
}

/// Mutable per-invocation state. Reset every iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionState {
    pub result: Option<ResultKind>,
    pub direct_dmg: f64,
    pub tick_dmg: f64,
    pub current_tick: u32,
    /// Start of the current cast.
    pub cast_start: Duration,
    pub time_to_execute: Duration,
    pub execute_event: Option<EventId>,
    pub tick_event: Option<EventId>,
}

impl ActionState {
    /// Whether a tick is pending.
    pub fn ticking(&self) -> bool {
        self.tick_event.is_some()
    }
}

/// A concrete action owned by one actor.
pub struct Action {
    id: ActionId,
    owner: ActorId,
    pub def: ActionDef,
    pub behavior: Box<dyn ActionBehavior>,
    pub state: ActionState,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.def.name)
            .field("state", &self.state)
            .finish()
    }
}

impl Action {
    pub fn new(id: ActionId, owner: ActorId, def: ActionDef, behavior: Box<dyn ActionBehavior>) -> Self {
        Self {
            id,
            owner,
            def,
            behavior,
            state: ActionState::default(),
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn reset(&mut self) {
        self.state = ActionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_defaults() {
        let fire = ActionDef::spell("fireball", School::Fire);
        assert!(fire.flags.may_resist);
        assert!(!fire.flags.may_dodge);
        assert_eq!(fire.resource, ResourceKind::Mana);
        assert_eq!(fire.cooldown_group(), "fireball");

        let physical = ActionDef::spell("shoot", School::Physical);
        assert!(!physical.flags.may_resist);
    }

    #[test]
    fn test_periodic() {
        let dot = ActionDef::spell("corruption", School::Shadow).with_ticks(
            6,
            Duration::from_secs(3),
            150.0,
        );
        assert!(dot.is_periodic());
        assert!(!dot.has_direct());
        assert_eq!(dot.tick_span(), Duration::from_secs(18));
        assert!(!ActionDef::attack("slam").is_periodic());
    }

    #[test]
    fn test_modifiers_stack() {
        let a = Modifiers {
            crit: 0.05,
            multiplier: 1.1,
            ..Modifiers::default()
        };
        let b = Modifiers {
            crit: 0.02,
            multiplier: 1.2,
            ..Modifiers::default()
        };
        let c = a.stack(b);
        assert!((c.crit - 0.07).abs() < 1e-12);
        assert!((c.multiplier - 1.32).abs() < 1e-12);
    }
}
