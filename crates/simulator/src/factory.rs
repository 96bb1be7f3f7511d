//! Table-driven actor behaviour.
//!
//! Scenario files describe actions as templates instead of code. A
//! [`TableActor`] looks action-list names up in its template table and turns
//! the matching template, plus any per-entry options, into an [`ActionDef`].

use raidsim_combat::{
    ActionBehavior, ActionContext, ActionDef, ActionFlags, ActionOutcome, ActionSpec, Actor,
    ActorBehavior, AuraEffect, FixedResult, HookContext, HookResult, Modifiers, Options,
    OptionsError,
};
use raidsim_types::{Patch, ResourceKind, ResultKind, School};
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;

/// Options an action-list entry may override.
const OPTION_KEYS: &[&str] = &[
    "cast_time",
    "cooldown",
    "cost",
    "ticks",
    "tick_interval",
    "binary",
    "gcd",
    "background",
];

/// Shape of a templated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Direct-damage spell.
    Nuke,
    /// Periodic spell that releases the caster after execution.
    Dot,
    /// Physical attack.
    Strike,
    /// Channeled periodic spell.
    Channel,
    /// Always-landing aura application, not recast while it lasts.
    Buff,
}

fn default_school() -> School {
    School::Shadow
}

fn default_one() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// One action description from a scenario file. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionTemplate {
    pub name: String,
    pub kind: TemplateKind,

    #[serde(default = "default_school")]
    pub school: School,

    /// Direct damage range.
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub power_mod: f64,

    #[serde(default)]
    pub ticks: u32,
    #[serde(default)]
    pub tick_interval: f64,
    #[serde(default)]
    pub tick_damage: f64,
    #[serde(default)]
    pub tick_power_mod: f64,
    #[serde(default)]
    pub tick_may_crit: bool,

    #[serde(default)]
    pub cast_time: f64,
    #[serde(default)]
    pub cooldown: f64,
    pub cooldown_group: Option<String>,
    pub debuff_group: Option<String>,
    /// Debuff timer length, defaulting to the tick span.
    pub debuff_duration: Option<f64>,

    /// Resource paid, defaulting to mana for spells and rage for strikes.
    pub resource: Option<ResourceKind>,
    #[serde(default)]
    pub cost: f64,

    #[serde(default)]
    pub binary: bool,
    #[serde(default = "default_true")]
    pub gcd: bool,
    #[serde(default)]
    pub background: bool,

    /// Aura applied when the action lands.
    pub aura: Option<String>,
    #[serde(default)]
    pub aura_duration: f64,
    #[serde(default = "default_one_stack")]
    pub aura_stacks: u32,
    #[serde(default)]
    pub aura_on_target: bool,

    /// Aura that amplifies this action while up on the caster or the target.
    pub amplified_by: Option<String>,
    #[serde(default = "default_one")]
    pub amplify: f64,

    /// First patch the action exists in, as `arch.version.revision`.
    pub min_patch: Option<String>,
}

fn default_one_stack() -> u32 {
    1
}

impl ActionTemplate {
    /// Build the definition, applying per-entry overrides.
    pub fn to_def(&self, options: &Options) -> Result<ActionDef, OptionsError> {
        options.check_known(OPTION_KEYS)?;
        let name = self.name.as_str();

        let mut def = match self.kind {
            TemplateKind::Nuke | TemplateKind::Dot | TemplateKind::Channel => {
                ActionDef::spell(name, self.school)
            }
            TemplateKind::Strike => ActionDef::attack(name),
            TemplateKind::Buff => ActionDef::other(name, self.school),
        };

        def.dd_min = self.min;
        def.dd_max = self.max.max(self.min);
        def.direct_power_mod = self.power_mod;
        def.execute_time = secs("cast_time", self.cast_time)?;
        def.cooldown = secs("cooldown", self.cooldown)?;
        def.cooldown_group = self.cooldown_group.clone();
        def.base_cost = self.cost;
        if let Some(resource) = self.resource {
            def.resource = resource;
        }

        if matches!(self.kind, TemplateKind::Dot | TemplateKind::Channel) {
            def.tick_count = self.ticks;
            def.tick_interval = secs("tick_interval", self.tick_interval)?;
            def.tick_damage = self.tick_damage;
            def.tick_power_mod = self.tick_power_mod;
            def.flags.tick_may_crit = self.tick_may_crit;
        }
        // Dots and buffs gate their own recast until they wear off.
        def.debuff_group = match self.kind {
            TemplateKind::Dot | TemplateKind::Buff => {
                Some(self.debuff_group.clone().unwrap_or_else(|| self.name.clone()))
            }
            _ => self.debuff_group.clone(),
        };
        def.debuff_duration = match (self.debuff_duration, self.kind) {
            (Some(duration), _) => Some(secs("debuff_duration", duration)?),
            (None, TemplateKind::Buff) => Some(secs("aura_duration", self.aura_duration)?),
            (None, _) => None,
        };
        def.flags.channeled = self.kind == TemplateKind::Channel;

        if let Some(aura) = &self.aura {
            def.aura = Some(AuraEffect {
                name: aura.clone(),
                stacks: self.aura_stacks,
                duration: secs("aura_duration", self.aura_duration)?,
                on_target: self.aura_on_target,
            });
        }

        def.flags = ActionFlags {
            binary: options.flag("binary")?.unwrap_or(self.binary),
            trigger_gcd: options.flag("gcd")?.unwrap_or(self.gcd),
            background: options.flag("background")?.unwrap_or(self.background),
            ..def.flags
        };

        if let Some(cast_time) = options.duration("cast_time")? {
            def.execute_time = cast_time;
        }
        if let Some(cooldown) = options.duration("cooldown")? {
            def.cooldown = cooldown;
        }
        if let Some(cost) = options.parsed::<f64>("cost")? {
            def.base_cost = cost;
        }
        if let Some(ticks) = options.parsed::<u32>("ticks")? {
            def.tick_count = ticks;
        }
        if let Some(interval) = options.duration("tick_interval")? {
            def.tick_interval = interval;
        }
        Ok(def)
    }

    /// Whether the action exists in `patch`.
    pub fn available_in(&self, patch: Patch) -> bool {
        match self.min_patch.as_deref().map(str::parse::<Patch>) {
            Some(Ok(first)) => patch >= first,
            // Unparsable patches are rejected when the scenario is resolved.
            Some(Err(_)) | None => true,
        }
    }
}

/// A template time in seconds.
fn secs(key: &str, value: f64) -> Result<Duration, OptionsError> {
    Duration::try_from_secs_f64(value).map_err(|_| OptionsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Behaviour of a templated action.
#[derive(Debug, Clone)]
struct TemplateBehavior {
    /// `(aura, multiplier)` applied while the aura is up.
    amplifier: Option<(String, f64)>,
}

impl TemplateBehavior {
    fn amplified(&self, holder: &Actor) -> Modifiers {
        match &self.amplifier {
            Some((aura, multiplier)) if holder.auras.is_up(aura) => Modifiers {
                multiplier: *multiplier,
                ..Modifiers::default()
            },
            _ => Modifiers::default(),
        }
    }
}

impl ActionBehavior for TemplateBehavior {
    fn player_buff(&self, ctx: &ActionContext<'_>) -> Modifiers {
        self.amplified(ctx.actor)
    }

    fn target_debuff(&self, ctx: &ActionContext<'_>) -> Modifiers {
        self.amplified(ctx.target)
    }
}

/// A chance-based effect triggered by landing actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcTemplate {
    pub name: String,
    /// Chance per landed direct hit, in `[0, 1]`.
    pub chance: f64,
    /// Only crits trigger it.
    #[serde(default)]
    pub on_crit: bool,
    /// Aura granted to the actor.
    pub aura: Option<String>,
    #[serde(default)]
    pub duration: f64,
}

/// Actor whose actions and procs come from scenario tables.
#[derive(Debug, Clone, Default)]
pub struct TableActor {
    actions: Vec<ActionTemplate>,
    procs: Vec<Proc>,
}

#[derive(Debug, Clone)]
struct Proc {
    name: String,
    chance: f64,
    on_crit: bool,
    aura: Option<String>,
    duration: Duration,
}

impl TableActor {
    /// Keep the templates available in `patch`.
    ///
    /// Every kept template is built once without overrides, so malformed
    /// table entries fail here rather than when an actor is initialised.
    pub fn new(
        actions: &[ActionTemplate],
        procs: &[ProcTemplate],
        patch: Patch,
    ) -> Result<Self, OptionsError> {
        let actions: Vec<ActionTemplate> = actions
            .iter()
            .filter(|t| t.available_in(patch))
            .cloned()
            .collect();
        for template in &actions {
            template.to_def(&Options::default())?;
        }
        let procs = procs
            .iter()
            .map(|proc| {
                Ok(Proc {
                    name: proc.name.clone(),
                    chance: proc.chance,
                    on_crit: proc.on_crit,
                    aura: proc.aura.clone(),
                    duration: secs("duration", proc.duration)?,
                })
            })
            .collect::<Result<_, OptionsError>>()?;
        Ok(Self { actions, procs })
    }

    /// Names of the templates kept for the patch.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|t| t.name.as_str())
    }
}

impl ActorBehavior for TableActor {
    fn create_action(
        &self,
        _actor: &Actor,
        name: &str,
        options: &str,
    ) -> Result<Option<ActionSpec>, OptionsError> {
        let Some(template) = self.actions.iter().find(|t| t.name == name) else {
            return Ok(None);
        };
        let options = Options::parse(name, options)?;
        let def = template.to_def(&options)?;
        let amplifier = template
            .amplified_by
            .clone()
            .map(|aura| (aura, template.amplify));

        Ok(Some(match template.kind {
            TemplateKind::Buff => ActionSpec::new(def, FixedResult(ResultKind::Hit)),
            _ => ActionSpec::new(def, TemplateBehavior { amplifier }),
        }))
    }

    fn on_hit(&mut self, ctx: &mut HookContext<'_>, outcome: &ActionOutcome<'_>) -> HookResult {
        for proc in &self.procs {
            if proc.on_crit && outcome.result != ResultKind::Crit {
                continue;
            }
            if ctx.rng.gen::<f64>() >= proc.chance {
                continue;
            }
            ctx.actor.proc(&proc.name);
            trace!(actor = %ctx.actor, proc = %proc.name, source = %outcome.def.name, "Proc");
            if let Some(aura) = &proc.aura {
                ctx.buff(aura, 1, proc.duration)?;
            }
        }
        Ok(())
    }
}
