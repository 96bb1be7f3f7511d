//! Actors: players, pets and the target.
//!
//! An [`Actor`] splits its fields by lifetime:
//!
//! - **Configuration** ([`ActorConfig`]): set before `init()` and never
//!   touched by a reset.
//! - **Per iteration**: resources, global pacing deadline, temporary auras,
//!   cooldown and debuff timers, pending event handles, last cast time and
//!   iteration damage. [`Actor::reset`] re-initialises exactly these.
//! - **Cumulative**: gain/loss ledgers and proc counters, kept for the whole
//!   run.

use crate::{Auras, Defense, Ledger, ResourceError, Resources};
use indexmap::IndexMap;
use raidsim_types::{ActionId, ActorId, EventId, ResourceKind, ResourceMap};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Casting within this long counts as recently cast.
pub const FIVE_SECOND_RULE: Duration = Duration::from_secs(5);
/// Minimum idle time before [`Actor::time_to_think`] holds.
pub const THINK_TIME: Duration = Duration::from_millis(500);
/// Floor of the hasted global pacing delay.
pub const MIN_GCD: Duration = Duration::from_secs(1);

/// Actor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Pet { owner: ActorId },
    Target,
}

/// Static actor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorConfig {
    pub name: String,
    pub level: u32,
    /// Unhasted global pacing delay.
    pub gcd: Duration,
    pub haste_rating: f64,
    /// Rating per 1% haste.
    pub haste_rating_per_percent: f64,

    pub spell_hit: f64,
    pub spell_crit: f64,
    pub spell_power: f64,
    pub spell_penetration: f64,
    pub attack_hit: f64,
    pub attack_crit: f64,
    pub attack_power: f64,
    pub expertise: f64,
    /// Extra crit damage as a share of normal damage.
    pub crit_bonus: f64,

    pub spirit: f64,
    pub intellect: f64,
    pub mp5: f64,

    /// Pool maxima.
    pub resources: ResourceMap<f64>,
    /// Starting amounts that differ from the maximum.
    pub initial_resources: ResourceMap<Option<f64>>,
    pub defense: Defense,

    /// `/`-separated action list.
    pub action_list: String,
    /// Auras re-established by every reset.
    pub permanent_auras: Vec<String>,
    /// Auras whose uptime is sampled when this actor finishes an action.
    pub tracked_auras: Vec<String>,
    /// Start every iteration dismissed.
    pub sleeping: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: 70,
            gcd: Duration::from_millis(1500),
            haste_rating: 0.0,
            haste_rating_per_percent: 15.77,
            spell_hit: 0.0,
            spell_crit: 0.0,
            spell_power: 0.0,
            spell_penetration: 0.0,
            attack_hit: 0.0,
            attack_crit: 0.0,
            attack_power: 0.0,
            expertise: 0.0,
            crit_bonus: 0.5,
            spirit: 0.0,
            intellect: 0.0,
            mp5: 0.0,
            resources: ResourceMap::splat(0.0),
            initial_resources: ResourceMap::splat(None),
            defense: Defense::default(),
            action_list: String::new(),
            permanent_auras: Vec::new(),
            tracked_auras: Vec::new(),
            sleeping: false,
        }
    }
}

impl ActorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_gcd(mut self, gcd: Duration) -> Self {
        self.gcd = gcd;
        self
    }

    pub fn with_resource(mut self, kind: ResourceKind, max: f64) -> Self {
        self.resources[kind] = max;
        self
    }

    pub fn with_initial_resource(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.initial_resources[kind] = Some(amount);
        self
    }

    pub fn with_action_list(mut self, list: impl Into<String>) -> Self {
        self.action_list = list.into();
        self
    }

    pub fn with_permanent_aura(mut self, aura: impl Into<String>) -> Self {
        self.permanent_auras.push(aura.into());
        self
    }

    pub fn with_tracked_aura(mut self, aura: impl Into<String>) -> Self {
        self.tracked_auras.push(aura.into());
        self
    }

    pub fn with_sleeping(mut self, sleeping: bool) -> Self {
        self.sleeping = sleeping;
        self
    }

    /// Multiplicative haste factor, at least 1.
    pub fn haste(&self) -> f64 {
        if self.haste_rating_per_percent <= 0.0 {
            return 1.0;
        }
        1.0 + (self.haste_rating / self.haste_rating_per_percent / 100.0).max(0.0)
    }
}

/// A combatant.
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    kind: ActorKind,
    config: ActorConfig,
    actions: Vec<ActionId>,

    // Per iteration.
    pub resources: Resources,
    pub auras: Auras,
    gcd_ready: Duration,
    cooldowns: HashMap<String, Duration>,
    debuffs: HashMap<String, Duration>,
    /// Pending cast completion.
    pub executing: Option<EventId>,
    /// Action currently channeling.
    pub channeling: Option<ActionId>,
    /// Pending readiness check.
    pub ready_event: Option<EventId>,
    last_cast: Option<Duration>,
    last_regen: Duration,
    iteration_damage: f64,
    sleeping: bool,

    // Cumulative.
    gains: Ledger,
    losses: Ledger,
    procs: IndexMap<String, u64>,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorKind, config: ActorConfig) -> Self {
        let mut resources = Resources::new(config.resources);
        for (kind, initial) in config.initial_resources.iter() {
            if let Some(amount) = initial {
                resources.set_initial(kind, amount);
            }
        }
        let sleeping = config.sleeping;
        Self {
            id,
            kind,
            config,
            actions: Vec::new(),
            resources,
            auras: Auras::new(),
            gcd_ready: Duration::ZERO,
            cooldowns: HashMap::new(),
            debuffs: HashMap::new(),
            executing: None,
            channeling: None,
            ready_event: None,
            last_cast: None,
            last_regen: Duration::ZERO,
            iteration_damage: 0.0,
            sleeping,
            gains: Ledger::default(),
            losses: Ledger::default(),
            procs: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Mutable configuration, for base-stat initialisation before the run.
    pub fn config_mut(&mut self) -> &mut ActorConfig {
        &mut self.config
    }

    pub fn level(&self) -> u32 {
        self.config.level
    }

    /// Owning player of a pet.
    pub fn owner(&self) -> Option<ActorId> {
        match self.kind {
            ActorKind::Pet { owner } => Some(owner),
            _ => None,
        }
    }

    /// Actions in priority order.
    pub fn actions(&self) -> &[ActionId] {
        &self.actions
    }

    pub fn push_action(&mut self, action: ActionId) {
        self.actions.push(action);
    }

    /// Restore every per-iteration field. Configuration and cumulative
    /// bookkeeping are untouched.
    pub fn reset(&mut self) {
        self.resources.reset();
        self.auras.clear();
        for aura in &self.config.permanent_auras {
            self.auras.add_permanent(aura, 1);
        }
        self.gcd_ready = Duration::ZERO;
        self.cooldowns.clear();
        self.debuffs.clear();
        self.executing = None;
        self.channeling = None;
        self.ready_event = None;
        self.last_cast = None;
        self.last_regen = Duration::ZERO;
        self.iteration_damage = 0.0;
        self.sleeping = self.config.sleeping;
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        self.sleeping = sleeping;
    }

    /// No cast pending and not channeling.
    pub fn is_idle(&self) -> bool {
        self.executing.is_none() && self.channeling.is_none()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════

    pub fn gcd_ready(&self) -> Duration {
        self.gcd_ready
    }

    /// Start the global pacing delay at `now`.
    pub fn trigger_gcd(&mut self, now: Duration) {
        let hasted = self.config.gcd.div_f64(self.config.haste());
        let gcd = if self.config.gcd.is_zero() {
            Duration::ZERO
        } else {
            hasted.max(MIN_GCD.min(self.config.gcd))
        };
        self.gcd_ready = now + gcd;
    }

    /// When a cooldown group is ready. Zero if never used.
    pub fn cooldown_ready(&self, group: &str) -> Duration {
        self.cooldowns.get(group).copied().unwrap_or(Duration::ZERO)
    }

    pub fn start_cooldown(&mut self, group: &str, ready: Duration) {
        self.cooldowns.insert(group.to_string(), ready);
    }

    /// When a debuff group allows reapplication. Zero if never applied.
    pub fn debuff_ready(&self, group: &str) -> Duration {
        self.debuffs.get(group).copied().unwrap_or(Duration::ZERO)
    }

    pub fn start_debuff(&mut self, group: &str, ready: Duration) {
        self.debuffs.insert(group.to_string(), ready);
    }

    pub fn last_cast(&self) -> Option<Duration> {
        self.last_cast
    }

    pub fn set_last_cast(&mut self, now: Duration) {
        self.last_cast = Some(now);
    }

    /// Cast within the last five seconds.
    pub fn recent_cast(&self, now: Duration) -> bool {
        self.last_cast
            .is_some_and(|cast| now.saturating_sub(cast) < FIVE_SECOND_RULE)
    }

    /// More than half a second since the last cast.
    pub fn time_to_think(&self, now: Duration) -> bool {
        self.last_cast
            .map_or(true, |cast| now.saturating_sub(cast) > THINK_TIME)
    }

    /// Time since the last regeneration, and mark `now` as the latest.
    pub fn take_regen_elapsed(&mut self, now: Duration) -> Duration {
        let elapsed = now.saturating_sub(self.last_regen);
        self.last_regen = now;
        elapsed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Resources and bookkeeping
    // ═══════════════════════════════════════════════════════════════════════

    /// Gain a resource, recording the applied amount under `source`.
    pub fn resource_gain(&mut self, kind: ResourceKind, amount: f64, source: &str) -> f64 {
        let actual = self.resources.gain(kind, amount);
        self.gains.record(source, kind, actual);
        actual
    }

    /// Lose a resource, recording the applied amount under `source`.
    pub fn resource_loss(&mut self, kind: ResourceKind, amount: f64, source: &str) -> f64 {
        let actual = self.resources.loss(kind, amount);
        self.losses.record(source, kind, actual);
        actual
    }

    /// Pay an action cost.
    pub fn consume(&mut self, kind: ResourceKind, cost: f64, source: &str) -> Result<f64, ResourceError> {
        let actual = self.resources.consume(kind, cost)?;
        self.losses.record(source, kind, actual);
        Ok(actual)
    }

    pub fn resource_available(&self, kind: ResourceKind, cost: f64) -> bool {
        self.resources.available(kind, cost)
    }

    pub fn gains(&self) -> &Ledger {
        &self.gains
    }

    pub fn losses(&self) -> &Ledger {
        &self.losses
    }

    /// Count one occurrence of a named proc.
    pub fn proc(&mut self, name: &str) {
        *self.procs.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn procs(&self) -> &IndexMap<String, u64> {
        &self.procs
    }

    pub fn add_damage(&mut self, amount: f64) {
        self.iteration_damage += amount;
    }

    pub fn iteration_damage(&self) -> f64 {
        self.iteration_damage
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.config.name)
    }
}

/// Default regeneration over `elapsed`.
///
/// Mana regenerates from mp5 always and from spirit only outside the five
/// second rule. Energy regenerates at 10 per second. Rage, focus, runic power
/// and health do not regenerate.
pub fn default_regen(actor: &mut Actor, now: Duration, elapsed: Duration) {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return;
    }

    if actor.resources.max(ResourceKind::Mana) > 0.0 {
        let mp5 = actor.config.mp5 / 5.0 * seconds;
        actor.resource_gain(ResourceKind::Mana, mp5, "mp5_regen");

        if !actor.recent_cast(now) {
            let per_second = 0.001 + actor.config.spirit * actor.config.intellect.sqrt() * 0.009327;
            actor.resource_gain(ResourceKind::Mana, per_second * seconds, "spirit_regen");
        }
    }

    if actor.resources.max(ResourceKind::Energy) > 0.0 {
        actor.resource_gain(ResourceKind::Energy, 10.0 * seconds, "energy_regen");
    }
}
