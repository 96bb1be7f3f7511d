//! Action resolution pipeline.
//!
//! ```text
//! PlayerReady ──▶ readiness ──▶ cast ──▶ ActionExecute
//!                    │                       │ cost, modifiers, roll,
//!                    │ not ready             │ damage, hooks
//!                    ▼                       ▼
//!             PlayerReady later       ActionTick × N ──▶ finish ──▶ PlayerReady
//! ```
//!
//! Every phase runs inside the event that triggered it. Nothing here blocks:
//! waiting is always expressed as a newly scheduled event.

use crate::runner::TARGET;
use crate::{Simulation, SimulationError};
use raidsim_combat::{
    apply_result, mitigation, partial_resist, Action, ActionContext, ActionDef, ActionOutcome,
    Actor, ActorKind, DamageChain, HookContext, Modifiers, OutcomeChances, Resolution, RollInput,
    RollTable,
};
use raidsim_core::{EventKind, EventSink};
use raidsim_types::{ActionId, ActionType, ActorId, DamageKind, EventId, ResourceKind, ResultKind};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, trace};

/// Borrow the active scheduler as an [`EventSink`] at the current time.
macro_rules! sink {
    ($sim:expr) => {
        EventSink::new($sim.scheduler.as_mut(), &mut $sim.next_id, $sim.now)
    };
}

/// Whether an action can be picked now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Ready,
    /// Blocked by a timer that clears at the given time.
    Until(Duration),
    /// Blocked by a condition with no known deadline.
    Poll,
    /// Never picked by the ready check.
    Never,
}

/// Result of one resolution, before hooks see it.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    action: ActionId,
    result: ResultKind,
    kind: DamageKind,
    amount: f64,
}

impl Resolved {
    fn outcome<'a>(&self, actions: &'a [Action]) -> ActionOutcome<'a> {
        ActionOutcome {
            action: self.action,
            def: &actions[self.action.index()].def,
            result: self.result,
            kind: self.kind,
            amount: self.amount,
        }
    }
}

/// Actor callback to dispatch.
#[derive(Debug, Clone, Copy)]
enum Hook {
    Start(ActionId),
    Miss(Resolved),
    Hit(Resolved),
    Tick(Resolved),
    Damage(Resolved),
    Finish(ActionId),
    Custom(u64),
}

/// Combined state of acting actor, target and buffs at resolution time.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    input: RollInput,
    power: f64,
    penetration: f64,
    crit_bonus: f64,
    player_multiplier: f64,
    target_multiplier: f64,
    attacker_level: u32,
}

/// Two distinct elements of a slice, mutably. `None` if `a == b`.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = items.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}

fn snapshot(def: &ActionDef, actor: &Actor, target: &Actor, buff: Modifiers, debuff: Modifiers) -> Snapshot {
    let config = actor.config();
    let mods = buff.stack(debuff);
    let (hit, crit, power, penetration) = match def.action_type {
        ActionType::Attack => (config.attack_hit, config.attack_crit, config.attack_power, 0.0),
        ActionType::Spell | ActionType::Other => (
            config.spell_hit,
            config.spell_crit,
            config.spell_power,
            config.spell_penetration,
        ),
    };
    let penetration = penetration + def.base_penetration + mods.penetration;
    let resist = partial_resist(
        target.config().defense.resistance(def.school),
        penetration,
        actor.level(),
    );

    Snapshot {
        input: RollInput {
            level_delta: target.level() as i32 - actor.level() as i32,
            hit: def.base_hit + hit + mods.hit,
            crit: def.base_crit + crit + mods.crit,
            expertise: config.expertise,
            resist,
        },
        power: power + mods.power,
        penetration,
        crit_bonus: config.crit_bonus + mods.crit_bonus,
        player_multiplier: buff.multiplier,
        target_multiplier: debuff.multiplier,
        attacker_level: actor.level(),
    }
}

impl Simulation {
    // ═══════════════════════════════════════════════════════════════════════
    // Readiness
    // ═══════════════════════════════════════════════════════════════════════

    fn readiness(&self, action: ActionId) -> Gate {
        let action = &self.actions[action.index()];
        let def = &action.def;
        if def.flags.background {
            return Gate::Never;
        }
        let actor = &self.actors[action.owner().index()];
        let now = self.now;

        let mut until = actor.cooldown_ready(def.cooldown_group());
        if def.flags.trigger_gcd {
            until = until.max(actor.gcd_ready());
        }
        if let Some(group) = &def.debuff_group {
            until = until.max(actor.debuff_ready(group));
        }
        if until > now {
            return Gate::Until(until);
        }

        let ctx = ActionContext {
            def,
            actor,
            target: &self.actors[TARGET.index()],
            now,
        };
        let cost = action.behavior.cost(&ctx);
        if !actor.resource_available(def.resource, cost) || !action.behavior.ready(&ctx) {
            return Gate::Poll;
        }
        Gate::Ready
    }

    /// Pick the first ready action in priority order, or schedule the next
    /// check for when the earliest blocker clears.
    pub(crate) fn player_ready(&mut self, actor: ActorId, event: EventId) -> Result<(), SimulationError> {
        let index = actor.index();
        if self.actors[index].ready_event == Some(event) {
            self.actors[index].ready_event = None;
        }
        if self.actors[index].is_sleeping() || !self.actors[index].is_idle() {
            return Ok(());
        }

        let now = self.now;
        let mut chosen = None;
        let mut wake: Option<Duration> = None;
        for &action in self.actors[index].actions() {
            let retry = match self.readiness(action) {
                Gate::Ready => {
                    chosen = Some(action);
                    break;
                }
                Gate::Until(time) => time,
                Gate::Poll => now + self.config.ready_poll_interval,
                Gate::Never => continue,
            };
            wake = Some(wake.map_or(retry, |w| w.min(retry)));
        }

        match (chosen, wake) {
            (Some(action), _) => self.start_action(action),
            (None, Some(time)) => {
                trace!(actor = %self.actors[index], retry = ?time, "Nothing ready");
                self.schedule_ready(actor, time - now)
            }
            (None, None) => {
                debug!(actor = %self.actors[index], "No selectable actions, idling");
                Ok(())
            }
        }
    }

    /// Schedule the next readiness check, replacing any pending one.
    pub(crate) fn schedule_ready(&mut self, actor: ActorId, delay: Duration) -> Result<(), SimulationError> {
        let index = actor.index();
        let mut sink = sink!(self);
        if let Some(previous) = self.actors[index].ready_event.take() {
            sink.invalidate(previous);
        }
        let ready = sink.schedule(delay, Some(actor), EventKind::PlayerReady)?;
        self.actors[index].ready_event = Some(ready);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cast and execute
    // ═══════════════════════════════════════════════════════════════════════

    /// Begin casting: start pacing and schedule the execute event.
    fn start_action(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let now = self.now;

        let execute_time = {
            let action = &self.actions[ai];
            if action.def.flags.channeled {
                Duration::ZERO
            } else {
                let ctx = ActionContext {
                    def: &action.def,
                    actor: &self.actors[owner.index()],
                    target: &self.actors[TARGET.index()],
                    now,
                };
                action.behavior.execute_time(&ctx)
            }
        };

        if self.actions[ai].def.flags.trigger_gcd {
            self.actors[owner.index()].trigger_gcd(now);
        }
        let state = &mut self.actions[ai].state;
        state.cast_start = now;
        state.time_to_execute = execute_time;

        debug!(
            actor = %self.actors[owner.index()],
            action = %self.actions[ai].name(),
            time = ?now,
            execute_time = ?execute_time,
            "Casting"
        );
        self.hook(owner, Hook::Start(action))?;

        let execute = sink!(self).schedule(execute_time, Some(owner), EventKind::ActionExecute { action })?;
        self.actions[ai].state.execute_event = Some(execute);
        self.actors[owner.index()].executing = Some(execute);
        Ok(())
    }

    /// Resolve a completed cast.
    pub(crate) fn execute_action(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let oi = owner.index();
        let now = self.now;

        self.actions[ai].state.execute_event = None;
        self.actors[oi].executing = None;
        if self.actors[oi].is_sleeping() {
            return Ok(());
        }

        // Cost. A pool drained since the ready check means the action does
        // not fire and the actor picks again.
        let cost = {
            let action = &self.actions[ai];
            let ctx = ActionContext {
                def: &action.def,
                actor: &self.actors[oi],
                target: &self.actors[TARGET.index()],
                now,
            };
            action.behavior.cost(&ctx)
        };
        let def = &self.actions[ai].def;
        if let Err(err) = self.actors[oi].consume(def.resource, cost, &def.name) {
            debug!(
                actor = %self.actors[oi],
                action = %def.name,
                %err,
                "Cost no longer payable, re-evaluating"
            );
            return self.schedule_ready(owner, Duration::ZERO);
        }
        if cost > 0.0 {
            self.actors[oi].set_last_cast(now);
        }

        let snapshot = self.snapshot(action);
        let result = self.roll(action, &snapshot, DamageKind::Direct);

        let def = &self.actions[ai].def;
        let direct = if def.has_direct() {
            let base = if self.config.average_damage || def.dd_max <= def.dd_min {
                (def.dd_min + def.dd_max) / 2.0
            } else {
                self.rng.gen_range(def.dd_min..def.dd_max)
            };
            self.damage(def, &snapshot, def.direct_power_mod, base, result)
        } else {
            0.0
        };

        let state = &mut self.actions[ai].state;
        state.result = Some(result);
        state.direct_dmg = direct;
        self.stats
            .add(self.records[ai], direct, DamageKind::Direct, result, now);

        debug!(
            actor = %self.actors[oi],
            action = %self.actions[ai].name(),
            %result,
            damage = direct,
            "Executed"
        );

        let resolved = Resolved {
            action,
            result,
            kind: DamageKind::Direct,
            amount: direct,
        };
        let channeling = if result.is_hit() {
            self.hook(owner, Hook::Hit(resolved))?;
            if direct > 0.0 {
                self.assess_damage(owner, resolved)?;
            }
            self.apply_aura(action)?;
            if self.actions[ai].def.is_periodic() {
                self.start_ticks(action)?
            } else {
                false
            }
        } else {
            self.hook(owner, Hook::Miss(resolved))?;
            false
        };

        self.charge_execute(action);
        if !channeling {
            self.finish(action)?;
        }
        Ok(())
    }

    /// Charge the pacing window of the execution just resolved.
    fn charge_execute(&mut self, action: ActionId) {
        let ai = action.index();
        let def = &self.actions[ai].def;
        let state = &self.actions[ai].state;
        let actor = &self.actors[self.actions[ai].owner().index()];

        let mut busy = state.time_to_execute;
        if def.flags.channeled {
            busy += def.tick_span();
        }
        if def.flags.trigger_gcd {
            busy = busy.max(actor.gcd_ready().saturating_sub(state.cast_start));
        }
        self.stats
            .charge_execute(self.records[ai], state.cast_start, busy + self.config.lag);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution helpers
    // ═══════════════════════════════════════════════════════════════════════

    /// Modifiers are evaluated now, so buffs that fell off mid-cast no longer
    /// count.
    fn snapshot(&self, action: ActionId) -> Snapshot {
        let action = &self.actions[action.index()];
        let actor = &self.actors[action.owner().index()];
        let target = &self.actors[TARGET.index()];
        let ctx = ActionContext {
            def: &action.def,
            actor,
            target,
            now: self.now,
        };
        let buff = action.behavior.player_buff(&ctx);
        let debuff = action.behavior.target_debuff(&ctx);
        snapshot(&action.def, actor, target, buff, debuff)
    }

    fn roll(&mut self, action: ActionId, snapshot: &Snapshot, kind: DamageKind) -> ResultKind {
        let ai = action.index();
        let flags = &self.actions[ai].def.flags;
        let chances = match (self.resolutions[ai], kind) {
            (Resolution::Fixed(result), _) => return result,
            (_, DamageKind::OverTime) => OutcomeChances::tick(flags, &snapshot.input),
            (Resolution::Spell, DamageKind::Direct) => OutcomeChances::spell(flags, &snapshot.input),
            (Resolution::Attack, DamageKind::Direct) => {
                OutcomeChances::attack(flags, &snapshot.input)
            }
        };
        let table = RollTable::new(&chances);
        let draw: f64 = self.rng.gen();
        let result = table.roll(draw);
        trace!(draw, %result, entries = table.entries().len(), "Rolled");
        result
    }

    /// Scaled, result-adjusted and mitigated damage.
    fn damage(&self, def: &ActionDef, snapshot: &Snapshot, power_mod: f64, base: f64, result: ResultKind) -> f64 {
        let chain = DamageChain {
            power_mod,
            power: snapshot.power,
            base_multiplier: def.base_multiplier,
            player_multiplier: snapshot.player_multiplier,
            target_multiplier: snapshot.target_multiplier,
        };
        let target = &self.actors[TARGET.index()];
        let amount = apply_result(
            chain.scale(base),
            result,
            snapshot.crit_bonus,
            target.config().defense.block_value,
        );
        let mitigated = mitigation(
            def.school,
            &def.flags,
            &target.config().defense,
            snapshot.penetration,
            snapshot.attacker_level,
        );
        amount * (1.0 - mitigated)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Effects
    // ═══════════════════════════════════════════════════════════════════════

    /// Credit damage to its source and take it off the target's health.
    fn assess_damage(&mut self, owner: ActorId, resolved: Resolved) -> Result<(), SimulationError> {
        self.actors[owner.index()].add_damage(resolved.amount);

        let target = &mut self.actors[TARGET.index()];
        if target.resources.max(ResourceKind::Health) > 0.0 {
            let source = &self.actions[resolved.action.index()].def.name;
            target.resource_loss(ResourceKind::Health, resolved.amount, source);
            if target.resources.current(ResourceKind::Health) <= 0.0 {
                self.target_defeated = true;
            }
        }
        self.hook(owner, Hook::Damage(resolved))
    }

    /// Apply the action's aura to the caster or the target.
    fn apply_aura(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let Some(effect) = &self.actions[ai].def.aura else {
            return Ok(());
        };
        let holder = if effect.on_target {
            TARGET
        } else {
            self.actions[ai].owner()
        };
        let mut sink = sink!(self);
        self.actors[holder.index()].auras.apply(
            &mut sink,
            holder,
            &effect.name,
            effect.stacks,
            effect.duration,
        )?;
        Ok(())
    }

    /// Start a fresh tick sequence, clipping any pending one. Returns whether
    /// the actor is now channeling.
    fn start_ticks(&mut self, action: ActionId) -> Result<bool, SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let mut sink = sink!(self);

        let entry = &mut self.actions[ai];
        let (def, state) = (&entry.def, &mut entry.state);
        if let Some(pending) = state.tick_event.take() {
            sink.invalidate(pending);
            debug!(
                action = %def.name,
                remaining = def.tick_count.saturating_sub(state.current_tick),
                "Clipped pending ticks"
            );
        }
        state.current_tick = 0;
        state.tick_dmg = 0.0;
        let tick = sink.schedule(def.tick_interval, Some(owner), EventKind::ActionTick { action })?;
        state.tick_event = Some(tick);

        let channeled = def.flags.channeled;
        if channeled {
            self.actors[owner.index()].channeling = Some(action);
        }
        Ok(channeled)
    }

    /// One periodic tick. Modifiers and the roll are re-evaluated per tick.
    pub(crate) fn tick(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let now = self.now;

        let state = &mut self.actions[ai].state;
        state.tick_event = None;
        state.current_tick += 1;
        let current = state.current_tick;

        let snapshot = self.snapshot(action);
        let result = self.roll(action, &snapshot, DamageKind::OverTime);
        let def = &self.actions[ai].def;
        let amount = self.damage(def, &snapshot, def.tick_power_mod, def.tick_damage, result);
        let (count, interval, channeled) = (def.tick_count, def.tick_interval, def.flags.channeled);

        self.actions[ai].state.tick_dmg = amount;
        self.stats
            .add(self.records[ai], amount, DamageKind::OverTime, result, now);
        trace!(
            action = %self.actions[ai].name(),
            tick = current,
            of = count,
            %result,
            damage = amount,
            "Tick"
        );

        let resolved = Resolved {
            action,
            result,
            kind: DamageKind::OverTime,
            amount,
        };
        self.hook(owner, Hook::Tick(resolved))?;
        if amount > 0.0 {
            self.assess_damage(owner, resolved)?;
        }

        if current < count {
            let next = sink!(self).schedule(interval, Some(owner), EventKind::ActionTick { action })?;
            self.actions[ai].state.tick_event = Some(next);
        } else if channeled && self.actors[owner.index()].channeling == Some(action) {
            self.actors[owner.index()].channeling = None;
            self.finish(action)?;
        }
        Ok(())
    }

    /// Cancel an action's pending cast and ticks.
    pub(crate) fn interrupt(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let oi = owner.index();
        let mut sink = sink!(self);

        let state = &mut self.actions[ai].state;
        let ticks = state.tick_event.take();
        let cast = state.execute_event.take();
        if let Some(tick) = ticks {
            sink.invalidate(tick);
        }
        if let Some(execute) = cast {
            sink.invalidate(execute);
            self.actors[oi].executing = None;
        }
        if ticks.is_none() && cast.is_none() {
            trace!(action = %self.actions[ai].name(), "Nothing to interrupt");
            return Ok(());
        }

        debug!(
            actor = %self.actors[oi],
            action = %self.actions[ai].name(),
            tick = self.actions[ai].state.current_tick,
            "Interrupted"
        );
        if self.actors[oi].channeling == Some(action) {
            self.actors[oi].channeling = None;
            self.finish(action)
        } else if cast.is_some() {
            self.schedule_ready(owner, Duration::ZERO)
        } else {
            Ok(())
        }
    }

    /// Close an invocation: start timers, sample uptimes and schedule the
    /// next readiness check after the reaction lag.
    pub(crate) fn finish(&mut self, action: ActionId) -> Result<(), SimulationError> {
        let ai = action.index();
        let owner = self.actions[ai].owner();
        let oi = owner.index();
        let now = self.now;

        let entry = &self.actions[ai];
        let def = &entry.def;
        let actor = &mut self.actors[oi];
        if !def.cooldown.is_zero() {
            actor.start_cooldown(def.cooldown_group(), now + def.cooldown);
        }
        if let Some(group) = &def.debuff_group {
            if entry.state.result.is_some_and(ResultKind::is_hit) {
                let applied = entry.state.cast_start + entry.state.time_to_execute;
                let duration = def.debuff_duration.unwrap_or_else(|| def.tick_span());
                actor.start_debuff(group, applied + duration);
            }
        }

        self.hook(owner, Hook::Finish(action))?;

        let actor = &self.actors[oi];
        let target = &self.actors[TARGET.index()];
        for aura in &actor.config().tracked_auras {
            let up = actor.auras.is_up(aura) || target.auras.is_up(aura);
            self.uptimes.register(aura).update(up);
        }

        trace!(actor = %actor, action = %self.actions[ai].name(), "Finished");
        if actor.is_sleeping() {
            return Ok(());
        }
        self.schedule_ready(owner, self.config.lag)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Actor-wide events
    // ═══════════════════════════════════════════════════════════════════════

    /// Regenerate every awake actor and schedule the next regeneration.
    pub(crate) fn regen(&mut self) -> Result<(), SimulationError> {
        let now = self.now;
        for (actor, behavior) in self.actors.iter_mut().zip(self.behaviors.iter_mut()) {
            if actor.kind() == ActorKind::Target {
                continue;
            }
            let elapsed = actor.take_regen_elapsed(now);
            if !actor.is_sleeping() {
                behavior.regen(actor, now, elapsed);
            }
        }
        sink!(self).schedule(self.config.regen_interval, None, EventKind::Regen)?;
        Ok(())
    }

    /// Wake a sleeping actor.
    pub(crate) fn summon(&mut self, actor: ActorId) -> Result<(), SimulationError> {
        let summoned = &mut self.actors[actor.index()];
        if !summoned.is_sleeping() {
            return Ok(());
        }
        summoned.set_sleeping(false);
        summoned.take_regen_elapsed(self.now);
        debug!(actor = %summoned, time = ?self.now, "Summoned");
        self.schedule_ready(actor, Duration::ZERO)
    }

    /// Put an actor to sleep and cancel everything it has pending.
    pub(crate) fn dismiss(&mut self, actor: ActorId) -> Result<(), SimulationError> {
        let mut sink = sink!(self);
        let dismissed = &mut self.actors[actor.index()];
        if dismissed.is_sleeping() {
            return Ok(());
        }
        dismissed.set_sleeping(true);
        dismissed.channeling = None;
        for pending in [dismissed.ready_event.take(), dismissed.executing.take()]
            .into_iter()
            .flatten()
        {
            sink.invalidate(pending);
        }
        for id in dismissed.actions() {
            let state = &mut self.actions[id.index()].state;
            state.execute_event = None;
            if let Some(tick) = state.tick_event.take() {
                sink.invalidate(tick);
            }
        }
        debug!(actor = %dismissed, time = ?self.now, "Dismissed");
        Ok(())
    }

    pub(crate) fn custom(&mut self, actor: ActorId, tag: u64) -> Result<(), SimulationError> {
        self.hook(actor, Hook::Custom(tag))
    }

    /// Run one actor callback.
    ///
    /// The target's own hooks are never invoked: it would be both sides of
    /// the context.
    fn hook(&mut self, actor: ActorId, hook: Hook) -> Result<(), SimulationError> {
        let Some((me, target)) = pair_mut(&mut self.actors, actor.index(), TARGET.index()) else {
            return Ok(());
        };
        let behavior = &mut self.behaviors[actor.index()];
        let actions = &self.actions;
        let mut ctx = HookContext {
            actor: me,
            target,
            sink: sink!(self),
            rng: &mut self.rng,
        };
        match hook {
            Hook::Start(action) => behavior.on_start(&mut ctx, action, &actions[action.index()].def),
            Hook::Miss(r) => behavior.on_miss(&mut ctx, &r.outcome(actions)),
            Hook::Hit(r) => behavior.on_hit(&mut ctx, &r.outcome(actions)),
            Hook::Tick(r) => behavior.on_tick(&mut ctx, &r.outcome(actions)),
            Hook::Damage(r) => behavior.on_damage(&mut ctx, &r.outcome(actions)),
            Hook::Finish(action) => {
                behavior.on_finish(&mut ctx, action, &actions[action.index()].def)
            }
            Hook::Custom(tag) => behavior.on_custom_event(&mut ctx, tag),
        }?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_mut() {
        let mut items = vec![1, 2, 3];
        let (a, b) = pair_mut(&mut items, 2, 0).unwrap();
        *a += 10;
        *b += 20;
        assert_eq!(items, vec![21, 2, 13]);
        assert!(pair_mut(&mut items, 1, 1).is_none());
        assert!(pair_mut(&mut items, 0, 3).is_none());
    }
}
