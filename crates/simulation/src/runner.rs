//! Deterministic simulation driver.
//!
//! The driver owns every actor, every action, the scheduler and the virtual
//! clock. It runs the configured number of independent iterations and folds
//! their outcomes into one [`StatsAggregator`].

use crate::report::{ActorSummary, Anomaly, IterationEnd, IterationSummary, SimulationReport};
use crate::{ConfigError, SimConfig, SimulationError};
use raidsim_combat::{
    parse_action_list, Action, Actor, ActorBehavior, ActorConfig, ActorKind, PassiveActor,
    Resolution,
};
use raidsim_core::{new_scheduler, Event, EventKind, EventSink, Scheduler};
use raidsim_stats::{RecordId, StatsAggregator, Uptimes};
use raidsim_types::{ActionId, ActorId, EventId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Handle of the target. It is always the first actor.
pub const TARGET: ActorId = ActorId(0);

/// Lifecycle of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting actors.
    Idle,
    /// Configuration validated and action lists parsed.
    Initialized,
    Running { iteration: u64 },
    IterationComplete { iteration: u64 },
    Finished,
}

/// An event replayed at the same time in every iteration.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedEvent {
    time: Duration,
    actor: Option<ActorId>,
    kind: EventKind,
}

/// Discrete-event combat simulation.
///
/// Build it with [`Simulation::new`], add players and pets, call
/// [`Simulation::init`] once and then [`Simulation::run`]. Given the same
/// seed, produces identical results every run.
pub struct Simulation {
    pub(crate) config: SimConfig,
    phase: Phase,

    /// All actors, indexed by [`ActorId`]. The target is at index 0.
    pub(crate) actors: Vec<Actor>,
    /// Behaviour of each actor, same indexing.
    pub(crate) behaviors: Vec<Box<dyn ActorBehavior>>,
    /// All actions, indexed by [`ActionId`].
    pub(crate) actions: Vec<Action>,
    /// Resolution model of each action, same indexing.
    pub(crate) resolutions: Vec<Resolution>,
    /// Stats record of each action, same indexing.
    pub(crate) records: Vec<RecordId>,

    pub(crate) scheduler: Box<dyn Scheduler>,
    /// Next creation id. Restarts at zero every iteration.
    pub(crate) next_id: EventId,
    /// Current virtual time.
    pub(crate) now: Duration,
    pub(crate) rng: ChaCha8Rng,

    pub(crate) stats: StatsAggregator,
    pub(crate) uptimes: Uptimes,
    scripted: Vec<ScriptedEvent>,

    /// Set when the target's health reaches zero.
    pub(crate) target_defeated: bool,
    summaries: Vec<IterationSummary>,
}

impl Simulation {
    /// Create a simulation holding only the target.
    pub fn new(config: SimConfig) -> Self {
        let target = Actor::new(TARGET, ActorKind::Target, config.target.to_actor_config());
        let scheduler = new_scheduler(config.scheduler, config.wheel);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let stats = StatsAggregator::new(config.timeline_window);

        Self {
            config,
            phase: Phase::Idle,
            actors: vec![target],
            behaviors: vec![Box::new(PassiveActor)],
            actions: Vec::new(),
            resolutions: Vec::new(),
            records: Vec::new(),
            scheduler,
            next_id: EventId(0),
            now: Duration::ZERO,
            rng,
            stats,
            uptimes: Uptimes::new(),
            scripted: Vec::new(),
            target_defeated: false,
            summaries: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Setup
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a player.
    pub fn add_player(
        &mut self,
        config: ActorConfig,
        behavior: impl ActorBehavior + 'static,
    ) -> Result<ActorId, SimulationError> {
        self.add_actor(ActorKind::Player, config, Box::new(behavior))
    }

    /// Add a pet owned by a player.
    pub fn add_pet(
        &mut self,
        owner: ActorId,
        config: ActorConfig,
        behavior: impl ActorBehavior + 'static,
    ) -> Result<ActorId, SimulationError> {
        match self.actors.get(owner.index()).map(Actor::kind) {
            Some(ActorKind::Player) => {}
            _ => return Err(ConfigError::InvalidOwner(owner).into()),
        }
        self.add_actor(ActorKind::Pet { owner }, config, Box::new(behavior))
    }

    fn add_actor(
        &mut self,
        kind: ActorKind,
        config: ActorConfig,
        behavior: Box<dyn ActorBehavior>,
    ) -> Result<ActorId, SimulationError> {
        if self.phase != Phase::Idle {
            return Err(SimulationError::AlreadyInitialized);
        }
        let id = ActorId(self.actors.len() as u32);
        debug!(%id, name = %config.name, ?kind, "Adding actor");
        self.actors.push(Actor::new(id, kind, config));
        self.behaviors.push(behavior);
        Ok(id)
    }

    /// Validate the configuration and build every actor's actions.
    ///
    /// Fails on malformed configuration, an action name no factory knows, or
    /// an action that cannot resolve.
    pub fn init(&mut self) -> Result<(), SimulationError> {
        if self.phase != Phase::Idle {
            return Err(SimulationError::AlreadyInitialized);
        }
        self.config.validate()?;
        self.scheduler = new_scheduler(self.config.scheduler, self.config.wheel);

        for (actor, behavior) in self.actors.iter_mut().zip(self.behaviors.iter_mut()) {
            if actor.kind() != ActorKind::Target {
                actor.resources.set_infinite(self.config.infinite_resources);
            }
            behavior.init_base(actor);
        }

        for index in 0..self.actors.len() {
            let actor = &self.actors[index];
            let options_error = |source| ConfigError::Options {
                actor: actor.name().to_string(),
                source,
            };
            let entries = parse_action_list(&actor.config().action_list).map_err(options_error)?;

            let mut created = Vec::with_capacity(entries.len());
            for entry in entries {
                let spec = self.behaviors[index]
                    .create_action(actor, &entry.name, &entry.options)
                    .map_err(options_error)?
                    .ok_or_else(|| ConfigError::UnknownAction {
                        actor: actor.name().to_string(),
                        action: entry.name.clone(),
                    })?;
                let resolution = spec.behavior.resolution(&spec.def).ok_or_else(|| {
                    ConfigError::MissingResolution {
                        actor: actor.name().to_string(),
                        action: spec.def.name.clone(),
                    }
                })?;

                let id = ActionId(self.actions.len() as u32);
                let record =
                    self.stats
                        .register(actor.id(), &spec.def.name, spec.def.flags.channeled);
                debug!(
                    actor = %actor,
                    action = %spec.def.name,
                    %id,
                    ?resolution,
                    "Created action"
                );
                self.actions
                    .push(Action::new(id, actor.id(), spec.def, spec.behavior));
                self.resolutions.push(resolution);
                self.records.push(record);
                created.push(id);
            }

            for aura in &actor.config().tracked_auras {
                self.uptimes.register(aura);
            }
            for id in created {
                self.actors[index].push_action(id);
            }
        }

        info!(
            actors = self.actors.len(),
            actions = self.actions.len(),
            scheduler = %self.config.scheduler,
            patch = %self.config.patch,
            "Simulation initialized"
        );
        self.phase = Phase::Initialized;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scripted events
    // ═══════════════════════════════════════════════════════════════════════

    /// Interrupt an action at `at` in every iteration.
    pub fn schedule_interrupt(&mut self, action: ActionId, at: Duration) -> Result<(), SimulationError> {
        let owner = self
            .actions
            .get(action.index())
            .map(Action::owner)
            .ok_or(SimulationError::UnknownAction(action))?;
        self.script(at, Some(owner), EventKind::ActionInterrupt { action });
        Ok(())
    }

    /// Wake a sleeping actor at `at` in every iteration.
    pub fn schedule_summon(&mut self, actor: ActorId, at: Duration) -> Result<(), SimulationError> {
        self.check_actor(actor)?;
        self.script(at, Some(actor), EventKind::Summon);
        Ok(())
    }

    /// Put an actor to sleep at `at` in every iteration.
    pub fn schedule_dismiss(&mut self, actor: ActorId, at: Duration) -> Result<(), SimulationError> {
        self.check_actor(actor)?;
        self.script(at, Some(actor), EventKind::Dismiss);
        Ok(())
    }

    /// Deliver a custom event to an actor's hooks at `at` in every iteration.
    pub fn schedule_custom(
        &mut self,
        actor: ActorId,
        at: Duration,
        tag: u64,
    ) -> Result<(), SimulationError> {
        self.check_actor(actor)?;
        self.script(at, Some(actor), EventKind::Custom { tag });
        Ok(())
    }

    fn script(&mut self, time: Duration, actor: Option<ActorId>, kind: EventKind) {
        trace!(time = ?time, kind = kind.name(), "Scripted event");
        self.scripted.push(ScriptedEvent { time, actor, kind });
    }

    fn check_actor(&self, actor: ActorId) -> Result<(), SimulationError> {
        if actor.index() < self.actors.len() {
            Ok(())
        } else {
            Err(SimulationError::UnknownActor(actor))
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn target(&self) -> &Actor {
        &self.actors[TARGET.index()]
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.index())
    }

    /// Look up an actor by name.
    pub fn find_actor(&self, name: &str) -> Option<ActorId> {
        self.actors.iter().find(|a| a.name() == name).map(Actor::id)
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.index())
    }

    /// Look up one of an actor's actions by name.
    pub fn find_action(&self, actor: ActorId, name: &str) -> Option<ActionId> {
        self.actor(actor)?
            .actions()
            .iter()
            .copied()
            .find(|id| self.actions[id.index()].name() == name)
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn uptimes(&self) -> &Uptimes {
        &self.uptimes
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Running
    // ═══════════════════════════════════════════════════════════════════════

    /// Run every iteration and analyse the results.
    pub fn run(&mut self) -> Result<SimulationReport, SimulationError> {
        if self.phase != Phase::Initialized {
            return Err(SimulationError::NotInitialized);
        }

        info!(
            iterations = self.config.iterations,
            seed = self.config.seed,
            max_time = ?self.config.max_time,
            "Starting simulation"
        );

        for iteration in 0..self.config.iterations {
            self.phase = Phase::Running { iteration };
            let summary = self.run_iteration(iteration)?;
            self.summaries.push(summary);
            self.phase = Phase::IterationComplete { iteration };
        }

        self.stats.analyze();
        self.phase = Phase::Finished;

        let report = self.report();
        info!(
            iterations = report.iterations,
            events = report.events_processed,
            anomalies = report.anomalies().count(),
            "Simulation finished"
        );
        Ok(report)
    }

    fn run_iteration(&mut self, index: u64) -> Result<IterationSummary, SimulationError> {
        self.reset_iteration()?;

        let cap = self.config.max_events_per_iteration;
        let mut processed = 0u64;
        let mut skipped = 0u64;
        let mut anomaly = None;

        let end = loop {
            let Some(next) = self.scheduler.peek().map(Event::occurs) else {
                break IterationEnd::QueueEmpty;
            };
            if next > self.config.max_time {
                debug!(
                    next = ?next,
                    max_time = ?self.config.max_time,
                    "Reached time limit"
                );
                break IterationEnd::TimeLimit;
            }
            if processed >= cap {
                warn!(
                    iteration = index,
                    cap,
                    time = ?self.now,
                    "Event cap reached, ending iteration early"
                );
                anomaly = Some(Anomaly::EventCapReached {
                    cap,
                    time: self.now,
                });
                break IterationEnd::EventCap;
            }

            let Some(event) = self.scheduler.pop() else {
                break IterationEnd::QueueEmpty;
            };
            let time = event.occurs();
            if time < self.now {
                return Err(SimulationError::TimeWentBackwards {
                    now: self.now,
                    event: time,
                });
            }
            self.now = time;
            processed += 1;

            if event.is_invalid() {
                skipped += 1;
                trace!(id = %event.id(), kind = event.kind().name(), "Skipping invalidated event");
                continue;
            }

            trace!(
                time = ?self.now,
                id = %event.id(),
                kind = event.kind().name(),
                "Processing event"
            );
            self.execute(event)?;

            if self.target_defeated {
                debug!(time = ?self.now, "Target defeated");
                break IterationEnd::TargetDefeated;
            }
        };

        let elapsed = match end {
            IterationEnd::TimeLimit => self.config.max_time,
            _ => self.now,
        };
        self.stats.end_iteration(
            elapsed,
            self.actors
                .iter()
                .filter(|a| a.kind() != ActorKind::Target)
                .map(|a| (a.id(), a.name(), a.iteration_damage())),
        );

        debug!(
            iteration = index,
            elapsed = ?elapsed,
            processed,
            skipped,
            ?end,
            "Iteration complete"
        );

        Ok(IterationSummary {
            index,
            end_time: elapsed,
            events_processed: processed,
            events_skipped: skipped,
            end,
            anomaly,
        })
    }

    /// Reset every actor and the scheduler, then seed the iteration.
    fn reset_iteration(&mut self) -> Result<(), SimulationError> {
        self.scheduler.clear();
        self.next_id = EventId(0);
        self.now = Duration::ZERO;
        self.target_defeated = false;

        for (actor, behavior) in self.actors.iter_mut().zip(self.behaviors.iter_mut()) {
            actor.reset();
            behavior.reset(actor);
        }
        for action in &mut self.actions {
            action.reset();
        }
        self.stats.begin_iteration();

        let mut sink = EventSink::new(self.scheduler.as_mut(), &mut self.next_id, Duration::ZERO);
        sink.schedule(self.config.regen_interval, None, EventKind::Regen)?;
        for actor in &mut self.actors {
            if actor.kind() == ActorKind::Target || actor.is_sleeping() {
                continue;
            }
            let ready = sink.schedule(Duration::ZERO, Some(actor.id()), EventKind::PlayerReady)?;
            actor.ready_event = Some(ready);
        }
        for scripted in &self.scripted {
            sink.schedule_at(scripted.time, scripted.actor, scripted.kind.clone())?;
        }
        Ok(())
    }

    /// Dispatch one event.
    fn execute(&mut self, event: Event) -> Result<(), SimulationError> {
        let id = event.id();
        let owner = event.actor();
        match event.kind() {
            EventKind::Regen => self.regen(),
            EventKind::ActionExecute { action } => self.execute_action(*action),
            EventKind::ActionTick { action } => self.tick(*action),
            EventKind::ActionInterrupt { action } => self.interrupt(*action),
            kind => {
                let actor = self.owner(owner, kind)?;
                match kind {
                    EventKind::PlayerReady => self.player_ready(actor, id),
                    EventKind::AuraExpiry { aura } => {
                        let holder = &mut self.actors[actor.index()];
                        if holder.auras.expire(aura, id) {
                            trace!(actor = %holder, aura = %aura, "Aura expired");
                        }
                        Ok(())
                    }
                    EventKind::Summon => self.summon(actor),
                    EventKind::Dismiss => self.dismiss(actor),
                    EventKind::Custom { tag } => self.custom(actor, *tag),
                    _ => Ok(()),
                }
            }
        }
    }

    /// The actor an actor-bound event belongs to.
    fn owner(&self, actor: Option<ActorId>, kind: &EventKind) -> Result<ActorId, SimulationError> {
        match actor {
            Some(id) if id.index() < self.actors.len() => Ok(id),
            Some(id) => Err(SimulationError::UnknownActor(id)),
            None => Err(SimulationError::MissingOwner { kind: kind.name() }),
        }
    }

    fn report(&self) -> SimulationReport {
        let summaries = &self.summaries;
        SimulationReport {
            iterations: self.stats.iterations(),
            total_time: self.stats.total_time(),
            events_processed: summaries.iter().map(|s| s.events_processed).sum(),
            events_skipped: summaries.iter().map(|s| s.events_skipped).sum(),
            iteration_summaries: summaries.clone(),
            actors: self
                .actors
                .iter()
                .filter(|a| a.kind() != ActorKind::Target)
                .map(|a| ActorSummary::new(a, self.stats.actor_totals(a.id())))
                .collect(),
            stats: self.stats.clone(),
            uptimes: self.uptimes.clone(),
        }
    }
}
