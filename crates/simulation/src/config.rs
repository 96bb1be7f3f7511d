//! Configuration types for the simulation driver.

use crate::ConfigError;
use raidsim_combat::{ActorConfig, Defense};
use raidsim_core::{SchedulerKind, WheelConfig};
use raidsim_types::{Patch, ResourceKind, ResourceMap, School};
use std::time::Duration;

/// The actor every action is aimed at.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetConfig {
    pub name: String,

    /// Target level. Raid bosses are three levels above the players.
    pub level: u32,

    /// Resistance per school, indexed by [`School::index`].
    pub resistances: [f64; School::COUNT],

    pub armor: f64,

    /// Damage removed from blocked attacks.
    pub block_value: f64,

    /// Starting health. With it set the iteration ends when the target
    /// dies; without it the target is unkillable.
    pub initial_health: Option<f64>,

    /// Debuffs present on the target for the whole fight.
    pub permanent_auras: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name: "target".to_string(),
            level: 73,
            resistances: [0.0; School::COUNT],
            armor: 0.0,
            block_value: 0.0,
            initial_health: None,
            permanent_auras: Vec::new(),
        }
    }
}

impl TargetConfig {
    /// Set the target level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the resistance of one school.
    pub fn with_resistance(mut self, school: School, value: f64) -> Self {
        self.resistances[school.index()] = value;
        self
    }

    /// Set the armor value.
    pub fn with_armor(mut self, armor: f64) -> Self {
        self.armor = armor;
        self
    }

    /// Give the target a health pool.
    pub fn with_health(mut self, health: f64) -> Self {
        self.initial_health = Some(health);
        self
    }

    /// The target as an actor configuration.
    pub fn to_actor_config(&self) -> ActorConfig {
        let mut config = ActorConfig::new(self.name.clone()).with_level(self.level);
        config.defense = Defense {
            resistances: self.resistances,
            armor: self.armor,
            block_value: self.block_value,
        };
        if let Some(health) = self.initial_health {
            config = config.with_resource(ResourceKind::Health, health.max(0.0));
        }
        config.permanent_auras = self.permanent_auras.clone();
        config
    }
}

/// Configuration for a simulation run.
///
/// Immutable once handed to [`crate::Simulation::new`]; checked by
/// [`SimConfig::validate`] from `init()`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Number of independent iterations.
    pub iterations: u64,

    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Scheduler strategy.
    pub scheduler: SchedulerKind,

    /// Wheel dimensions, used by [`SchedulerKind::Wheel`] only.
    pub wheel: WheelConfig,

    /// Resource kinds that never run out for players and pets.
    pub infinite_resources: ResourceMap<bool>,

    /// Soft horizon of one iteration.
    pub max_time: Duration,

    /// Hard cap on events processed per iteration.
    pub max_events_per_iteration: u64,

    /// Game patch selecting patch-dependent behaviour.
    pub patch: Patch,

    /// Reaction delay between finishing an action and the next readiness
    /// check.
    pub lag: Duration,

    /// Interval of the periodic regeneration event.
    pub regen_interval: Duration,

    /// How soon an actor blocked by a condition without a known deadline
    /// re-checks readiness.
    pub ready_poll_interval: Duration,

    /// Use the mean of the direct damage range instead of a uniform draw.
    pub average_damage: bool,

    /// Width in seconds of the DPS timeline smoothing window.
    pub timeline_window: usize,

    /// The target.
    pub target: TargetConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: 12345,
            scheduler: SchedulerKind::default(),
            wheel: WheelConfig::default(),
            infinite_resources: ResourceMap::splat(false),
            max_time: Duration::from_secs(300),
            max_events_per_iteration: 1_000_000,
            patch: Patch::default(),
            lag: Duration::from_millis(100),
            regen_interval: Duration::from_secs(2),
            ready_poll_interval: Duration::from_millis(100),
            average_damage: false,
            timeline_window: 10,
            target: TargetConfig::default(),
        }
    }
}

impl SimConfig {
    /// Set the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the scheduler strategy.
    pub fn with_scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Set the wheel dimensions.
    pub fn with_wheel(mut self, wheel: WheelConfig) -> Self {
        self.wheel = wheel;
        self
    }

    /// Mark a resource kind as unconstrained.
    pub fn with_infinite_resource(mut self, kind: ResourceKind) -> Self {
        self.infinite_resources[kind] = true;
        self
    }

    /// Set the per-iteration horizon.
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = max_time;
        self
    }

    /// Set the per-iteration event cap.
    pub fn with_max_events(mut self, cap: u64) -> Self {
        self.max_events_per_iteration = cap;
        self
    }

    pub fn with_patch(mut self, patch: Patch) -> Self {
        self.patch = patch;
        self
    }

    /// Set the patch from its `arch.version.revision` string.
    pub fn with_patch_str(mut self, patch: &str) -> Result<Self, ConfigError> {
        self.patch = patch.parse()?;
        Ok(self)
    }

    /// Set the reaction delay.
    pub fn with_lag(mut self, lag: Duration) -> Self {
        self.lag = lag;
        self
    }

    pub fn with_regen_interval(mut self, interval: Duration) -> Self {
        self.regen_interval = interval;
        self
    }

    pub fn with_ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }

    /// Use average instead of random direct damage.
    pub fn with_average_damage(mut self, average: bool) -> Self {
        self.average_damage = average;
        self
    }

    pub fn with_timeline_window(mut self, window: usize) -> Self {
        self.timeline_window = window;
        self
    }

    /// Set the target.
    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = target;
        self
    }

    /// Reject configurations the driver cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_time.is_zero() {
            return Err(ConfigError::ZeroMaxTime);
        }
        if self.regen_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "regen_interval",
            });
        }
        if self.ready_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "ready_poll_interval",
            });
        }
        if self.max_events_per_iteration == 0 {
            return Err(ConfigError::ZeroEventCap);
        }

        if self.scheduler == SchedulerKind::Wheel {
            let WheelConfig {
                horizon,
                granularity,
            } = self.wheel;
            if horizon.is_zero() || granularity.is_zero() || granularity > horizon {
                return Err(ConfigError::InvalidWheel {
                    horizon,
                    granularity,
                });
            }
            let fixed_delays = [
                ("regen_interval", self.regen_interval),
                ("ready_poll_interval", self.ready_poll_interval),
                ("lag", self.lag),
            ];
            for (name, required) in fixed_delays {
                if horizon < required {
                    return Err(ConfigError::WheelHorizonTooShort {
                        horizon,
                        name,
                        required,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_limits() {
        let config = SimConfig::default().with_max_time(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxTime));

        let config = SimConfig::default().with_regen_interval(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroInterval {
                name: "regen_interval"
            })
        );

        let config = SimConfig::default().with_max_events(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroEventCap));
    }

    #[test]
    fn test_wheel_dimensions_only_checked_for_wheel() {
        let wheel = WheelConfig {
            horizon: Duration::from_secs(1),
            granularity: Duration::from_secs(2),
        };
        let config = SimConfig::default().with_wheel(wheel);
        assert_eq!(config.validate(), Ok(()));

        let config = config.with_scheduler(SchedulerKind::Wheel);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWheel { .. })
        ));
    }

    #[test]
    fn test_wheel_horizon_must_cover_driver_delays() {
        let config = SimConfig::default()
            .with_scheduler(SchedulerKind::Wheel)
            .with_wheel(WheelConfig {
                horizon: Duration::from_secs(1),
                granularity: Duration::from_millis(10),
            });
        assert_eq!(
            config.validate(),
            Err(ConfigError::WheelHorizonTooShort {
                horizon: Duration::from_secs(1),
                name: "regen_interval",
                required: Duration::from_secs(2),
            })
        );
    }

    #[test]
    fn test_patch_string() {
        let config = SimConfig::default().with_patch_str("2.1.0").unwrap();
        assert!(config.patch.before(2, 4, 0));
        assert!(matches!(
            SimConfig::default().with_patch_str("two"),
            Err(ConfigError::Patch(_))
        ));
    }

    #[test]
    fn test_target_actor_config() {
        let target = TargetConfig::default()
            .with_health(50_000.0)
            .with_resistance(School::Fire, 75.0)
            .with_armor(7700.0);
        let config = target.to_actor_config();
        assert_eq!(config.level, 73);
        assert_eq!(config.resources[ResourceKind::Health], 50_000.0);
        assert_eq!(config.defense.resistance(School::Fire), 75.0);
        assert_eq!(config.defense.armor, 7700.0);

        let immortal = TargetConfig::default().to_actor_config();
        assert_eq!(immortal.resources[ResourceKind::Health], 0.0);
    }
}
