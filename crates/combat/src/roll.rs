//! Result rolls.
//!
//! Outcome chances are laid out as a cumulative table in a fixed order and a
//! single uniform draw picks the first entry whose threshold it reaches. Any
//! remainder is a plain hit.

use crate::ActionFlags;
use raidsim_types::ResultKind;

/// Spell miss against an equal-level target.
pub const SPELL_MISS_BASE: f64 = 0.04;
/// Added per level the target is above, up to two levels.
pub const SPELL_MISS_PER_LEVEL: f64 = 0.01;
/// Added per level beyond the second.
pub const SPELL_MISS_PER_LEVEL_HIGH: f64 = 0.11;
/// Spells always keep this much miss chance.
pub const SPELL_MISS_FLOOR: f64 = 0.01;

/// Melee miss, dodge, parry and block against an equal-level target.
pub const ATTACK_AVOID_BASE: f64 = 0.05;
/// Added to each avoidance per level the target is above.
pub const ATTACK_AVOID_PER_LEVEL: f64 = 0.005;
/// Glancing blows against an equal-level target.
pub const GLANCE_BASE: f64 = 0.10;
pub const GLANCE_PER_LEVEL: f64 = 0.05;
pub const GLANCE_MAX: f64 = 0.25;
/// Level advantage the attacker needs before blows can crush.
pub const CRUSH_LEVEL_GAP: i32 = 4;
pub const CRUSH_BASE: f64 = 0.15;
pub const CRUSH_PER_LEVEL: f64 = 0.10;
/// Crit suppressed per level the target is above.
pub const ATTACK_CRIT_PER_LEVEL: f64 = 0.01;

/// How an action picks its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// miss, resist (binary only), crit, hit.
    Spell,
    /// miss, dodge, parry, block, glance, crush, crit, hit.
    Attack,
    /// Always the given result. Draws nothing.
    Fixed(ResultKind),
}

/// Inputs to a roll, already combined from actor, target and modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollInput {
    /// Target level minus actor level.
    pub level_delta: i32,
    pub hit: f64,
    pub crit: f64,
    /// Reduces dodge and parry.
    pub expertise: f64,
    /// Full-resist chance for binary spells.
    pub resist: f64,
}

/// Chance of every non-hit outcome. Zero means not in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeChances {
    pub miss: f64,
    pub resist: f64,
    pub dodge: f64,
    pub parry: f64,
    pub block: f64,
    pub glance: f64,
    pub crush: f64,
    pub crit: f64,
}

/// Level-based spell miss before hit bonuses.
pub fn spell_level_miss(level_delta: i32) -> f64 {
    let delta = level_delta.max(-4);
    let low = delta.min(2) as f64;
    let high = (delta - 2).max(0) as f64;
    (SPELL_MISS_BASE + low * SPELL_MISS_PER_LEVEL + high * SPELL_MISS_PER_LEVEL_HIGH).max(0.0)
}

fn avoidance(level_delta: i32) -> f64 {
    (ATTACK_AVOID_BASE + level_delta as f64 * ATTACK_AVOID_PER_LEVEL).max(0.0)
}

impl OutcomeChances {
    /// Spell table.
    pub fn spell(flags: &ActionFlags, input: &RollInput) -> Self {
        let mut chances = Self::default();
        if flags.may_miss {
            chances.miss = (spell_level_miss(input.level_delta) - input.hit).max(SPELL_MISS_FLOOR);
        }
        if flags.may_resist && flags.binary {
            chances.resist = input.resist.clamp(0.0, 1.0);
        }
        if flags.may_crit {
            chances.crit = input.crit.max(0.0);
        }
        chances
    }

    /// Melee table.
    pub fn attack(flags: &ActionFlags, input: &RollInput) -> Self {
        let delta = input.level_delta;
        let mut chances = Self::default();
        if flags.may_miss {
            chances.miss = (avoidance(delta) - input.hit).max(0.0);
        }
        if flags.may_dodge {
            chances.dodge = (avoidance(delta) - input.expertise).max(0.0);
        }
        if flags.may_parry {
            chances.parry = (avoidance(delta) - input.expertise).max(0.0);
        }
        if flags.may_block {
            chances.block = avoidance(delta);
        }
        if flags.may_glance && delta >= 0 {
            chances.glance = (GLANCE_BASE + delta as f64 * GLANCE_PER_LEVEL).min(GLANCE_MAX);
        }
        if flags.may_crush && -delta >= CRUSH_LEVEL_GAP {
            chances.crush = CRUSH_BASE + (-delta - CRUSH_LEVEL_GAP) as f64 * CRUSH_PER_LEVEL;
        }
        if flags.may_crit {
            chances.crit = (input.crit - delta.max(0) as f64 * ATTACK_CRIT_PER_LEVEL).max(0.0);
        }
        chances
    }

    /// Periodic tick table: crit or hit.
    pub fn tick(flags: &ActionFlags, input: &RollInput) -> Self {
        Self {
            crit: if flags.tick_may_crit {
                input.crit.max(0.0)
            } else {
                0.0
            },
            ..Self::default()
        }
    }
}

/// Cumulative thresholds in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollTable {
    entries: Vec<(ResultKind, f64)>,
}

impl RollTable {
    /// Build the table, omitting zero-chance outcomes. The running total is
    /// capped at 1, so outcomes late in the order get squeezed out first.
    pub fn new(chances: &OutcomeChances) -> Self {
        let ordered = [
            (ResultKind::Miss, chances.miss),
            (ResultKind::Resist, chances.resist),
            (ResultKind::Dodge, chances.dodge),
            (ResultKind::Parry, chances.parry),
            (ResultKind::Block, chances.block),
            (ResultKind::Glance, chances.glance),
            (ResultKind::Crush, chances.crush),
            (ResultKind::Crit, chances.crit),
        ];

        let mut total = 0.0;
        let mut entries = Vec::new();
        for (kind, chance) in ordered {
            if chance <= 0.0 || total >= 1.0 {
                continue;
            }
            total = (total + chance).min(1.0);
            entries.push((kind, total));
        }
        Self { entries }
    }

    /// Result for a draw `u` in `[0, 1)`.
    pub fn roll(&self, u: f64) -> ResultKind {
        self.entries
            .iter()
            .find(|(_, threshold)| u <= *threshold)
            .map_or(ResultKind::Hit, |(kind, _)| *kind)
    }

    pub fn entries(&self) -> &[(ResultKind, f64)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidsim_types::School;

    #[test]
    fn test_spell_miss_by_level() {
        assert!((spell_level_miss(0) - 0.04).abs() < 1e-12);
        assert!((spell_level_miss(2) - 0.06).abs() < 1e-12);
        assert!((spell_level_miss(3) - 0.17).abs() < 1e-12);
        assert!((spell_level_miss(4) - 0.28).abs() < 1e-12);
        assert!(spell_level_miss(-10).abs() < 1e-12);
    }

    #[test]
    fn test_table_order_and_boundaries() {
        let table = RollTable::new(&OutcomeChances {
            miss: 0.25,
            crit: 0.25,
            ..OutcomeChances::default()
        });
        assert_eq!(
            table.entries(),
            &[(ResultKind::Miss, 0.25), (ResultKind::Crit, 0.5)]
        );
        assert_eq!(table.roll(0.0), ResultKind::Miss);
        assert_eq!(table.roll(0.25), ResultKind::Miss, "boundary goes to first");
        assert_eq!(table.roll(0.2500001), ResultKind::Crit);
        assert_eq!(table.roll(0.5), ResultKind::Crit);
        assert_eq!(table.roll(0.75), ResultKind::Hit);
    }

    #[test]
    fn test_table_is_capped() {
        let table = RollTable::new(&OutcomeChances {
            miss: 0.75,
            crit: 0.5,
            glance: 0.5,
            ..OutcomeChances::default()
        });
        assert_eq!(
            table.entries(),
            &[
                (ResultKind::Miss, 0.75),
                (ResultKind::Glance, 1.0),
            ]
        );
        assert_eq!(table.roll(0.999), ResultKind::Glance);
    }

    #[test]
    fn test_spell_chances_respect_flags() {
        let input = RollInput {
            level_delta: 3,
            hit: 0.1,
            crit: 0.2,
            resist: 0.3,
            ..RollInput::default()
        };
        let mut flags = ActionFlags::spell(School::Shadow);
        let chances = OutcomeChances::spell(&flags, &input);
        assert!((chances.miss - 0.07).abs() < 1e-12);
        assert_eq!(chances.resist, 0.0, "only binary spells fully resist");
        assert_eq!(chances.crit, 0.2);

        flags.binary = true;
        flags.may_crit = false;
        let chances = OutcomeChances::spell(&flags, &input);
        assert_eq!(chances.resist, 0.3);
        assert_eq!(chances.crit, 0.0);

        let capped = RollInput { hit: 1.0, ..input };
        assert_eq!(OutcomeChances::spell(&flags, &capped).miss, SPELL_MISS_FLOOR);
    }

    #[test]
    fn test_attack_chances() {
        let input = RollInput {
            level_delta: 3,
            hit: 0.02,
            crit: 0.25,
            expertise: 0.01,
            ..RollInput::default()
        };
        let chances = OutcomeChances::attack(&ActionFlags::attack(), &input);
        assert!((chances.miss - 0.045).abs() < 1e-12);
        assert!((chances.dodge - 0.055).abs() < 1e-12);
        assert!((chances.block - 0.065).abs() < 1e-12);
        assert!((chances.glance - 0.25).abs() < 1e-12);
        assert_eq!(chances.crush, 0.0);
        assert!((chances.crit - 0.22).abs() < 1e-12);

        let mut flags = ActionFlags::attack();
        flags.may_crush = true;
        let crushing = RollInput {
            level_delta: -5,
            ..RollInput::default()
        };
        let chances = OutcomeChances::attack(&flags, &crushing);
        assert!((chances.crush - 0.25).abs() < 1e-12);
        assert_eq!(chances.glance, 0.0);
    }

    #[test]
    fn test_ticks_only_crit() {
        let input = RollInput {
            crit: 0.3,
            hit: -1.0,
            ..RollInput::default()
        };
        let mut flags = ActionFlags::spell(School::Fire);
        assert_eq!(OutcomeChances::tick(&flags, &input), OutcomeChances::default());
        flags.tick_may_crit = true;
        let chances = OutcomeChances::tick(&flags, &input);
        assert_eq!(chances.crit, 0.3);
        assert_eq!(chances.miss, 0.0);
    }
}
