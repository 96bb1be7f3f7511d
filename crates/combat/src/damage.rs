//! Damage computation and mitigation.

use crate::ActionFlags;
use raidsim_types::{ResultKind, School};

pub const GLANCE_MULTIPLIER: f64 = 0.75;
pub const CRUSH_MULTIPLIER: f64 = 1.5;
/// No mitigation source removes more than this share.
pub const MAX_MITIGATION: f64 = 0.75;

/// A defender's mitigation stats.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Defense {
    pub resistances: [f64; School::COUNT],
    pub armor: f64,
    pub block_value: f64,
}

impl Defense {
    pub fn resistance(&self, school: School) -> f64 {
        self.resistances[school.index()]
    }
}

/// Multiplier chain: `(base + power_mod * power) * base * player * target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageChain {
    pub power_mod: f64,
    pub power: f64,
    pub base_multiplier: f64,
    pub player_multiplier: f64,
    pub target_multiplier: f64,
}

impl DamageChain {
    pub fn scale(&self, base: f64) -> f64 {
        let amount = (base + self.power_mod * self.power)
            * self.base_multiplier
            * self.player_multiplier
            * self.target_multiplier;
        amount.max(0.0)
    }
}

/// Adjust an amount for the roll result.
///
/// Avoided results zero it. Block removes `block_value` and never goes
/// below zero.
pub fn apply_result(amount: f64, result: ResultKind, crit_bonus: f64, block_value: f64) -> f64 {
    match result {
        ResultKind::Miss | ResultKind::Resist | ResultKind::Dodge | ResultKind::Parry => 0.0,
        ResultKind::Block => (amount - block_value).max(0.0),
        ResultKind::Glance => amount * GLANCE_MULTIPLIER,
        ResultKind::Crush => amount * CRUSH_MULTIPLIER,
        ResultKind::Crit => amount * (1.0 + crit_bonus),
        ResultKind::Hit => amount,
    }
}

/// Average share removed by partial resists.
pub fn partial_resist(resistance: f64, penetration: f64, attacker_level: u32) -> f64 {
    let level = attacker_level.max(1) as f64;
    (0.75 * (resistance - penetration) / (5.0 * level)).clamp(0.0, MAX_MITIGATION)
}

/// Share removed by armor.
pub fn armor_reduction(armor: f64, attacker_level: u32) -> f64 {
    let armor = armor.max(0.0);
    let denominator = armor + 400.0 + 85.0 * attacker_level as f64;
    if denominator <= 0.0 {
        return 0.0;
    }
    (armor / denominator).clamp(0.0, MAX_MITIGATION)
}

/// Share of damage removed by the defender for this school.
///
/// Physical damage is reduced by armor. Other schools lose the average
/// partial resist unless the action is binary (binary spells are resisted in
/// full by the roll instead).
pub fn mitigation(
    school: School,
    flags: &ActionFlags,
    defense: &Defense,
    penetration: f64,
    attacker_level: u32,
) -> f64 {
    if school == School::Physical {
        armor_reduction(defense.armor, attacker_level)
    } else if flags.may_resist && !flags.binary {
        partial_resist(defense.resistance(school), penetration, attacker_level)
    } else {
        0.0
    }
}
