//! Combat enums: damage schools, roll outcomes, damage kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Damage school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum School {
    Holy,
    Shadow,
    Arcane,
    Frost,
    Fire,
    Nature,
    Physical,
}

impl School {
    /// Number of schools.
    pub const COUNT: usize = 7;

    /// All schools in declaration order.
    pub const ALL: [School; School::COUNT] = [
        School::Holy,
        School::Shadow,
        School::Arcane,
        School::Frost,
        School::Fire,
        School::Nature,
        School::Physical,
    ];

    /// Dense index for per-school tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            School::Holy => "holy",
            School::Shadow => "shadow",
            School::Arcane => "arcane",
            School::Frost => "frost",
            School::Fire => "fire",
            School::Nature => "nature",
            School::Physical => "physical",
        }
    }

    /// Parse a lowercase school name.
    pub fn parse(s: &str) -> Option<Self> {
        School::ALL.into_iter().find(|school| school.as_str() == s)
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Miss,
    Resist,
    Dodge,
    Parry,
    Block,
    Glance,
    Crush,
    Crit,
    Hit,
}

impl ResultKind {
    /// Number of result kinds.
    pub const COUNT: usize = 9;

    /// All result kinds in declaration order.
    pub const ALL: [ResultKind; ResultKind::COUNT] = [
        ResultKind::Miss,
        ResultKind::Resist,
        ResultKind::Dodge,
        ResultKind::Parry,
        ResultKind::Block,
        ResultKind::Glance,
        ResultKind::Crush,
        ResultKind::Crit,
        ResultKind::Hit,
    ];

    /// Dense index for per-result tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the outcome lands (hit, crit and the partial outcomes).
    ///
    /// Miss, full resist, dodge and parry do not land.
    pub fn is_hit(self) -> bool {
        !matches!(
            self,
            ResultKind::Miss | ResultKind::Resist | ResultKind::Dodge | ResultKind::Parry
        )
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Miss => "miss",
            ResultKind::Resist => "resist",
            ResultKind::Dodge => "dodge",
            ResultKind::Parry => "parry",
            ResultKind::Block => "block",
            ResultKind::Glance => "glance",
            ResultKind::Crush => "crush",
            ResultKind::Crit => "crit",
            ResultKind::Hit => "hit",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether damage came from the direct component or a periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Direct,
    OverTime,
}

impl fmt::Display for DamageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DamageKind::Direct => f.write_str("direct"),
            DamageKind::OverTime => f.write_str("over_time"),
        }
    }
}

/// Broad action family. Selects the default result-roll model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Spell,
    Attack,
    #[default]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_hit() {
        assert!(ResultKind::Hit.is_hit());
        assert!(ResultKind::Crit.is_hit());
        assert!(ResultKind::Glance.is_hit());
        assert!(ResultKind::Block.is_hit());
        assert!(!ResultKind::Miss.is_hit());
        assert!(!ResultKind::Dodge.is_hit());
        assert!(!ResultKind::Parry.is_hit());
        assert!(!ResultKind::Resist.is_hit());
    }

    #[test]
    fn test_school_parse() {
        assert_eq!(School::parse("fire"), Some(School::Fire));
        assert_eq!(School::parse("Fire"), None);
        for school in School::ALL {
            assert_eq!(School::parse(school.as_str()), Some(school));
        }
    }

    #[test]
    fn test_indexes_are_dense() {
        for (i, kind) in ResultKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        for (i, school) in School::ALL.iter().enumerate() {
            assert_eq!(school.index(), i);
        }
    }
}
