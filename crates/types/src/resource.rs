//! Resource kinds and a fixed-size map keyed by them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// A pool an actor spends or tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Health,
    Mana,
    Rage,
    Energy,
    Focus,
    Runic,
}

impl ResourceKind {
    /// Number of resource kinds.
    pub const COUNT: usize = 6;

    /// All kinds in declaration order.
    pub const ALL: [ResourceKind; ResourceKind::COUNT] = [
        ResourceKind::Health,
        ResourceKind::Mana,
        ResourceKind::Rage,
        ResourceKind::Energy,
        ResourceKind::Focus,
        ResourceKind::Runic,
    ];

    /// Dense index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Health => "health",
            ResourceKind::Mana => "mana",
            ResourceKind::Rage => "rage",
            ResourceKind::Energy => "energy",
            ResourceKind::Focus => "focus",
            ResourceKind::Runic => "runic",
        }
    }

    /// Parse a lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        ResourceKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`ResourceKind`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMap<T>([T; ResourceKind::COUNT]);

impl<T: Copy> ResourceMap<T> {
    /// Every kind set to `value`.
    pub fn splat(value: T) -> Self {
        Self([value; ResourceKind::COUNT])
    }

    /// Iterate `(kind, value)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, T)> + '_ {
        ResourceKind::ALL.into_iter().map(|kind| (kind, self.0[kind.index()]))
    }
}

impl<T> Index<ResourceKind> for ResourceMap<T> {
    type Output = T;

    fn index(&self, kind: ResourceKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<ResourceKind> for ResourceMap<T> {
    fn index_mut(&mut self, kind: ResourceKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_map_indexing() {
        let mut map = ResourceMap::splat(0.0);
        map[ResourceKind::Mana] = 100.0;
        assert_eq!(map[ResourceKind::Mana], 100.0);
        assert_eq!(map[ResourceKind::Rage], 0.0);
        assert_eq!(map.iter().filter(|(_, v)| *v > 0.0).count(), 1);
    }

    #[test]
    fn test_parse_round_trips_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("gold"), None);
    }
}
