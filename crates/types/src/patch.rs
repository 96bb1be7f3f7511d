//! Game patch selector.
//!
//! Behaviour that changed between patches branches on a [`Patch`] carried by
//! the simulation configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Encoded `arch.version.revision` patch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(u64);

/// Error parsing a patch string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid patch '{0}': expected arch.version.revision, e.g. 2.4.0")]
pub struct PatchParseError(pub String);

impl Patch {
    /// Encode a patch triple.
    pub const fn new(arch: u32, version: u32, revision: u32) -> Self {
        Patch(arch as u64 * 10_000 + version as u64 * 100 + revision as u64)
    }

    /// Encoded value.
    pub fn encoded(self) -> u64 {
        self.0
    }

    /// True if this patch is strictly older than the given one.
    pub fn before(self, arch: u32, version: u32, revision: u32) -> bool {
        self < Patch::new(arch, version, revision)
    }

    /// True if this patch is the given one or newer.
    pub fn after(self, arch: u32, version: u32, revision: u32) -> bool {
        self >= Patch::new(arch, version, revision)
    }
}

impl Default for Patch {
    fn default() -> Self {
        Patch::new(2, 4, 0)
    }
}

impl FromStr for Patch {
    type Err = PatchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(PatchParseError(s.to_string()));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| PatchParseError(s.to_string()))?;
        }
        // version and revision are packed into two decimal digits each
        if nums[1] > 99 || nums[2] > 99 {
            return Err(PatchParseError(s.to_string()));
        }
        Ok(Patch::new(nums[0], nums[1], nums[2]))
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.0 / 10_000,
            (self.0 / 100) % 100,
            self.0 % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_compare() {
        let patch: Patch = "2.3.2".parse().unwrap();
        assert!(patch.before(2, 4, 0));
        assert!(patch.after(2, 3, 0));
        assert!(patch.after(2, 3, 2));
        assert!(!patch.after(2, 3, 3));
        assert_eq!(patch.to_string(), "2.3.2");
    }

    #[test]
    fn test_default_is_2_4_0() {
        assert_eq!(Patch::default(), Patch::new(2, 4, 0));
        assert_eq!(Patch::default().encoded(), 20400);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("2.4".parse::<Patch>().is_err());
        assert!("two.4.0".parse::<Patch>().is_err());
        assert!("2.400.0".parse::<Patch>().is_err());
    }
}
