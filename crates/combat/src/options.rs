//! Action list and option string parsing.
//!
//! An action list is a `/`-separated sequence of entries, each
//! `name[,key=value]*`:
//!
//! ```text
//! shadow_word_pain/mind_blast,cooldown=5.5/mind_flay
//! ```

use crate::OptionsError;
use indexmap::IndexMap;
use std::str::FromStr;
use std::time::Duration;

/// One entry of an action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub name: String,
    /// Everything after the first comma, unparsed.
    pub options: String,
}

/// Split an action list into entries. Blank entries are skipped.
pub fn parse_action_list(list: &str) -> Result<Vec<ActionEntry>, OptionsError> {
    let mut entries = Vec::new();
    for (index, raw) in list.split('/').enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (name, options) = raw.split_once(',').unwrap_or((raw, ""));
        let name = name.trim();
        if name.is_empty() {
            return Err(OptionsError::EmptyName { index });
        }
        entries.push(ActionEntry {
            name: name.to_string(),
            options: options.trim().to_string(),
        });
    }
    Ok(entries)
}

/// Parsed `key=value` options of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    action: String,
    values: IndexMap<String, String>,
}

impl Options {
    /// Parse a comma-separated option string for `action`.
    pub fn parse(action: &str, options: &str) -> Result<Self, OptionsError> {
        let mut values = IndexMap::new();
        for option in options.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            let Some((key, value)) = option.split_once('=') else {
                return Err(OptionsError::Malformed {
                    option: option.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(OptionsError::Malformed {
                    option: option.to_string(),
                });
            }
            if values
                .insert(key.to_string(), value.trim().to_string())
                .is_some()
            {
                return Err(OptionsError::Duplicate {
                    key: key.to_string(),
                });
            }
        }
        Ok(Self {
            action: action.to_string(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse a value, `None` if absent.
    pub fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, OptionsError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| OptionsError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// A value in seconds.
    pub fn duration(&self, key: &str) -> Result<Option<Duration>, OptionsError> {
        let Some(secs) = self.parsed::<f64>(key)? else {
            return Ok(None);
        };
        // Rejects negative, non-finite and out-of-range values alike.
        Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| OptionsError::InvalidValue {
                key: key.to_string(),
                value: self.get(key).unwrap_or_default().to_string(),
            })
    }

    /// A flag given as `1`/`0` or `true`/`false`.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, OptionsError> {
        match self.get(key) {
            None => Ok(None),
            Some("1") | Some("true") => Ok(Some(true)),
            Some("0") | Some("false") => Ok(Some(false)),
            Some(value) => Err(OptionsError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Reject keys outside `allowed`.
    pub fn check_known(&self, allowed: &[&str]) -> Result<(), OptionsError> {
        match self.values.keys().find(|key| !allowed.contains(&key.as_str())) {
            Some(key) => Err(OptionsError::Unknown {
                action: self.action.clone(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
