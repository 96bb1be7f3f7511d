//! Error types for the combat model.

use raidsim_types::ResourceKind;
use thiserror::Error;

/// A resource operation that cannot proceed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    /// Not enough of a constrained resource to pay a cost.
    #[error("insufficient {kind}: need {cost}, have {available}")]
    Insufficient {
        kind: ResourceKind,
        cost: f64,
        available: f64,
    },

    /// Resource name not recognised.
    #[error("unknown resource: {0}")]
    Unknown(String),
}

/// Malformed action list or option string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// An action list entry with no name.
    #[error("empty action name in entry {index}")]
    EmptyName { index: usize },

    /// An option that is not `key=value`.
    #[error("malformed option '{option}' (expected key=value)")]
    Malformed { option: String },

    /// The same key given twice.
    #[error("option '{key}' given more than once")]
    Duplicate { key: String },

    /// A value that does not parse as the expected type.
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },

    /// A key the action does not understand.
    #[error("unknown option '{key}' for action '{action}'")]
    Unknown { action: String, key: String },
}
