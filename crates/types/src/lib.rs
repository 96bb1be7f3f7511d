//! Core types shared by every raidsim crate.
//!
//! Nothing in here knows about scheduling or resolution. These are the
//! handles, enums and small value types the other crates agree on.

mod combat;
mod identifiers;
mod patch;
mod resource;

pub use combat::{ActionType, DamageKind, ResultKind, School};
pub use identifiers::{ActionId, ActorId, EventId};
pub use patch::{Patch, PatchParseError};
pub use resource::{ResourceKind, ResourceMap};
