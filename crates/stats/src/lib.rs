//! Simulation statistics.
//!
//! The [`StatsAggregator`] is the only mutable state carried from one
//! iteration to the next. It is append-only while iterations run and is read
//! only after [`StatsAggregator::analyze`].
//!
//! - [`StatsRecord`] - per-action outcome buckets and damage timeline
//! - [`StatsAggregator`] - all records, pacing-overlap correction, per-actor
//!   iteration totals
//! - [`Uptime`] - up/down tallies for tracked effects

mod aggregator;
mod distribution;
mod record;
mod uptime;

pub use aggregator::{ActorTotals, RecordId, StatsAggregator};
pub use distribution::Distribution;
pub use record::{ResultStats, StatsRecord};
pub use uptime::{Uptime, Uptimes};
