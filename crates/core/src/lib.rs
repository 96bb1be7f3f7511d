//! Event scheduling for the raidsim combat engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     EventSink                           │
//! │   assigns creation ids, stamps times relative to now    │
//! └────────────────────────┬────────────────────────────────┘
//!                          │ push / invalidate / reschedule
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              dyn Scheduler (one per simulation)         │
//! │                                                         │
//! │   SortedListScheduler │ HeapScheduler │ WheelScheduler  │
//! │                                                         │
//! │   Pop order: effective time, then creation id           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All three backends are drop-in substitutes: for the same sequence of
//! operations they pop the same events in the same order. Invalidated events
//! keep their place in that order; the caller skips them after popping.

mod error;
mod event;
mod scheduler;
mod sink;

pub use error::SchedulerError;
pub use event::{Event, EventKey, EventKind};
pub use scheduler::{
    new_scheduler, HeapScheduler, Scheduler, SchedulerKind, SortedListScheduler, WheelConfig,
    WheelScheduler,
};
pub use sink::EventSink;
