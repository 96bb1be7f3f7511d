//! Scheduler errors.

use raidsim_types::EventId;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a scheduler backend.
///
/// Both variants are configuration errors: the wheel was sized too small for
/// the delays the simulation schedules. They are not recoverable mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Event lies further ahead than the wheel can represent.
    #[error("{id} at {time:?} exceeds the wheel horizon ({horizon:?} from {now:?})")]
    BeyondHorizon {
        id: EventId,
        time: Duration,
        now: Duration,
        horizon: Duration,
    },

    /// Event lies before the wheel cursor.
    #[error("{id} at {time:?} is earlier than the wheel cursor at {now:?}")]
    EventInPast {
        id: EventId,
        time: Duration,
        now: Duration,
    },
}
