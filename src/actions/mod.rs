//! Top-level use cases of the scheduling assistant.
//!
//! Every action returns a `SchedulingOutcome`: failures are values with a
//! short user-facing message, and ambiguity carries the partial resolution
//! so the caller can ask a targeted follow-up question instead of starting
//! over.

mod book_meeting;
mod find_time;
mod view_schedule;

pub use book_meeting::{BookMeetingAction, BookMeetingData, BookMeetingRequest};
pub use find_time::{FindTimeAction, FindTimeData, FindTimeRequest};
pub use view_schedule::{ViewScheduleAction, ViewScheduleData, ViewScheduleRequest};

use serde::Serialize;

use crate::resolve::BatchOutcome;
use crate::types::{AmbiguousName, Identity};

/// Outcome of a scheduling use case.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SchedulingOutcome<T> {
    Success {
        data: T,
    },
    /// One or more participant names need a human pick before the use case
    /// can continue.
    NeedsDisambiguation {
        resolved: Vec<Identity>,
        pending: Vec<AmbiguousName>,
    },
    Failure {
        message: String,
        resolved: Vec<Identity>,
    },
}

impl<T> SchedulingOutcome<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        SchedulingOutcome::Failure {
            message: message.into(),
            resolved: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SchedulingOutcome::Success { .. })
    }
}

/// Fold a resolver batch into either the resolved identities or a terminal
/// outcome for the caller.
pub(crate) fn identities_or_outcome<T>(
    batch: BatchOutcome,
) -> Result<Vec<Identity>, SchedulingOutcome<T>> {
    match batch {
        BatchOutcome::Resolved(identities) => Ok(identities),
        BatchOutcome::Ambiguous { resolved, pending } => {
            Err(SchedulingOutcome::NeedsDisambiguation { resolved, pending })
        }
        BatchOutcome::Failed { message } => Err(SchedulingOutcome::Failure {
            message,
            resolved: Vec::new(),
        }),
    }
}
