//! Expected, non-fatal results of engine operations.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::schedule::{HabitId, ScheduleSlot, SlotId};

/// Why an operation left the store untouched.
///
/// These are normal outcomes the caller is expected to check, not faults.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    #[error("slot {slot_id} not found")]
    SlotNotFound { slot_id: SlotId },

    #[error("habit {habit_id} not found")]
    HabitNotFound { habit_id: HabitId },

    #[error("no free time for habit {habit_id} starting {date}")]
    NoAvailability { habit_id: HabitId, date: NaiveDate },

    #[error("habit {habit_id} already has {scheduled} of {target} slots this week")]
    QuotaExhausted {
        habit_id: HabitId,
        scheduled: u32,
        target: u32,
    },
}

impl Rejection {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Rejection::SlotNotFound { .. } | Rejection::HabitNotFound { .. }
        )
    }
}

/// Result of an engine operation that can be turned down.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<T, Rejection> {
        match self {
            Outcome::Applied(value) => Ok(value),
            Outcome::Rejected(rejection) => Err(rejection),
        }
    }
}

impl<T> From<Rejection> for Outcome<T> {
    fn from(rejection: Rejection) -> Self {
        Outcome::Rejected(rejection)
    }
}

/// A slot replaced by a new one on a later day of the same week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rescheduled {
    /// The removed slot, as it was before removal.
    pub original: ScheduleSlot,
    pub replacement: ScheduleSlot,
}
