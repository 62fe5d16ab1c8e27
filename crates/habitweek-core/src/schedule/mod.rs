//! Schedule types for habits and their weekly slots.

mod week;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use week::{Week, WeekDay};

pub type HabitId = i64;
pub type SlotId = i64;

/// A recurring habit with a weekly target and an allowed hour window.
///
/// `start_hour..=end_hour` bounds where a slot may sit: a slot starting at
/// hour `h` must finish its full duration by `end_hour`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub frequency_per_week: u32,
    pub min_duration_minutes: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    pub is_active: bool,
}

impl Habit {
    /// Whole hours needed to fit the minimum duration.
    pub fn duration_hours(&self) -> u32 {
        self.min_duration_minutes.div_ceil(60)
    }

    /// Latest hour a slot for this habit may start at, if any fits.
    pub fn latest_start_hour(&self) -> Option<u32> {
        self.end_hour
            .checked_sub(self.duration_hours())
            .filter(|latest| *latest >= self.start_hour)
    }
}

/// Habit fields without an identity, used for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub frequency_per_week: u32,
    pub min_duration_minutes: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl HabitDraft {
    /// Check the draft can ever be scheduled.
    ///
    /// # Errors
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::invalid("name", "must not be empty"));
        }
        if self.frequency_per_week > 7 {
            return Err(ValidationError::invalid(
                "frequency_per_week",
                "at most one slot per day, so at most 7 per week",
            ));
        }
        if self.min_duration_minutes == 0 {
            return Err(ValidationError::invalid(
                "min_duration_minutes",
                "must be greater than zero",
            ));
        }
        if self.end_hour > 24 {
            return Err(ValidationError::invalid("end_hour", "must be 24 or less"));
        }
        if self.start_hour >= self.end_hour {
            return Err(ValidationError::invalid(
                "start_hour",
                format!(
                    "start_hour ({}) must be before end_hour ({})",
                    self.start_hour, self.end_hour
                ),
            ));
        }
        if self.min_duration_minutes.div_ceil(60) > self.end_hour - self.start_hour {
            return Err(ValidationError::invalid(
                "min_duration_minutes",
                format!(
                    "{} minutes do not fit between {}:00 and {}:00",
                    self.min_duration_minutes, self.start_hour, self.end_hour
                ),
            ));
        }
        Ok(())
    }

    pub fn into_habit(self, id: HabitId) -> Habit {
        Habit {
            id,
            name: self.name,
            frequency_per_week: self.frequency_per_week,
            min_duration_minutes: self.min_duration_minutes,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            is_active: self.is_active,
        }
    }
}

/// Status of a scheduled slot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Scheduled,
    Completed,
    Missed,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Scheduled => "scheduled",
            SlotStatus::Completed => "completed",
            SlotStatus::Missed => "missed",
        }
    }

    /// Parse a storage token. Unknown tokens read back as `Scheduled`.
    pub fn parse(token: &str) -> Self {
        match token {
            "completed" => SlotStatus::Completed,
            "missed" => SlotStatus::Missed,
            _ => SlotStatus::Scheduled,
        }
    }
}

/// A booked time window for one habit on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: SlotId,
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: SlotStatus,
}

impl ScheduleSlot {
    /// Minutes since midnight.
    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start_time)
    }

    /// Exclusive end in minutes since midnight; may exceed 1440.
    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes
    }

    /// Half-open overlap test against `[start, end)` in minutes since midnight.
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        start < self.end_minute() && self.start_minute() < end
    }
}

pub(crate) fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Insert payload for a new slot. Inserted slots are always `Scheduled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl NewSlot {
    pub fn for_habit(habit: &Habit, date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            habit_id: habit.id,
            date,
            start_time,
            duration_minutes: habit.min_duration_minutes,
        }
    }
}

/// A slot joined with its habit name, as shown in week listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekEntry {
    pub id: SlotId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: SlotStatus,
    pub habit_id: HabitId,
    pub habit_name: String,
}

impl WeekEntry {
    pub fn new(slot: ScheduleSlot, habit_name: String) -> Self {
        Self {
            id: slot.id,
            date: slot.date,
            start_time: slot.start_time,
            duration_minutes: slot.duration_minutes,
            status: slot.status,
            habit_id: slot.habit_id,
            habit_name,
        }
    }
}
