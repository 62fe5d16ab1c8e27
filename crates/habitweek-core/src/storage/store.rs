//! Store abstraction the scheduling engine runs against.

use chrono::NaiveDate;

use crate::error::DatabaseError;
use crate::schedule::{Habit, HabitDraft, HabitId, NewSlot, ScheduleSlot, SlotId};

/// Persistent home for habits and their slots, keyed by identity.
///
/// The engine brackets every operation with `begin` and `commit`, calling
/// `rollback` instead of `commit` when any call inside fails. Implementations
/// are not expected to guard against concurrent writers.
pub trait HabitStore {
    /// Start a unit of work.
    fn begin(&mut self) -> Result<(), DatabaseError>;

    /// Persist everything written since `begin`.
    fn commit(&mut self) -> Result<(), DatabaseError>;

    /// Discard everything written since `begin`.
    fn rollback(&mut self) -> Result<(), DatabaseError>;

    /// All habits, ordered by name.
    fn list_habits(&self) -> Result<Vec<Habit>, DatabaseError>;

    /// Active habits, ordered by id.
    fn list_active_habits(&self) -> Result<Vec<Habit>, DatabaseError>;

    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, DatabaseError>;

    fn create_habit(&mut self, draft: &HabitDraft) -> Result<Habit, DatabaseError>;

    /// Overwrite a habit's fields. Returns `false` if no such habit exists.
    fn update_habit(&mut self, habit: &Habit) -> Result<bool, DatabaseError>;

    fn get_slot(&self, id: SlotId) -> Result<Option<ScheduleSlot>, DatabaseError>;

    /// Slots dated `date`, any habit, ordered by start time.
    fn list_slots_on(&self, date: NaiveDate) -> Result<Vec<ScheduleSlot>, DatabaseError>;

    /// Slots dated within `[from, to]`, ordered by date then start time.
    fn list_slots_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleSlot>, DatabaseError>;

    fn insert_slot(&mut self, slot: &NewSlot) -> Result<ScheduleSlot, DatabaseError>;

    /// Overwrite date, start time, duration and status. Returns `false` if the
    /// slot does not exist.
    fn update_slot(&mut self, slot: &ScheduleSlot) -> Result<bool, DatabaseError>;

    /// Returns `false` if the slot does not exist.
    fn remove_slot(&mut self, id: SlotId) -> Result<bool, DatabaseError>;
}
