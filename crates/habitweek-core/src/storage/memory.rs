//! In-memory store, used by tests and by callers that persist elsewhere.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::HabitStore;
use crate::error::DatabaseError;
use crate::schedule::{Habit, HabitDraft, HabitId, NewSlot, ScheduleSlot, SlotId, SlotStatus};

#[derive(Debug, Clone, Default)]
struct State {
    habits: BTreeMap<HabitId, Habit>,
    slots: BTreeMap<SlotId, ScheduleSlot>,
    next_habit_id: HabitId,
    next_slot_id: SlotId,
}

/// `BTreeMap`-backed [`HabitStore`]. `begin` snapshots, `rollback` restores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: State,
    snapshot: Option<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slot in the store, ordered by id.
    pub fn slots(&self) -> impl Iterator<Item = &ScheduleSlot> {
        self.state.slots.values()
    }
}

fn sort_by_date_and_time(slots: &mut [ScheduleSlot]) {
    slots.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.start_time.cmp(&b.start_time))
            .then(a.id.cmp(&b.id))
    });
}

impl HabitStore for MemoryStore {
    fn begin(&mut self) -> Result<(), DatabaseError> {
        self.snapshot = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DatabaseError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or(DatabaseError::NoTransaction)
    }

    fn rollback(&mut self) -> Result<(), DatabaseError> {
        let snapshot = self.snapshot.take().ok_or(DatabaseError::NoTransaction)?;
        self.state = snapshot;
        Ok(())
    }

    fn list_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        let mut habits: Vec<_> = self.state.habits.values().cloned().collect();
        habits.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(habits)
    }

    fn list_active_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        Ok(self
            .state
            .habits
            .values()
            .filter(|h| h.is_active)
            .cloned()
            .collect())
    }

    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, DatabaseError> {
        Ok(self.state.habits.get(&id).cloned())
    }

    fn create_habit(&mut self, draft: &HabitDraft) -> Result<Habit, DatabaseError> {
        self.state.next_habit_id += 1;
        let habit = draft.clone().into_habit(self.state.next_habit_id);
        self.state.habits.insert(habit.id, habit.clone());
        Ok(habit)
    }

    fn update_habit(&mut self, habit: &Habit) -> Result<bool, DatabaseError> {
        match self.state.habits.get_mut(&habit.id) {
            Some(existing) => {
                *existing = habit.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_slot(&self, id: SlotId) -> Result<Option<ScheduleSlot>, DatabaseError> {
        Ok(self.state.slots.get(&id).cloned())
    }

    fn list_slots_on(&self, date: NaiveDate) -> Result<Vec<ScheduleSlot>, DatabaseError> {
        self.list_slots_between(date, date)
    }

    fn list_slots_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleSlot>, DatabaseError> {
        let mut slots: Vec<_> = self
            .state
            .slots
            .values()
            .filter(|s| from <= s.date && s.date <= to)
            .cloned()
            .collect();
        sort_by_date_and_time(&mut slots);
        Ok(slots)
    }

    fn insert_slot(&mut self, slot: &NewSlot) -> Result<ScheduleSlot, DatabaseError> {
        if !self.state.habits.contains_key(&slot.habit_id) {
            return Err(DatabaseError::QueryFailed(format!(
                "FOREIGN KEY constraint failed: habit {} does not exist",
                slot.habit_id
            )));
        }
        self.state.next_slot_id += 1;
        let stored = ScheduleSlot {
            id: self.state.next_slot_id,
            habit_id: slot.habit_id,
            date: slot.date,
            start_time: slot.start_time,
            duration_minutes: slot.duration_minutes,
            status: SlotStatus::Scheduled,
        };
        self.state.slots.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_slot(&mut self, slot: &ScheduleSlot) -> Result<bool, DatabaseError> {
        match self.state.slots.get_mut(&slot.id) {
            Some(existing) => {
                existing.date = slot.date;
                existing.start_time = slot.start_time;
                existing.duration_minutes = slot.duration_minutes;
                existing.status = slot.status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_slot(&mut self, id: SlotId) -> Result<bool, DatabaseError> {
        Ok(self.state.slots.remove(&id).is_some())
    }
}
