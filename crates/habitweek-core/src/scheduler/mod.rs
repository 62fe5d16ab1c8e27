//! Weekly slot allocation and repair for habits.
//!
//! This module provides the scheduling engine:
//! - Finds the earliest free whole hour for a habit on a day
//! - Fills a week with slots for every active habit, up to its weekly target
//! - Repairs a missed slot by moving it forward within its week
//! - Relocates a slot, or adds one ad hoc, on an explicit weekday
//!
//! Every public operation is one unit of work against the injected
//! [`HabitStore`]: either all of its writes are committed or none are.

pub mod availability;
mod outcome;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::{CoreError, DatabaseError, Result};
use crate::schedule::{
    Habit, HabitDraft, HabitId, NewSlot, ScheduleSlot, SlotId, SlotStatus, Week, WeekDay,
    WeekEntry,
};
use crate::storage::HabitStore;

pub use outcome::{Outcome, Rejection, Rescheduled};

/// Scheduling engine over a habit store.
pub struct HabitScheduler<S> {
    store: S,
}

impl<S: HabitStore> HabitScheduler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `body` between `begin` and `commit`, rolling back if either the
    /// body or the commit fails.
    fn unit_of_work<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut S) -> std::result::Result<T, DatabaseError>,
    ) -> Result<T> {
        self.store.begin()?;
        let result = body(&mut self.store).and_then(|value| {
            self.store.commit()?;
            Ok(value)
        });
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(operation, error = %err, "rolling back");
                if let Err(rollback_err) = self.store.rollback() {
                    warn!(operation, error = %rollback_err, "rollback failed");
                }
                Err(CoreError::Database(err))
            }
        }
    }

    /// Earliest free whole hour for `habit` on `date`, or `None` when the
    /// habit's window is fully blocked.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn find_available_time(&self, date: NaiveDate, habit: &Habit) -> Result<Option<NaiveTime>> {
        Ok(find_available(&self.store, date, habit, None)?)
    }

    /// Fill `week` for every active habit.
    ///
    /// Each habit gets at most `frequency_per_week` slots dated inside the
    /// week, one per day, on the earliest days with a free hour. Slots already
    /// in the week count toward the target. Returns the slots created.
    ///
    /// # Errors
    /// Returns an error if the store fails; nothing is written in that case.
    pub fn create_schedule(&mut self, week: Week) -> Result<Vec<ScheduleSlot>> {
        self.unit_of_work("create_schedule", |store| {
            let mut created = Vec::new();

            for habit in store.list_active_habits()? {
                let existing = habit_slots_in_week(store, habit.id, week)?;
                let mut remaining = habit
                    .frequency_per_week
                    .saturating_sub(count_u32(existing.len()));
                if remaining == 0 {
                    debug!(habit_id = habit.id, "weekly target already met");
                    continue;
                }

                let mut booked_days: HashSet<NaiveDate> =
                    existing.iter().map(|slot| slot.date).collect();

                for day in week.days() {
                    if remaining == 0 {
                        break;
                    }
                    if booked_days.contains(&day) {
                        continue;
                    }
                    let Some(start) = find_available(store, day, &habit, None)? else {
                        debug!(habit_id = habit.id, %day, "no free hour");
                        continue;
                    };

                    let slot = store.insert_slot(&NewSlot::for_habit(&habit, day, start))?;
                    info!(habit_id = habit.id, slot_id = slot.id, %day, %start, "slot scheduled");
                    booked_days.insert(day);
                    created.push(slot);
                    remaining -= 1;
                }

                if remaining > 0 {
                    debug!(habit_id = habit.id, remaining, "week under-filled");
                }
            }

            Ok(created)
        })
    }

    /// Mark a slot completed. Any status may become `Completed`.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn mark_completed(&mut self, slot_id: SlotId) -> Result<Outcome<ScheduleSlot>> {
        self.set_status(slot_id, SlotStatus::Completed)
    }

    /// Mark a slot missed. Any status may become `Missed`.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn mark_missed(&mut self, slot_id: SlotId) -> Result<Outcome<ScheduleSlot>> {
        self.set_status(slot_id, SlotStatus::Missed)
    }

    fn set_status(&mut self, slot_id: SlotId, status: SlotStatus) -> Result<Outcome<ScheduleSlot>> {
        self.unit_of_work("set_status", |store| {
            let Some(mut slot) = store.get_slot(slot_id)? else {
                return Ok(Rejection::SlotNotFound { slot_id }.into());
            };
            slot.status = status;
            store.update_slot(&slot)?;
            info!(slot_id, status = status.as_str(), "slot status changed");
            Ok(Outcome::Applied(slot))
        })
    }

    /// Replace a slot with a new one on a later day of the same week.
    ///
    /// Days after the slot's date are tried in order, skipping days where the
    /// habit already has a slot. On success the original is removed and a new
    /// `Scheduled` slot is created; otherwise nothing changes.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn reschedule(&mut self, slot_id: SlotId) -> Result<Outcome<Rescheduled>> {
        self.unit_of_work("reschedule", |store| {
            let Some(original) = store.get_slot(slot_id)? else {
                return Ok(Rejection::SlotNotFound { slot_id }.into());
            };
            let Some(habit) = store.get_habit(original.habit_id)? else {
                return Ok(Rejection::HabitNotFound {
                    habit_id: original.habit_id,
                }
                .into());
            };

            let week = Week::containing(original.date);
            let habit_days: HashSet<NaiveDate> = habit_slots_in_week(store, habit.id, week)?
                .into_iter()
                .filter(|slot| slot.id != original.id)
                .map(|slot| slot.date)
                .collect();

            for day in week.days().filter(|day| *day > original.date) {
                if habit_days.contains(&day) {
                    continue;
                }
                let Some(start) = find_available(store, day, &habit, None)? else {
                    continue;
                };

                store.remove_slot(original.id)?;
                let replacement = store.insert_slot(&NewSlot::for_habit(&habit, day, start))?;
                info!(
                    habit_id = habit.id,
                    from = original.id,
                    to = replacement.id,
                    %day,
                    %start,
                    "slot rescheduled"
                );
                return Ok(Outcome::Applied(Rescheduled {
                    original,
                    replacement,
                }));
            }

            debug!(slot_id, "no later day in the week has room");
            Ok(Rejection::NoAvailability {
                habit_id: habit.id,
                date: original.date,
            }
            .into())
        })
    }

    /// Move a slot to `day` of `week`, keeping its identity.
    ///
    /// The slot itself does not block the search, so it may move within its
    /// own day. Its duration is reset to the habit's minimum duration.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn move_slot(
        &mut self,
        slot_id: SlotId,
        day: WeekDay,
        week: Week,
    ) -> Result<Outcome<ScheduleSlot>> {
        self.unit_of_work("move_slot", |store| {
            let Some(mut slot) = store.get_slot(slot_id)? else {
                return Ok(Rejection::SlotNotFound { slot_id }.into());
            };
            let Some(habit) = store.get_habit(slot.habit_id)? else {
                return Ok(Rejection::HabitNotFound {
                    habit_id: slot.habit_id,
                }
                .into());
            };

            let date = week.date_of(day);
            let Some(start) = find_available(store, date, &habit, Some(slot.id))? else {
                return Ok(Rejection::NoAvailability {
                    habit_id: habit.id,
                    date,
                }
                .into());
            };

            slot.date = date;
            slot.start_time = start;
            slot.duration_minutes = habit.min_duration_minutes;
            store.update_slot(&slot)?;
            info!(slot_id, %date, %start, "slot moved");
            Ok(Outcome::Applied(slot))
        })
    }

    /// Add one slot for a habit on `day` of `week`, if the habit is under its
    /// weekly target and the day has a free hour.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn add_habit(
        &mut self,
        habit_id: HabitId,
        day: WeekDay,
        week: Week,
    ) -> Result<Outcome<ScheduleSlot>> {
        self.unit_of_work("add_habit", |store| {
            let Some(habit) = store.get_habit(habit_id)? else {
                return Ok(Rejection::HabitNotFound { habit_id }.into());
            };

            let scheduled = count_u32(habit_slots_in_week(store, habit_id, week)?.len());
            if scheduled >= habit.frequency_per_week {
                return Ok(Rejection::QuotaExhausted {
                    habit_id,
                    scheduled,
                    target: habit.frequency_per_week,
                }
                .into());
            }

            let date = week.date_of(day);
            let Some(start) = find_available(store, date, &habit, None)? else {
                return Ok(Rejection::NoAvailability { habit_id, date }.into());
            };

            let slot = store.insert_slot(&NewSlot::for_habit(&habit, date, start))?;
            info!(habit_id, slot_id = slot.id, %date, %start, "slot added");
            Ok(Outcome::Applied(slot))
        })
    }

    /// Slots of `week` with their habit names, by date then start time.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn week_entries(&self, week: Week) -> Result<Vec<WeekEntry>> {
        let names: HashMap<HabitId, String> = self
            .store
            .list_habits()?
            .into_iter()
            .map(|habit| (habit.id, habit.name))
            .collect();

        Ok(self
            .store
            .list_slots_between(week.start, week.end())?
            .into_iter()
            .map(|slot| {
                let name = names.get(&slot.habit_id).cloned().unwrap_or_default();
                WeekEntry::new(slot, name)
            })
            .collect())
    }

    /// Delete one slot.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn delete_slot(&mut self, slot_id: SlotId) -> Result<Outcome<ScheduleSlot>> {
        self.unit_of_work("delete_slot", |store| {
            let Some(slot) = store.get_slot(slot_id)? else {
                return Ok(Rejection::SlotNotFound { slot_id }.into());
            };
            store.remove_slot(slot_id)?;
            info!(slot_id, "slot deleted");
            Ok(Outcome::Applied(slot))
        })
    }

    /// Delete every slot dated inside `week`. Returns how many were removed.
    ///
    /// # Errors
    /// Returns an error if the store fails; nothing is removed in that case.
    pub fn clear_week(&mut self, week: Week) -> Result<usize> {
        self.unit_of_work("clear_week", |store| {
            let slots = store.list_slots_between(week.start, week.end())?;
            for slot in &slots {
                store.remove_slot(slot.id)?;
            }
            info!(week_start = %week.start, removed = slots.len(), "week cleared");
            Ok(slots.len())
        })
    }

    /// Validate and store a new habit.
    ///
    /// # Errors
    /// Returns a validation error for an unschedulable draft, or a store error.
    pub fn create_habit(&mut self, draft: &HabitDraft) -> Result<Habit> {
        draft.validate()?;
        self.unit_of_work("create_habit", |store| store.create_habit(draft))
    }

    /// Validate and overwrite an existing habit. Existing slots are kept.
    ///
    /// # Errors
    /// Returns a validation error for an unschedulable draft, or a store error.
    pub fn update_habit(&mut self, habit_id: HabitId, draft: &HabitDraft) -> Result<Outcome<Habit>> {
        draft.validate()?;
        self.unit_of_work("update_habit", |store| {
            let habit = draft.clone().into_habit(habit_id);
            if store.update_habit(&habit)? {
                Ok(Outcome::Applied(habit))
            } else {
                Ok(Rejection::HabitNotFound { habit_id }.into())
            }
        })
    }
}

fn find_available<S: HabitStore>(
    store: &S,
    date: NaiveDate,
    habit: &Habit,
    ignore: Option<SlotId>,
) -> std::result::Result<Option<NaiveTime>, DatabaseError> {
    let day_slots = store.list_slots_on(date)?;
    Ok(availability::first_free_hour(habit, &day_slots, ignore))
}

fn habit_slots_in_week<S: HabitStore>(
    store: &S,
    habit_id: HabitId,
    week: Week,
) -> std::result::Result<Vec<ScheduleSlot>, DatabaseError> {
    Ok(store
        .list_slots_between(week.start, week.end())?
        .into_iter()
        .filter(|slot| slot.habit_id == habit_id)
        .collect())
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
