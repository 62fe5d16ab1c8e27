//! Hourly availability search within a single day.
//!
//! Candidates are whole-hour starts from `habit.start_hour` up to the latest
//! hour that still fits `min_duration_minutes` before `habit.end_hour`. Every
//! slot on the day blocks time, whichever habit owns it.

use chrono::NaiveTime;

use crate::schedule::{Habit, ScheduleSlot, SlotId};

/// Candidate start hours for `habit`, earliest first.
pub fn candidate_hours(habit: &Habit) -> impl Iterator<Item = u32> {
    let first = habit.start_hour;
    let last = habit.latest_start_hour();
    last.into_iter().flat_map(move |last| first..=last)
}

/// First candidate hour whose `[start, start + min_duration)` overlaps none of
/// `day_slots`. A slot whose id equals `ignore` is treated as absent.
pub fn first_free_hour(
    habit: &Habit,
    day_slots: &[ScheduleSlot],
    ignore: Option<SlotId>,
) -> Option<NaiveTime> {
    let blocking: Vec<&ScheduleSlot> = day_slots
        .iter()
        .filter(|slot| Some(slot.id) != ignore)
        .collect();

    candidate_hours(habit)
        .find(|hour| {
            let start = hour * 60;
            let end = start + habit.min_duration_minutes;
            !blocking.iter().any(|slot| slot.overlaps(start, end))
        })
        .and_then(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
}
