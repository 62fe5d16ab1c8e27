//! Weekly schedule commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitweek_core::{HabitId, HabitStore, Rejection, ScheduleSlot, SlotId, WeekDay, WeekEntry};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Fill the week with slots for every active habit
    Create {
        /// Any date in the target week (default: this week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Show the week's slots
    Week {
        /// Any date in the target week (default: this week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Mark a slot completed
    Complete {
        /// Slot ID
        id: SlotId,
    },
    /// Mark a slot missed
    Miss {
        /// Slot ID
        id: SlotId,
    },
    /// Move a slot to a later day of its week
    Reschedule {
        /// Slot ID
        id: SlotId,
    },
    /// Move a slot to a given weekday
    Move {
        /// Slot ID
        id: SlotId,
        /// Target day: Sat, Sun, Mon, Tue, Wed, Thu or Fri
        day: WeekDay,
        /// Any date in the target week (default: this week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Add one slot for a habit on a given weekday
    Add {
        /// Habit ID
        habit_id: HabitId,
        /// Target day: Sat, Sun, Mon, Tue, Wed, Thu or Fri
        day: WeekDay,
        /// Any date in the target week (default: this week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Delete a slot
    Delete {
        /// Slot ID
        id: SlotId,
    },
    /// Delete every slot in the week
    Clear {
        /// Any date in the target week (default: this week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Show the earliest free hour for a habit on a date
    Free {
        /// Habit ID
        habit_id: HabitId,
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },
}

fn print_slot(slot: &ScheduleSlot) {
    println!(
        "#{} habit {} {} {} {} {}m {}",
        slot.id,
        slot.habit_id,
        WeekDay::of(slot.date),
        slot.date,
        slot.start_time.format("%H:%M"),
        slot.duration_minutes,
        slot.status.as_str(),
    );
}

fn print_entry(entry: &WeekEntry) {
    println!(
        "#{} {} {} {} {}m {} {}",
        entry.id,
        WeekDay::of(entry.date),
        entry.date,
        entry.start_time.format("%H:%M"),
        entry.duration_minutes,
        entry.status.as_str(),
        entry.habit_name,
    );
}

fn report_slot(slot: &ScheduleSlot, json: bool, label: &str) -> super::CliResult {
    if json {
        super::print_json(slot)
    } else {
        print!("{label}: ");
        print_slot(slot);
        Ok(())
    }
}

pub fn run(action: ScheduleAction, json: bool) -> super::CliResult {
    let mut scheduler = super::open_scheduler()?;

    match action {
        ScheduleAction::Create { week } => {
            let week = super::resolve_week(week);
            let created = scheduler.create_schedule(week)?;
            if json {
                super::print_json(&created)?;
            } else {
                println!("Week of {}: {} slots created", week.start, created.len());
                created.iter().for_each(print_slot);
            }
        }
        ScheduleAction::Week { week } => {
            let week = super::resolve_week(week);
            let entries = scheduler.week_entries(week)?;
            if json {
                super::print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No slots for the week of {}.", week.start);
            } else {
                entries.iter().for_each(print_entry);
            }
        }
        ScheduleAction::Complete { id } => {
            let slot = scheduler.mark_completed(id)?.into_result()?;
            report_slot(&slot, json, "Completed")?;
        }
        ScheduleAction::Miss { id } => {
            let slot = scheduler.mark_missed(id)?.into_result()?;
            report_slot(&slot, json, "Missed")?;
        }
        ScheduleAction::Reschedule { id } => {
            let result = scheduler.reschedule(id)?.into_result()?;
            if json {
                super::print_json(&result)?;
            } else {
                print!("Removed: ");
                print_slot(&result.original);
                print!("Rescheduled: ");
                print_slot(&result.replacement);
            }
        }
        ScheduleAction::Move { id, day, week } => {
            let week = super::resolve_week(week);
            let slot = scheduler.move_slot(id, day, week)?.into_result()?;
            report_slot(&slot, json, "Moved")?;
        }
        ScheduleAction::Add {
            habit_id,
            day,
            week,
        } => {
            let week = super::resolve_week(week);
            let slot = scheduler.add_habit(habit_id, day, week)?.into_result()?;
            report_slot(&slot, json, "Added")?;
        }
        ScheduleAction::Delete { id } => {
            let slot = scheduler.delete_slot(id)?.into_result()?;
            report_slot(&slot, json, "Deleted")?;
        }
        ScheduleAction::Clear { week } => {
            let week = super::resolve_week(week);
            let removed = scheduler.clear_week(week)?;
            if json {
                super::print_json(&serde_json::json!({ "removed": removed }))?;
            } else {
                println!("Removed {removed} slots from the week of {}", week.start);
            }
        }
        ScheduleAction::Free { habit_id, date } => {
            let habit = scheduler
                .store()
                .get_habit(habit_id)?
                .ok_or(Rejection::HabitNotFound { habit_id })?;
            let start = scheduler
                .find_available_time(date, &habit)?
                .ok_or(Rejection::NoAvailability { habit_id, date })?;
            if json {
                super::print_json(&serde_json::json!({ "date": date, "start_time": start }))?;
            } else {
                println!("{}", start.format("%H:%M"));
            }
        }
    }
    Ok(())
}
