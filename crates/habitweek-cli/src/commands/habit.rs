//! Habit management commands for CLI.

use clap::Subcommand;
use habitweek_core::seed::seed_defaults;
use habitweek_core::{Config, Habit, HabitDb, HabitDraft, HabitId, HabitStore, Rejection};

#[derive(Subcommand)]
pub enum HabitAction {
    /// List habits
    List,
    /// Create a new habit
    Create {
        /// Habit name
        name: String,
        /// Target slots per week (default: from config)
        #[arg(long)]
        frequency: Option<u32>,
        /// Minimum minutes per slot (default: from config)
        #[arg(long)]
        duration: Option<u32>,
        /// First allowed hour (default: from config)
        #[arg(long)]
        start_hour: Option<u32>,
        /// Hour by which the slot must end (default: from config)
        #[arg(long)]
        end_hour: Option<u32>,
        /// Create the habit paused
        #[arg(long)]
        inactive: bool,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: HabitId,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New weekly target
        #[arg(long)]
        frequency: Option<u32>,
        /// New minimum minutes per slot
        #[arg(long)]
        duration: Option<u32>,
        /// New first allowed hour
        #[arg(long)]
        start_hour: Option<u32>,
        /// New window end hour
        #[arg(long)]
        end_hour: Option<u32>,
        /// Pause or resume the habit
        #[arg(long)]
        active: Option<bool>,
    },
    /// Insert the built-in habits if none exist
    Seed,
}

fn print_habit(habit: &Habit) {
    println!(
        "#{} {} {}x/week {}m {:02}:00-{:02}:00{}",
        habit.id,
        habit.name,
        habit.frequency_per_week,
        habit.min_duration_minutes,
        habit.start_hour,
        habit.end_hour,
        if habit.is_active { "" } else { " (paused)" },
    );
}

pub fn run(action: HabitAction, json: bool) -> super::CliResult {
    match action {
        HabitAction::List => {
            let scheduler = super::open_scheduler()?;
            let habits = scheduler.store().list_habits()?;
            if json {
                super::print_json(&habits)?;
            } else if habits.is_empty() {
                println!("No habits.");
            } else {
                habits.iter().for_each(print_habit);
            }
        }
        HabitAction::Create {
            name,
            frequency,
            duration,
            start_hour,
            end_hour,
            inactive,
        } => {
            let defaults = Config::load_or_default().habit_defaults;
            let draft = HabitDraft {
                name,
                frequency_per_week: frequency.unwrap_or(defaults.frequency_per_week),
                min_duration_minutes: duration.unwrap_or(defaults.min_duration_minutes),
                start_hour: start_hour.unwrap_or(defaults.start_hour),
                end_hour: end_hour.unwrap_or(defaults.end_hour),
                is_active: !inactive,
            };
            let habit = super::open_scheduler()?.create_habit(&draft)?;
            if json {
                super::print_json(&habit)?;
            } else {
                print!("Habit created: ");
                print_habit(&habit);
            }
        }
        HabitAction::Update {
            id,
            name,
            frequency,
            duration,
            start_hour,
            end_hour,
            active,
        } => {
            let mut scheduler = super::open_scheduler()?;
            let current = scheduler
                .store()
                .get_habit(id)?
                .ok_or(Rejection::HabitNotFound { habit_id: id })?;

            let draft = HabitDraft {
                name: name.unwrap_or(current.name),
                frequency_per_week: frequency.unwrap_or(current.frequency_per_week),
                min_duration_minutes: duration.unwrap_or(current.min_duration_minutes),
                start_hour: start_hour.unwrap_or(current.start_hour),
                end_hour: end_hour.unwrap_or(current.end_hour),
                is_active: active.unwrap_or(current.is_active),
            };
            let habit = scheduler.update_habit(id, &draft)?.into_result()?;
            if json {
                super::print_json(&habit)?;
            } else {
                print!("Habit updated: ");
                print_habit(&habit);
            }
        }
        HabitAction::Seed => {
            let mut db = HabitDb::open()?;
            let inserted = seed_defaults(&mut db)?;
            if inserted == 0 {
                println!("Habits already exist; nothing seeded.");
            } else {
                println!("Seeded {inserted} habits.");
            }
        }
    }
    Ok(())
}
