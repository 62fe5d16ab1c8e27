pub mod config;
pub mod habit;
pub mod schedule;

use chrono::{Local, NaiveDate};
use habitweek_core::seed::seed_defaults;
use habitweek_core::{Config, HabitDb, HabitScheduler, Week};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the database, seeding the built-in habits on first run if enabled.
pub fn open_scheduler() -> Result<HabitScheduler<HabitDb>, Box<dyn std::error::Error>> {
    let mut db = HabitDb::open()?;
    if Config::load_or_default().seed_on_first_run {
        seed_defaults(&mut db)?;
    }
    Ok(HabitScheduler::new(db))
}

/// The week containing `date`, or the current week.
pub fn resolve_week(date: Option<NaiveDate>) -> Week {
    Week::containing(date.unwrap_or_else(|| Local::now().date_naive()))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
