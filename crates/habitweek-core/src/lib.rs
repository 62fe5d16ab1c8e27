//! # Habitweek Core Library
//!
//! This library provides the scheduling logic for habitweek, a weekly habit
//! planner. Every operation is available through the `habitweek` CLI, which is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Schedule**: Habits, slots and the Saturday-to-Friday week
//! - **Scheduler**: Availability search, week filling and slot repair
//! - **Storage**: SQLite-backed store, in-memory store and TOML configuration
//!
//! ## Key Components
//!
//! - [`HabitScheduler`]: Scheduling engine over any [`HabitStore`]
//! - [`HabitDb`]: SQLite persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod seed;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use schedule::{
    Habit, HabitDraft, HabitId, NewSlot, ScheduleSlot, SlotId, SlotStatus, Week, WeekDay,
    WeekEntry,
};
pub use scheduler::{HabitScheduler, Outcome, Rejection, Rescheduled};
pub use storage::{Config, HabitDb, HabitStore, MemoryStore};
