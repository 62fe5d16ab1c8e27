//! Built-in starter habits.

use tracing::{info, warn};

use crate::error::DatabaseError;
use crate::schedule::HabitDraft;
use crate::storage::HabitStore;

/// Starter habits: name, times per week, minutes, window start, window end.
const DEFAULT_HABITS: [(&str, u32, u32, u32, u32); 3] = [
    ("Workout", 4, 30, 6, 22),
    ("Read", 5, 30, 8, 22),
    ("Code", 7, 30, 7, 19),
];

/// Drafts for the built-in habits.
pub fn default_habits() -> Vec<HabitDraft> {
    DEFAULT_HABITS
        .iter()
        .map(|&(name, frequency, minutes, start_hour, end_hour)| HabitDraft {
            name: name.to_string(),
            frequency_per_week: frequency,
            min_duration_minutes: minutes,
            start_hour,
            end_hour,
            is_active: true,
        })
        .collect()
}

/// Insert the built-in habits if the store has no habits yet.
///
/// The emptiness check and the inserts share one transaction. Returns how
/// many habits were inserted, 0 when the store already had some.
///
/// # Errors
/// Returns an error if the store fails; nothing is inserted in that case.
pub fn seed_defaults<S: HabitStore>(store: &mut S) -> Result<usize, DatabaseError> {
    store.begin()?;
    let result = insert_if_empty(store).and_then(|inserted| {
        store.commit()?;
        Ok(inserted)
    });

    match result {
        Ok(inserted) => {
            if inserted > 0 {
                info!(inserted, "seeded default habits");
            }
            Ok(inserted)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

fn insert_if_empty<S: HabitStore>(store: &mut S) -> Result<usize, DatabaseError> {
    if !store.list_habits()?.is_empty() {
        return Ok(0);
    }
    let drafts = default_habits();
    for draft in &drafts {
        store.create_habit(draft)?;
    }
    Ok(drafts.len())
}
