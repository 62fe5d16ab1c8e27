//! Database schema migrations for habitweek.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Schema version after all migrations have run.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: habits and their schedule slots.
///
/// Dates are stored as `YYYY-MM-DD`, start times as `HH:MM`, so text ordering
/// matches chronological ordering.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            name                 TEXT NOT NULL,
            frequency_per_week   INTEGER NOT NULL,
            min_duration_minutes INTEGER NOT NULL,
            start_hour           INTEGER NOT NULL,
            end_hour             INTEGER NOT NULL,
            is_active            INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS schedule_slots (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            date             TEXT NOT NULL,
            start_time       TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            status           TEXT NOT NULL DEFAULT 'scheduled'
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: indexes for the per-day conflict scan and per-habit week counts.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_slots_date ON schedule_slots(date, start_time);
         CREATE INDEX IF NOT EXISTS idx_slots_habit_date ON schedule_slots(habit_id, date);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
