//! SQLite-based storage for habits and schedule slots.

use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, HabitStore};
use crate::error::{CoreError, DatabaseError};
use crate::schedule::{Habit, HabitDraft, HabitId, NewSlot, ScheduleSlot, SlotId, SlotStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// How long a write waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SLOT_COLUMNS: &str = "id, habit_id, date, start_time, duration_minutes, status";
const HABIT_COLUMNS: &str =
    "id, name, frequency_per_week, min_duration_minutes, start_hour, end_hour, is_active";

// === Helper Functions ===

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_date(idx: usize, raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_time(idx: usize, raw: &str) -> Result<NaiveTime, rusqlite::Error> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_slot(row: &rusqlite::Row) -> Result<ScheduleSlot, rusqlite::Error> {
    let date: String = row.get(2)?;
    let start_time: String = row.get(3)?;
    let status: String = row.get(5)?;

    Ok(ScheduleSlot {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        date: parse_date(2, &date)?,
        start_time: parse_time(3, &start_time)?,
        duration_minutes: row.get(4)?,
        status: SlotStatus::parse(&status),
    })
}

fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    Ok(Habit {
        id: row.get(0)?,
        name: row.get(1)?,
        frequency_per_week: row.get(2)?,
        min_duration_minutes: row.get(3)?,
        start_hour: row.get(4)?,
        end_hour: row.get(5)?,
        is_active: row.get(6)?,
    })
}

/// SQLite database for habits and schedule slots.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Open the database at `<data_dir>/habitweek.db`.
    ///
    /// Creates the file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("habitweek.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn query_slots(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<ScheduleSlot>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(sql)?;
        let slots = stmt.query_map(params, row_to_slot)?.collect();
        slots
    }
}

impl HabitStore for HabitDb {
    fn begin(&mut self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DatabaseError> {
        if self.conn.is_autocommit() {
            return Err(DatabaseError::NoTransaction);
        }
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DatabaseError> {
        if self.conn.is_autocommit() {
            return Err(DatabaseError::NoTransaction);
        }
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    // === Habit CRUD ===

    fn list_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits ORDER BY name ASC, id ASC"))?;
        let habits = stmt.query_map([], row_to_habit)?.collect::<Result<_, _>>()?;
        Ok(habits)
    }

    fn list_active_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE is_active = 1 ORDER BY id ASC"
        ))?;
        let habits = stmt.query_map([], row_to_habit)?.collect::<Result<_, _>>()?;
        Ok(habits)
    }

    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, DatabaseError> {
        let habit = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                row_to_habit,
            )
            .optional()?;
        Ok(habit)
    }

    fn create_habit(&mut self, draft: &HabitDraft) -> Result<Habit, DatabaseError> {
        self.conn.execute(
            "INSERT INTO habits (name, frequency_per_week, min_duration_minutes, start_hour, end_hour, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.name,
                draft.frequency_per_week,
                draft.min_duration_minutes,
                draft.start_hour,
                draft.end_hour,
                draft.is_active,
            ],
        )?;
        Ok(draft.clone().into_habit(self.conn.last_insert_rowid()))
    }

    fn update_habit(&mut self, habit: &Habit) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?1, frequency_per_week = ?2, min_duration_minutes = ?3,
                 start_hour = ?4, end_hour = ?5, is_active = ?6
             WHERE id = ?7",
            params![
                habit.name,
                habit.frequency_per_week,
                habit.min_duration_minutes,
                habit.start_hour,
                habit.end_hour,
                habit.is_active,
                habit.id,
            ],
        )?;
        Ok(changed > 0)
    }

    // === ScheduleSlot CRUD ===

    fn get_slot(&self, id: SlotId) -> Result<Option<ScheduleSlot>, DatabaseError> {
        let slot = self
            .conn
            .query_row(
                &format!("SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE id = ?1"),
                params![id],
                row_to_slot,
            )
            .optional()?;
        Ok(slot)
    }

    fn list_slots_on(&self, date: NaiveDate) -> Result<Vec<ScheduleSlot>, DatabaseError> {
        Ok(self.query_slots(
            &format!(
                "SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE date = ?1 ORDER BY start_time ASC, id ASC"
            ),
            params![format_date(date)],
        )?)
    }

    fn list_slots_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleSlot>, DatabaseError> {
        Ok(self.query_slots(
            &format!(
                "SELECT {SLOT_COLUMNS} FROM schedule_slots
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY date ASC, start_time ASC, id ASC"
            ),
            params![format_date(from), format_date(to)],
        )?)
    }

    fn insert_slot(&mut self, slot: &NewSlot) -> Result<ScheduleSlot, DatabaseError> {
        self.conn.execute(
            "INSERT INTO schedule_slots (habit_id, date, start_time, duration_minutes, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                slot.habit_id,
                format_date(slot.date),
                format_time(slot.start_time),
                slot.duration_minutes,
                SlotStatus::Scheduled.as_str(),
            ],
        )?;
        Ok(ScheduleSlot {
            id: self.conn.last_insert_rowid(),
            habit_id: slot.habit_id,
            date: slot.date,
            start_time: slot.start_time,
            duration_minutes: slot.duration_minutes,
            status: SlotStatus::Scheduled,
        })
    }

    fn update_slot(&mut self, slot: &ScheduleSlot) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE schedule_slots
             SET date = ?1, start_time = ?2, duration_minutes = ?3, status = ?4
             WHERE id = ?5",
            params![
                format_date(slot.date),
                format_time(slot.start_time),
                slot.duration_minutes,
                slot.status.as_str(),
                slot.id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_slot(&mut self, id: SlotId) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM schedule_slots WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_draft() -> HabitDraft {
        HabitDraft {
            name: "Workout".to_string(),
            frequency_per_week: 4,
            min_duration_minutes: 30,
            start_hour: 6,
            end_hour: 22,
            is_active: true,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn create_and_get_habit() {
        let mut db = HabitDb::open_memory().unwrap();
        let habit = db.create_habit(&make_test_draft()).unwrap();
        let loaded = db.get_habit(habit.id).unwrap().unwrap();
        assert_eq!(loaded, habit);
        assert!(db.get_habit(habit.id + 1).unwrap().is_none());
    }

    #[test]
    fn update_habit_reports_missing_rows() {
        let mut db = HabitDb::open_memory().unwrap();
        let mut habit = db.create_habit(&make_test_draft()).unwrap();
        habit.is_active = false;
        habit.frequency_per_week = 2;
        assert!(db.update_habit(&habit).unwrap());
        assert_eq!(db.get_habit(habit.id).unwrap().unwrap(), habit);
        assert!(db.list_active_habits().unwrap().is_empty());

        habit.id = 99;
        assert!(!db.update_habit(&habit).unwrap());
    }

    #[test]
    fn slot_round_trip_preserves_date_and_time() {
        let mut db = HabitDb::open_memory().unwrap();
        let habit = db.create_habit(&make_test_draft()).unwrap();
        let slot = db
            .insert_slot(&NewSlot::for_habit(&habit, date(19), time(7)))
            .unwrap();

        let loaded = db.get_slot(slot.id).unwrap().unwrap();
        assert_eq!(loaded, slot);
        assert_eq!(loaded.status, SlotStatus::Scheduled);
    }

    #[test]
    fn list_slots_orders_by_date_then_time() {
        let mut db = HabitDb::open_memory().unwrap();
        let habit = db.create_habit(&make_test_draft()).unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(18), time(10))).unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(17), time(9))).unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(18), time(6))).unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(25), time(6))).unwrap();

        let week = db.list_slots_between(date(17), date(23)).unwrap();
        let keys: Vec<_> = week.iter().map(|s| (s.date, s.start_time)).collect();
        assert_eq!(
            keys,
            vec![(date(17), time(9)), (date(18), time(6)), (date(18), time(10))]
        );

        let day = db.list_slots_on(date(18)).unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].start_time, time(6));
    }

    #[test]
    fn update_and_remove_slot() {
        let mut db = HabitDb::open_memory().unwrap();
        let habit = db.create_habit(&make_test_draft()).unwrap();
        let mut slot = db
            .insert_slot(&NewSlot::for_habit(&habit, date(19), time(7)))
            .unwrap();

        slot.status = SlotStatus::Missed;
        slot.date = date(20);
        assert!(db.update_slot(&slot).unwrap());
        assert_eq!(db.get_slot(slot.id).unwrap().unwrap(), slot);

        assert!(db.remove_slot(slot.id).unwrap());
        assert!(!db.remove_slot(slot.id).unwrap());
        assert!(db.get_slot(slot.id).unwrap().is_none());
    }

    #[test]
    fn insert_slot_for_unknown_habit_fails() {
        let mut db = HabitDb::open_memory().unwrap();
        let orphan = NewSlot {
            habit_id: 7,
            date: date(19),
            start_time: time(7),
            duration_minutes: 30,
        };
        assert!(matches!(
            db.insert_slot(&orphan),
            Err(DatabaseError::QueryFailed(_))
        ));
    }

    #[test]
    fn rollback_discards_writes() {
        let mut db = HabitDb::open_memory().unwrap();
        let habit = db.create_habit(&make_test_draft()).unwrap();

        db.begin().unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(19), time(7))).unwrap();
        db.rollback().unwrap();
        assert!(db.list_slots_on(date(19)).unwrap().is_empty());

        db.begin().unwrap();
        db.insert_slot(&NewSlot::for_habit(&habit, date(19), time(7))).unwrap();
        db.commit().unwrap();
        assert_eq!(db.list_slots_on(date(19)).unwrap().len(), 1);

        assert!(matches!(db.commit(), Err(DatabaseError::NoTransaction)));
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habitweek.db");
        {
            let mut db = HabitDb::open_at(&path).unwrap();
            db.create_habit(&make_test_draft()).unwrap();
        }
        let db = HabitDb::open_at(&path).unwrap();
        assert_eq!(db.list_habits().unwrap().len(), 1);
    }
}
