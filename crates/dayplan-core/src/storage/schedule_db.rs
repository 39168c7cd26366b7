//! SQLite-based storage for recurring definitions and occurrences.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::migrations;
use super::{data_dir, ScheduleStore};
use crate::clock::{format_date, ClockTime};
use crate::error::{DatabaseError, Result};
use crate::recurrence::RecurrenceRule;
use crate::schedule::{NewOccurrence, Occurrence, Priority, RecurringDefinition};

const DEFINITION_COLUMNS: &str =
    "id, owner_id, title, category, priority, time, rule, created_at, end_date, is_active";
const OCCURRENCE_COLUMNS: &str =
    "id, owner_id, title, category, priority, date, time, duration_minutes, definition_id, completed";

// === Helper Functions ===

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Parse priority from database string, defaulting to medium
fn parse_priority(s: &str) -> Priority {
    s.parse().unwrap_or_default()
}

/// Parse an optional `HH:MM` column; unreadable values are dropped
fn parse_time(s: Option<String>) -> Option<ClockTime> {
    s.and_then(|t| t.parse().ok())
}

fn parse_date_column(idx: usize, s: &str) -> Result<NaiveDate, rusqlite::Error> {
    crate::clock::parse_date(s).map_err(|e| conversion_error(idx, e))
}

/// Stored rules that no longer decode are kept and never match.
fn parse_rule(s: &str) -> RecurrenceRule {
    serde_json::from_str(s).unwrap_or_else(|e| RecurrenceRule::Unsupported {
        reason: format!("unreadable rule: {e}"),
    })
}

fn row_to_definition(row: &rusqlite::Row) -> Result<RecurringDefinition, rusqlite::Error> {
    let priority: String = row.get(4)?;
    let rule: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(7, e))?;
    let end_date = match row.get::<_, Option<String>>(8)? {
        Some(s) => Some(parse_date_column(8, &s)?),
        None => None,
    };

    Ok(RecurringDefinition {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        priority: parse_priority(&priority),
        time: parse_time(row.get(5)?),
        rule: parse_rule(&rule),
        created_at,
        end_date,
        is_active: row.get(9)?,
    })
}

fn row_to_occurrence(row: &rusqlite::Row) -> Result<Occurrence, rusqlite::Error> {
    let priority: String = row.get(4)?;
    let date: String = row.get(5)?;

    Ok(Occurrence {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        priority: parse_priority(&priority),
        date: parse_date_column(5, &date)?,
        time: parse_time(row.get(6)?),
        duration_minutes: row.get(7)?,
        definition_id: row.get(8)?,
        completed: row.get(9)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn insert_occurrence_row(conn: &Connection, request: NewOccurrence) -> Result<Occurrence> {
    let occurrence = request.into_occurrence();
    let inserted = conn.execute(
        &format!(
            "INSERT INTO occurrences ({OCCURRENCE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            occurrence.id,
            occurrence.owner_id,
            occurrence.title,
            occurrence.category,
            occurrence.priority.as_str(),
            format_date(occurrence.date),
            occurrence.time.map(|t| t.to_string()),
            occurrence.duration_minutes,
            occurrence.definition_id,
            occurrence.completed,
        ],
    );

    match inserted {
        Ok(_) => Ok(occurrence),
        Err(e) if is_unique_violation(&e) => Err(DatabaseError::DuplicateOccurrence {
            owner_id: occurrence.owner_id,
            definition_id: occurrence.definition_id.unwrap_or_default(),
            date: occurrence.date,
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// SQLite database for schedule storage.
///
/// Stores recurring definitions and their occurrences. A partial unique index
/// guarantees at most one generated occurrence per (owner, definition, date),
/// independent of any check the caller makes first.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open the database at `~/.config/dayplan/dayplan.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("dayplan.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // === Recurring definitions ===

    /// Store a new recurring definition.
    pub fn insert_definition(&self, definition: &RecurringDefinition) -> Result<()> {
        let rule = serde_json::to_string(&definition.rule)?;
        self.conn.execute(
            &format!(
                "INSERT INTO recurring_definitions ({DEFINITION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                definition.id,
                definition.owner_id,
                definition.title,
                definition.category,
                definition.priority.as_str(),
                definition.time.map(|t| t.to_string()),
                rule,
                definition.created_at.to_rfc3339(),
                definition.end_date.map(format_date),
                definition.is_active,
            ],
        )?;
        Ok(())
    }

    /// Look up a definition by id.
    ///
    /// # Errors
    /// Returns [`DatabaseError::NotFound`] when no such definition exists.
    pub fn get_definition(&self, id: &str) -> Result<RecurringDefinition> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {DEFINITION_COLUMNS} FROM recurring_definitions WHERE id = ?1"),
                params![id],
                row_to_definition,
            )
            .optional()?;
        found.ok_or_else(|| {
            DatabaseError::NotFound {
                entity: "recurring definition",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Definitions of `owner_id`, oldest first.
    pub fn list_definitions(&self, owner_id: &str, include_inactive: bool) -> Result<Vec<RecurringDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEFINITION_COLUMNS} FROM recurring_definitions
             WHERE owner_id = ?1 AND (?2 OR is_active = 1)
             ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![owner_id, include_inactive], row_to_definition)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Stop a definition from generating further occurrences.
    ///
    /// Occurrences already generated are left untouched.
    pub fn deactivate_definition(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE recurring_definitions SET is_active = 0 WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "recurring definition",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    // === Occurrences ===

    /// Mark an occurrence done or not done.
    /// Insert `requests` in one transaction; either all are stored or none.
    ///
    /// # Errors
    /// Returns the first insert failure, after rolling back the batch.
    pub fn insert_occurrences(&mut self, requests: Vec<NewOccurrence>) -> Result<Vec<Occurrence>> {
        let tx = self.conn.transaction()?;
        let mut stored = Vec::with_capacity(requests.len());
        for request in requests {
            stored.push(insert_occurrence_row(&tx, request)?);
        }
        tx.commit()?;
        Ok(stored)
    }

    pub fn set_occurrence_completed(&self, id: &str, completed: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE occurrences SET completed = ?2 WHERE id = ?1",
            params![id, completed],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "occurrence",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ScheduleStore for ScheduleDb {
    fn list_active_definitions(&self, owner_id: &str) -> Result<Vec<RecurringDefinition>> {
        self.list_definitions(owner_id, false)
    }

    fn occurrence_exists(&self, owner_id: &str, definition_id: &str, date: NaiveDate) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM occurrences
                WHERE owner_id = ?1 AND definition_id = ?2 AND date = ?3
             )",
            params![owner_id, definition_id, format_date(date)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_occurrence(&mut self, request: NewOccurrence) -> Result<Occurrence> {
        insert_occurrence_row(&self.conn, request)
    }

    fn occurrences_on(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Occurrence>> {
        // NULL times sort first, matching `Option<ClockTime>` ordering.
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OCCURRENCE_COLUMNS} FROM occurrences
             WHERE owner_id = ?1 AND date = ?2
             ORDER BY time, title"
        ))?;
        let rows = stmt.query_map(params![owner_id, format_date(date)], row_to_occurrence)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn weekly_definition() -> RecurringDefinition {
        RecurringDefinition::new("alice", "Team sync", RecurrenceRule::weekly([1, 3]))
            .with_category("work")
            .with_priority(Priority::High)
            .with_time(ClockTime::from_hm(10, 0).unwrap())
            .with_end_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .with_created_at(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
    }

    #[test]
    fn definition_round_trips_through_sqlite() {
        let db = ScheduleDb::open_memory().unwrap();
        let def = weekly_definition();
        db.insert_definition(&def).unwrap();

        let loaded = db.get_definition(&def.id).unwrap();
        assert_eq!(loaded, def);
    }

    #[test]
    fn deactivated_definitions_are_hidden_from_active_list() {
        let db = ScheduleDb::open_memory().unwrap();
        let def = weekly_definition();
        db.insert_definition(&def).unwrap();
        db.deactivate_definition(&def.id).unwrap();

        assert!(db.list_active_definitions("alice").unwrap().is_empty());
        assert_eq!(db.list_definitions("alice", true).unwrap().len(), 1);
    }

    #[test]
    fn unknown_definition_is_not_found() {
        let db = ScheduleDb::open_memory().unwrap();
        let err = db.deactivate_definition("missing").unwrap_err();
        assert!(matches!(err, CoreError::Database(DatabaseError::NotFound { .. })));
        assert!(db.get_definition("missing").is_err());
    }

    #[test]
    fn corrupt_rule_json_degrades_to_unsupported() {
        let db = ScheduleDb::open_memory().unwrap();
        let def = weekly_definition();
        db.insert_definition(&def).unwrap();
        db.conn()
            .execute(
                "UPDATE recurring_definitions SET rule = 'not json' WHERE id = ?1",
                params![def.id],
            )
            .unwrap();

        let loaded = db.get_definition(&def.id).unwrap();
        assert!(!loaded.rule.is_supported());
    }

    #[test]
    fn duplicate_generated_occurrence_is_rejected_by_index() {
        let mut db = ScheduleDb::open_memory().unwrap();
        let def = weekly_definition();

        db.insert_occurrence(NewOccurrence::from_definition(&def, day())).unwrap();
        let err = db
            .insert_occurrence(NewOccurrence::from_definition(&def, day()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Database(DatabaseError::DuplicateOccurrence { .. })));
        assert!(db.occurrence_exists("alice", &def.id, day()).unwrap());
        assert!(!db.occurrence_exists("bob", &def.id, day()).unwrap());
    }

    #[test]
    fn batch_insert_is_all_or_nothing() {
        let mut db = ScheduleDb::open_memory().unwrap();
        let def = weekly_definition();
        let batch = vec![
            NewOccurrence::one_off("alice", "Planned", day()),
            NewOccurrence::from_definition(&def, day()),
            NewOccurrence::from_definition(&def, day()),
        ];

        let err = db.insert_occurrences(batch).unwrap_err();
        assert!(matches!(err, CoreError::Database(DatabaseError::DuplicateOccurrence { .. })));
        assert!(db.occurrences_on("alice", day()).unwrap().is_empty());

        let stored = db
            .insert_occurrences(vec![
                NewOccurrence::one_off("alice", "A", day()),
                NewOccurrence::one_off("alice", "B", day()),
            ])
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(db.occurrences_on("alice", day()).unwrap().len(), 2);
    }

    #[test]
    fn occurrences_on_are_ordered_by_time() {
        let mut db = ScheduleDb::open_memory().unwrap();
        let late = NewOccurrence::one_off("alice", "Late", day())
            .with_time(ClockTime::from_hm(15, 0).unwrap())
            .with_duration(45);
        let early = NewOccurrence::one_off("alice", "Early", day()).with_time(ClockTime::from_hm(8, 30).unwrap());
        db.insert_occurrence(late).unwrap();
        let early = db.insert_occurrence(early).unwrap();
        db.insert_occurrence(NewOccurrence::one_off("bob", "Elsewhere", day())).unwrap();

        let listed = db.occurrences_on("alice", day()).unwrap();
        let titles: Vec<_> = listed.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Late"]);
        assert_eq!(listed[1].duration_minutes, Some(45));

        db.set_occurrence_completed(&early.id, true).unwrap();
        assert!(db.occurrences_on("alice", day()).unwrap()[0].completed);
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.db");
        let def = weekly_definition();
        {
            let db = ScheduleDb::open_at(&path).unwrap();
            db.insert_definition(&def).unwrap();
        }
        let db = ScheduleDb::open_at(&path).unwrap();
        assert_eq!(db.list_active_definitions("alice").unwrap().len(), 1);
    }
}
