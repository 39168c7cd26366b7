//! Database schema migrations for dayplan.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};
use tracing::warn;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

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
    conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0))
        .unwrap_or_else(|e| {
            if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                warn!(error = %e, "failed to read schema_version");
            }
            0
        })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: definitions and occurrences tables.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS recurring_definitions (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL,
            category    TEXT NOT NULL DEFAULT '',
            priority    TEXT NOT NULL DEFAULT 'medium',
            time        TEXT,
            rule        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            end_date    TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS occurrences (
            id               TEXT PRIMARY KEY,
            owner_id         TEXT NOT NULL,
            title            TEXT NOT NULL,
            category         TEXT NOT NULL DEFAULT '',
            priority         TEXT NOT NULL DEFAULT 'medium',
            date             TEXT NOT NULL,
            time             TEXT,
            duration_minutes INTEGER,
            definition_id    TEXT,
            completed        INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_definitions_owner ON recurring_definitions(owner_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_occurrences_owner_date ON occurrences(owner_id, date);
    "})?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: at most one generated occurrence per (owner, definition, date).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_occurrences_generated
            ON occurrences(owner_id, definition_id, date)
            WHERE definition_id IS NOT NULL;
    "})?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn unique_index_rejects_duplicate_generated_rows() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let insert = "INSERT INTO occurrences (id, owner_id, title, date, definition_id)
                      VALUES (?1, 'alice', 't', '2024-01-01', ?2)";
        conn.execute(insert, rusqlite::params!["a", "def"]).unwrap();
        assert!(conn.execute(insert, rusqlite::params!["b", "def"]).is_err());
        // One-off rows have no definition and are never constrained.
        conn.execute(insert, rusqlite::params!["c", Option::<String>::None]).unwrap();
        conn.execute(insert, rusqlite::params!["d", Option::<String>::None]).unwrap();
    }
}
