//! Database schema migrations for almanac.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

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
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: reference records, series metadata, and occurrences.
///
/// `events.recurrence_id` is a plain foreign key without cascade; deleting a
/// series' last occurrence leaves clean-up of the series to the caller.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS locations (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            name           TEXT NOT NULL,
            slug           TEXT NOT NULL,
            category_slug  TEXT NOT NULL,
            category_name  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS albums (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recurrences (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            frequency       INTEGER NOT NULL,
            frequency_unit  INTEGER NOT NULL,
            is_weekly       INTEGER NOT NULL DEFAULT 0,
            end_condition   INTEGER NOT NULL,
            ends_on         TEXT,
            ends_after      INTEGER,
            weekday_mask    INTEGER
        );

        CREATE TABLE IF NOT EXISTS recurrence_weekdays (
            recurrence_id  INTEGER NOT NULL REFERENCES recurrences(id),
            weekday        INTEGER NOT NULL,
            PRIMARY KEY (recurrence_id, weekday)
        );

        CREATE TABLE IF NOT EXISTS events (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            name           TEXT NOT NULL,
            slug           TEXT NOT NULL DEFAULT '',
            description    TEXT,
            all_day        INTEGER NOT NULL DEFAULT 0,
            date_start     TEXT NOT NULL,
            date_end       TEXT,
            location_id    INTEGER REFERENCES locations(id),
            album_id       INTEGER REFERENCES albums(id),
            recurrence_id  INTEGER REFERENCES recurrences(id)
        );

        CREATE INDEX IF NOT EXISTS idx_events_date_start ON events(date_start);
        CREATE INDEX IF NOT EXISTS idx_events_recurrence ON events(recurrence_id, date_start);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: index supporting the grouped-by-location view.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_events_location ON events(location_id, date_start);
         CREATE INDEX IF NOT EXISTS idx_locations_name ON locations(name);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
