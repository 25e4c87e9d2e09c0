//! SQLite-backed event store and reference resolver.
//!
//! Provides persistent storage for:
//! - Occurrences (single events and members of a series)
//! - Series metadata and their weekday markers
//! - Locations and albums that occurrences reference

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{migrations, EventFilter, EventStore, ReferenceResolver};
use crate::error::{CoreError, DatabaseError, Result};
use crate::event::{Album, Event, Location, NewEvent};
use crate::recurrence::{EndCondition, FrequencyUnit, RecurrenceInfo, RecurrenceRule, WeekdaySet};
use crate::slug::slugify;

const EVENT_COLUMNS: &str = "id, name, slug, description, all_day, date_start, date_end, \
                             location_id, album_id, recurrence_id";

/// Fixed-width UTC form, so string order matches time order.
fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn corrupt(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn parse_timestamp(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            tracing::warn!(column, value = raw, error = %e, "undecodable timestamp");
            corrupt(column, format!("invalid timestamp '{raw}': {e}"))
        })
}

fn row_to_event(row: &rusqlite::Row) -> Result<Event, rusqlite::Error> {
    let date_start: String = row.get(5)?;
    let date_end: Option<String> = row.get(6)?;

    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        all_day: row.get(4)?,
        date_start: parse_timestamp(5, &date_start)?,
        date_end: date_end.as_deref().map(|s| parse_timestamp(6, s)).transpose()?,
        location_id: row.get(7)?,
        album_id: row.get(8)?,
        recurrence_id: row.get(9)?,
    })
}

fn row_to_recurrence(row: &rusqlite::Row) -> Result<RecurrenceInfo, rusqlite::Error> {
    let unit_code: i64 = row.get(2)?;
    let unit = FrequencyUnit::from_code(unit_code)
        .ok_or_else(|| corrupt(2, format!("unknown frequency unit {unit_code}")))?;

    let end_code: i64 = row.get(4)?;
    let end = match end_code {
        0 => EndCondition::MaxDuration,
        1 => {
            let ends_on: Option<String> = row.get(5)?;
            let ends_on = ends_on.ok_or_else(|| corrupt(5, "missing ends_on".into()))?;
            EndCondition::OnDate {
                ends_on: parse_timestamp(5, &ends_on)?,
            }
        }
        2 => {
            let count: Option<u32> = row.get(6)?;
            EndCondition::AfterCount {
                count: count.ok_or_else(|| corrupt(6, "missing ends_after".into()))?,
            }
        }
        other => return Err(corrupt(4, format!("unknown end condition {other}"))),
    };

    let mask: Option<u8> = row.get(7)?;

    Ok(RecurrenceInfo {
        id: row.get(0)?,
        rule: RecurrenceRule {
            frequency: row.get(1)?,
            unit,
            end,
            weekdays: mask.map(WeekdaySet::from_mask),
        },
        is_weekly: row.get(3)?,
    })
}

fn row_to_location(row: &rusqlite::Row) -> Result<Location, rusqlite::Error> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        category_slug: row.get(3)?,
        category_name: row.get(4)?,
    })
}

/// Render a filter as a WHERE clause plus its positional parameters.
fn where_clause(filter: &EventFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(id) = filter.recurrence_id {
        clauses.push("recurrence_id = ?");
        values.push(Value::Integer(id));
    }
    if let Some(id) = filter.location_id {
        clauses.push("location_id = ?");
        values.push(Value::Integer(id));
    }
    if let Some(t) = &filter.start_from {
        clauses.push("date_start >= ?");
        values.push(Value::Text(format_timestamp(t)));
    }
    if let Some(t) = &filter.start_after {
        clauses.push("date_start > ?");
        values.push(Value::Text(format_timestamp(t)));
    }
    if let Some(t) = &filter.start_before {
        clauses.push("date_start < ?");
        values.push(Value::Text(format_timestamp(t)));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// SQLite database for events and their reference data.
pub struct EventDb {
    conn: Connection,
}

impl EventDb {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
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
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Locations & albums ===

    /// Add a location; its slug is derived from the name.
    pub fn add_location(
        &self,
        name: &str,
        category_slug: &str,
        category_name: &str,
    ) -> Result<Location> {
        let slug = slugify(name);
        self.conn.execute(
            "INSERT INTO locations (name, slug, category_slug, category_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, slug, category_slug, category_name],
        )?;
        Ok(Location {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            slug,
            category_slug: category_slug.to_string(),
            category_name: category_name.to_string(),
        })
    }

    /// All locations, ordered by name.
    pub fn list_locations(&self) -> Result<Vec<Location>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, category_slug, category_name
             FROM locations ORDER BY name, id",
        )?;
        let locations = stmt
            .query_map([], row_to_location)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    pub fn add_album(&self, name: &str) -> Result<Album> {
        self.conn
            .execute("INSERT INTO albums (name) VALUES (?1)", params![name])?;
        Ok(Album {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn list_albums(&self) -> Result<Vec<Album>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM albums ORDER BY name, id")?;
        let albums = stmt
            .query_map([], |row| {
                Ok(Album {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    /// Weekday markers stored for a series, Monday = 0.
    pub fn weekday_markers(&self, recurrence_id: i64) -> Result<Vec<u8>> {
        let mut stmt = self.conn.prepare(
            "SELECT weekday FROM recurrence_weekdays WHERE recurrence_id = ?1 ORDER BY weekday",
        )?;
        let days = stmt
            .query_map(params![recurrence_id], |row| row.get::<_, u8>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }
}

impl EventStore for EventDb {
    fn create_recurrence(&self, rule: &RecurrenceRule, is_weekly: bool) -> Result<RecurrenceInfo> {
        let (ends_on, ends_after) = match rule.end {
            EndCondition::MaxDuration => (None, None),
            EndCondition::OnDate { ends_on } => (Some(format_timestamp(&ends_on)), None),
            EndCondition::AfterCount { count } => (None, Some(count)),
        };

        self.conn.execute(
            "INSERT INTO recurrences
                (frequency, frequency_unit, is_weekly, end_condition, ends_on, ends_after, weekday_mask)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rule.frequency,
                rule.unit.code(),
                is_weekly,
                rule.end.code(),
                ends_on,
                ends_after,
                rule.weekdays.map(WeekdaySet::mask),
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        if let Some(days) = rule.weekdays {
            for day in days.iter() {
                self.conn.execute(
                    "INSERT INTO recurrence_weekdays (recurrence_id, weekday) VALUES (?1, ?2)",
                    params![id, day.num_days_from_monday()],
                )?;
            }
        }

        Ok(RecurrenceInfo {
            id,
            rule: *rule,
            is_weekly,
        })
    }

    fn get_recurrence(&self, id: i64) -> Result<Option<RecurrenceInfo>> {
        let info = self
            .conn
            .query_row(
                "SELECT id, frequency, frequency_unit, is_weekly, end_condition, ends_on, ends_after, weekday_mask
                 FROM recurrences WHERE id = ?1",
                params![id],
                row_to_recurrence,
            )
            .optional()?;
        Ok(info)
    }

    fn delete_recurrence(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM recurrence_weekdays WHERE recurrence_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM recurrences WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn create_event(&self, event: &NewEvent) -> Result<Event> {
        let slug = event.slug();
        self.conn.execute(
            "INSERT INTO events
                (name, slug, description, all_day, date_start, date_end, location_id, album_id, recurrence_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.name,
                slug,
                event.description,
                event.all_day,
                format_timestamp(&event.date_start),
                event.date_end.as_ref().map(format_timestamp),
                event.location_id,
                event.album_id,
                event.recurrence_id,
            ],
        )?;
        Ok(event.clone().into_event(self.conn.last_insert_rowid()))
    }

    fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                params![id],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE events
             SET name = ?1, slug = ?2, description = ?3, all_day = ?4, date_start = ?5,
                 date_end = ?6, location_id = ?7, album_id = ?8, recurrence_id = ?9
             WHERE id = ?10",
            params![
                event.name,
                event.slug,
                event.description,
                event.all_day,
                format_timestamp(&event.date_start),
                event.date_end.as_ref().map(format_timestamp),
                event.location_id,
                event.album_id,
                event.recurrence_id,
                event.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: crate::error::RecordKind::Event,
                id: event.id,
            });
        }
        Ok(())
    }

    fn filter_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let (clause, values) = where_clause(filter);
        let mut query = format!("SELECT {EVENT_COLUMNS} FROM events{clause} ORDER BY date_start, id");
        if let Some(limit) = filter.limit {
            query += &format!(" LIMIT {limit}");
        }

        let mut stmt = self.conn.prepare(&query)?;
        let events = stmt
            .query_map(params_from_iter(values.iter()), row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn count_events(&self, filter: &EventFilter) -> Result<usize> {
        let (clause, values) = where_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM events{clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        let count = usize::try_from(count).unwrap_or_default();
        Ok(filter.limit.map_or(count, |limit| count.min(limit)))
    }

    fn delete_event(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// `limit` is ignored; every match is deleted.
    fn delete_events(&self, filter: &EventFilter) -> Result<usize> {
        let (clause, values) = where_clause(filter);
        let deleted = self.conn.execute(
            &format!("DELETE FROM events{clause}"),
            params_from_iter(values.iter()),
        )?;
        Ok(deleted)
    }

    fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<CoreError>,
    {
        // Already inside a transaction: join it.
        if !self.conn.is_autocommit() {
            return f(self);
        }

        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(|e| E::from(CoreError::from(e)))?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT;")
                    .map_err(|e| E::from(CoreError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK;") {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl ReferenceResolver for EventDb {
    fn location(&self, id: i64) -> Result<Option<Location>> {
        let location = self
            .conn
            .query_row(
                "SELECT id, name, slug, category_slug, category_name FROM locations WHERE id = ?1",
                params![id],
                row_to_location,
            )
            .optional()?;
        Ok(location)
    }

    fn album(&self, id: i64) -> Result<Option<Album>> {
        let album = self
            .conn
            .query_row(
                "SELECT id, name FROM albums WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Album {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(album)
    }

    fn locations(&self) -> Result<Vec<Location>> {
        self.list_locations()
    }
}
