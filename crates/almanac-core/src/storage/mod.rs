mod config;
pub mod database;
pub mod migrations;

pub use config::{CalendarConfig, Config, StorageConfig};
pub use database::EventDb;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::event::{Album, Event, Location, NewEvent};
use crate::recurrence::{RecurrenceInfo, RecurrenceRule};

/// Returns the data directory, creating it if needed.
///
/// `ALMANAC_HOME` overrides the location entirely; otherwise the directory is
/// `~/.config/almanac/`, or `~/.config/almanac-dev/` when `ALMANAC_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("ALMANAC_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ALMANAC_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("almanac-dev")
            } else {
                base_dir.join("almanac")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Interpret a submitted reference id. `0` (or anything non-positive) means "no reference".
pub fn reference_id(raw: i64) -> Option<i64> {
    (raw > 0).then_some(raw)
}

/// Criteria for selecting stored occurrences. Unset fields do not filter.
///
/// Matches are always ordered by start time, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub recurrence_id: Option<i64>,
    pub location_id: Option<i64>,
    /// Inclusive lower bound on `date_start`.
    pub start_from: Option<DateTime<Utc>>,
    /// Exclusive lower bound on `date_start`.
    pub start_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `date_start`.
    pub start_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_series(mut self, recurrence_id: i64) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }

    pub fn at_location(mut self, location_id: i64) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn starting_from(mut self, instant: DateTime<Utc>) -> Self {
        self.start_from = Some(instant);
        self
    }

    pub fn starting_after(mut self, instant: DateTime<Utc>) -> Self {
        self.start_after = Some(instant);
        self
    }

    pub fn starting_before(mut self, instant: DateTime<Utc>) -> Self {
        self.start_before = Some(instant);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Persistence for occurrences and their series metadata.
pub trait EventStore {
    /// Store a series and its weekday markers.
    fn create_recurrence(&self, rule: &RecurrenceRule, is_weekly: bool) -> Result<RecurrenceInfo>;

    fn get_recurrence(&self, id: i64) -> Result<Option<RecurrenceInfo>>;

    /// Remove a series and its weekday markers. Occurrences are not touched.
    fn delete_recurrence(&self, id: i64) -> Result<()>;

    fn create_event(&self, event: &NewEvent) -> Result<Event>;

    fn get_event(&self, id: i64) -> Result<Option<Event>>;

    fn update_event(&self, event: &Event) -> Result<()>;

    fn filter_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    fn count_events(&self, filter: &EventFilter) -> Result<usize>;

    /// Delete one occurrence; `false` if it did not exist.
    fn delete_event(&self, id: i64) -> Result<bool>;

    /// Delete every matching occurrence and return how many went.
    fn delete_events(&self, filter: &EventFilter) -> Result<usize>;

    /// Run `f` atomically: every write inside it lands, or none does.
    fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<CoreError>;
}

/// Lookup of the location and album records events may point at.
pub trait ReferenceResolver {
    fn location(&self, id: i64) -> Result<Option<Location>>;

    fn album(&self, id: i64) -> Result<Option<Album>>;

    /// Every location, ordered by name.
    fn locations(&self) -> Result<Vec<Location>>;
}
