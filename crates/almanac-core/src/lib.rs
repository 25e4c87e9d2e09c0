//! # Almanac Core Library
//!
//! Recurrence materialization for event calendars. A recurrence rule
//! (start, frequency, unit, optional weekday filter, end condition) is
//! expanded into every concrete occurrence it implies, and the stored set can
//! later be re-spaced, edited or truncated as a unit. The `almanac` CLI is a
//! thin layer over this library.
//!
//! ## Architecture
//!
//! - **Civil time**: parses `MM/DD/YYYY hh:mm AM/PM` strings in one fixed
//!   timezone into absolute timestamps
//! - **Recurrence**: rule validation and the occurrence generator, capped at
//!   one year from the series start
//! - **Lifecycle**: create / update / delete of whole occurrence sets inside
//!   a single store transaction
//! - **Calendar**: month grid, by-date and by-location listings, detail lookup
//! - **Storage**: SQLite event store and TOML configuration
//!
//! ## Key Components
//!
//! - [`generate`]: materializes a rule into occurrences
//! - [`SeriesManager`]: lifecycle operations over an [`EventStore`]
//! - [`CalendarQuery`]: read-side views
//! - [`EventDb`]: SQLite implementation of the store and reference resolver
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod civil_time;
pub mod clock;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod recurrence;
pub mod slug;
pub mod storage;

pub use calendar::{CalendarQuery, DetailError, EventDetail, MonthLink, MonthRef};
pub use civil_time::CivilTime;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{
    ConfigError, CoreError, DatabaseError, InvalidFormat, RecordKind, ValidationError,
    ValidationErrors,
};
pub use event::{Album, Event, Location, NewEvent, RedirectTarget};
pub use lifecycle::{
    CreateOutcome, DeleteOutcome, EventEdit, LifecycleError, Scope, SeriesManager, UpdateOutcome,
};
pub use recurrence::{
    generate, EndCondition, FrequencyUnit, RawEventFields, RecurrenceInfo, RecurrenceRule,
    SeriesTemplate, WeekdaySet,
};
pub use storage::{Config, EventDb, EventFilter, EventStore, ReferenceResolver};
