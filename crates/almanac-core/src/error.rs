//! Core error types for almanac-core.
//!
//! Errors are split by how a caller is expected to react: user-correctable
//! validation problems are accumulated into [`ValidationErrors`], missing
//! records surface as [`CoreError::NotFound`], and malformed date strings as
//! [`InvalidFormat`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for almanac-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more user-correctable problems
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A record referenced by id does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: i64 },

    /// Malformed civil date string
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kinds of records the core looks up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Event,
    Series,
    Location,
    Album,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Event => "event",
            RecordKind::Series => "series",
            RecordKind::Location => "location",
            RecordKind::Album => "album",
        };
        f.write_str(name)
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// The configured civil timezone is not an IANA zone name
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// A civil date string that does not match `MM/DD/YYYY hh:mm AM/PM`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{input}' is not a valid date (expected MM/DD/YYYY hh:mm AM/PM)")]
pub struct InvalidFormat {
    pub input: String,
}

/// Form fields that carry civil date strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
    EndsOn,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateField::Start => "start date",
            DateField::End => "end date",
            DateField::EndsOn => "end-on date",
        };
        f.write_str(name)
    }
}

/// A single user-correctable problem with submitted event fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a name.")]
    MissingName,

    #[error("Please enter a start date.")]
    MissingStartDate,

    #[error("Invalid {field}: {source}")]
    InvalidDate {
        field: DateField,
        #[source]
        source: InvalidFormat,
    },

    #[error("Start date cannot be in the past.")]
    StartInPast,

    #[error("End date cannot be in the past.")]
    EndInPast,

    #[error("Start date must come before end date.")]
    StartNotBeforeEnd,

    #[error("Please enter a unit for frequency.")]
    UnknownFrequencyUnit(i64),

    #[error("Please enter a number of repetitions.")]
    MissingFrequency,

    #[error("Please enter an end condition.")]
    MissingEndCondition,

    #[error("Please enter a date to end on.")]
    MissingEndsOn,

    #[error("Please enter a number of occurrences.")]
    MissingEndsAfter,

    #[error("Unknown day of the week: '{0}'.")]
    UnknownWeekday(String),

    #[error("The specified location could not be found.")]
    LocationNotFound(i64),

    #[error("The specified album could not be found.")]
    AlbumNotFound(i64),

    #[error("Please choose which instances will be affected.")]
    MissingScope,
}

/// Every problem found while validating one submission.
///
/// Never empty when returned as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    /// User-facing messages, one per problem.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(" "))
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
