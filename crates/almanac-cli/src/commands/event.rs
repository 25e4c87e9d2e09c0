//! Event lifecycle commands.
//!
//! Flags are passed through as raw field values; all checking happens in the
//! core so the CLI reports the same messages a form submission would get.

use almanac_core::{
    CalendarQuery, EventEdit, LifecycleError, RawEventFields, Scope, SeriesManager,
};
use clap::{Subcommand, ValueEnum};

use super::Session;

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitArg {
    None,
    Day,
    Week,
    Month,
    Year,
}

impl UnitArg {
    fn code(self) -> i64 {
        match self {
            UnitArg::None => 0,
            UnitArg::Day => 1,
            UnitArg::Week => 2,
            UnitArg::Month => 3,
            UnitArg::Year => 4,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EndsArg {
    MaxDuration,
    OnDate,
    AfterCount,
}

impl EndsArg {
    fn code(self) -> i64 {
        match self {
            EndsArg::MaxDuration => 0,
            EndsArg::OnDate => 1,
            EndsArg::AfterCount => 2,
        }
    }
}

#[derive(Subcommand)]
pub enum EventAction {
    /// Create a single event or a repeating series
    Create {
        /// Event name
        #[arg(long)]
        name: String,
        /// Start, e.g. "01/15/2025 07:30 PM"
        #[arg(long)]
        start: String,
        /// End, same format as start
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        all_day: bool,
        #[arg(long)]
        description: Option<String>,
        /// Repeat every N units
        #[arg(long)]
        frequency: Option<i64>,
        /// Repeat unit; "none" creates a single event
        #[arg(long, value_enum, default_value = "none")]
        unit: UnitArg,
        /// Only keep occurrences on these weekdays (repeatable)
        #[arg(long = "weekday")]
        weekdays: Vec<String>,
        /// How the series stops
        #[arg(long, value_enum)]
        ends: Option<EndsArg>,
        /// Last date for --ends on-date
        #[arg(long)]
        ends_on: Option<String>,
        /// Occurrence count for --ends after-count
        #[arg(long, default_value = "0")]
        ends_after: i64,
        #[arg(long, default_value = "0")]
        location_id: i64,
        #[arg(long, default_value = "0")]
        album_id: i64,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit one occurrence or it and all following
    Update {
        /// Event ID
        id: i64,
        /// New start
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        all_day: bool,
        /// 0 clears the location
        #[arg(long, default_value = "0")]
        location_id: i64,
        /// 0 clears the album
        #[arg(long, default_value = "0")]
        album_id: i64,
        /// single | all-following
        #[arg(long, default_value = "single")]
        scope: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete one occurrence or it and all following
    Delete {
        /// Event ID
        id: i64,
        /// single | all-following
        #[arg(long, default_value = "single")]
        scope: String,
        #[arg(long)]
        json: bool,
    },
    /// Show an event addressed by its slugs and ID
    Show {
        category: String,
        location: String,
        slug: String,
        id: i64,
    },
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let manager = SeriesManager::new(&session.db, &session.clock);

    match action {
        EventAction::Create {
            name,
            start,
            end,
            all_day,
            description,
            frequency,
            unit,
            weekdays,
            ends,
            ends_on,
            ends_after,
            location_id,
            album_id,
            json,
        } => {
            let raw = RawEventFields {
                name,
                description: description.unwrap_or_default(),
                all_day,
                date_start: start,
                date_end: end.unwrap_or_default(),
                frequency,
                frequency_unit: unit.code(),
                weekdays,
                ends: ends.map(EndsArg::code),
                ends_on: ends_on.unwrap_or_default(),
                ends_after,
                location_id,
                album_id,
            };
            let outcome = manager.create_event(&raw)?;
            if json {
                super::print_json(&outcome)?;
            } else {
                println!("{}", outcome.message());
            }
        }
        EventAction::Update {
            id,
            start,
            end,
            name,
            description,
            all_day,
            location_id,
            album_id,
            scope,
            json,
        } => {
            let scope: Scope = scope.parse()?;
            let edit = EventEdit {
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
                all_day,
                date_start: start,
                date_end: end.unwrap_or_default(),
                location_id,
                album_id,
            };
            let outcome = match manager.update_event(id, &edit, scope) {
                Ok(outcome) => outcome,
                Err(LifecycleError::Rejected {
                    errors,
                    redirect: Some(target),
                }) => return Err(format!("{errors} (editing {})", target.path()).into()),
                Err(e) => return Err(e.into()),
            };
            if json {
                super::print_json(&outcome)?;
            } else {
                println!("{}", outcome.message());
                if let Some(target) = &outcome.redirect {
                    println!("{}", target.path());
                }
            }
        }
        EventAction::Delete { id, scope, json } => {
            let outcome = manager.delete_event(id, scope.parse()?)?;
            if json {
                super::print_json(&outcome)?;
            } else {
                println!("{}", outcome.message());
            }
        }
        EventAction::Show {
            category,
            location,
            slug,
            id,
        } => {
            let query = CalendarQuery::new(&session.db, &session.clock);
            let detail = query.event_detail(&category, &location, &slug, id)?;
            super::print_json(&detail)?;
        }
    }
    Ok(())
}
