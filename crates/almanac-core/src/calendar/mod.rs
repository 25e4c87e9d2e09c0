//! Read-side calendar views over stored occurrences.
//!
//! Every view covers one month, defaults to the clock's current month, and
//! hides occurrences that started before local midnight today.

pub mod detail;
pub mod grid;
pub mod listing;

pub use detail::{DetailError, EventDetail};
pub use grid::{DayOfWeek, GridCell, MonthGrid, DAYS_OF_WEEK};
pub use listing::{ByDate, ByLocation, DayGroup, ListedEvent, LocationGroup};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::civil_time::CivilTime;
use crate::clock::Clock;
use crate::error::Result;
use crate::event::Event;
use crate::storage::{EventFilter, EventStore, ReferenceResolver};

/// Default cap on occurrences shown in one grid cell.
pub const DEFAULT_MAX_PER_CELL: usize = 3;

/// A calendar month. Always a valid date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthRef(NaiveDate);

impl MonthRef {
    /// `None` when `month` is outside `1..=12` or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        // The following month must exist too, so the range is bounded.
        first.checked_add_months(Months::new(1))?;
        Some(Self(first))
    }

    /// Month containing the clock's local "today".
    pub fn current<C: Clock>(clock: &C) -> Self {
        let today = clock.today();
        Self(today.with_day(1).unwrap_or(today))
    }

    /// Fill in missing parts from the clock's current month.
    pub fn resolve<C: Clock>(year: Option<i32>, month: Option<u32>, clock: &C) -> Option<Self> {
        let current = Self::current(clock);
        Self::new(
            year.unwrap_or_else(|| current.year()),
            month.unwrap_or_else(|| current.month()),
        )
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn prev(&self) -> Option<Self> {
        self.0
            .checked_sub_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
    }

    pub fn next(&self) -> Option<Self> {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
    }

    /// Number of days in the month.
    pub fn day_count(&self) -> u32 {
        self.0
            .checked_add_months(Months::new(1))
            .map_or(0, |next| (next - self.0).num_days() as u32)
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.0.iter_days().take(self.day_count() as usize)
    }

    /// Local midnight at the start of the month and of the following month.
    fn bounds(&self, civil: &CivilTime) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = civil.start_of_day(self.0).with_timezone(&Utc);
        let end = self
            .0
            .checked_add_months(Months::new(1))
            .map_or(DateTime::<Utc>::MAX_UTC, |next| {
                civil.start_of_day(next).with_timezone(&Utc)
            });
        (start, end)
    }
}

impl Serialize for MonthRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MonthRef", 2)?;
        state.serialize_field("year", &self.year())?;
        state.serialize_field("month", &self.month())?;
        state.end()
    }
}

/// Month navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthLink {
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<MonthRef>,
}

/// Builds calendar views from an event store.
pub struct CalendarQuery<'a, S, C> {
    store: &'a S,
    clock: &'a C,
    max_per_cell: usize,
}

impl<'a, S, C> CalendarQuery<'a, S, C>
where
    S: EventStore + ReferenceResolver,
    C: Clock,
{
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Self {
            store,
            clock,
            max_per_cell: DEFAULT_MAX_PER_CELL,
        }
    }

    pub fn with_max_per_cell(mut self, max_per_cell: usize) -> Self {
        self.max_per_cell = max_per_cell;
        self
    }

    fn tz(&self) -> Tz {
        self.clock.timezone()
    }

    fn civil(&self) -> CivilTime {
        CivilTime::new(self.tz())
    }

    /// Local midnight today; nothing earlier is ever shown.
    fn today_start(&self) -> DateTime<Utc> {
        self.civil()
            .start_of_day(self.clock.today())
            .with_timezone(&Utc)
    }

    fn local_date(&self, event: &Event) -> NaiveDate {
        event.date_start.with_timezone(&self.tz()).date_naive()
    }

    /// Upcoming occurrences in `[from, until)`, never earlier than today.
    fn upcoming(
        &self,
        filter: EventFilter,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let from = from.max(self.today_start());
        if from >= until {
            return Ok(Vec::new());
        }
        self.store
            .filter_events(&filter.starting_from(from).starting_before(until))
    }

    /// Link to the previous month; disabled on the current month.
    pub fn prev_month(&self, month: MonthRef) -> MonthLink {
        if month == MonthRef::current(self.clock) {
            return MonthLink {
                disabled: true,
                date: None,
            };
        }
        MonthLink {
            disabled: month.prev().is_none(),
            date: month.prev(),
        }
    }

    pub fn next_month(&self, month: MonthRef) -> MonthLink {
        MonthLink {
            disabled: month.next().is_none(),
            date: month.next(),
        }
    }
}
