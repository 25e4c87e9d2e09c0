//! Six-week month grid.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::Serialize;

use super::{CalendarQuery, MonthRef};
use crate::clock::Clock;
use crate::error::Result;
use crate::event::Event;
use crate::storage::{EventFilter, EventStore, ReferenceResolver};

/// Cells in a grid: six weeks of seven days.
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayOfWeek {
    pub col: usize,
    pub dow: &'static str,
}

/// Column headers, Sunday first.
pub const DAYS_OF_WEEK: [DayOfWeek; 7] = [
    DayOfWeek { col: 0, dow: "Sun" },
    DayOfWeek { col: 1, dow: "Mon" },
    DayOfWeek { col: 2, dow: "Tue" },
    DayOfWeek { col: 3, dow: "Wed" },
    DayOfWeek { col: 4, dow: "Thu" },
    DayOfWeek { col: 5, dow: "Fri" },
    DayOfWeek { col: 6, dow: "Sat" },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub row: usize,
    pub col: usize,
    /// Upcoming occurrences on this local date, earliest first, capped per cell.
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub month: MonthRef,
    pub first_of_month: NaiveDate,
    pub days_of_week: [DayOfWeek; 7],
    pub cells: Vec<GridCell>,
    /// Whether anything at all is stored for the month, past days included.
    pub has_events: bool,
}

/// Sunday on or before `date`.
fn preceding_sunday(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

impl<S, C> CalendarQuery<'_, S, C>
where
    S: EventStore + ReferenceResolver,
    C: Clock,
{
    /// Grid of 42 days starting on the Sunday on or before the 1st.
    pub fn grid(&self, month: MonthRef) -> Result<MonthGrid> {
        let civil = self.civil();
        let first = month.first_day();
        let grid_start = preceding_sunday(first);
        let dates: Vec<NaiveDate> = grid_start.iter_days().take(GRID_CELLS).collect();

        let from = civil.start_of_day(grid_start).with_timezone(&Utc);
        let until = dates
            .last()
            .and_then(|d| d.succ_opt())
            .map_or(DateTime::<Utc>::MAX_UTC, |d| {
                civil.start_of_day(d).with_timezone(&Utc)
            });
        let mut upcoming = self
            .upcoming(EventFilter::new(), from, until)?
            .into_iter()
            .peekable();

        let mut cells = Vec::with_capacity(GRID_CELLS);
        for (i, date) in dates.into_iter().enumerate() {
            let mut events = Vec::new();
            while let Some(event) = upcoming.next_if(|e| self.local_date(e) <= date) {
                if self.local_date(&event) == date && events.len() < self.max_per_cell {
                    events.push(event);
                }
            }
            cells.push(GridCell {
                date,
                row: i / 7,
                col: i % 7,
                events,
            });
        }

        let (month_start, month_end) = month.bounds(&civil);
        let has_events = self.store.count_events(
            &EventFilter::new()
                .starting_from(month_start)
                .starting_before(month_end)
                .limit(1),
        )? > 0;

        Ok(MonthGrid {
            month,
            first_of_month: first,
            days_of_week: DAYS_OF_WEEK,
            cells,
            has_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::event::NewEvent;
    use crate::storage::EventDb;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;

    fn event_at(db: &EventDb, name: &str, day: u32, hour: u32) {
        let start = Chicago
            .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        db.create_event(&NewEvent {
            name: name.into(),
            description: None,
            all_day: false,
            date_start: start,
            date_end: None,
            location_id: None,
            album_id: None,
            recurrence_id: None,
        })
        .unwrap();
    }

    fn clock() -> FixedClock {
        // Noon on 2024-03-10 in Chicago.
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 17, 0, 0).unwrap(), Chicago)
    }

    #[test]
    fn grid_starts_on_preceding_sunday() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let grid = CalendarQuery::new(&db, &clock)
            .grid(MonthRef::new(2024, 3).unwrap())
            .unwrap();

        assert_eq!(grid.cells.len(), 42);
        // March 1, 2024 is a Friday.
        assert_eq!(grid.cells[0].date, NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
        assert_eq!(grid.cells[5].date, grid.first_of_month);
        assert_eq!((grid.cells[41].row, grid.cells[41].col), (5, 6));
        assert_eq!(grid.days_of_week[0].dow, "Sun");
        assert!(!grid.has_events);
    }

    #[test]
    fn cells_hold_upcoming_events_capped() {
        let db = EventDb::open_memory().unwrap();
        // Before today: hidden, but still counts towards has_events.
        event_at(&db, "Past", 4, 19);
        for hour in [21, 18, 20, 19] {
            event_at(&db, &format!("Show {hour}"), 12, hour);
        }
        // Late evening in Chicago is the next day in UTC.
        event_at(&db, "Late", 14, 22);

        let clock = clock();
        let grid = CalendarQuery::new(&db, &clock)
            .grid(MonthRef::new(2024, 3).unwrap())
            .unwrap();
        assert!(grid.has_events);

        let cell = |day: u32| {
            let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
            grid.cells.iter().find(|c| c.date == date).unwrap()
        };
        assert!(cell(4).events.is_empty());
        let names: Vec<_> = cell(12).events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Show 18", "Show 19", "Show 20"]);
        assert_eq!(cell(14).events.len(), 1);
        assert!(cell(15).events.is_empty());
    }

    #[test]
    fn cell_cap_is_configurable() {
        let db = EventDb::open_memory().unwrap();
        for hour in [18, 19, 20] {
            event_at(&db, "Show", 12, hour);
        }
        let clock = clock();
        let grid = CalendarQuery::new(&db, &clock)
            .with_max_per_cell(1)
            .grid(MonthRef::new(2024, 3).unwrap())
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let cell = grid.cells.iter().find(|c| c.date == date).unwrap();
        assert_eq!(cell.events.len(), 1);
    }
}
