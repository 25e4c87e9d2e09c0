//! Month listings grouped by day and by location.
//!
//! Both listings hand out keyboard tab indices in display order. The
//! by-location listing continues counting where the by-date listing stopped,
//! since a page shows the two one after the other.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{CalendarQuery, MonthRef};
use crate::clock::Clock;
use crate::error::Result;
use crate::event::{Event, Location};
use crate::storage::{EventFilter, EventStore, ReferenceResolver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEvent {
    pub event: Event,
    /// Category of the event's location, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    /// Absent for all-day events without a location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabindex: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub events: Vec<ListedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByDate {
    pub month: MonthRef,
    pub days: Vec<DayGroup>,
    /// First tab index not used by this listing.
    pub next_tabindex: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationGroup {
    pub location: Location,
    pub category_slug: String,
    pub days: Vec<DayGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByLocation {
    pub month: MonthRef,
    pub locations: Vec<LocationGroup>,
}

impl<S, C> CalendarQuery<'_, S, C>
where
    S: EventStore + ReferenceResolver,
    C: Clock,
{
    /// Split date-ordered events into runs sharing a local date.
    fn group_by_day(&self, events: Vec<ListedEvent>) -> Vec<DayGroup> {
        let mut days: Vec<DayGroup> = Vec::new();
        for listed in events {
            let date = self.local_date(&listed.event);
            match days.last_mut() {
                Some(group) if group.date == date => group.events.push(listed),
                _ => days.push(DayGroup {
                    date,
                    events: vec![listed],
                }),
            }
        }
        days
    }

    /// Every day of the month with upcoming occurrences.
    pub fn by_date(&self, month: MonthRef) -> Result<ByDate> {
        let (start, end) = month.bounds(&self.civil());
        let events = self.upcoming(EventFilter::new(), start, end)?;
        let locations: HashMap<i64, Location> = self
            .store
            .locations()?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let mut tabindex = 0;
        let listed = events
            .into_iter()
            .map(|event| {
                let location = event.location_id.and_then(|id| locations.get(&id));
                let index = (!event.all_day || location.is_some()).then(|| {
                    tabindex += 1;
                    tabindex - 1
                });
                ListedEvent {
                    category_slug: location.map(|l| l.category_slug.clone()),
                    tabindex: index,
                    event,
                }
            })
            .collect();

        Ok(ByDate {
            month,
            days: self.group_by_day(listed),
            next_tabindex: tabindex,
        })
    }

    /// Every location with at least one occurrence this month, by name.
    ///
    /// A location qualifies through past occurrences too, in which case its
    /// day list may be empty.
    pub fn by_location(&self, month: MonthRef) -> Result<ByLocation> {
        let mut tabindex = self.by_date(month)?.next_tabindex;
        let (start, end) = month.bounds(&self.civil());

        let mut groups = Vec::new();
        for location in self.store.locations()? {
            let at_location = EventFilter::new().at_location(location.id);
            let in_month = self.store.count_events(
                &at_location
                    .clone()
                    .starting_from(start)
                    .starting_before(end)
                    .limit(1),
            )?;
            if in_month == 0 {
                continue;
            }

            let listed = self
                .upcoming(at_location, start, end)?
                .into_iter()
                .map(|event| {
                    tabindex += 1;
                    ListedEvent {
                        event,
                        category_slug: Some(location.category_slug.clone()),
                        tabindex: Some(tabindex - 1),
                    }
                })
                .collect();

            groups.push(LocationGroup {
                category_slug: location.category_slug.clone(),
                days: self.group_by_day(listed),
                location,
            });
        }

        Ok(ByLocation {
            month,
            locations: groups,
        })
    }
}
