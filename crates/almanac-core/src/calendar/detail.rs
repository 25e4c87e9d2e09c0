//! Single-occurrence detail lookup.

use serde::Serialize;
use thiserror::Error;

use super::CalendarQuery;
use crate::clock::Clock;
use crate::error::CoreError;
use crate::event::{Album, Event, Location, RedirectTarget, UNCATEGORIZED_NAME};
use crate::storage::{EventFilter, EventStore, ReferenceResolver};

#[derive(Error, Debug)]
pub enum DetailError {
    #[error("invalid ID")]
    InvalidId,

    /// The id exists but the path slugs are stale.
    #[error("event moved to {}", .0.path())]
    Moved(RedirectTarget),

    #[error(transparent)]
    Store(#[from] CoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    pub event: Event,
    /// Next occurrence of the same series, if any.
    pub next_occurrence: Option<Event>,
    pub recurring: bool,
    pub category_slug: String,
    pub category_name: String,
    pub location: Option<Location>,
    pub album: Option<Album>,
}

impl<S, C> CalendarQuery<'_, S, C>
where
    S: EventStore + ReferenceResolver,
    C: Clock,
{
    /// Look up an occurrence by id, checking the slugs it was addressed by.
    pub fn event_detail(
        &self,
        category_slug: &str,
        location_slug: &str,
        event_slug: &str,
        id: i64,
    ) -> Result<EventDetail, DetailError> {
        let event = self.store.get_event(id)?.ok_or(DetailError::InvalidId)?;
        let location = match event.location_id {
            Some(location_id) => self.store.location(location_id)?,
            None => None,
        };

        let canonical = RedirectTarget::for_event(&event, location.as_ref());
        if canonical.category_slug != category_slug
            || canonical.location_slug != location_slug
            || canonical.event_slug != event_slug
        {
            return Err(DetailError::Moved(canonical));
        }

        let next_occurrence = match event.recurrence_id {
            Some(recurrence_id) => self
                .store
                .filter_events(
                    &EventFilter::new()
                        .in_series(recurrence_id)
                        .starting_after(event.date_start)
                        .limit(1),
                )?
                .into_iter()
                .next(),
            None => None,
        };

        let album = match event.album_id {
            Some(album_id) => self.store.album(album_id)?,
            None => None,
        };

        Ok(EventDetail {
            recurring: event.is_recurring(),
            category_slug: canonical.category_slug,
            category_name: location
                .as_ref()
                .map_or(UNCATEGORIZED_NAME, |l| l.category_name.as_str())
                .to_string(),
            next_occurrence,
            location,
            album,
            event,
        })
    }
}
