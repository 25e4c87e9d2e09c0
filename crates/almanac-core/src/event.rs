//! Stored occurrences and the reference records they point at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slug::slugify;

/// Category slug used for occurrences without a location.
pub const UNCATEGORIZED_SLUG: &str = "events";
/// Category display name used for occurrences without a location.
pub const UNCATEGORIZED_NAME: &str = "Miscellaneous";
/// Location slug used for occurrences without a location.
pub const NO_LOCATION_SLUG: &str = "undefined";

/// A place an event happens at. Owned by the location collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category_slug: String,
    pub category_name: String,
}

/// A photo album attached to an event. Owned by the album collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
}

/// One stored occurrence, standalone or part of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub all_day: bool,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub location_id: Option<i64>,
    pub album_id: Option<i64>,
    /// Owning series; `None` for single events.
    pub recurrence_id: Option<i64>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// Rename the event, keeping its slug in step.
    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.slug = slugify(name);
    }
}

/// An occurrence that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub all_day: bool,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub location_id: Option<i64>,
    pub album_id: Option<i64>,
    pub recurrence_id: Option<i64>,
}

impl NewEvent {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn into_event(self, id: i64) -> Event {
        let slug = self.slug();
        Event {
            id,
            name: self.name,
            slug,
            description: self.description,
            all_day: self.all_day,
            date_start: self.date_start,
            date_end: self.date_end,
            location_id: self.location_id,
            album_id: self.album_id,
            recurrence_id: self.recurrence_id,
        }
    }
}

/// Canonical address of an occurrence's detail page.
///
/// Returned alongside failures so a caller can send the user back to the
/// occurrence they were editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTarget {
    pub category_slug: String,
    pub location_slug: String,
    pub event_slug: String,
    pub event_id: i64,
}

impl RedirectTarget {
    pub fn for_event(event: &Event, location: Option<&Location>) -> Self {
        Self {
            category_slug: location
                .map_or(UNCATEGORIZED_SLUG, |l| l.category_slug.as_str())
                .to_string(),
            location_slug: location
                .map_or(NO_LOCATION_SLUG, |l| l.slug.as_str())
                .to_string(),
            event_slug: event.slug.clone(),
            event_id: event.id,
        }
    }

    /// Path segments in `category/location/slug/id` order.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.category_slug, self.location_slug, self.event_slug, self.event_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Event {
        NewEvent {
            name: "Trivia Night".into(),
            description: None,
            all_day: false,
            date_start: Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap(),
            date_end: None,
            location_id: None,
            album_id: None,
            recurrence_id: None,
        }
        .into_event(9)
    }

    #[test]
    fn stored_event_gets_slug() {
        let event = sample();
        assert_eq!(event.slug, "trivia-night");
        assert!(!event.is_recurring());
    }

    #[test]
    fn redirect_without_location_uses_placeholders() {
        let target = RedirectTarget::for_event(&sample(), None);
        assert_eq!(target.path(), "events/undefined/trivia-night/9");
    }

    #[test]
    fn redirect_with_location_uses_its_slugs() {
        let location = Location {
            id: 1,
            name: "The Bell".into(),
            slug: "the-bell".into(),
            category_slug: "bars".into(),
            category_name: "Bars".into(),
        };
        let target = RedirectTarget::for_event(&sample(), Some(&location));
        assert_eq!(target.path(), "bars/the-bell/trivia-night/9");
    }
}
