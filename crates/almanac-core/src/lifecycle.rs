//! Create, edit and delete occurrence sets.
//!
//! Every operation runs inside one [`EventStore::transaction`], so an edit or
//! delete touching a whole series lands completely or not at all.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::civil_time::{localize, CivilTime};
use crate::clock::Clock;
use crate::error::{CoreError, RecordKind, ValidationError, ValidationErrors};
use crate::event::{Event, RedirectTarget};
use crate::recurrence::rule::{check_references, check_schedule, Schedule};
use crate::recurrence::generator::ceiling_for;
use crate::recurrence::{self, EventDraft, RawEventFields, Walk};
use crate::storage::{EventFilter, EventStore, ReferenceResolver};

/// Failure of a lifecycle operation.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The event or series does not exist at all.
    #[error("The specified {kind} could not be found.")]
    NotFound { kind: RecordKind, id: i64 },

    /// The record exists but the submission was rejected.
    ///
    /// `redirect` points back at the occurrence being edited, when there is one.
    #[error("{errors}")]
    Rejected {
        errors: ValidationErrors,
        redirect: Option<RedirectTarget>,
    },

    #[error(transparent)]
    Store(CoreError),
}

impl From<CoreError> for LifecycleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => LifecycleError::Rejected {
                errors,
                redirect: None,
            },
            CoreError::NotFound { kind, id } => LifecycleError::NotFound { kind, id },
            other => LifecycleError::Store(other),
        }
    }
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

/// Which occurrences an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Only the chosen occurrence.
    Single,
    /// The chosen occurrence and every later one in its series.
    AllFollowing,
}

impl FromStr for Scope {
    type Err = ValidationError;

    /// Accepts both the short names and the form values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "single-event" => Ok(Scope::Single),
            "all-following" | "multiple-events" => Ok(Scope::AllFollowing),
            _ => Err(ValidationError::MissingScope),
        }
    }
}

/// Raw edited field values. Empty strings leave name and description as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEdit {
    pub name: String,
    pub description: String,
    pub all_day: bool,
    pub date_start: String,
    pub date_end: String,
    /// `0` clears the location.
    pub location_id: i64,
    /// `0` clears the album.
    pub album_id: i64,
}

/// "1 event", "3 events".
pub fn event_count(n: usize) -> String {
    if n == 1 {
        "1 event".to_string()
    } else {
        format!("{n} events")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub count: usize,
    pub recurrence_id: Option<i64>,
    pub event_ids: Vec<i64>,
}

impl CreateOutcome {
    pub fn message(&self) -> String {
        format!("You have successfully created {}.", event_count(self.count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub count: usize,
    /// Occurrences deleted because the rewritten tail reached the series ceiling.
    pub removed: usize,
    /// Detail page of the last occurrence written.
    pub redirect: Option<RedirectTarget>,
}

impl UpdateOutcome {
    pub fn message(&self) -> String {
        format!("You have successfully updated {}.", event_count(self.count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub count: usize,
    /// Series removed because its last occurrence went.
    pub removed_series: Option<i64>,
}

impl DeleteOutcome {
    pub fn message(&self) -> String {
        format!("You have successfully deleted {}.", event_count(self.count))
    }
}

/// An edit whose fields have been checked.
struct ValidEdit {
    name: Option<String>,
    description: Option<String>,
    all_day: bool,
    schedule: Schedule,
    location_id: Option<i64>,
    album_id: Option<i64>,
}

impl ValidEdit {
    fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.rename(name);
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        event.all_day = self.all_day;
        event.location_id = self.location_id;
        event.album_id = self.album_id;
    }

    /// End of `event` once it starts at `start`.
    ///
    /// A submitted end fixes the wall-clock length; otherwise the event keeps
    /// its previous length. All-day events have no end.
    fn end_for(&self, event: &Event, start: DateTime<Tz>) -> Option<DateTime<Utc>> {
        if self.all_day {
            return None;
        }
        let tz = start.timezone();
        let length = match self.schedule.end {
            Some(end) => {
                end.with_timezone(&tz).naive_local()
                    - self.schedule.start.with_timezone(&tz).naive_local()
            }
            None => {
                let end = event.date_end?;
                end.with_timezone(&tz).naive_local()
                    - event.date_start.with_timezone(&tz).naive_local()
            }
        };
        Some(localize(&tz, start.naive_local() + length).with_timezone(&Utc))
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Orchestrates generator and store for whole occurrence sets.
pub struct SeriesManager<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S, C> SeriesManager<'a, S, C>
where
    S: EventStore + ReferenceResolver,
    C: Clock,
{
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    fn civil(&self) -> CivilTime {
        CivilTime::new(self.clock.timezone())
    }

    fn redirect_for(&self, event: &Event) -> Result<RedirectTarget, CoreError> {
        let location = match event.location_id {
            Some(id) => self.store.location(id)?,
            None => None,
        };
        Ok(RedirectTarget::for_event(event, location.as_ref()))
    }

    fn find_event(&self, event_id: i64) -> LifecycleResult<Event> {
        self.store
            .get_event(event_id)?
            .ok_or(LifecycleError::NotFound {
                kind: RecordKind::Event,
                id: event_id,
            })
    }

    /// Check edited fields; on failure the error carries `redirect`.
    fn validate_edit(
        &self,
        edit: &EventEdit,
        redirect: Option<RedirectTarget>,
    ) -> LifecycleResult<ValidEdit> {
        let mut errors = Vec::new();
        let schedule = check_schedule(
            &self.civil(),
            self.clock.now(),
            &edit.date_start,
            &edit.date_end,
            edit.all_day,
            &mut errors,
        );
        let (location_id, album_id) =
            check_references(self.store, edit.location_id, edit.album_id, &mut errors)?;

        match schedule {
            Some(schedule) if errors.is_empty() => Ok(ValidEdit {
                name: non_empty(&edit.name),
                description: non_empty(&edit.description),
                all_day: edit.all_day,
                schedule,
                location_id,
                album_id,
            }),
            _ => Err(LifecycleError::Rejected {
                errors: ValidationErrors(errors),
                redirect,
            }),
        }
    }

    /// Validate raw fields and store a single event or a whole generated series.
    pub fn create_event(&self, raw: &RawEventFields) -> LifecycleResult<CreateOutcome> {
        let draft = recurrence::build(raw, self.clock, self.store)?;

        let outcome = self.store.transaction(|store| -> LifecycleResult<_> {
            match draft {
                EventDraft::Single(single) => {
                    let event = store.create_event(&single.event)?;
                    Ok(CreateOutcome {
                        count: 1,
                        recurrence_id: None,
                        event_ids: vec![event.id],
                    })
                }
                EventDraft::Series(series) => {
                    let mut events = recurrence::generate(
                        &series.rule,
                        None,
                        series.start,
                        self.clock.timezone(),
                        &series.template,
                    );
                    if events.is_empty() {
                        return Ok(CreateOutcome {
                            count: 0,
                            recurrence_id: None,
                            event_ids: Vec::new(),
                        });
                    }

                    let info =
                        store.create_recurrence(&series.rule, series.rule.derive_is_weekly())?;
                    let mut event_ids = Vec::with_capacity(events.len());
                    for event in &mut events {
                        event.recurrence_id = Some(info.id);
                        event_ids.push(store.create_event(event)?.id);
                    }
                    Ok(CreateOutcome {
                        count: event_ids.len(),
                        recurrence_id: Some(info.id),
                        event_ids,
                    })
                }
            }
        })?;

        tracing::info!(
            count = outcome.count,
            recurrence_id = ?outcome.recurrence_id,
            "created events"
        );
        Ok(outcome)
    }

    /// Edit one occurrence, or it and every later occurrence of its series.
    ///
    /// With [`Scope::AllFollowing`] the rewrite is effective from the chosen
    /// occurrence's stored start, so the chosen occurrence always takes the
    /// edited start. A non-recurring event is always edited alone.
    pub fn update_event(
        &self,
        event_id: i64,
        edit: &EventEdit,
        scope: Scope,
    ) -> LifecycleResult<UpdateOutcome> {
        let event = self.find_event(event_id)?;
        let redirect = self.redirect_for(&event)?;
        let valid = self.validate_edit(edit, Some(redirect))?;

        match (scope, event.recurrence_id) {
            (Scope::AllFollowing, Some(recurrence_id)) => {
                self.rewrite_series(recurrence_id, &valid, event.date_start)
            }
            _ => self.store.transaction(|store| -> LifecycleResult<_> {
                let mut event = event;
                valid.apply_to(&mut event);
                let start = valid.schedule.start.with_timezone(&self.clock.timezone());
                event.date_end = valid.end_for(&event, start);
                event.date_start = valid.schedule.start;
                store.update_event(&event)?;
                tracing::info!(event_id = event.id, "updated single event");
                Ok(UpdateOutcome {
                    count: 1,
                    removed: 0,
                    redirect: Some(self.redirect_for(&event)?),
                })
            }),
        }
    }

    /// Rewrite every occurrence of a series starting at or after `effective_from`.
    ///
    /// Occurrences are walked in start order. The first gets the edited start,
    /// each later one the next slot of the series' rule after it, so the
    /// rewritten tail stays evenly spaced. Earlier occurrences are untouched.
    ///
    /// The tail never reaches past the series ceiling, one year after the
    /// series' first occurrence (or after the edited start when the edit
    /// begins at that first occurrence). Occurrences with no slot left below
    /// the ceiling are deleted. The series keeps at least one occurrence either
    /// way, since the anchor itself is never past its own ceiling.
    pub fn update_series(
        &self,
        recurrence_id: i64,
        edit: &EventEdit,
        effective_from: DateTime<Utc>,
    ) -> LifecycleResult<UpdateOutcome> {
        if self.store.get_recurrence(recurrence_id)?.is_none() {
            return Err(LifecycleError::NotFound {
                kind: RecordKind::Series,
                id: recurrence_id,
            });
        }
        let first = self
            .store
            .filter_events(
                &EventFilter::new()
                    .in_series(recurrence_id)
                    .starting_from(effective_from)
                    .limit(1),
            )?
            .into_iter()
            .next();
        let redirect = first.map(|e| self.redirect_for(&e)).transpose()?;
        let valid = self.validate_edit(edit, redirect)?;
        self.rewrite_series(recurrence_id, &valid, effective_from)
    }

    fn rewrite_series(
        &self,
        recurrence_id: i64,
        valid: &ValidEdit,
        effective_from: DateTime<Utc>,
    ) -> LifecycleResult<UpdateOutcome> {
        let tz = self.clock.timezone();

        let outcome = self.store.transaction(|store| -> LifecycleResult<_> {
            let info = store
                .get_recurrence(recurrence_id)?
                .ok_or(LifecycleError::NotFound {
                    kind: RecordKind::Series,
                    id: recurrence_id,
                })?;
            let walk = Walk::for_rule(&info.rule, &tz, valid.schedule.start);
            let first = store
                .filter_events(&EventFilter::new().in_series(recurrence_id).limit(1))?
                .into_iter()
                .next();
            let anchor = match first {
                Some(first) if first.date_start < effective_from => first.date_start,
                _ => valid.schedule.start,
            };
            let ceiling = ceiling_for(&tz, anchor);
            let events = store.filter_events(
                &EventFilter::new()
                    .in_series(recurrence_id)
                    .starting_from(effective_from),
            )?;

            let mut cursor = Some(valid.schedule.start.with_timezone(&tz));
            let mut count = 0;
            let mut removed = 0;
            let mut last = None;
            for mut event in events {
                let Some(start) = cursor.filter(|s| s.with_timezone(&Utc) < ceiling) else {
                    removed += usize::from(store.delete_event(event.id)?);
                    continue;
                };
                valid.apply_to(&mut event);
                event.date_end = valid.end_for(&event, start);
                event.date_start = start.with_timezone(&Utc);
                store.update_event(&event)?;

                count += 1;
                cursor = walk.next_slot(&tz, start);
                last = Some(event);
            }

            if removed > 0 {
                tracing::warn!(
                    recurrence_id,
                    removed,
                    %ceiling,
                    "dropped occurrences past the series ceiling"
                );
            }

            let redirect = last.map(|e| self.redirect_for(&e)).transpose()?;
            Ok(UpdateOutcome {
                count,
                removed,
                redirect,
            })
        })?;

        tracing::info!(
            recurrence_id,
            count = outcome.count,
            removed = outcome.removed,
            "updated series"
        );
        Ok(outcome)
    }

    /// Delete one occurrence, or it and every later occurrence of its series.
    ///
    /// A series left without occurrences is removed together with its
    /// weekday markers.
    pub fn delete_event(&self, event_id: i64, scope: Scope) -> LifecycleResult<DeleteOutcome> {
        let outcome = self.store.transaction(|store| -> LifecycleResult<_> {
            let event = self.find_event(event_id)?;

            let count = match (scope, event.recurrence_id) {
                (Scope::AllFollowing, Some(recurrence_id)) => store.delete_events(
                    &EventFilter::new()
                        .in_series(recurrence_id)
                        .starting_from(event.date_start),
                )?,
                _ => usize::from(store.delete_event(event.id)?),
            };

            let mut removed_series = None;
            if let Some(recurrence_id) = event.recurrence_id {
                let remaining = store.count_events(&EventFilter::new().in_series(recurrence_id))?;
                if remaining == 0 {
                    store.delete_recurrence(recurrence_id)?;
                    tracing::debug!(recurrence_id, "removed orphaned series");
                    removed_series = Some(recurrence_id);
                }
            }

            Ok(DeleteOutcome {
                count,
                removed_series,
            })
        })?;

        tracing::info!(event_id, count = outcome.count, ?scope, "deleted events");
        Ok(outcome)
    }

    /// Delete every occurrence of a series at or after `from`.
    pub fn delete_series(
        &self,
        recurrence_id: i64,
        from: DateTime<Utc>,
    ) -> LifecycleResult<DeleteOutcome> {
        let first = self
            .store
            .filter_events(
                &EventFilter::new()
                    .in_series(recurrence_id)
                    .starting_from(from)
                    .limit(1),
            )?
            .into_iter()
            .next();
        match first {
            Some(event) => self.delete_event(event.id, Scope::AllFollowing),
            None if self.store.get_recurrence(recurrence_id)?.is_some() => Ok(DeleteOutcome {
                count: 0,
                removed_series: None,
            }),
            None => Err(LifecycleError::NotFound {
                kind: RecordKind::Series,
                id: recurrence_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::EventDb;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};
    use chrono_tz::America::Chicago;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2023, 12, 1, 18, 0, 0).unwrap(), Chicago)
    }

    fn weekly(count: i64) -> RawEventFields {
        RawEventFields {
            name: "Karaoke".into(),
            date_start: "01/01/2024 09:00 PM".into(),
            date_end: "01/01/2024 11:00 PM".into(),
            frequency: Some(1),
            frequency_unit: 2,
            ends: Some(2),
            ends_after: count,
            ..RawEventFields::default()
        }
    }

    fn series(db: &EventDb, id: i64) -> Vec<Event> {
        db.filter_events(&EventFilter::new().in_series(id)).unwrap()
    }

    #[test]
    fn scope_parses_form_values() {
        assert_eq!("single-event".parse::<Scope>(), Ok(Scope::Single));
        assert_eq!("multiple-events".parse::<Scope>(), Ok(Scope::AllFollowing));
        assert_eq!("".parse::<Scope>(), Err(ValidationError::MissingScope));
    }

    #[test]
    fn messages_pluralise() {
        assert_eq!(event_count(1), "1 event");
        assert_eq!(event_count(0), "0 events");
        let outcome = DeleteOutcome {
            count: 4,
            removed_series: None,
        };
        assert_eq!(outcome.message(), "You have successfully deleted 4 events.");
    }

    #[test]
    fn create_series_stores_every_occurrence() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);

        let outcome = manager.create_event(&weekly(3)).unwrap();
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.message(), "You have successfully created 3 events.");

        let id = outcome.recurrence_id.unwrap();
        let info = db.get_recurrence(id).unwrap().unwrap();
        assert!(info.is_weekly);
        let stored = series(&db, id);
        assert_eq!(stored.len(), 3);
        assert!(stored
            .iter()
            .all(|e| e.date_end.unwrap() - e.date_start == chrono::Duration::hours(2)));
    }

    #[test]
    fn create_single_event() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let raw = RawEventFields {
            frequency_unit: 0,
            ..weekly(3)
        };
        let outcome = manager.create_event(&raw).unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.recurrence_id, None);
        assert_eq!(outcome.message(), "You have successfully created 1 event.");
    }

    #[test]
    fn create_with_empty_weekday_match_stores_nothing() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        // Thursday-only filter, but the series ends before the first Thursday.
        let raw = RawEventFields {
            weekdays: vec!["thursday".into()],
            frequency_unit: 1,
            ends: Some(1),
            ends_on: "01/02/2024 12:00 PM".into(),
            ..weekly(0)
        };
        let outcome = manager.create_event(&raw).unwrap();
        assert_eq!(outcome.count, 0);
        assert_eq!(outcome.recurrence_id, None);
    }

    #[test]
    fn create_rejects_with_all_errors() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let raw = RawEventFields {
            name: String::new(),
            location_id: 9,
            ..weekly(3)
        };
        match manager.create_event(&raw) {
            Err(LifecycleError::Rejected { errors, redirect }) => {
                assert!(errors.contains(&ValidationError::MissingName));
                assert!(errors.contains(&ValidationError::LocationNotFound(9)));
                assert_eq!(redirect, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(db.count_events(&EventFilter::new()).unwrap(), 0);
    }

    #[test]
    fn update_all_following_respaces_tail() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(4)).unwrap().recurrence_id.unwrap();
        let before = series(&db, id);

        // Move the third occurrence (Jan 15) to Jan 16, 08:00 PM.
        let edit = EventEdit {
            name: "Late Karaoke".into(),
            date_start: "01/16/2024 08:00 PM".into(),
            date_end: "01/16/2024 10:30 PM".into(),
            ..EventEdit::default()
        };
        let outcome = manager
            .update_event(before[2].id, &edit, Scope::AllFollowing)
            .unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.removed, 0);

        let after = series(&db, id);
        assert_eq!(after.len(), 4);
        assert_eq!(after[..2], before[..2]);
        for (moved, day) in after[2..].iter().zip([16, 23]) {
            assert_eq!(moved.name, "Late Karaoke");
            assert_eq!(moved.slug, "late-karaoke");
            let local = moved.date_start.with_timezone(&Chicago);
            assert_eq!((local.day(), local.hour()), (day, 20));
            assert_eq!(
                moved.date_end.unwrap() - moved.date_start,
                chrono::Duration::minutes(150)
            );
        }
        assert_eq!(after[2].id, before[2].id);
        assert_eq!(outcome.redirect.unwrap().event_id, after[3].id);
    }

    #[test]
    fn update_all_following_moved_later_keeps_one_per_week() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(4)).unwrap().recurrence_id.unwrap();
        let chosen = series(&db, id)[2].id;

        let edit = EventEdit {
            name: "Late".into(),
            date_start: "01/15/2024 10:00 PM".into(),
            ..EventEdit::default()
        };
        let outcome = manager
            .update_event(chosen, &edit, Scope::AllFollowing)
            .unwrap();
        assert_eq!(outcome.count, 2);

        let slots: Vec<_> = series(&db, id)
            .iter()
            .map(|e| {
                let local = e.date_start.with_timezone(&Chicago);
                (e.name.clone(), local.day(), local.hour())
            })
            .collect();
        assert_eq!(
            slots,
            vec![
                ("Karaoke".to_string(), 1, 21),
                ("Karaoke".to_string(), 8, 21),
                ("Late".to_string(), 15, 22),
                ("Late".to_string(), 22, 22),
            ]
        );
        let edited = db.get_event(chosen).unwrap().unwrap();
        assert_eq!(edited.name, "Late");
    }

    #[test]
    fn update_series_past_ceiling_drops_leftovers() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(4)).unwrap().recurrence_id.unwrap();
        let before = series(&db, id);

        // Two weeks before the one-year ceiling: only one more weekly slot fits.
        let edit = EventEdit {
            date_start: "12/25/2024 09:00 PM".into(),
            ..EventEdit::default()
        };
        let outcome = manager.update_series(id, &edit, before[1].date_start).unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.removed, 2);

        let after = series(&db, id);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], before[0]);
        let local = after[1].date_start.with_timezone(&Chicago);
        assert_eq!((local.month(), local.day()), (12, 25));
        assert!(db.get_recurrence(id).unwrap().is_some());
    }

    #[test]
    fn update_series_from_start_rewrites_everything() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(3)).unwrap().recurrence_id.unwrap();
        let first = series(&db, id)[0].date_start;

        let edit = EventEdit {
            date_start: "01/02/2024 07:00 PM".into(),
            ..EventEdit::default()
        };
        let outcome = manager.update_series(id, &edit, first).unwrap();
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.message(), "You have successfully updated 3 events.");

        let days: Vec<_> = series(&db, id)
            .iter()
            .map(|e| {
                let local = e.date_start.with_timezone(&Chicago);
                (local.day(), local.weekday(), local.hour())
            })
            .collect();
        assert_eq!(
            days,
            vec![
                (2, Weekday::Tue, 19),
                (9, Weekday::Tue, 19),
                (16, Weekday::Tue, 19)
            ]
        );
        // Name untouched when left empty.
        assert!(series(&db, id).iter().all(|e| e.name == "Karaoke"));
    }

    #[test]
    fn update_with_missing_location_redirects_back() {
        let db = EventDb::open_memory().unwrap();
        let bell = db.add_location("The Bell", "bars", "Bars").unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let raw = RawEventFields {
            location_id: bell.id,
            ..weekly(2)
        };
        let id = manager.create_event(&raw).unwrap().recurrence_id.unwrap();
        let target = series(&db, id)[0].clone();

        let edit = EventEdit {
            date_start: "01/01/2024 09:00 PM".into(),
            location_id: 404,
            ..EventEdit::default()
        };
        match manager.update_event(target.id, &edit, Scope::AllFollowing) {
            Err(LifecycleError::Rejected { errors, redirect }) => {
                assert_eq!(errors.messages(), vec!["The specified location could not be found."]);
                let redirect = redirect.unwrap();
                assert_eq!(redirect.category_slug, "bars");
                assert_eq!(redirect.location_slug, "the-bell");
                assert_eq!(redirect.event_slug, "karaoke");
                assert_eq!(redirect.event_id, target.id);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_unknown_event_is_not_found() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let result = manager.update_event(5, &EventEdit::default(), Scope::Single);
        assert!(matches!(
            result,
            Err(LifecycleError::NotFound {
                kind: RecordKind::Event,
                id: 5
            })
        ));
    }

    #[test]
    fn update_single_leaves_siblings() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(3)).unwrap().recurrence_id.unwrap();
        let before = series(&db, id);

        let edit = EventEdit {
            description: "Bring a friend".into(),
            all_day: true,
            date_start: "01/08/2024 09:00 PM".into(),
            ..EventEdit::default()
        };
        let outcome = manager.update_event(before[1].id, &edit, Scope::Single).unwrap();
        assert_eq!(outcome.message(), "You have successfully updated 1 event.");

        let after = series(&db, id);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert!(after[1].all_day);
        assert_eq!(after[1].date_end, None);
        assert_eq!(after[1].date_start.with_timezone(&Chicago).hour(), 0);
        assert_eq!(after[1].description.as_deref(), Some("Bring a friend"));
    }

    #[test]
    fn delete_following_then_orphan_cleanup() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(4)).unwrap().recurrence_id.unwrap();
        let events = series(&db, id);

        let outcome = manager.delete_event(events[2].id, Scope::AllFollowing).unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.removed_series, None);
        assert_eq!(series(&db, id).len(), 2);

        manager.delete_event(events[1].id, Scope::Single).unwrap();
        let last = manager.delete_event(events[0].id, Scope::Single).unwrap();
        assert_eq!(last.message(), "You have successfully deleted 1 event.");
        assert_eq!(last.removed_series, Some(id));
        assert!(db.get_recurrence(id).unwrap().is_none());
    }

    #[test]
    fn delete_series_from_date() {
        let db = EventDb::open_memory().unwrap();
        let clock = clock();
        let manager = SeriesManager::new(&db, &clock);
        let id = manager.create_event(&weekly(3)).unwrap().recurrence_id.unwrap();
        let first = series(&db, id)[0].date_start;

        let outcome = manager.delete_series(id, first).unwrap();
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.removed_series, Some(id));
        assert!(matches!(
            manager.delete_series(id, first),
            Err(LifecycleError::NotFound { kind: RecordKind::Series, .. })
        ));
    }
}
