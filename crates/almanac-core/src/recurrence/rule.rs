//! Validation of submitted event fields.
//!
//! [`build`] checks every field and reports all problems together, so a form
//! can show the user everything that needs fixing in one round trip.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{EndCondition, FrequencyUnit, RecurrenceRule, SeriesTemplate, WeekdaySet};
use crate::civil_time::CivilTime;
use crate::clock::Clock;
use crate::error::{CoreError, DateField, Result, ValidationError, ValidationErrors};
use crate::event::NewEvent;
use crate::storage::{reference_id, ReferenceResolver};

/// Raw field values as extracted by the caller, before any validation.
///
/// Numeric codes follow the submission form: `frequency_unit` is `0` for a
/// single event and `1..=4` for day/week/month/year; `ends` is `0` for the
/// maximum duration, `1` for an end date and `2` for an occurrence count.
/// Reference ids of `0` mean "none".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventFields {
    pub name: String,
    pub description: String,
    pub all_day: bool,
    pub date_start: String,
    pub date_end: String,
    pub frequency: Option<i64>,
    pub frequency_unit: i64,
    pub weekdays: Vec<String>,
    pub ends: Option<i64>,
    pub ends_on: String,
    pub ends_after: i64,
    pub location_id: i64,
    pub album_id: i64,
}

/// A validated one-off event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleDraft {
    pub event: NewEvent,
}

/// A validated series, ready for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDraft {
    pub rule: RecurrenceRule,
    pub start: DateTime<Utc>,
    pub template: SeriesTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDraft {
    Single(SingleDraft),
    Series(SeriesDraft),
}

/// Start and optional end of an occurrence after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Schedule {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Parse and check a start/end pair, pushing every problem onto `errors`.
///
/// The "not in the past" checks run on the submitted time; all-day
/// flattening to local midnight happens afterwards.
pub(crate) fn check_schedule(
    civil: &CivilTime,
    now: DateTime<Utc>,
    date_start: &str,
    date_end: &str,
    all_day: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Schedule> {
    let start = if date_start.trim().is_empty() {
        errors.push(ValidationError::MissingStartDate);
        None
    } else {
        match civil.parse_local(date_start) {
            Ok(local) => Some(local),
            Err(source) => {
                errors.push(ValidationError::InvalidDate {
                    field: DateField::Start,
                    source,
                });
                None
            }
        }
    };

    if let Some(start) = start {
        if start.with_timezone(&Utc) < now {
            errors.push(ValidationError::StartInPast);
        }
    }

    let mut end = None;
    if !date_end.trim().is_empty() {
        match civil.parse(date_end, false) {
            Ok(parsed) => {
                if parsed < now {
                    errors.push(ValidationError::EndInPast);
                }
                // All-day events drop their end, so its order does not matter.
                if !all_day && start.is_some_and(|s| s.with_timezone(&Utc) >= parsed) {
                    errors.push(ValidationError::StartNotBeforeEnd);
                }
                end = Some(parsed);
            }
            Err(source) => errors.push(ValidationError::InvalidDate {
                field: DateField::End,
                source,
            }),
        }
    }

    let start = start?;
    let start = if all_day {
        civil.start_of_day(start.date_naive())
    } else {
        start
    };
    Some(Schedule {
        start: start.with_timezone(&Utc),
        end,
    })
}

/// Look up optional location/album references, reporting unresolved ids.
pub(crate) fn check_references<R: ReferenceResolver>(
    resolver: &R,
    location_id: i64,
    album_id: i64,
    errors: &mut Vec<ValidationError>,
) -> Result<(Option<i64>, Option<i64>)> {
    let mut location = None;
    if let Some(id) = reference_id(location_id) {
        match resolver.location(id)? {
            Some(found) => location = Some(found.id),
            None => errors.push(ValidationError::LocationNotFound(id)),
        }
    }

    let mut album = None;
    if let Some(id) = reference_id(album_id) {
        match resolver.album(id)? {
            Some(found) => album = Some(found.id),
            None => errors.push(ValidationError::AlbumNotFound(id)),
        }
    }

    Ok((location, album))
}

fn check_rule(
    raw: &RawEventFields,
    unit: FrequencyUnit,
    civil: &CivilTime,
    errors: &mut Vec<ValidationError>,
) -> Option<RecurrenceRule> {
    let frequency = raw
        .frequency
        .and_then(|f| u32::try_from(f).ok())
        .filter(|f| *f > 0);
    if frequency.is_none() {
        errors.push(ValidationError::MissingFrequency);
    }

    let end = match raw.ends {
        Some(0) => Some(EndCondition::MaxDuration),
        Some(1) if raw.ends_on.trim().is_empty() => {
            errors.push(ValidationError::MissingEndsOn);
            None
        }
        Some(1) => match civil.parse(&raw.ends_on, false) {
            Ok(ends_on) => Some(EndCondition::OnDate {
                ends_on: civil.end_of_day(ends_on),
            }),
            Err(source) => {
                errors.push(ValidationError::InvalidDate {
                    field: DateField::EndsOn,
                    source,
                });
                None
            }
        },
        Some(2) => match u32::try_from(raw.ends_after) {
            Ok(count) if count > 0 => Some(EndCondition::AfterCount { count }),
            _ => {
                errors.push(ValidationError::MissingEndsAfter);
                None
            }
        },
        _ => {
            errors.push(ValidationError::MissingEndCondition);
            None
        }
    };

    let mut weekdays = WeekdaySet::new();
    for name in raw.weekdays.iter().filter(|n| !n.trim().is_empty()) {
        match WeekdaySet::parse_day(name) {
            Some(day) => weekdays.insert(day),
            None => errors.push(ValidationError::UnknownWeekday(name.clone())),
        }
    }

    Some(RecurrenceRule {
        frequency: frequency?,
        unit,
        end: end?,
        weekdays: (!weekdays.is_empty()).then_some(weekdays),
    })
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate raw fields into a single event or a series draft.
///
/// A `frequency_unit` of `0` marks a single event and skips every
/// recurrence-specific check. Validation problems are returned together as
/// [`CoreError::Validation`]; store failures while resolving references
/// propagate as they are.
pub fn build<C, R>(raw: &RawEventFields, clock: &C, resolver: &R) -> Result<EventDraft>
where
    C: Clock,
    R: ReferenceResolver,
{
    let tz: Tz = clock.timezone();
    let civil = CivilTime::new(tz);
    let mut errors = Vec::new();

    let name = non_empty(&raw.name);
    if name.is_none() {
        errors.push(ValidationError::MissingName);
    }

    let schedule = check_schedule(
        &civil,
        clock.now(),
        &raw.date_start,
        &raw.date_end,
        raw.all_day,
        &mut errors,
    );

    let rule = match raw.frequency_unit {
        0 => None,
        code => match FrequencyUnit::from_code(code) {
            Some(unit) => check_rule(raw, unit, &civil, &mut errors),
            None => {
                errors.push(ValidationError::UnknownFrequencyUnit(code));
                None
            }
        },
    };

    let (location_id, album_id) =
        check_references(resolver, raw.location_id, raw.album_id, &mut errors)?;

    if !errors.is_empty() {
        return Err(CoreError::Validation(ValidationErrors(errors)));
    }

    // Every branch that leaves these empty also pushed an error above.
    let (Some(name), Some(schedule)) = (name, schedule) else {
        return Err(CoreError::Validation(ValidationErrors(vec![
            ValidationError::MissingStartDate,
        ])));
    };
    let description = non_empty(&raw.description);
    let date_end = schedule.end.filter(|_| !raw.all_day);

    if raw.frequency_unit == 0 {
        return Ok(EventDraft::Single(SingleDraft {
            event: NewEvent {
                name,
                description,
                all_day: raw.all_day,
                date_start: schedule.start,
                date_end,
                location_id,
                album_id,
                recurrence_id: None,
            },
        }));
    }

    let Some(rule) = rule else {
        return Err(CoreError::Validation(ValidationErrors(vec![
            ValidationError::MissingFrequency,
        ])));
    };

    Ok(EventDraft::Series(SeriesDraft {
        rule,
        start: schedule.start,
        template: SeriesTemplate {
            name,
            description,
            all_day: raw.all_day,
            location_id,
            album_id,
            date_end,
        },
    }))
}
