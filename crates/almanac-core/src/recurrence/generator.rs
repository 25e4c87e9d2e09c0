//! Occurrence generator.
//!
//! A series is materialized by walking a cursor forward from its start in
//! local wall-clock time. Everything that varies between rules is chosen once
//! up front and captured in a [`Walk`]:
//!
//! - a [`Cadence`]: the step between candidates (`+n days`, `+7n days`,
//!   `+n months`, `+n years`, or `+1 day` whenever a weekday filter is set)
//! - an optional weekday filter: candidates on other weekdays are skipped and
//!   do not count towards an `AfterCount` limit
//! - a [`Termination`] predicate from the rule's end condition
//! - the ceiling: no occurrence is ever emitted at or past `start + 1 year`
//!
//! Stepping happens on the naive local time and is re-localized afterwards,
//! so a 09:00 series stays at 09:00 across DST changes.

use chrono::{DateTime, Days, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{EndCondition, RecurrenceRule, WeekdaySet};
use crate::civil_time::localize;
use crate::event::NewEvent;

/// Months from the start of a series to its ceiling.
pub const CEILING_MONTHS: u32 = 12;

/// Distance between two consecutive candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Cadence {
    /// Advance a wall-clock value by one step.
    ///
    /// Month and year steps clamp to the end of shorter months, so a series
    /// starting on the 31st continues on the 30th (or 28th/29th) and then
    /// stays there. Returns `None` on overflow.
    pub fn advance(self, naive: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Cadence::Days(n) => naive.checked_add_days(Days::new(u64::from(n))),
            Cadence::Months(n) => naive.checked_add_months(Months::new(n)),
            Cadence::Years(n) => naive.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// Advance a localized value by one step, keeping its wall-clock time.
    pub fn step(self, tz: &Tz, from: DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.advance(from.naive_local()).map(|next| localize(tz, next))
    }
}

/// Why a walk stops, evaluated before each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Only the ceiling applies.
    Ceiling,
    /// Stop once the cursor passes this instant.
    OnDate(DateTime<Utc>),
    /// Stop once this many occurrences have been emitted.
    AfterCount(u32),
}

impl Termination {
    pub fn for_end(end: &EndCondition) -> Self {
        match *end {
            EndCondition::MaxDuration => Termination::Ceiling,
            EndCondition::OnDate { ends_on } => Termination::OnDate(ends_on),
            EndCondition::AfterCount { count } => Termination::AfterCount(count),
        }
    }

    pub fn reached(&self, cursor: DateTime<Utc>, emitted: u32) -> bool {
        match *self {
            Termination::Ceiling => false,
            Termination::OnDate(ends_on) => cursor > ends_on,
            Termination::AfterCount(count) => emitted >= count,
        }
    }
}

/// Step function, filter, and stop conditions for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    pub cadence: Cadence,
    pub filter: Option<WeekdaySet>,
    pub termination: Termination,
    /// Exclusive upper bound on every emitted start.
    pub ceiling: DateTime<Utc>,
}

impl Walk {
    /// Select the walk for `rule` beginning at `start`.
    pub fn for_rule(rule: &RecurrenceRule, tz: &Tz, start: DateTime<Utc>) -> Self {
        let cadence = match rule.weekdays {
            Some(_) => Cadence::Days(1),
            None => rule.nominal_cadence(),
        };
        Self {
            cadence,
            filter: rule.weekdays,
            termination: Termination::for_end(&rule.end),
            ceiling: ceiling_for(tz, start),
        }
    }

    fn admits(&self, candidate: &DateTime<Tz>) -> bool {
        use chrono::Datelike;
        self.filter
            .map_or(true, |days| days.contains(candidate.weekday()))
    }

    /// First slot strictly after `from` that the weekday filter admits.
    ///
    /// Ignores termination and the ceiling. Returns `None` when the filter is
    /// empty or the calendar overflows.
    pub fn next_slot(&self, tz: &Tz, from: DateTime<Tz>) -> Option<DateTime<Tz>> {
        if self.filter.is_some_and(WeekdaySet::is_empty) {
            return None;
        }
        let mut cursor = self.cadence.step(tz, from)?;
        // Seven daily steps always reach an admitted weekday.
        for _ in 0..7 {
            if self.admits(&cursor) {
                return Some(cursor);
            }
            cursor = self.cadence.step(tz, cursor)?;
        }
        None
    }
}

/// Ceiling of a series starting at `start`: the same wall-clock time one year later.
pub fn ceiling_for(tz: &Tz, start: DateTime<Utc>) -> DateTime<Utc> {
    let local = start.with_timezone(tz).naive_local();
    local
        .checked_add_months(Months::new(CEILING_MONTHS))
        .map_or(DateTime::<Utc>::MAX_UTC, |naive| {
            localize(tz, naive).with_timezone(&Utc)
        })
}

/// Lazy sequence of `(date_start, date_end)` pairs produced by a [`Walk`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    walk: Walk,
    tz: Tz,
    cursor: Option<DateTime<Tz>>,
    end_cursor: Option<DateTime<Tz>>,
    emitted: u32,
}

impl Occurrences {
    pub fn new(walk: Walk, tz: Tz, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            walk,
            tz,
            cursor: Some(start.with_timezone(&tz)),
            end_cursor: end.map(|e| e.with_timezone(&tz)),
            emitted: 0,
        }
    }

    fn stop(&mut self, reason: &str) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        tracing::debug!(emitted = self.emitted, reason, "occurrence walk finished");
        self.cursor = None;
        None
    }
}

impl Iterator for Occurrences {
    type Item = (DateTime<Utc>, Option<DateTime<Utc>>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.cursor?;
            let utc = date.with_timezone(&Utc);
            if utc >= self.walk.ceiling {
                return self.stop("ceiling");
            }
            if self.walk.termination.reached(utc, self.emitted) {
                return self.stop("end condition");
            }

            let end = self.end_cursor;
            let next = self.walk.cadence.step(&self.tz, date);
            match next {
                Some(n) if n > date => self.cursor = Some(n),
                _ => {
                    self.cursor = None;
                }
            }
            // The end cursor moves on every candidate, admitted or not.
            self.end_cursor = end.and_then(|e| self.walk.cadence.step(&self.tz, e));

            if self.walk.admits(&date) {
                self.emitted += 1;
                return Some((utc, end.map(|e| e.with_timezone(&Utc))));
            }
        }
    }
}

/// Per-occurrence payload copied onto every generated event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesTemplate {
    pub name: String,
    pub description: Option<String>,
    pub all_day: bool,
    pub location_id: Option<i64>,
    pub album_id: Option<i64>,
    /// End of the first occurrence; later ends keep the same offset from their start.
    pub date_end: Option<DateTime<Utc>>,
}

/// Materialize every occurrence of `rule` starting at `start`.
///
/// `recurrence_id` is stamped onto each event so the whole set shares one
/// series. The result is fully collected: callers report its length.
pub fn generate(
    rule: &RecurrenceRule,
    recurrence_id: Option<i64>,
    start: DateTime<Utc>,
    tz: Tz,
    template: &SeriesTemplate,
) -> Vec<NewEvent> {
    let walk = Walk::for_rule(rule, &tz, start);
    // All-day occurrences carry no end time.
    let date_end = template.date_end.filter(|_| !template.all_day);

    Occurrences::new(walk, tz, start, date_end)
        .map(|(date_start, date_end)| NewEvent {
            name: template.name.clone(),
            description: template.description.clone(),
            all_day: template.all_day,
            date_start,
            date_end,
            location_id: template.location_id,
            album_id: template.album_id,
            recurrence_id,
        })
        .collect()
}
