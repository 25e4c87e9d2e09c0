//! Recurrence rules: what repeats, how often, and when it stops.
//!
//! - [`rule`] turns raw submitted fields into a validated draft
//! - [`generator`] materializes a rule into concrete occurrences

pub mod generator;
pub mod rule;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub use generator::{generate, Cadence, Occurrences, SeriesTemplate, Termination, Walk};
pub use rule::{build, EventDraft, RawEventFields, SeriesDraft, SingleDraft};

/// Unit the frequency multiplier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Day,
    Week,
    Month,
    Year,
}

impl FrequencyUnit {
    /// Form code of this unit. Code `0` means "does not repeat".
    pub fn code(self) -> i64 {
        match self {
            FrequencyUnit::Day => 1,
            FrequencyUnit::Week => 2,
            FrequencyUnit::Month => 3,
            FrequencyUnit::Year => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(FrequencyUnit::Day),
            2 => Some(FrequencyUnit::Week),
            3 => Some(FrequencyUnit::Month),
            4 => Some(FrequencyUnit::Year),
            _ => None,
        }
    }
}

/// How a series stops, on top of the one-year ceiling every series obeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndCondition {
    /// Runs until the ceiling.
    MaxDuration,
    /// Runs through `ends_on` (inclusive, normalized to end of day).
    OnDate { ends_on: DateTime<Utc> },
    /// Stops after `count` occurrences.
    AfterCount { count: u32 },
}

impl EndCondition {
    pub fn code(&self) -> i64 {
        match self {
            EndCondition::MaxDuration => 0,
            EndCondition::OnDate { .. } => 1,
            EndCondition::AfterCount { .. } => 2,
        }
    }
}

/// Set of weekdays, stored as a bitmask with Monday in the lowest bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new() -> Self {
        Self(0)
    }

    pub fn from_mask(mask: u8) -> Self {
        Self(mask & 0x7f)
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        Self::ALL.into_iter().filter(move |day| self.contains(*day))
    }

    /// Parse `monday`, `mon`, `Mon`, ... into a weekday.
    pub fn parse_day(name: &str) -> Option<Weekday> {
        let lower = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|day| {
            let full = weekday_name(*day);
            lower == full || (lower.len() >= 3 && full.starts_with(lower.as_str()))
        })
    }
}

/// Lowercase English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// The repeat pattern of a series, independent of where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Positive multiplier on `unit`.
    pub frequency: u32,
    pub unit: FrequencyUnit,
    pub end: EndCondition,
    /// When present only these weekdays are emitted, stepping one day at a time.
    pub weekdays: Option<WeekdaySet>,
}

impl RecurrenceRule {
    /// Whether the series reads as "weekly" to the query and UI layers.
    pub fn derive_is_weekly(&self) -> bool {
        self.weekdays.is_some() || (self.frequency == 1 && self.unit == FrequencyUnit::Week)
    }

    /// Step between consecutive occurrences, ignoring any weekday filter.
    pub fn nominal_cadence(&self) -> Cadence {
        match self.unit {
            FrequencyUnit::Day => Cadence::Days(self.frequency),
            FrequencyUnit::Week => Cadence::Days(self.frequency.saturating_mul(7)),
            FrequencyUnit::Month => Cadence::Months(self.frequency),
            FrequencyUnit::Year => Cadence::Years(self.frequency),
        }
    }
}

/// Stored metadata shared by every occurrence of one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceInfo {
    pub id: i64,
    pub rule: RecurrenceRule,
    /// Derived when the series is created and never recomputed afterwards.
    pub is_weekly: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_unit_codes_round_trip() {
        for unit in [
            FrequencyUnit::Day,
            FrequencyUnit::Week,
            FrequencyUnit::Month,
            FrequencyUnit::Year,
        ] {
            assert_eq!(FrequencyUnit::from_code(unit.code()), Some(unit));
        }
        assert_eq!(FrequencyUnit::from_code(0), None);
        assert_eq!(FrequencyUnit::from_code(5), None);
    }

    #[test]
    fn weekday_set_membership() {
        let set: WeekdaySet = [Weekday::Tue, Weekday::Thu].into_iter().collect();
        assert!(set.contains(Weekday::Tue));
        assert!(!set.contains(Weekday::Wed));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Weekday::Tue, Weekday::Thu]);
        assert_eq!(WeekdaySet::from_mask(set.mask()), set);
    }

    #[test]
    fn parses_weekday_names() {
        assert_eq!(WeekdaySet::parse_day("monday"), Some(Weekday::Mon));
        assert_eq!(WeekdaySet::parse_day("Thu"), Some(Weekday::Thu));
        assert_eq!(WeekdaySet::parse_day(" SUNDAY "), Some(Weekday::Sun));
        assert_eq!(WeekdaySet::parse_day("mo"), None);
        assert_eq!(WeekdaySet::parse_day("funday"), None);
    }

    #[test]
    fn is_weekly_derivation() {
        let mut rule = RecurrenceRule {
            frequency: 1,
            unit: FrequencyUnit::Week,
            end: EndCondition::MaxDuration,
            weekdays: None,
        };
        assert!(rule.derive_is_weekly());

        rule.frequency = 2;
        assert!(!rule.derive_is_weekly());

        rule.unit = FrequencyUnit::Day;
        rule.weekdays = Some([Weekday::Mon].into_iter().collect());
        assert!(rule.derive_is_weekly());
    }

    #[test]
    fn weekday_set_serializes_as_names() {
        let set: WeekdaySet = [Weekday::Mon, Weekday::Fri].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Mon","Fri"]"#);
        let back: WeekdaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
