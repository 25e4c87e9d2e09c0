//! Property tests for the occurrence generator.
//!
//! Rules are drawn at random and every materialized series is checked
//! against the ceiling, the weekday filter, count limits and durations.

use almanac_core::civil_time::localize;
use almanac_core::recurrence::generator::ceiling_for;
use almanac_core::{
    generate, EndCondition, FrequencyUnit, RecurrenceRule, SeriesTemplate, WeekdaySet,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::America::Chicago;
use proptest::prelude::*;

fn unit_strategy() -> impl Strategy<Value = FrequencyUnit> {
    prop_oneof![
        Just(FrequencyUnit::Day),
        Just(FrequencyUnit::Week),
        Just(FrequencyUnit::Month),
        Just(FrequencyUnit::Year),
    ]
}

fn end_strategy() -> impl Strategy<Value = EndCondition> {
    prop_oneof![
        Just(EndCondition::MaxDuration),
        (1u32..60).prop_map(|count| EndCondition::AfterCount { count }),
        (1i64..600).prop_map(|days| EndCondition::OnDate {
            ends_on: base_start() + Duration::days(days),
        }),
    ]
}

fn weekdays_strategy() -> impl Strategy<Value = Option<WeekdaySet>> {
    prop_oneof![Just(None), (0u8..128).prop_map(|m| Some(WeekdaySet::from_mask(m)))]
}

fn rule_strategy() -> impl Strategy<Value = RecurrenceRule> {
    (1u32..5, unit_strategy(), end_strategy(), weekdays_strategy()).prop_map(
        |(frequency, unit, end, weekdays)| RecurrenceRule {
            frequency,
            unit,
            end,
            weekdays,
        },
    )
}

fn base_start() -> DateTime<Utc> {
    local(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 9, 0)
}

fn local(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let naive = date.and_hms_opt(hour, minute, 0).unwrap();
    localize(&Chicago, naive).with_timezone(&Utc)
}

/// Starts spread over a year, away from the early-morning DST transitions.
fn start_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0u64..365, 8u32..23, 0u32..60).prop_map(|(days, hour, minute)| {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(days);
        local(date, hour, minute)
    })
}

proptest! {
    #[test]
    fn occurrences_stay_below_ceiling(rule in rule_strategy(), start in start_strategy()) {
        let ceiling = ceiling_for(&Chicago, start);
        let events = generate(&rule, None, start, Chicago, &SeriesTemplate::default());
        for event in &events {
            prop_assert!(event.date_start >= start);
            prop_assert!(event.date_start < ceiling);
        }
        // Daily steps can fit at most 366 candidates in a year.
        prop_assert!(events.len() <= 366);
    }

    #[test]
    fn occurrences_respect_weekday_filter(rule in rule_strategy(), start in start_strategy()) {
        let events = generate(&rule, None, start, Chicago, &SeriesTemplate::default());
        if let Some(days) = rule.weekdays {
            for event in &events {
                prop_assert!(days.contains(event.date_start.with_timezone(&Chicago).weekday()));
            }
            if days.is_empty() {
                prop_assert!(events.is_empty());
            }
        }
    }

    #[test]
    fn occurrences_are_strictly_increasing(rule in rule_strategy(), start in start_strategy()) {
        let events = generate(&rule, None, start, Chicago, &SeriesTemplate::default());
        for pair in events.windows(2) {
            prop_assert!(pair[0].date_start < pair[1].date_start);
        }
    }

    #[test]
    fn after_count_never_exceeds_count(rule in rule_strategy(), start in start_strategy()) {
        let events = generate(&rule, None, start, Chicago, &SeriesTemplate::default());
        match rule.end {
            EndCondition::AfterCount { count } => prop_assert!(events.len() <= count as usize),
            EndCondition::OnDate { ends_on } => {
                for event in &events {
                    prop_assert!(event.date_start <= ends_on);
                }
            }
            EndCondition::MaxDuration => {}
        }
    }

    #[test]
    fn short_daily_counts_are_exact(count in 1u32..60, start in start_strategy()) {
        let rule = RecurrenceRule {
            frequency: 1,
            unit: FrequencyUnit::Day,
            end: EndCondition::AfterCount { count },
            weekdays: None,
        };
        let events = generate(&rule, None, start, Chicago, &SeriesTemplate::default());
        prop_assert_eq!(events.len(), count as usize);
    }

    #[test]
    fn durations_follow_the_template(
        frequency in 1u32..4,
        weekly in any::<bool>(),
        minutes in 15i64..180,
        start in start_strategy(),
    ) {
        let rule = RecurrenceRule {
            frequency,
            unit: if weekly { FrequencyUnit::Week } else { FrequencyUnit::Day },
            end: EndCondition::MaxDuration,
            weekdays: None,
        };
        let first_end = start.with_timezone(&Chicago).naive_local() + Duration::minutes(minutes);
        let template = SeriesTemplate {
            date_end: Some(localize(&Chicago, first_end).with_timezone(&Utc)),
            ..SeriesTemplate::default()
        };
        for event in generate(&rule, None, start, Chicago, &template) {
            let end = event.date_end.unwrap().with_timezone(&Chicago).naive_local();
            let begin = event.date_start.with_timezone(&Chicago).naive_local();
            prop_assert_eq!(end - begin, Duration::minutes(minutes));
        }
    }

    #[test]
    fn generation_is_deterministic(rule in rule_strategy(), start in start_strategy()) {
        let template = SeriesTemplate {
            name: "Repeat".into(),
            ..SeriesTemplate::default()
        };
        let first = generate(&rule, Some(7), start, Chicago, &template);
        let second = generate(&rule, Some(7), start, Chicago, &template);
        prop_assert_eq!(first, second);
    }
}
