//! Injected source of "now" in the configured civil timezone.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Current time plus the civil timezone every date string is read in.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn timezone(&self) -> Tz;

    /// Current time as local wall-clock time.
    fn local_now(&self) -> DateTime<Tz> {
        self.now().with_timezone(&self.timezone())
    }

    /// Local calendar date of "now".
    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Clock frozen at a single instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    tz: Tz,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_local_date() {
        // 03:00 UTC on Jan 2 is still Jan 1 in Chicago.
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let clock = FixedClock::new(now, chrono_tz::America::Chicago);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
