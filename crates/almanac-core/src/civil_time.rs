//! Civil time normalization.
//!
//! User-facing dates arrive as local wall-clock strings in a single fixed
//! timezone (`MM/DD/YYYY hh:mm AM/PM`). This module turns them into absolute
//! timestamps and owns the local-time arithmetic the generator relies on.

use std::borrow::Cow;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::InvalidFormat;

/// `strftime` pattern of every civil date string.
pub const CIVIL_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// Length of a civil string whose hour lost its leading zero (`01/05/2024 9:00 AM`).
const SHORT_HOUR_LEN: usize = 18;

/// Restore the leading zero on a single-digit hour.
///
/// Date pickers emit `01/05/2024 9:00 AM`; the canonical form is
/// `01/05/2024 09:00 AM`. Any other length passes through untouched.
pub fn pad_single_digit_hour(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if bytes.len() == SHORT_HOUR_LEN && input.is_ascii() && bytes[10] == b' ' && bytes[12] == b':' {
        Cow::Owned(format!("{}0{}", &input[..11], &input[11..]))
    } else {
        Cow::Borrowed(input)
    }
}

/// Attach `tz` to a wall-clock value.
///
/// Times inside a DST gap move forward by the length of the gap; times in a
/// DST fold resolve to the later (standard time) instant.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, latest) => latest,
        LocalResult::None => {
            // Read the wall time with the offset in force before the gap.
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix();
            let utc = naive - Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}

/// Parser/normalizer bound to one civil timezone.
#[derive(Debug, Clone, Copy)]
pub struct CivilTime {
    tz: Tz,
}

impl CivilTime {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Parse a civil string into local time without any all-day flattening.
    pub fn parse_local(&self, input: &str) -> Result<DateTime<Tz>, InvalidFormat> {
        let padded = pad_single_digit_hour(input.trim());
        let naive = NaiveDateTime::parse_from_str(&padded, CIVIL_FORMAT).map_err(|_| InvalidFormat {
            input: input.to_string(),
        })?;
        Ok(localize(&self.tz, naive))
    }

    /// Parse a civil string into an absolute timestamp.
    ///
    /// With `all_day` the time of day is forced to local midnight.
    pub fn parse(&self, input: &str, all_day: bool) -> Result<DateTime<Utc>, InvalidFormat> {
        let local = self.parse_local(input)?;
        let local = if all_day {
            self.start_of_day(local.date_naive())
        } else {
            local
        };
        Ok(local.with_timezone(&Utc))
    }

    /// Local midnight of `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Tz> {
        localize(&self.tz, date.and_time(NaiveTime::MIN))
    }

    /// Last representable instant of the local day containing `instant`.
    pub fn end_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.with_timezone(&self.tz).date_naive();
        let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
        localize(&self.tz, date.and_time(last)).with_timezone(&Utc)
    }

    /// Render an absolute timestamp back into civil form.
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format(CIVIL_FORMAT).to_string()
    }
}
