//! Date + time composition.
//!
//! The single place where cross date/time ambiguity is resolved. The date
//! and time resolvers never guess across the boundary: a time with no date
//! defaults to today here, rolling one day forward when the instant has
//! already passed.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// A fully resolved due instant, produced once per parse and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Whether the phrase named a date (vs defaulting to today).
    pub had_explicit_date: bool,
    /// Whether the phrase named a time of day. When false, `time` is the
    /// start-of-day marker and callers may substitute their own default.
    pub had_explicit_time: bool,
}

impl ResolvedTimestamp {
    pub fn datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// The concrete instant, substituting `default` for a date-only parse.
    pub fn datetime_or_default(&self, default: NaiveTime) -> NaiveDateTime {
        if self.had_explicit_time {
            self.datetime()
        } else {
            self.date.and_time(default)
        }
    }
}

/// Merge resolved sub-parts against the reference instant. Total over valid
/// inputs; `None` only when neither part is present.
pub fn compose(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    now: NaiveDateTime,
) -> Option<ResolvedTimestamp> {
    match (date, time) {
        (Some(date), Some(time)) => Some(ResolvedTimestamp {
            date,
            time,
            had_explicit_date: true,
            had_explicit_time: true,
        }),
        (Some(date), None) => Some(ResolvedTimestamp {
            date,
            time: NaiveTime::MIN,
            had_explicit_date: true,
            had_explicit_time: false,
        }),
        (None, Some(time)) => {
            let mut date = now.date();
            if date.and_time(time) < now {
                // "晚上8点" said at 9pm means tomorrow evening.
                date = date.checked_add_days(Days::new(1)).unwrap_or(date);
            }
            Some(ResolvedTimestamp {
                date,
                time,
                had_explicit_date: false,
                had_explicit_time: true,
            })
        }
        (None, None) => None,
    }
}
