//! Relative date resolution.
//!
//! Resolves the date-bearing tokens of a phrase against a reference date.
//! Priority order: absolute literals, N天后, 明天/后天/大后天, 下周X, 周X.
//! Rolling a defaulted "today" forward when the time of day has already
//! passed is the Composer's job, never this module's.

use chrono::{Datelike, Days, NaiveDate};

use super::token::{ClockUnit, Token};
use crate::error::ParseError;

/// Resolve the date part of a token stream. `Ok(None)` means no date token
/// was present; the raw phrase is only carried for error reporting.
pub fn resolve_date(
    tokens: &[Token],
    today: NaiveDate,
    raw: &str,
) -> Result<Option<NaiveDate>, ParseError> {
    // A week prefix directly followed by a number is a malformed
    // weekday (下周十, 这周十).
    for pair in tokens.windows(2) {
        if let [Token::WeekMarker { .. }, Token::Number(_)] = pair {
            return Err(ParseError::UnparsableInput {
                input: raw.to_string(),
            });
        }
    }

    if let Some(date) = resolve_absolute(tokens, today, raw)? {
        return Ok(Some(date));
    }

    for pair in tokens.windows(2) {
        if let [Token::Number(n), Token::Unit(ClockUnit::DaysAhead)] = pair {
            return add_days(today, *n as u64, raw).map(Some);
        }
    }

    for token in tokens {
        match token {
            Token::RelativeDay(n) => {
                return add_days(today, *n as u64, raw).map(Some);
            }
            Token::Weekday { index, next_week } => {
                let current = today.weekday().num_days_from_monday() as i64;
                let mut ahead = (*index as i64 - current).rem_euclid(7);
                if *next_week {
                    // Strictly the following week, even when X is today's
                    // weekday.
                    ahead += 7;
                }
                return add_days(today, ahead as u64, raw).map(Some);
            }
            _ => {}
        }
    }

    Ok(None)
}

/// Absolute forms: YYYY-MM-DD, YYYY年MM月DD日, MM-DD, MM月DD日.
/// Year-less dates already past the reference roll to next year.
fn resolve_absolute(
    tokens: &[Token],
    today: NaiveDate,
    raw: &str,
) -> Result<Option<NaiveDate>, ParseError> {
    for window in tokens.windows(5) {
        let ymd = match window {
            [Token::Number(y), Token::Literal(a), Token::Number(m), Token::Literal(b), Token::Number(d)]
                if matches!(a, '-' | '/') && matches!(b, '-' | '/') =>
            {
                Some((*y, *m, *d))
            }
            [Token::Number(y), Token::Unit(ClockUnit::Year), Token::Number(m), Token::Unit(ClockUnit::Month), Token::Number(d)] =>
            {
                // 日/号 after the day number is customary but optional here;
                // the five matched tokens already pin the meaning.
                Some((*y, *m, *d))
            }
            _ => None,
        };
        if let Some((y, m, d)) = ymd {
            let date = NaiveDate::from_ymd_opt(y as i32, m, d).ok_or_else(|| {
                ParseError::UnparsableInput {
                    input: raw.to_string(),
                }
            })?;
            return Ok(Some(date));
        }
    }

    for window in tokens.windows(3) {
        let md = match window {
            [Token::Number(m), Token::Literal('-'), Token::Number(d)] => Some((*m, *d)),
            [Token::Number(m), Token::Unit(ClockUnit::Month), Token::Number(d)] => Some((*m, *d)),
            _ => None,
        };
        if let Some((m, d)) = md {
            if m == 0 || m > 12 || d == 0 || d > 31 {
                return Err(ParseError::UnparsableInput {
                    input: raw.to_string(),
                });
            }
            return month_day_with_roll(today, m, d, raw).map(Some);
        }
    }

    Ok(None)
}

/// MM-DD in the reference year, rolled to the next year if already past
/// (or invalid this year, e.g. Feb 29 outside a leap year).
fn month_day_with_roll(
    today: NaiveDate,
    month: u32,
    day: u32,
    raw: &str,
) -> Result<NaiveDate, ParseError> {
    for year in [today.year(), today.year() + 1] {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            if date >= today {
                return Ok(date);
            }
        }
    }
    Err(ParseError::UnparsableInput {
        input: raw.to_string(),
    })
}

fn add_days(today: NaiveDate, n: u64, raw: &str) -> Result<NaiveDate, ParseError> {
    today
        .checked_add_days(Days::new(n))
        .ok_or_else(|| ParseError::CalendarOverflow {
            context: format!("{raw:?}: {n} days past {today}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::tokenize;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolve(phrase: &str, today: NaiveDate) -> Result<Option<NaiveDate>, ParseError> {
        resolve_date(&tokenize(phrase), today, phrase)
    }

    // 2024-01-01 is a Monday.
    const Y: i32 = 2024;

    #[test]
    fn relative_days() {
        let today = date(Y, 1, 1);
        assert_eq!(resolve("明天", today).unwrap(), Some(date(Y, 1, 2)));
        assert_eq!(resolve("后天", today).unwrap(), Some(date(Y, 1, 3)));
        assert_eq!(resolve("大后天", today).unwrap(), Some(date(Y, 1, 4)));
        assert_eq!(resolve("今天", today).unwrap(), Some(today));
    }

    #[test]
    fn n_days_ahead() {
        let today = date(Y, 1, 1);
        assert_eq!(resolve("3天后", today).unwrap(), Some(date(Y, 1, 4)));
        assert_eq!(resolve("十天后", today).unwrap(), Some(date(Y, 1, 11)));
    }

    #[test]
    fn next_week_is_strictly_next_week() {
        let monday = date(Y, 1, 1);
        assert_eq!(resolve("下周一", monday).unwrap(), Some(date(Y, 1, 8)));
        assert_eq!(resolve("下周三", monday).unwrap(), Some(date(Y, 1, 10)));
    }

    #[test]
    fn bare_weekday_allows_today() {
        let monday = date(Y, 1, 1);
        assert_eq!(resolve("周一", monday).unwrap(), Some(monday));
        assert_eq!(resolve("周三", monday).unwrap(), Some(date(Y, 1, 3)));
        assert_eq!(resolve("这周五", monday).unwrap(), Some(date(Y, 1, 5)));
    }

    #[test]
    fn next_week_always_beyond_bare_weekday() {
        // Every reference weekday x target weekday combination.
        for offset in 0..7 {
            let today = date(Y, 1, 1) + chrono::Duration::days(offset);
            for wd in ["一", "二", "三", "四", "五", "六", "日"] {
                let bare = resolve(&format!("周{wd}"), today).unwrap().unwrap();
                let next = resolve(&format!("下周{wd}"), today).unwrap().unwrap();
                let gap = (next - bare).num_days();
                assert!((1..=7).contains(&gap), "gap {gap} for 周{wd} from {today}");
            }
        }
    }

    #[test]
    fn absolute_dates() {
        let today = date(Y, 1, 1);
        assert_eq!(
            resolve("2026-02-20", today).unwrap(),
            Some(date(2026, 2, 20))
        );
        assert_eq!(
            resolve("2026/02/20", today).unwrap(),
            Some(date(2026, 2, 20))
        );
        assert_eq!(
            resolve("2026年2月20日", today).unwrap(),
            Some(date(2026, 2, 20))
        );
    }

    #[test]
    fn month_day_rolls_to_next_year_when_past() {
        let today = date(Y, 6, 1);
        assert_eq!(resolve("3月5日", today).unwrap(), Some(date(Y + 1, 3, 5)));
        assert_eq!(resolve("12-24", today).unwrap(), Some(date(Y, 12, 24)));
    }

    #[test]
    fn invalid_calendar_dates_fail() {
        let today = date(Y, 1, 1);
        assert!(resolve("2026-13-01", today).is_err());
        assert!(resolve("2026年2月30日", today).is_err());
        assert!(resolve("13月5日", today).is_err());
    }

    #[test]
    fn dangling_week_prefix_with_number_fails() {
        assert!(resolve("下周十", date(Y, 1, 1)).is_err());
        assert!(resolve("这周十", date(Y, 1, 1)).is_err());
        assert!(resolve("本周十", date(Y, 1, 1)).is_err());
    }

    #[test]
    fn dangling_week_prefix_without_number_is_ignored() {
        assert_eq!(resolve("下周汇报", date(Y, 1, 1)).unwrap(), None);
        assert_eq!(resolve("这周工作总结", date(Y, 1, 1)).unwrap(), None);
    }

    #[test]
    fn huge_day_offset_overflows() {
        let err = resolve("4294967295天后", date(Y, 1, 1));
        assert!(matches!(err, Err(ParseError::CalendarOverflow { .. })));
    }

    #[test]
    fn plain_text_has_no_date() {
        assert_eq!(resolve("交报告", date(Y, 1, 1)).unwrap(), None);
    }
}
