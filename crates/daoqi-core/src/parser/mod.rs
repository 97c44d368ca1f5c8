//! Chinese natural-language time parsing.
//!
//! Supported forms:
//! - absolute: 2026-02-20 18:00 / 2026年2月20日 / 3月5日
//! - relative dates: 明天, 后天, 大后天, 3天后, 下周一, 周五
//! - clock phrases: 下午三点, 晚上8点半, 上午十点三十分, 18:00
//! - combinations: 明天下午三点, 后天晚上8点
//! - offsets: 2小时后, 30分钟后
//!
//! Everything is pure: callers pass the reference instant, repeated calls
//! with the same inputs yield identical results.

mod clock;
mod compose;
mod date;
pub mod numeral;
pub mod token;

use chrono::{Duration, NaiveDateTime};

pub use compose::{compose, ResolvedTimestamp};
pub use token::{tokenize, ClockUnit, Daypart, Token};

use crate::error::ParseError;

/// Resolve a free-text phrase against the reference instant.
///
/// `Ok(None)` means the phrase carries no temporal tokens at all (pure task
/// text). `UnparsableInput` is returned only when temporal-looking tokens
/// are present but do not form a valid date or time (下周十, 25点).
pub fn resolve(
    raw: &str,
    now: NaiveDateTime,
) -> Result<Option<ResolvedTimestamp>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tokens = tokenize(trimmed);
    let date = date::resolve_date(&tokens, now.date(), trimmed)?;
    let time = clock::resolve_time(&tokens, trimmed)?;

    if let Some(ts) = compose(date, time, now) {
        return Ok(Some(ts));
    }

    if let Some(instant) = resolve_offset(&tokens, now, trimmed)? {
        return Ok(Some(ResolvedTimestamp {
            date: instant.date(),
            time: instant.time(),
            had_explicit_date: true,
            had_explicit_time: true,
        }));
    }

    if tokens.iter().any(Token::is_temporal_marker) {
        return Err(ParseError::UnparsableInput {
            input: trimmed.to_string(),
        });
    }
    Ok(None)
}

/// N小时后 / N分钟后 — resolved last, only when no date/time tokens matched.
fn resolve_offset(
    tokens: &[Token],
    now: NaiveDateTime,
    raw: &str,
) -> Result<Option<NaiveDateTime>, ParseError> {
    for pair in tokens.windows(2) {
        let delta = match pair {
            [Token::Number(n), Token::Unit(ClockUnit::HoursAhead)] => Duration::hours(*n as i64),
            [Token::Number(n), Token::Unit(ClockUnit::MinutesAhead)] => {
                Duration::minutes(*n as i64)
            }
            _ => continue,
        };
        return now
            .checked_add_signed(delta)
            .map(Some)
            .ok_or_else(|| ParseError::CalendarOverflow {
                context: format!("{raw:?}: offset past {now}"),
            });
    }
    Ok(None)
}

/// Split "time prefix + task content" out of free text, greedy over
/// whitespace-separated words: the longest leading run of words that still
/// parses as a time wins. A single word is always pure content, and so is
/// text whose every word belongs to the time (a task needs content).
pub fn split_leading_time(
    text: &str,
    now: NaiveDateTime,
) -> (String, Option<ResolvedTimestamp>) {
    let text = text.trim();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= 1 {
        return (text.to_string(), None);
    }

    let mut best: Option<(usize, ResolvedTimestamp)> = None;
    for split in 1..words.len() {
        let candidate = words[..split].join(" ");
        if let Ok(Some(ts)) = resolve(&candidate, now) {
            best = Some((split, ts));
        }
    }

    if let Some((split, ts)) = best {
        let content = words[split..].join(" ");
        if !content.is_empty() {
            return (content, Some(ts));
        }
    }
    (text.to_string(), None)
}
