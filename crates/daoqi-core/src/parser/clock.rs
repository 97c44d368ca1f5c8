//! Time-of-day resolution.
//!
//! Resolves clock-bearing tokens to a 24-hour `NaiveTime`. A daypart word
//! anywhere in the phrase disambiguates 12-hour forms; bare hours 1-12
//! without one default to AM, hours >= 13 are taken literally.

use chrono::NaiveTime;

use super::token::{ClockUnit, Daypart, Token};
use crate::error::ParseError;

/// Resolve the time part of a token stream. `Ok(None)` means no time token
/// was present.
pub fn resolve_time(tokens: &[Token], raw: &str) -> Result<Option<NaiveTime>, ParseError> {
    let daypart = tokens.iter().find_map(|t| match t {
        Token::Daypart(p) => Some(*p),
        _ => None,
    });

    // HH:MM literal first.
    for window in tokens.windows(3) {
        if let [Token::Number(h), Token::Literal(':'), Token::Number(m)] = window {
            let mut hour = *h;
            if daypart.is_some_and(|p| p.is_pm()) && hour < 12 {
                hour += 12;
            }
            return build(hour, *m, raw).map(Some);
        }
    }

    // X点 / X时, with an optional minute qualifier right after.
    for (i, window) in tokens.windows(2).enumerate() {
        let [Token::Number(h), Token::Unit(ClockUnit::Hour)] = window else {
            continue;
        };
        let minute = match tokens.get(i + 2..) {
            Some([Token::Unit(ClockUnit::Half), ..]) => 30,
            Some([Token::Number(k), Token::Unit(ClockUnit::Quarter), ..]) => k * 15,
            Some([Token::Unit(ClockUnit::Quarter), ..]) => 15,
            Some([Token::Number(m), Token::Unit(ClockUnit::Minute), ..]) => *m,
            Some([Token::Number(m), ..]) => *m,
            _ => 0,
        };
        let hour = apply_daypart(*h, daypart);
        return build(hour, minute, raw).map(Some);
    }

    Ok(None)
}

fn apply_daypart(hour: u32, daypart: Option<Daypart>) -> u32 {
    match daypart {
        Some(p) if p.is_pm() && hour < 12 => hour + 12,
        Some(Daypart::Dawn) if hour == 12 => 0,
        // 中午12点 and the AM dayparts keep the hour as stated.
        _ => hour,
    }
}

fn build(hour: u32, minute: u32, raw: &str) -> Result<NaiveTime, ParseError> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ParseError::UnparsableInput {
        input: raw.to_string(),
    })
}
