//! Phrase tokenizer.
//!
//! Turns a raw phrase into a flat token stream. Fixed vocabulary words are
//! matched longest-first; numerals (Arabic or Chinese) collapse into
//! `Number` tokens; everything else survives as `Literal` so the date and
//! time resolvers can ignore surrounding task text. Tokenization itself
//! never fails.

use super::numeral;

/// Segment-of-day words that disambiguate 12-hour clock phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daypart {
    /// 凌晨
    Dawn,
    /// 早上 / 早晨 / 上午
    Morning,
    /// 中午
    Noon,
    /// 下午
    Afternoon,
    /// 晚上 / 傍晚 / 晚
    Evening,
}

impl Daypart {
    /// Whether this daypart lifts a 1-11 hour into the afternoon/evening.
    pub fn is_pm(self) -> bool {
        matches!(self, Daypart::Afternoon | Daypart::Evening)
    }
}

/// Clock and calendar unit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockUnit {
    /// 点 / 时
    Hour,
    /// 分
    Minute,
    /// 半 (= 30 minutes)
    Half,
    /// 刻 (= 15 minutes)
    Quarter,
    /// 天后 / 日后
    DaysAhead,
    /// 小时后
    HoursAhead,
    /// 分钟后
    MinutesAhead,
    /// 年
    Year,
    /// 月
    Month,
    /// 日 / 号
    DayOfMonth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(u32),
    /// 今天(0) 明天(1) 后天(2) 大后天(3), as days from the reference date.
    RelativeDay(u8),
    /// 周X / 下周X. `index` is 0-based from Monday.
    Weekday { index: u32, next_week: bool },
    /// A 周/下周 prefix with no weekday character after it.
    WeekMarker { next_week: bool },
    Daypart(Daypart),
    Unit(ClockUnit),
    Literal(char),
}

impl Token {
    /// Tokens that mark the phrase as temporal even when resolution fails.
    ///
    /// Bare numbers and single unit characters (点, 月, 日...) occur in
    /// ordinary task text all the time, so they do not count.
    pub fn is_temporal_marker(&self) -> bool {
        matches!(
            self,
            Token::RelativeDay(_)
                | Token::Weekday { .. }
                | Token::Daypart(_)
                | Token::Unit(
                    ClockUnit::DaysAhead | ClockUnit::HoursAhead | ClockUnit::MinutesAhead
                )
        )
    }
}

/// Vocabulary entries tried in order at each position; longer words first
/// where prefixes overlap (傍晚 before 晚, 分钟后 before 分).
const VOCAB: &[(&str, Token)] = &[
    ("大后天", Token::RelativeDay(3)),
    ("后天", Token::RelativeDay(2)),
    ("明天", Token::RelativeDay(1)),
    ("明日", Token::RelativeDay(1)),
    ("今天", Token::RelativeDay(0)),
    ("今日", Token::RelativeDay(0)),
    ("凌晨", Token::Daypart(Daypart::Dawn)),
    ("早上", Token::Daypart(Daypart::Morning)),
    ("早晨", Token::Daypart(Daypart::Morning)),
    ("上午", Token::Daypart(Daypart::Morning)),
    ("中午", Token::Daypart(Daypart::Noon)),
    ("下午", Token::Daypart(Daypart::Afternoon)),
    ("傍晚", Token::Daypart(Daypart::Evening)),
    ("晚上", Token::Daypart(Daypart::Evening)),
    ("晚", Token::Daypart(Daypart::Evening)),
    ("小时后", Token::Unit(ClockUnit::HoursAhead)),
    ("分钟后", Token::Unit(ClockUnit::MinutesAhead)),
    ("天后", Token::Unit(ClockUnit::DaysAhead)),
    ("日后", Token::Unit(ClockUnit::DaysAhead)),
    ("点", Token::Unit(ClockUnit::Hour)),
    ("时", Token::Unit(ClockUnit::Hour)),
    ("分", Token::Unit(ClockUnit::Minute)),
    ("半", Token::Unit(ClockUnit::Half)),
    ("刻", Token::Unit(ClockUnit::Quarter)),
    ("年", Token::Unit(ClockUnit::Year)),
    ("月", Token::Unit(ClockUnit::Month)),
    ("日", Token::Unit(ClockUnit::DayOfMonth)),
    ("号", Token::Unit(ClockUnit::DayOfMonth)),
];

fn weekday_index(ch: char) -> Option<u32> {
    // Monday = 0, matching chrono's num_days_from_monday.
    let idx = match ch {
        '一' => 0,
        '二' => 1,
        '三' => 2,
        '四' => 3,
        '五' => 4,
        '六' => 5,
        '日' | '天' => 6,
        _ => return None,
    };
    Some(idx)
}

/// Match a 周-family word at the head of `rest`. Returns the token and the
/// number of characters consumed.
fn match_week(rest: &[char]) -> Option<(Token, usize)> {
    let (next_week, prefix_len) = match rest {
        ['下', '周', ..] => (true, 2),
        ['这', '周', ..] | ['本', '周', ..] => (false, 2),
        ['周', ..] => (false, 1),
        _ => return None,
    };
    match rest.get(prefix_len).copied().and_then(weekday_index) {
        Some(index) => Some((Token::Weekday { index, next_week }, prefix_len + 1)),
        None => Some((Token::WeekMarker { next_week }, prefix_len)),
    }
}

fn match_vocab(rest: &[char]) -> Option<(Token, usize)> {
    for (word, token) in VOCAB {
        let wchars: Vec<char> = word.chars().collect();
        if rest.len() >= wchars.len() && rest[..wchars.len()] == wchars[..] {
            return Some((token.clone(), wchars.len()));
        }
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if let Some((token, len)) = match_week(&chars[i..]) {
            tokens.push(token);
            i += len;
            continue;
        }

        if let Some((token, len)) = match_vocab(&chars[i..]) {
            tokens.push(token);
            i += len;
            continue;
        }

        if ch.is_ascii_digit() {
            let mut value: u64 = 0;
            while i < chars.len() && chars[i].is_ascii_digit() {
                value = value
                    .saturating_mul(10)
                    .saturating_add(chars[i] as u64 - '0' as u64);
                i += 1;
            }
            tokens.push(Token::Number(value.min(u32::MAX as u64) as u32));
            continue;
        }

        if numeral::is_numeral_char(ch) {
            let start = i;
            while i < chars.len() && numeral::is_numeral_char(chars[i]) {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect();
            match numeral::from_chinese(&run) {
                Some(value) => tokens.push(Token::Number(value)),
                None => tokens.extend(chars[start..i].iter().map(|&c| Token::Literal(c))),
            }
            continue;
        }

        // Normalize the full-width colon so HH:MM matching sees one form.
        tokens.push(Token::Literal(if ch == '：' { ':' } else { ch }));
        i += 1;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_day_and_time_phrase() {
        let tokens = tokenize("明天下午三点");
        assert_eq!(
            tokens,
            vec![
                Token::RelativeDay(1),
                Token::Daypart(Daypart::Afternoon),
                Token::Number(3),
                Token::Unit(ClockUnit::Hour),
            ]
        );
    }

    #[test]
    fn next_week_weekday() {
        assert_eq!(
            tokenize("下周一"),
            vec![Token::Weekday { index: 0, next_week: true }]
        );
        assert_eq!(
            tokenize("周日"),
            vec![Token::Weekday { index: 6, next_week: false }]
        );
    }

    #[test]
    fn dangling_week_prefix() {
        assert_eq!(
            tokenize("下周十"),
            vec![Token::WeekMarker { next_week: true }, Token::Number(10)]
        );
    }

    #[test]
    fn days_ahead_suffix() {
        assert_eq!(
            tokenize("3天后"),
            vec![Token::Number(3), Token::Unit(ClockUnit::DaysAhead)]
        );
    }

    #[test]
    fn absolute_date_keeps_separators() {
        let tokens = tokenize("2026-02-20 18:00");
        assert_eq!(
            tokens,
            vec![
                Token::Number(2026),
                Token::Literal('-'),
                Token::Number(2),
                Token::Literal('-'),
                Token::Number(20),
                Token::Number(18),
                Token::Literal(':'),
                Token::Number(0),
            ]
        );
    }

    #[test]
    fn plain_text_is_literals_and_numbers() {
        let tokens = tokenize("买3个苹果");
        assert!(tokens.iter().all(|t| !t.is_temporal_marker()));
    }

    #[test]
    fn evening_half_hour() {
        assert_eq!(
            tokenize("晚上8点半"),
            vec![
                Token::Daypart(Daypart::Evening),
                Token::Number(8),
                Token::Unit(ClockUnit::Hour),
                Token::Unit(ClockUnit::Half),
            ]
        );
    }
}
