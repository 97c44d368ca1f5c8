//! Chinese numeral conversion.
//!
//! Handles the 一~九十九 range that shows up in time phrases, plus formal
//! bank numerals and 两. Larger values are written with Arabic digits in
//! practice and tokenized separately.

/// Value of a single numeral character, if it is one.
pub fn digit_value(ch: char) -> Option<u32> {
    let v = match ch {
        '零' | '〇' => 0,
        '一' | '壹' => 1,
        '二' | '两' | '贰' => 2,
        '三' | '叁' => 3,
        '四' | '肆' => 4,
        '五' | '伍' => 5,
        '六' | '陆' => 6,
        '七' | '柒' => 7,
        '八' | '捌' => 8,
        '九' | '玖' => 9,
        '十' | '拾' => 10,
        _ => return None,
    };
    Some(v)
}

pub fn is_numeral_char(ch: char) -> bool {
    digit_value(ch).is_some()
}

/// Convert a run of Chinese numeral characters to an integer.
///
/// Compounds with 十/拾 follow the tens rule: 十二 = 12, 二十 = 20,
/// 二十五 = 25. Runs without 十 are read digit-by-digit (二三 = 23).
pub fn from_chinese(s: &str) -> Option<u32> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return None;
    }

    if chars.len() == 1 {
        return digit_value(chars[0]);
    }

    if let Some(pos) = chars.iter().position(|&c| c == '十' || c == '拾') {
        // Leading 十 means an implicit 1: 十二 = 1*10 + 2.
        let tens = if pos == 0 {
            1
        } else if pos == 1 {
            digit_value(chars[0])?
        } else {
            return None;
        };
        let ones = match chars.len() - pos - 1 {
            0 => 0,
            1 => digit_value(chars[pos + 1])?,
            _ => return None,
        };
        let value = tens * 10 + ones;
        return if value > 0 { Some(value) } else { None };
    }

    let mut value: u32 = 0;
    for ch in chars {
        let d = digit_value(ch)?;
        if d >= 10 {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(d)?;
    }
    if value > 0 {
        Some(value)
    } else {
        None
    }
}
