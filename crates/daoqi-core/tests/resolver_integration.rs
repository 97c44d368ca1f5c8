//! Integration tests for the time phrase resolver.
//!
//! These tests exercise the full resolve pipeline (tokenizer, date and
//! time resolution, composition) through the public API, pinned to fixed
//! reference instants so every run sees the same calendar.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use proptest::prelude::*;

use daoqi_core::error::ParseError;
use daoqi_core::{resolve, split_leading_time};

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Monday 2024-01-01 10:00, the shared reference instant.
fn monday_morning() -> NaiveDateTime {
    let now = dt(2024, 1, 1, 10, 0);
    assert_eq!(now.weekday(), Weekday::Mon);
    now
}

#[test]
fn test_combined_relative_date_and_daypart_time() {
    let ts = resolve("明天下午三点", monday_morning()).unwrap().unwrap();
    assert_eq!(ts.datetime(), dt(2024, 1, 2, 15, 0));
    assert!(ts.had_explicit_date);
    assert!(ts.had_explicit_time);
}

#[test]
fn test_next_week_monday_is_date_only() {
    let ts = resolve("下周一", monday_morning()).unwrap().unwrap();
    assert_eq!(ts.date, dt(2024, 1, 8, 0, 0).date());
    assert!(!ts.had_explicit_time);
    // Callers pick the concrete time for date-only phrases.
    assert_eq!(
        ts.datetime_or_default(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
        dt(2024, 1, 8, 9, 0)
    );
}

#[test]
fn test_evening_time_rolls_forward_only_when_past() {
    // Said at 21:00, 晚上8点 means tomorrow evening.
    let ts = resolve("晚上8点", dt(2024, 1, 1, 21, 0)).unwrap().unwrap();
    assert_eq!(ts.datetime(), dt(2024, 1, 2, 20, 0));

    // Said in the morning, it means tonight.
    let ts = resolve("晚上8点", monday_morning()).unwrap().unwrap();
    assert_eq!(ts.datetime(), dt(2024, 1, 1, 20, 0));
}

#[test]
fn test_malformed_temporal_phrases_are_errors() {
    for bad in ["下周十", "这周十", "25点", "8点99分", "下午"] {
        let err = resolve(bad, monday_morning()).unwrap_err();
        assert!(
            matches!(err, ParseError::UnparsableInput { .. }),
            "{bad} gave {err:?}"
        );
    }
}

#[test]
fn test_plain_task_text_is_not_temporal() {
    for plain in ["交报告", "买3个苹果", "周报", "下周汇报", "看5月的账单"] {
        assert!(
            resolve(plain, monday_morning()).unwrap().is_none(),
            "{plain} should be plain text"
        );
    }
}

#[test]
fn test_absolute_formats() {
    let now = monday_morning();
    let ts = resolve("2026-02-20 18:00", now).unwrap().unwrap();
    assert_eq!(ts.datetime(), dt(2026, 2, 20, 18, 0));

    let ts = resolve("2026年3月5日", now).unwrap().unwrap();
    assert_eq!(ts.date, dt(2026, 3, 5, 0, 0).date());

    // Month-day already past this year rolls to next year.
    let ts = resolve("1月1日", dt(2024, 6, 1, 10, 0)).unwrap().unwrap();
    assert_eq!(ts.date, dt(2025, 1, 1, 0, 0).date());
}

#[test]
fn test_offsets_from_reference_instant() {
    let now = monday_morning();
    assert_eq!(
        resolve("2小时后", now).unwrap().unwrap().datetime(),
        dt(2024, 1, 1, 12, 0)
    );
    assert_eq!(
        resolve("30分钟后", now).unwrap().unwrap().datetime(),
        dt(2024, 1, 1, 10, 30)
    );
    assert_eq!(
        resolve("3天后", now).unwrap().unwrap().date,
        dt(2024, 1, 4, 0, 0).date()
    );
}

#[test]
fn test_resolution_is_deterministic() {
    let now = monday_morning();
    for phrase in ["明天晚上8点半", "下周五", "后天上午十点三十分", "2小时后"] {
        let a = resolve(phrase, now).unwrap();
        let b = resolve(phrase, now).unwrap();
        assert_eq!(a, b, "{phrase}");
    }
}

#[test]
fn test_split_leading_time_from_content() {
    let now = monday_morning();
    let (content, ts) = split_leading_time("明天下午三点 交报告", now);
    assert_eq!(content, "交报告");
    assert_eq!(ts.unwrap().datetime(), dt(2024, 1, 2, 15, 0));

    let (content, ts) = split_leading_time("整理 会议纪要", now);
    assert_eq!(content, "整理 会议纪要");
    assert!(ts.is_none());
}

#[test]
fn test_next_week_is_always_beyond_bare_weekday() {
    let days = ["一", "二", "三", "四", "五", "六", "日"];
    // Every reference weekday in the first week of 2024.
    for offset in 0..7 {
        let now = dt(2024, 1, 1, 10, 0) + Duration::days(offset);
        for day in days {
            let bare = resolve(&format!("周{day}"), now).unwrap().unwrap().date;
            let next = resolve(&format!("下周{day}"), now).unwrap().unwrap().date;
            let gap = (next - bare).num_days();
            assert!(
                (1..=7).contains(&gap),
                "now={now} 周{day}: bare={bare} next={next}"
            );
        }
    }
}

proptest! {
    /// Any input at all: resolve never panics, and a successful parse
    /// always lands on a real clock reading.
    #[test]
    fn prop_resolve_total_and_in_range(input in "\\PC{0,20}") {
        let now = dt(2024, 1, 1, 10, 0);
        if let Ok(Some(ts)) = resolve(&input, now) {
            let t = ts.datetime().time();
            prop_assert!(t.hour() <= 23);
            prop_assert!(t.minute() <= 59);
        }
    }

    /// Valid hour/minute phrases resolve to exactly the stated reading.
    #[test]
    fn prop_clock_phrases_roundtrip(h in 0u32..24, m in 0u32..60) {
        let now = dt(2024, 1, 1, 0, 0);
        let ts = resolve(&format!("{h}点{m}分"), now).unwrap().unwrap();
        prop_assert_eq!(ts.time.minute(), m);
        prop_assert_eq!(ts.time.hour(), h);
    }

    /// N天后 moves the date by exactly N days.
    #[test]
    fn prop_days_ahead_exact(n in 1u32..3650) {
        let now = dt(2024, 1, 1, 10, 0);
        let ts = resolve(&format!("{n}天后"), now).unwrap().unwrap();
        prop_assert_eq!((ts.date - now.date()).num_days(), i64::from(n));
    }
}
