//! User-facing message rendering.
//!
//! All reminder, digest and sweep texts are built here so the drivers stay
//! pure translation. Rendering is explicit-time for testability.

use chrono::NaiveDateTime;

use crate::store::TaskRecord;

/// "2026-02-20 18:00", or 未设置 when no time is set.
pub fn format_time(at: Option<NaiveDateTime>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "未设置".to_string(),
    }
}

/// Relative description against `now`: 2小时后到期, 已逾期3天.
pub fn format_relative(at: Option<NaiveDateTime>, now: NaiveDateTime) -> String {
    let Some(at) = at else {
        return String::new();
    };
    let diff = at - now;

    if diff.num_seconds() <= 0 {
        let days = -diff.num_days();
        let hours = -diff.num_hours();
        if days > 0 {
            format!("已逾期{days}天")
        } else if hours > 0 {
            format!("已逾期{hours}小时")
        } else {
            "刚刚逾期".to_string()
        }
    } else {
        let days = diff.num_days();
        let hours = diff.num_hours();
        if days > 0 {
            format!("{days}天后到期")
        } else if hours > 0 {
            format!("{hours}小时后到期")
        } else {
            format!("{}分钟后到期", diff.num_minutes())
        }
    }
}

/// Advance reminder for a single task.
pub fn render_advance_reminder(task: &TaskRecord, now: NaiveDateTime) -> String {
    format!(
        "待办即将到期提醒\n{}\n截止：{} ({})",
        task.content,
        format_time(task.due_at),
        format_relative(task.due_at, now),
    )
}

/// Due-moment reminder for a single task.
pub fn render_due_reminder(task: &TaskRecord) -> String {
    format!(
        "待办已到期\n{}\n截止：{}",
        task.content,
        format_time(task.due_at),
    )
}

/// Custom reminder set via remind.
pub fn render_custom_reminder(task: &TaskRecord) -> String {
    let mut text = format!("自定义提醒\n{}", task.content);
    if task.due_at.is_some() {
        text.push_str(&format!("\n截止：{}", format_time(task.due_at)));
    }
    text
}

/// Overdue sweep summary for one scope. `None` when nothing is overdue.
pub fn render_overdue_summary(overdue: &[TaskRecord], now: NaiveDateTime) -> Option<String> {
    if overdue.is_empty() {
        return None;
    }
    let mut lines = vec![format!("你有 {} 条逾期待办：", overdue.len()), String::new()];
    for task in overdue {
        lines.push(format!("- {}", task.content));
        lines.push(format!(
            "   截止：{} ({})",
            format_time(task.due_at),
            format_relative(task.due_at, now),
        ));
    }
    Some(lines.join("\n"))
}

/// Daily digest for one scope: overdue, due today, due within three days,
/// and no-deadline sections, plus the pending/done tally. `None` when the
/// scope has no pending items at all.
pub fn render_digest(
    pending: &[TaskRecord],
    done_count: usize,
    now: NaiveDateTime,
) -> Option<String> {
    if pending.is_empty() {
        return None;
    }

    let today_start = now.date().and_time(chrono::NaiveTime::MIN);
    let today_end = today_start + chrono::Duration::days(1) - chrono::Duration::seconds(1);
    let horizon = today_end + chrono::Duration::days(3);

    let overdue: Vec<&TaskRecord> = pending
        .iter()
        .filter(|t| t.due_at.is_some_and(|d| d < now))
        .collect();
    let due_today: Vec<&TaskRecord> = pending
        .iter()
        .filter(|t| t.due_at.is_some_and(|d| d >= today_start && d <= today_end && d >= now))
        .collect();
    let upcoming: Vec<&TaskRecord> = pending
        .iter()
        .filter(|t| t.due_at.is_some_and(|d| d > today_end && d <= horizon))
        .collect();
    let no_deadline: Vec<&TaskRecord> = pending.iter().filter(|t| t.due_at.is_none()).collect();

    let mut lines = vec!["每日待办早报".to_string(), String::new()];

    if !overdue.is_empty() {
        lines.push(format!("[已逾期] ({} 项)：", overdue.len()));
        for task in &overdue {
            lines.push(format!(
                "   - {} ({})",
                task.content,
                format_relative(task.due_at, now)
            ));
        }
        lines.push(String::new());
    }

    if !due_today.is_empty() {
        lines.push(format!("[今日到期] ({} 项)：", due_today.len()));
        for task in &due_today {
            lines.push(format!("   - {} ({})", task.content, format_time(task.due_at)));
        }
        lines.push(String::new());
    }

    if !upcoming.is_empty() {
        lines.push(format!("[近3天到期] ({} 项)：", upcoming.len()));
        for task in &upcoming {
            lines.push(format!("   - {} ({})", task.content, format_time(task.due_at)));
        }
        lines.push(String::new());
    }

    if !no_deadline.is_empty() {
        lines.push(format!("[无截止时间] ({} 项)：", no_deadline.len()));
        for task in &no_deadline {
            lines.push(format!("   - {}", task.content));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "待办总计：未完成 {} 项 | 已完成 {} 项",
        pending.len(),
        done_count
    ));

    Some(lines.join("\n"))
}
