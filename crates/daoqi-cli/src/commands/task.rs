//! Task management commands for CLI.

use clap::Subcommand;
use chrono::Local;
use daoqi_core::report::{format_relative, format_time, render_digest};
use daoqi_core::{resolve, task_from_input, JsonTaskStore, TaskStore, DEFAULT_DUE_TIME};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task; a leading time phrase becomes the due moment
    /// (e.g. `daoqi task add 明天下午三点 交报告`)
    Add {
        /// Time phrase and task content
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// List pending tasks
    List,
    /// Complete a pending task by its list position
    Done {
        /// 1-based position from `list`
        index: usize,
    },
    /// Delete a pending task by its list position
    Del {
        /// 1-based position from `list`
        index: usize,
    },
    /// Delete every pending task
    DelAll,
    /// Show recently completed tasks
    History {
        /// Maximum entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Drop completed tasks from the store
    ClearHistory,
    /// Set a custom reminder on a pending task
    Remind {
        /// 1-based position from `list`
        index: usize,
        /// Time phrase (e.g. 明天上午十点, 30分钟后)
        #[arg(required = true, trailing_var_arg = true)]
        phrase: Vec<String>,
    },
    /// Render the digest for this scope right now
    Digest,
}

pub async fn run(action: TaskAction, scope: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonTaskStore::open_default()?;
    let now = Local::now().naive_local();

    match action {
        TaskAction::Add { text } => {
            let task = task_from_input(scope, &text.join(" "), now)?;
            let task = store.add(task).await?;
            match task.due_at {
                Some(due) => println!(
                    "已添加：{}\n截止：{} ({})",
                    task.content,
                    format_time(Some(due)),
                    format_relative(Some(due), now)
                ),
                None => println!("已添加：{}", task.content),
            }
        }
        TaskAction::List => {
            let pending = store.list_pending(scope).await?;
            if pending.is_empty() {
                println!("暂无待办事项");
                return Ok(());
            }
            for (i, task) in pending.iter().enumerate() {
                match task.due_at {
                    Some(due) => println!(
                        "{}. {}  截止：{} ({})",
                        i + 1,
                        task.content,
                        format_time(Some(due)),
                        format_relative(Some(due), now)
                    ),
                    None => println!("{}. {}", i + 1, task.content),
                }
            }
        }
        TaskAction::Done { index } => {
            let task = store.mark_done(scope, index).await?;
            println!("已完成：{}", task.content);
        }
        TaskAction::Del { index } => {
            let task = store.delete(scope, index).await?;
            println!("已删除：{}", task.content);
        }
        TaskAction::DelAll => {
            let removed = store.delete_all(scope).await?;
            println!("已删除 {removed} 条待办");
        }
        TaskAction::History { limit } => {
            let done = store.history(scope, limit).await?;
            if done.is_empty() {
                println!("暂无历史记录");
                return Ok(());
            }
            for task in done {
                println!("{}  完成于 {}", task.content, format_time(task.done_at));
            }
        }
        TaskAction::ClearHistory => {
            let cleared = store.clear_done(scope).await?;
            println!("已清除 {cleared} 条历史记录");
        }
        TaskAction::Remind { index, phrase } => {
            let phrase = phrase.join(" ");
            let resolved = resolve(&phrase, now)?.ok_or_else(|| {
                format!("无法识别时间：{phrase}")
            })?;
            let at = resolved.datetime_or_default(DEFAULT_DUE_TIME);
            let task = store.set_reminder(scope, index, at).await?;
            println!("已设置提醒：{} @ {}", task.content, format_time(Some(at)));
        }
        TaskAction::Digest => {
            let pending = store.list_pending(scope).await?;
            let (_, done) = store.counts(scope).await?;
            match render_digest(&pending, done, now) {
                Some(text) => println!("{text}"),
                None => println!("今天没有待办事项"),
            }
        }
    }
    Ok(())
}
