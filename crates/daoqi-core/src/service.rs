//! Reminder service glue.
//!
//! `ReminderService` owns the running scheduler and keeps it consistent
//! with the task store: adding a task registers its wake entries,
//! completing or deleting a task cancels them, and startup rebuilds the
//! whole index from stored due times. The schedule index is a derived
//! cache; the store is the only persistent state.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::drivers::{Notifier, ReminderDriver};
use crate::error::Result;
use crate::parser;
use crate::scheduler::{ScheduleEntry, Scheduler};
use crate::store::{TaskRecord, TaskStore};

/// Due time applied to date-only phrases (明天, 下周一).
pub const DEFAULT_DUE_TIME: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// Build a task record from free text. A leading time phrase becomes the
/// due moment; the rest is content. A malformed leading time phrase
/// (下周十 开会) is an error rather than silently becoming content.
pub fn task_from_input(
    scope: &str,
    input: &str,
    now: NaiveDateTime,
) -> Result<TaskRecord, crate::error::ParseError> {
    let (content, resolved) = parser::split_leading_time(input, now);
    if resolved.is_none() {
        if let Some(first) = input.trim().split_whitespace().next() {
            // A single word is always content; a failed multi-word
            // leading phrase surfaces as a parse error.
            if first != input.trim() {
                parser::resolve(first, now)?;
            }
        }
    }
    let due_at = resolved.map(|ts| ts.datetime_or_default(DEFAULT_DUE_TIME));
    Ok(TaskRecord::new(scope, content, due_at))
}

pub struct ReminderService {
    store: Arc<dyn TaskStore>,
    config: Config,
    /// Parsed once at startup; `None` when digests are disabled.
    digest_time: Option<NaiveTime>,
    scheduler: Scheduler,
}

impl ReminderService {
    /// Spawn the scheduling loop and rebuild the schedule index from the
    /// store: due/advance entries for pending tasks, custom reminders,
    /// one digest per scope, and the global overdue sweep.
    pub async fn start(
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        let digest_time = if config.digest_enabled {
            Some(config.digest_time()?)
        } else {
            None
        };
        let driver = Arc::new(ReminderDriver::new(
            store.clone(),
            notifier,
            config.at_all_enabled,
        ));
        let service = Self {
            store,
            config,
            digest_time,
            scheduler: Scheduler::spawn(driver),
        };
        service.rehydrate().await?;
        Ok(service)
    }

    async fn rehydrate(&self) -> Result<()> {
        let now = Local::now().naive_local();
        let scopes = self.store.scopes().await?;

        for scope in &scopes {
            for task in self.store.list_pending(scope).await? {
                self.register_task_entries(&task, now);
            }
            if let Some(time) = self.digest_time {
                self.try_register(ScheduleEntry::daily_digest(scope, time, now));
            }
        }

        // Due moments missed while the process was down: deliver the due
        // reminder right after startup instead of waiting for the sweep.
        if self.config.due_reminder_enabled {
            for task in self.store.list_due_before(now, false).await? {
                self.try_register(ScheduleEntry::item_due(
                    &task.scope,
                    &task.id,
                    now + Duration::seconds(1),
                ));
            }
        }

        self.try_register(ScheduleEntry::overdue_sweep(self.config.sweep_interval(), now));

        info!(
            scopes = scopes.len(),
            entries = self.scheduler.pending(),
            "schedule index rebuilt"
        );
        Ok(())
    }

    /// Hand an entry to the scheduler. A rejected entry is never fatal:
    /// the task just stays without an active reminder (the overdue sweep
    /// still covers it), and the log says why.
    fn try_register(&self, entry: ScheduleEntry) {
        let id = entry.id.clone();
        if let Err(e) = self.scheduler.register(entry) {
            warn!(id = %id, error = %e, "schedule entry not registered");
        }
    }

    /// Register the due, advance, and custom-reminder entries a task
    /// still needs. Past moments are skipped; the overdue sweep covers
    /// anything already late.
    fn register_task_entries(&self, task: &TaskRecord, now: NaiveDateTime) {
        if self.config.due_reminder_enabled && !task.notified {
            if let Some(due) = task.due_at {
                if due > now {
                    self.try_register(ScheduleEntry::item_due(&task.scope, &task.id, due));
                }
                let advance = due - self.config.advance();
                if advance > now {
                    self.try_register(ScheduleEntry::item_advance(&task.scope, &task.id, advance));
                }
            }
        }
        if let Some(at) = task.reminder_at {
            if at > now {
                self.try_register(ScheduleEntry::custom_reminder(&task.scope, &task.id, at));
            }
        }
    }

    fn cancel_task_entries(&self, scope: &str, task_id: &str) {
        self.scheduler.cancel(&format!("due:{scope}:{task_id}"));
        self.scheduler.cancel(&format!("adv:{scope}:{task_id}"));
        self.scheduler.cancel(&format!("rem:{scope}:{task_id}"));
    }

    /// Add a task from free text; see [`task_from_input`].
    pub async fn add_task(&self, scope: &str, input: &str) -> Result<TaskRecord> {
        let now = Local::now().naive_local();
        let task = self.store.add(task_from_input(scope, input, now)?).await?;
        self.register_task_entries(&task, now);
        if let Some(time) = self.digest_time {
            // A scope first seen after startup gets its digest here;
            // same-id replacement keeps this idempotent for old scopes.
            self.try_register(ScheduleEntry::daily_digest(scope, time, now));
        }
        debug!(scope, id = %task.id, due = ?task.due_at, "task added");
        Ok(task)
    }

    /// Complete the index-th pending task (1-based).
    pub async fn complete(&self, scope: &str, index: usize) -> Result<TaskRecord> {
        let task = self.store.mark_done(scope, index).await?;
        self.cancel_task_entries(scope, &task.id);
        Ok(task)
    }

    /// Delete the index-th pending task (1-based).
    pub async fn remove(&self, scope: &str, index: usize) -> Result<TaskRecord> {
        let task = self.store.delete(scope, index).await?;
        self.cancel_task_entries(scope, &task.id);
        Ok(task)
    }

    /// Delete every pending task of a scope.
    pub async fn remove_all(&self, scope: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .store
            .list_pending(scope)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let removed = self.store.delete_all(scope).await?;
        for id in &ids {
            self.cancel_task_entries(scope, id);
        }
        Ok(removed)
    }

    /// Set a custom reminder on the index-th pending task from a time
    /// phrase (明天上午十点, 30分钟后).
    pub async fn set_reminder(&self, scope: &str, index: usize, phrase: &str) -> Result<TaskRecord> {
        let now = Local::now().naive_local();
        let resolved = parser::resolve(phrase, now)?.ok_or_else(|| {
            crate::error::ParseError::UnparsableInput {
                input: phrase.to_string(),
            }
        })?;
        let at = resolved.datetime_or_default(DEFAULT_DUE_TIME);
        let task = self.store.set_reminder(scope, index, at).await?;
        self.try_register(ScheduleEntry::custom_reminder(scope, &task.id, at));
        Ok(task)
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Live schedule entries (due + advance + reminders + digests + sweep).
    pub fn scheduled(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
