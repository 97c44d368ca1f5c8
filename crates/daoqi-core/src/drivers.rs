//! Delivery drivers for fired schedule entries.
//!
//! [`ReminderDriver`] is the bridge between the scheduling loop and the
//! outside world: it re-reads the task store at fire time (the entry may
//! be stale by the time it fires), renders the message, and hands it to a
//! [`Notifier`]. A task completed or deleted between registration and
//! fire is dropped silently.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::report;
use crate::scheduler::{EntryKind, FireEvent, FireHandler};
use crate::store::TaskStore;

/// Outbound message channel (a chat bridge, the console, a test probe).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `scope`. `at_all` asks the channel to ping
    /// everyone, where the channel supports it.
    async fn send(&self, scope: &str, text: &str, at_all: bool) -> Result<()>;
}

pub struct ReminderDriver {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    /// Config-level default when a scope has no explicit @-all setting.
    at_all_default: bool,
}

impl ReminderDriver {
    pub fn new(
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn Notifier>,
        at_all_default: bool,
    ) -> Self {
        Self {
            store,
            notifier,
            at_all_default,
        }
    }

    async fn send(&self, scope: &str, text: &str) -> Result<()> {
        let at_all = self.at_all_default || self.store.at_all(scope).await?;
        self.notifier.send(scope, text, at_all).await
    }

    async fn on_item_due(&self, event: &FireEvent) -> Result<()> {
        let Some(task) = self.store.get(&event.scope, event.task_id()).await? else {
            debug!(id = %event.id, "task gone before due fire");
            return Ok(());
        };
        if task.done || task.notified {
            return Ok(());
        }
        self.send(&event.scope, &report::render_due_reminder(&task))
            .await?;
        self.store.mark_notified(&event.scope, &task.id).await?;
        Ok(())
    }

    async fn on_item_advance(&self, event: &FireEvent) -> Result<()> {
        let Some(task) = self.store.get(&event.scope, event.task_id()).await? else {
            debug!(id = %event.id, "task gone before advance fire");
            return Ok(());
        };
        if task.done {
            return Ok(());
        }
        if event.id.starts_with("rem:") {
            // User-set reminder: fires once, then leaves the record.
            self.send(&event.scope, &report::render_custom_reminder(&task))
                .await?;
            self.store.clear_reminder(&event.scope, &task.id).await?;
        } else if !task.notified {
            self.send(
                &event.scope,
                &report::render_advance_reminder(&task, event.fired_at),
            )
            .await?;
        }
        Ok(())
    }

    async fn on_daily_digest(&self, event: &FireEvent) -> Result<()> {
        let pending = self.store.list_pending(&event.scope).await?;
        let (_, done) = self.store.counts(&event.scope).await?;
        if let Some(text) = report::render_digest(&pending, done, event.fired_at) {
            self.send(&event.scope, &text).await?;
        }
        Ok(())
    }

    async fn on_overdue_sweep(&self, event: &FireEvent) -> Result<()> {
        for scope in self.store.scopes().await? {
            let overdue: Vec<_> = self
                .store
                .list_pending(&scope)
                .await?
                .into_iter()
                .filter(|t| t.due_at.is_some_and(|d| d < event.fired_at))
                .collect();
            if let Some(text) = report::render_overdue_summary(&overdue, event.fired_at) {
                self.send(&scope, &text).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FireHandler for ReminderDriver {
    async fn on_fire(&self, event: FireEvent) -> Result<(), CoreError> {
        match event.kind {
            EntryKind::ItemDue => self.on_item_due(&event).await,
            EntryKind::ItemAdvance => self.on_item_advance(&event).await,
            EntryKind::DailyDigest => self.on_daily_digest(&event).await,
            EntryKind::OverdueSweep => self.on_overdue_sweep(&event).await,
        }
    }
}
