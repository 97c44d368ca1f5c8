//! Task storage.
//!
//! The scheduler and drivers talk to storage only through the [`TaskStore`]
//! trait; [`JsonTaskStore`] is the bundled file-backed implementation.
//! Tasks are grouped by scope (a chat/user identifier); pending tasks are
//! addressed by 1-based position in the scope's list, matching what users
//! see in listings.

mod json;

pub use json::JsonTaskStore;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One todo item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: String,
    pub scope: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub due_at: Option<NaiveDateTime>,
    /// User-set custom reminder, cleared after it fires.
    #[serde(default)]
    pub reminder_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_at: Option<NaiveDateTime>,
    /// Whether the due reminder for this task was already sent.
    #[serde(default)]
    pub notified: bool,
}

impl TaskRecord {
    pub fn new(scope: &str, content: String, due_at: Option<NaiveDateTime>) -> Self {
        Self {
            id: short_id(),
            scope: scope.to_string(),
            content,
            created_at: Local::now().naive_local(),
            due_at,
            reminder_at: None,
            done: false,
            done_at: None,
            notified: false,
        }
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Storage operations the core depends on. Implementations must be safe
/// to call concurrently from delivery tasks and the command layer.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn add(&self, task: TaskRecord) -> Result<TaskRecord, StoreError>;

    async fn get(&self, scope: &str, id: &str) -> Result<Option<TaskRecord>, StoreError>;

    /// Pending (not done) tasks of a scope, in insertion order.
    async fn list_pending(&self, scope: &str) -> Result<Vec<TaskRecord>, StoreError>;

    /// (pending, done) counts for a scope.
    async fn counts(&self, scope: &str) -> Result<(usize, usize), StoreError>;

    /// Mark the index-th pending task done (1-based).
    async fn mark_done(&self, scope: &str, index: usize) -> Result<TaskRecord, StoreError>;

    /// Delete the index-th pending task (1-based).
    async fn delete(&self, scope: &str, index: usize) -> Result<TaskRecord, StoreError>;

    /// Delete every pending task of a scope; returns how many went away.
    async fn delete_all(&self, scope: &str) -> Result<usize, StoreError>;

    /// Most recently completed tasks, newest first.
    async fn history(&self, scope: &str, limit: usize) -> Result<Vec<TaskRecord>, StoreError>;

    /// Drop completed tasks; returns how many were cleared.
    async fn clear_done(&self, scope: &str) -> Result<usize, StoreError>;

    /// Set a custom reminder on the index-th pending task (1-based).
    async fn set_reminder(
        &self,
        scope: &str,
        index: usize,
        at: NaiveDateTime,
    ) -> Result<TaskRecord, StoreError>;

    /// Clear a fired custom reminder.
    async fn clear_reminder(&self, scope: &str, id: &str) -> Result<(), StoreError>;

    /// Record that the due reminder for a task was sent.
    async fn mark_notified(&self, scope: &str, id: &str) -> Result<(), StoreError>;

    /// Pending tasks across all scopes with `due_at < before`, filtered on
    /// the notified flag.
    async fn list_due_before(
        &self,
        before: NaiveDateTime,
        notified: bool,
    ) -> Result<Vec<TaskRecord>, StoreError>;

    /// Every scope that has any stored data.
    async fn scopes(&self) -> Result<Vec<String>, StoreError>;

    /// Per-scope @-all flag for group reminders.
    async fn at_all(&self, scope: &str) -> Result<bool, StoreError>;

    async fn set_at_all(&self, scope: &str, enabled: bool) -> Result<(), StoreError>;
}

/// Returns `~/.config/daoqi[-dev]/` based on DAOQI_ENV.
///
/// Set DAOQI_ENV=dev to use a separate development data directory.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DAOQI_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("daoqi-dev")
    } else {
        base_dir.join("daoqi")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
