//! JSON-file task store.
//!
//! One file (`todos.json`) holding every scope's tasks and settings,
//! rewritten after each mutation. The file is the source of truth the
//! scheduler index is rebuilt from at startup; a corrupt file starts the
//! store empty rather than refusing to run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{data_dir, TaskRecord, TaskStore};
use crate::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScopeData {
    #[serde(default)]
    items: Vec<TaskRecord>,
    #[serde(default)]
    at_all: bool,
}

pub struct JsonTaskStore {
    path: PathBuf,
    data: Mutex<HashMap<String, ScopeData>>,
}

impl JsonTaskStore {
    /// Open (or create) the store at an explicit path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(StoreError::OpenFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Open `todos.json` under the default data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from("~/.config/daoqi"),
            message: e.to_string(),
        })?;
        Self::open(dir.join("todos.json"))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ScopeData>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &HashMap<String, ScopeData>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(data).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, raw).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

/// Position of the index-th (1-based) pending item within the scope's
/// full item list.
fn pending_position(items: &[TaskRecord], index: usize) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.done)
        .nth(index.checked_sub(1)?)
        .map(|(pos, _)| pos)
}

fn out_of_range(scope: &str, index: usize, items: &[TaskRecord]) -> StoreError {
    StoreError::IndexOutOfRange {
        scope: scope.to_string(),
        index,
        len: items.iter().filter(|t| !t.done).count(),
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn add(&self, task: TaskRecord) -> Result<TaskRecord, StoreError> {
        let mut data = self.lock();
        data.entry(task.scope.clone())
            .or_default()
            .items
            .push(task.clone());
        self.persist(&data)?;
        Ok(task)
    }

    async fn get(&self, scope: &str, id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let data = self.lock();
        Ok(data
            .get(scope)
            .and_then(|s| s.items.iter().find(|t| t.id == id))
            .cloned())
    }

    async fn list_pending(&self, scope: &str) -> Result<Vec<TaskRecord>, StoreError> {
        let data = self.lock();
        Ok(data
            .get(scope)
            .map(|s| s.items.iter().filter(|t| !t.done).cloned().collect())
            .unwrap_or_default())
    }

    async fn counts(&self, scope: &str) -> Result<(usize, usize), StoreError> {
        let data = self.lock();
        let (mut pending, mut done) = (0, 0);
        if let Some(s) = data.get(scope) {
            for item in &s.items {
                if item.done {
                    done += 1;
                } else {
                    pending += 1;
                }
            }
        }
        Ok((pending, done))
    }

    async fn mark_done(&self, scope: &str, index: usize) -> Result<TaskRecord, StoreError> {
        let mut data = self.lock();
        let items = &mut data.entry(scope.to_string()).or_default().items;
        let pos = pending_position(items, index).ok_or_else(|| out_of_range(scope, index, items))?;
        items[pos].done = true;
        items[pos].done_at = Some(Local::now().naive_local());
        let task = items[pos].clone();
        self.persist(&data)?;
        Ok(task)
    }

    async fn delete(&self, scope: &str, index: usize) -> Result<TaskRecord, StoreError> {
        let mut data = self.lock();
        let items = &mut data.entry(scope.to_string()).or_default().items;
        let pos = pending_position(items, index).ok_or_else(|| out_of_range(scope, index, items))?;
        let task = items.remove(pos);
        self.persist(&data)?;
        Ok(task)
    }

    async fn delete_all(&self, scope: &str) -> Result<usize, StoreError> {
        let mut data = self.lock();
        let items = &mut data.entry(scope.to_string()).or_default().items;
        let before = items.len();
        items.retain(|t| t.done);
        let removed = before - items.len();
        self.persist(&data)?;
        Ok(removed)
    }

    async fn history(&self, scope: &str, limit: usize) -> Result<Vec<TaskRecord>, StoreError> {
        let data = self.lock();
        let mut done: Vec<TaskRecord> = data
            .get(scope)
            .map(|s| s.items.iter().filter(|t| t.done).cloned().collect())
            .unwrap_or_default();
        done.sort_by(|a, b| b.done_at.cmp(&a.done_at));
        done.truncate(limit);
        Ok(done)
    }

    async fn clear_done(&self, scope: &str) -> Result<usize, StoreError> {
        let mut data = self.lock();
        let items = &mut data.entry(scope.to_string()).or_default().items;
        let before = items.len();
        items.retain(|t| !t.done);
        let cleared = before - items.len();
        self.persist(&data)?;
        Ok(cleared)
    }

    async fn set_reminder(
        &self,
        scope: &str,
        index: usize,
        at: NaiveDateTime,
    ) -> Result<TaskRecord, StoreError> {
        let mut data = self.lock();
        let items = &mut data.entry(scope.to_string()).or_default().items;
        let pos = pending_position(items, index).ok_or_else(|| out_of_range(scope, index, items))?;
        items[pos].reminder_at = Some(at);
        let task = items[pos].clone();
        self.persist(&data)?;
        Ok(task)
    }

    async fn clear_reminder(&self, scope: &str, id: &str) -> Result<(), StoreError> {
        let mut data = self.lock();
        if let Some(task) = data
            .get_mut(scope)
            .and_then(|s| s.items.iter_mut().find(|t| t.id == id))
        {
            task.reminder_at = None;
            self.persist(&data)?;
        }
        Ok(())
    }

    async fn mark_notified(&self, scope: &str, id: &str) -> Result<(), StoreError> {
        let mut data = self.lock();
        if let Some(task) = data
            .get_mut(scope)
            .and_then(|s| s.items.iter_mut().find(|t| t.id == id))
        {
            task.notified = true;
            self.persist(&data)?;
        }
        Ok(())
    }

    async fn list_due_before(
        &self,
        before: NaiveDateTime,
        notified: bool,
    ) -> Result<Vec<TaskRecord>, StoreError> {
        let data = self.lock();
        let mut due: Vec<TaskRecord> = data
            .values()
            .flat_map(|s| s.items.iter())
            .filter(|t| !t.done && t.notified == notified)
            .filter(|t| t.due_at.is_some_and(|d| d < before))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.due_at);
        Ok(due)
    }

    async fn scopes(&self) -> Result<Vec<String>, StoreError> {
        let data = self.lock();
        let mut scopes: Vec<String> = data.keys().cloned().collect();
        scopes.sort();
        Ok(scopes)
    }

    async fn at_all(&self, scope: &str) -> Result<bool, StoreError> {
        let data = self.lock();
        Ok(data.get(scope).map(|s| s.at_all).unwrap_or(false))
    }

    async fn set_at_all(&self, scope: &str, enabled: bool) -> Result<(), StoreError> {
        let mut data = self.lock();
        data.entry(scope.to_string()).or_default().at_all = enabled;
        self.persist(&data)
    }
}
