//! Background scheduling loop.
//!
//! One cooperative tokio task sleeps until the earliest pending fire time,
//! ticks the core, and hands fired entries to the `FireHandler`. Every
//! registration or cancellation nudges the loop so the sleep is recomputed.
//! Reminders fire on the next tick after their target time, never before.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::core::{FireEvent, ScheduleEntry, SchedulerCore};
use crate::error::{CoreError, ScheduleError};

/// Consumer of fired entries. Delivery runs outside the scheduler lock
/// and may overlap between events; failures are logged, not retried.
#[async_trait]
pub trait FireHandler: Send + Sync {
    async fn on_fire(&self, event: FireEvent) -> Result<(), CoreError>;
}

struct Shared {
    core: Mutex<SchedulerCore>,
    notify: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerCore> {
        // A panic while holding the lock must not take the loop down.
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to the scheduling loop. `register` and `cancel` are safe from
/// any thread; all state mutation is serialized through one mutex, so a
/// cancelled entry is guaranteed not to fire once `cancel` returns.
pub struct Scheduler {
    shared: Arc<Shared>,
    loop_task: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(handler: Arc<dyn FireHandler>) -> Self {
        let shared = Arc::new(Shared {
            core: Mutex::new(SchedulerCore::new()),
            notify: Notify::new(),
        });
        let loop_task = tokio::spawn(run_loop(Arc::clone(&shared), handler));
        Self { shared, loop_task }
    }

    pub fn register(&self, entry: ScheduleEntry) -> Result<(), ScheduleError> {
        let now = Local::now().naive_local();
        self.shared.lock().register(entry, now)?;
        self.shared.notify.notify_one();
        Ok(())
    }

    pub fn cancel(&self, id: &str) -> bool {
        let cancelled = self.shared.lock().cancel(id);
        if cancelled {
            self.shared.notify.notify_one();
        }
        cancelled
    }

    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }

    /// Stop the loop. Pending entries are dropped with the in-memory
    /// index; the task store remains the source of truth for what to
    /// re-register on the next start.
    pub fn shutdown(&self) {
        self.loop_task.abort();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.loop_task.abort();
    }
}

async fn run_loop(shared: Arc<Shared>, handler: Arc<dyn FireHandler>) {
    loop {
        let next = shared.lock().next_fire_at();

        let Some(next) = next else {
            shared.notify.notified().await;
            continue;
        };

        let wait = (next - Local::now().naive_local())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let now = Local::now().naive_local();
                let events = shared.lock().tick(now);
                for event in events {
                    debug!(id = %event.id, kind = ?event.kind, "entry fired");
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        let id = event.id.clone();
                        if let Err(e) = handler.on_fire(event).await {
                            warn!(id = %id, error = %e, "fire delivery failed");
                        }
                    });
                }
            }
            _ = shared.notify.notified() => {
                // Index changed; recompute the sleep.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex as StdMutex;

    struct Recorder {
        fired: StdMutex<Vec<FireEvent>>,
    }

    #[async_trait]
    impl FireHandler for Recorder {
        async fn on_fire(&self, event: FireEvent) -> Result<(), CoreError> {
            self.fired.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fires_and_delivers_near_term_entries() {
        let recorder = Arc::new(Recorder {
            fired: StdMutex::new(Vec::new()),
        });
        let scheduler = Scheduler::spawn(recorder.clone());

        let soon = Local::now().naive_local() + Duration::milliseconds(150);
        scheduler
            .register(ScheduleEntry::item_due("s", "a", soon))
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(600)).await;
        let fired = recorder.fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].task_id(), "a");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_entries_never_fire() {
        let recorder = Arc::new(Recorder {
            fired: StdMutex::new(Vec::new()),
        });
        let scheduler = Scheduler::spawn(recorder.clone());

        let soon = Local::now().naive_local() + Duration::milliseconds(250);
        let entry = ScheduleEntry::item_due("s", "a", soon);
        let id = entry.id.clone();
        scheduler.register(entry).unwrap();
        assert!(scheduler.cancel(&id));

        tokio::time::sleep(std::time::Duration::from_millis(600)).await;
        assert!(recorder.fired.lock().unwrap().is_empty());
    }
}
