//! Foreground reminder loop with console delivery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use daoqi_core::{Config, JsonTaskStore, Notifier, ReminderService, Result as CoreResult};
use tracing::info;

/// Prints reminders to stdout. Stands in for a chat bridge.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, scope: &str, text: &str, at_all: bool) -> CoreResult<()> {
        let stamp = Local::now().naive_local().format("%Y-%m-%d %H:%M");
        let ping = if at_all { " @全体成员" } else { "" };
        println!("[{stamp}] [{scope}]{ping}\n{text}\n");
        Ok(())
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daoqi_core=info,daoqi=info".into()),
        )
        .init();

    let store = Arc::new(JsonTaskStore::open_default()?);
    let config = Config::load()?;
    let service = ReminderService::start(store, Arc::new(ConsoleNotifier), config).await?;
    info!(entries = service.scheduled(), "watching; Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    service.shutdown();
    println!("已停止");
    Ok(())
}
