//! # Daoqi Core Library
//!
//! Core business logic for daoqi, a Chinese natural-language todo
//! reminder: free-text time phrases (明天下午三点, 下周一, 2小时后) become
//! absolute due moments, and a scheduling loop delivers due reminders,
//! advance warnings, a daily digest, and periodic overdue summaries.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Parser**: pure functions from phrase + reference instant to a
//!   resolved timestamp; same inputs always give the same answer
//! - **Scheduler**: an explicit-time state machine (`SchedulerCore`)
//!   driven by one cooperative tokio loop (`Scheduler`)
//! - **Storage**: JSON-file task store behind the [`TaskStore`] trait,
//!   TOML-based configuration
//! - **Drivers**: translate fired entries into rendered Chinese messages
//!   handed to a [`Notifier`]
//!
//! ## Key Components
//!
//! - [`parser::resolve`]: phrase → timestamp
//! - [`ReminderService`]: wires store, scheduler, and delivery together
//! - [`SchedulerCore`]: deterministic, caller-ticked schedule index
//! - [`Config`]: digest time, advance lead, sweep interval

pub mod config;
pub mod drivers;
pub mod error;
pub mod parser;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod store;

pub use config::Config;
pub use drivers::{Notifier, ReminderDriver};
pub use error::{ConfigError, CoreError, ParseError, Result, ScheduleError, StoreError};
pub use parser::{resolve, split_leading_time, ResolvedTimestamp};
pub use scheduler::{EntryKind, FireEvent, FireHandler, ReArm, ScheduleEntry, Scheduler, SchedulerCore};
pub use service::{task_from_input, ReminderService, DEFAULT_DUE_TIME};
pub use store::{JsonTaskStore, TaskRecord, TaskStore};
