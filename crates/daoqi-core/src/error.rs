//! Core error types for daoqi-core.
//!
//! Every fallible operation in the library reports through this hierarchy.
//! None of these errors are fatal: a parse failure leaves a task without a
//! due time, a scheduling failure leaves it without an active reminder, and
//! the scheduling loop isolates per-entry delivery failures.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Core error type for daoqi-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Temporal expression parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Scheduler errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Task store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification delivery errors, surfaced by `Notifier` implementations
    #[error("Delivery to '{scope}' failed: {message}")]
    Delivery { scope: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the temporal expression resolver.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The phrase contains temporal-looking tokens that do not form a
    /// valid date or time (e.g. "下周十", "25点").
    #[error("unparsable time expression: {input:?}")]
    UnparsableInput { input: String },

    /// Date arithmetic produced an out-of-range calendar date.
    #[error("calendar arithmetic out of range: {context}")]
    CalendarOverflow { context: String },
}

/// Errors from the scheduler core.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Registered fire time is not strictly in the future.
    #[error("fire time {fire_at} is not after scheduler time {now}")]
    InvalidFireTime {
        fire_at: NaiveDateTime,
        now: NaiveDateTime,
    },

    /// Re-arming a recurring entry overflowed the calendar.
    #[error("calendar arithmetic out of range: {context}")]
    CalendarOverflow { context: String },
}

/// Task-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or create the store file
    #[error("Failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Failed to persist the store file
    #[error("Failed to save store to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// 1-based index past the end of the pending list
    #[error("Index {index} out of range for scope '{scope}' ({len} pending)")]
    IndexOutOfRange {
        scope: String,
        index: usize,
        len: usize,
    },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
