mod core;
mod runner;

pub use self::core::{EntryKind, FireEvent, ReArm, ScheduleEntry, SchedulerCore};
pub use runner::{FireHandler, Scheduler};
