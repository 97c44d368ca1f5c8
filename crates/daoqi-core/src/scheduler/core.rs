//! Scheduler state machine.
//!
//! `SchedulerCore` owns every pending wake event as a min-heap on
//! `(fire_at, registration seq)` with an id-keyed index for cancellation
//! and replacement. It has no clock and no thread of its own: the caller
//! passes `now` to `register` and `tick`, which keeps every transition
//! reproducible in tests. The async loop driving it lives in
//! [`super::runner`].
//!
//! Entry lifecycle is `PENDING -> FIRED`, with recurring entries re-armed
//! back to `PENDING` inside the same `tick`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::{Days, Duration, NaiveDateTime, NaiveTime};
use tracing::warn;

use crate::error::ScheduleError;

/// What a wake event is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A task's due moment.
    ItemDue,
    /// A reminder ahead of the due moment (configured advance, or a
    /// user-set custom reminder).
    ItemAdvance,
    /// Per-scope morning digest.
    DailyDigest,
    /// Global periodic overdue check.
    OverdueSweep,
}

/// Re-arm rule for recurring entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReArm {
    /// Same wall-clock time on the next calendar day.
    NextDay,
    /// A fixed interval after the tick that fired the entry.
    After(Duration),
}

/// One pending wake event.
///
/// Id conventions: `due:{scope}:{task}`, `adv:{scope}:{task}`,
/// `rem:{scope}:{task}` (custom reminder), `digest:{scope}`, `sweep`.
/// Task ids never contain `:`, so the task part is recoverable from the
/// tail even when the scope itself has colons.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub id: String,
    pub kind: EntryKind,
    pub fire_at: NaiveDateTime,
    pub scope: String,
    pub recurring: Option<ReArm>,
}

impl ScheduleEntry {
    pub fn item_due(scope: &str, task_id: &str, fire_at: NaiveDateTime) -> Self {
        Self {
            id: format!("due:{scope}:{task_id}"),
            kind: EntryKind::ItemDue,
            fire_at,
            scope: scope.to_string(),
            recurring: None,
        }
    }

    pub fn item_advance(scope: &str, task_id: &str, fire_at: NaiveDateTime) -> Self {
        Self {
            id: format!("adv:{scope}:{task_id}"),
            kind: EntryKind::ItemAdvance,
            fire_at,
            scope: scope.to_string(),
            recurring: None,
        }
    }

    /// User-set custom reminder; distinct id so it coexists with the
    /// configured advance reminder for the same task.
    pub fn custom_reminder(scope: &str, task_id: &str, fire_at: NaiveDateTime) -> Self {
        Self {
            id: format!("rem:{scope}:{task_id}"),
            kind: EntryKind::ItemAdvance,
            fire_at,
            scope: scope.to_string(),
            recurring: None,
        }
    }

    /// Daily digest armed for the next occurrence of `digest_time`
    /// strictly after `now` (a time already past today arms for
    /// tomorrow).
    pub fn daily_digest(scope: &str, digest_time: NaiveTime, now: NaiveDateTime) -> Self {
        let mut fire_at = now.date().and_time(digest_time);
        if fire_at <= now {
            let tomorrow = now.date().checked_add_days(Days::new(1)).unwrap_or(now.date());
            fire_at = tomorrow.and_time(digest_time);
        }
        Self {
            id: format!("digest:{scope}"),
            kind: EntryKind::DailyDigest,
            fire_at,
            scope: scope.to_string(),
            recurring: Some(ReArm::NextDay),
        }
    }

    /// Global overdue sweep, firing every `interval` from now on.
    pub fn overdue_sweep(interval: Duration, now: NaiveDateTime) -> Self {
        Self {
            id: "sweep".to_string(),
            kind: EntryKind::OverdueSweep,
            fire_at: now.checked_add_signed(interval).unwrap_or(now),
            scope: "all".to_string(),
            recurring: Some(ReArm::After(interval)),
        }
    }
}

/// An entry handed to a driver at its fire moment.
#[derive(Debug, Clone)]
pub struct FireEvent {
    pub id: String,
    pub kind: EntryKind,
    pub scope: String,
    pub fire_at: NaiveDateTime,
    /// Tick time at which the entry actually fired (>= fire_at).
    pub fired_at: NaiveDateTime,
}

impl FireEvent {
    /// The task id tail of an item entry's id.
    pub fn task_id(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or(&self.id)
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapSlot {
    fire_at: NaiveDateTime,
    seq: u64,
    id: String,
}

struct LiveEntry {
    entry: ScheduleEntry,
    seq: u64,
}

/// Time-ordered index of live schedule entries.
///
/// Cancellation is lazy: the heap keeps stale slots, and `tick` /
/// `next_fire_at` skip any slot whose seq no longer matches the live
/// index. Registration and cancellation are O(log n); a tick pops only
/// the entries that are actually due.
#[derive(Default)]
pub struct SchedulerCore {
    heap: BinaryHeap<Reverse<HeapSlot>>,
    live: HashMap<String, LiveEntry>,
    seq: u64,
}

impl SchedulerCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Its fire time must be strictly in the future;
    /// an entry with the same id replaces the live one.
    pub fn register(
        &mut self,
        entry: ScheduleEntry,
        now: NaiveDateTime,
    ) -> Result<(), ScheduleError> {
        if entry.fire_at <= now {
            return Err(ScheduleError::InvalidFireTime {
                fire_at: entry.fire_at,
                now,
            });
        }
        self.arm(entry);
        Ok(())
    }

    /// Remove an entry. Idempotent; returns whether anything was live.
    /// An already-fired or unknown id is a no-op.
    pub fn cancel(&mut self, id: &str) -> bool {
        self.live.remove(id).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Earliest live fire time, if any. Discards stale heap slots on the
    /// way, so repeated calls stay cheap.
    pub fn next_fire_at(&mut self) -> Option<NaiveDateTime> {
        loop {
            let (fire_at, id, seq) = match self.heap.peek() {
                Some(Reverse(slot)) => (slot.fire_at, slot.id.clone(), slot.seq),
                None => return None,
            };
            if self.live.get(&id).is_some_and(|l| l.seq == seq) {
                return Some(fire_at);
            }
            self.heap.pop();
        }
    }

    /// Fire every live entry with `fire_at <= now`, in `(fire_at,
    /// registration)` order. Non-recurring entries leave the index;
    /// recurring ones re-arm to their next occurrence. A re-arm whose
    /// arithmetic fails drops the entry with a warning rather than
    /// poisoning the loop.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<FireEvent> {
        let mut fired = Vec::new();

        loop {
            match self.heap.peek() {
                Some(Reverse(slot)) if slot.fire_at <= now => {}
                _ => break,
            }
            let Some(Reverse(slot)) = self.heap.pop() else {
                break;
            };
            let entry = match self.live.get(&slot.id) {
                Some(live) if live.seq == slot.seq => live.entry.clone(),
                _ => continue, // cancelled or replaced
            };

            fired.push(FireEvent {
                id: entry.id.clone(),
                kind: entry.kind,
                scope: entry.scope.clone(),
                fire_at: entry.fire_at,
                fired_at: now,
            });

            match entry.recurring {
                None => {
                    self.live.remove(&slot.id);
                }
                Some(rearm) => match next_occurrence(rearm, entry.fire_at, now) {
                    Ok(next) => {
                        let mut entry = entry;
                        entry.fire_at = next;
                        self.arm(entry);
                    }
                    Err(e) => {
                        warn!(id = %entry.id, error = %e, "dropping recurring entry");
                        self.live.remove(&slot.id);
                    }
                },
            }
        }

        fired
    }

    fn arm(&mut self, entry: ScheduleEntry) {
        self.seq += 1;
        let seq = self.seq;
        self.heap.push(Reverse(HeapSlot {
            fire_at: entry.fire_at,
            seq,
            id: entry.id.clone(),
        }));
        self.live.insert(entry.id.clone(), LiveEntry { entry, seq });
    }
}

/// Next fire time for a recurring entry that just fired at `tick` time
/// `now` with previous target `fired_at`.
fn next_occurrence(
    rearm: ReArm,
    fired_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ScheduleError> {
    let overflow = |what: &str| ScheduleError::CalendarOverflow {
        context: format!("re-arm {what} past {now}"),
    };
    match rearm {
        ReArm::NextDay => {
            // Keep the wall-clock time; if the loop slept across several
            // days, jump to the next occurrence after now instead of
            // replaying each missed day.
            let time = fired_at.time();
            let mut next = now.date().and_time(time);
            if next <= now {
                let tomorrow = now
                    .date()
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| overflow("next day"))?;
                next = tomorrow.and_time(time);
            }
            Ok(next)
        }
        ReArm::After(interval) => {
            if interval <= Duration::zero() {
                return Err(overflow("non-positive interval"));
            }
            now.checked_add_signed(interval)
                .ok_or_else(|| overflow("interval"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn register_rejects_past_and_present_fire_times() {
        let mut core = SchedulerCore::new();
        let now = dt(1, 10, 0);
        let past = ScheduleEntry::item_due("s", "a", dt(1, 9, 0));
        assert!(matches!(
            core.register(past, now),
            Err(ScheduleError::InvalidFireTime { .. })
        ));
        let exact = ScheduleEntry::item_due("s", "a", now);
        assert!(core.register(exact, now).is_err());
        assert!(core.is_empty());
    }

    #[test]
    fn entries_fire_once_and_never_early() {
        let mut core = SchedulerCore::new();
        let now = dt(1, 10, 0);
        core.register(ScheduleEntry::item_due("s", "a", dt(1, 12, 0)), now)
            .unwrap();

        assert!(core.tick(dt(1, 11, 59)).is_empty());
        let fired = core.tick(dt(1, 12, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, EntryKind::ItemDue);
        assert_eq!(fired[0].task_id(), "a");
        // Already fired: later ticks stay silent.
        assert!(core.tick(dt(1, 13, 0)).is_empty());
        assert!(core.is_empty());
    }

    #[test]
    fn equal_fire_times_fire_in_registration_order() {
        let mut core = SchedulerCore::new();
        let now = dt(1, 10, 0);
        let at = dt(1, 12, 0);
        for name in ["a", "b", "c"] {
            core.register(ScheduleEntry::item_due("s", name, at), now)
                .unwrap();
        }
        let fired = core.tick(at);
        let ids: Vec<String> = fired.iter().map(|e| e.task_id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn cancel_is_idempotent_and_prevents_firing() {
        let mut core = SchedulerCore::new();
        let now = dt(1, 10, 0);
        let entry = ScheduleEntry::item_due("s", "a", dt(1, 12, 0));
        let id = entry.id.clone();
        core.register(entry, now).unwrap();

        assert!(core.cancel(&id));
        assert!(!core.cancel(&id));
        assert!(core.tick(dt(1, 12, 0)).is_empty());
    }

    #[test]
    fn re_registering_replaces_fire_time() {
        let mut core = SchedulerCore::new();
        let now = dt(1, 10, 0);
        core.register(ScheduleEntry::item_due("s", "a", dt(1, 12, 0)), now)
            .unwrap();
        core.register(ScheduleEntry::item_due("s", "a", dt(1, 14, 0)), now)
            .unwrap();

        assert!(core.tick(dt(1, 12, 0)).is_empty());
        assert_eq!(core.tick(dt(1, 14, 0)).len(), 1);
    }

    #[test]
    fn daily_digest_rolls_past_time_to_next_day() {
        // Scenario: digest configured for 08:00, registered at 09:00.
        let now = dt(1, 9, 0);
        let entry = ScheduleEntry::daily_digest("s", t(8, 0), now);
        assert_eq!(entry.fire_at, dt(2, 8, 0));

        let mut core = SchedulerCore::new();
        core.register(entry, now).unwrap();

        let fired = core.tick(dt(2, 8, 0));
        assert_eq!(fired.len(), 1);
        // Re-armed for the day after at the same wall-clock time.
        assert_eq!(core.next_fire_at(), Some(dt(3, 8, 0)));
    }

    #[test]
    fn digest_skips_missed_days_after_long_sleep() {
        let now = dt(1, 9, 0);
        let mut core = SchedulerCore::new();
        core.register(ScheduleEntry::daily_digest("s", t(8, 0), now), now)
            .unwrap();

        // The loop was asleep for three days; exactly one fire, re-armed
        // into the future.
        let fired = core.tick(dt(5, 12, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(core.next_fire_at(), Some(dt(6, 8, 0)));
    }

    #[test]
    fn sweep_recurs_until_cancelled() {
        let now = dt(1, 10, 0);
        let mut core = SchedulerCore::new();
        let entry = ScheduleEntry::overdue_sweep(Duration::hours(2), now);
        let id = entry.id.clone();
        assert_eq!(entry.fire_at, dt(1, 12, 0));
        core.register(entry, now).unwrap();

        assert_eq!(core.tick(dt(1, 12, 0)).len(), 1);
        assert_eq!(core.next_fire_at(), Some(dt(1, 14, 0)));
        assert_eq!(core.tick(dt(1, 14, 0)).len(), 1);

        // Cancelling mid-interval prevents the next fire.
        assert!(core.cancel(&id));
        assert!(core.tick(dt(1, 16, 0)).is_empty());
    }

    #[test]
    fn tick_drains_everything_due_in_one_call() {
        let now = dt(1, 10, 0);
        let mut core = SchedulerCore::new();
        core.register(ScheduleEntry::item_due("s", "a", dt(1, 11, 0)), now)
            .unwrap();
        core.register(ScheduleEntry::item_advance("s", "b", dt(1, 12, 0)), now)
            .unwrap();
        core.register(ScheduleEntry::item_due("s", "c", dt(1, 18, 0)), now)
            .unwrap();

        let fired = core.tick(dt(1, 12, 0));
        assert_eq!(fired.len(), 2);
        assert_eq!(core.len(), 1);
        assert_eq!(core.next_fire_at(), Some(dt(1, 18, 0)));
    }
}
