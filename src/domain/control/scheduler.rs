use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime};

use crate::domain::errors::AppError;
use crate::domain::market_data::{Signal, Timestamp};
use crate::time_utils::{local_zone, utc_instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// A signal to publish once its absolute deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledSignal {
    pub id: TaskId,
    pub deadline: Timestamp,
    pub signal: Signal,
}

impl Ord for ScheduledSignal {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.id).cmp(&(other.deadline, other.id))
    }
}

impl PartialOrd for ScheduledSignal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of absolute-deadline signal tasks.
///
/// The host keeps a single timer armed for [`next_deadline`] and calls
/// [`take_due`] when it fires. A late wake-up still returns every task whose
/// deadline has passed.
///
/// [`next_deadline`]: SignalScheduler::next_deadline
/// [`take_due`]: SignalScheduler::take_due
#[derive(Debug, Default)]
pub struct SignalScheduler {
    heap: BinaryHeap<Reverse<ScheduledSignal>>,
    next_id: u64,
}

impl SignalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Timestamp, signal: Signal) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(ScheduledSignal { id, deadline, signal }));
        id
    }

    /// Returns `false` if the task already fired or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(task)| task.id != id);
        self.heap.len() != before
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.heap.peek().map(|Reverse(task)| task.deadline)
    }

    /// Remove and return every task due at `now`, earliest first. Tasks with
    /// equal deadlines come out in scheduling order.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<ScheduledSignal> {
        let mut due = Vec::new();
        while let Some(Reverse(task)) = self.heap.peek() {
            if task.deadline > now {
                break;
            }
            if let Some(Reverse(task)) = self.heap.pop() {
                due.push(task);
            }
        }
        due
    }

    pub fn pending(&self) -> Vec<ScheduledSignal> {
        let mut tasks: Vec<_> = self.heap.iter().map(|Reverse(task)| *task).collect();
        tasks.sort();
        tasks
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Wall-clock "HH:MM" as entered in the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, AppError> {
        NaiveTime::from_hms_opt(hour.into(), minute.into(), 0)
            .map(Self)
            .ok_or_else(|| AppError::ScheduleError(format!("{:02}:{:02} is not a valid time of day", hour, minute)))
    }

    /// Absolute deadline of the next occurrence of this local time.
    ///
    /// `utc_offset_minutes` is the observer's offset from UTC. While `now` is
    /// still inside the target minute the deadline is that minute's start
    /// (already due); once the minute is over it rolls to the next day.
    pub fn next_occurrence(&self, now: Timestamp, utc_offset_minutes: i32) -> Result<Timestamp, AppError> {
        let zone = local_zone(utc_offset_minutes)
            .ok_or_else(|| AppError::ScheduleError(format!("UTC offset {} min out of range", utc_offset_minutes)))?;
        let local_now = utc_instant(now.value())
            .ok_or_else(|| AppError::ScheduleError(format!("timestamp {} out of range", now.value())))?
            .with_timezone(&zone);

        let mut target = local_now
            .date_naive()
            .and_time(self.0)
            .and_local_timezone(zone)
            .single()
            .ok_or_else(|| AppError::ScheduleError(format!("{} has no single local instant", self)))?;
        if local_now >= target + Duration::minutes(1) {
            target = target + Duration::days(1);
        }

        Ok(Timestamp::from_millis(target.timestamp_millis().max(0) as u64))
    }
}

impl FromStr for ClockTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|e| AppError::ScheduleError(format!("expected HH:MM, got '{}': {}", s, e)))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
