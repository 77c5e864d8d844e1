use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::logging::{LogEntry, LogLevel, Logger, TimeProvider};
use crate::time_utils::format_log_time;

/// Browser console logger.
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn new_development() -> Self {
        Self::new(LogLevel::Debug)
    }

    pub fn new_production() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = entry.format();
        match entry.level {
            LogLevel::Error => web_sys::console::error_1(&line.into()),
            LogLevel::Warn => web_sys::console::warn_1(&line.into()),
            LogLevel::Info => web_sys::console::info_1(&line.into()),
            LogLevel::Debug => web_sys::console::log_1(&line.into()),
        }
    }
}

/// Wall clock from `Date.now()`.
#[derive(Default)]
pub struct BrowserTimeProvider;

impl BrowserTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for BrowserTimeProvider {
    fn current_timestamp(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        format_log_time(timestamp)
    }
}

/// Keeps the most recent entries in memory. Clones share the same buffer,
/// so a handle can be kept after the logger is installed globally.
#[derive(Clone)]
pub struct BufferedLogger {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
    min_level: LogLevel,
}

impl BufferedLogger {
    pub fn new(capacity: usize, min_level: LogLevel) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            min_level,
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|entries| entries.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries().iter().any(|entry| entry.level == level && entry.message.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Logger for BufferedLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level || self.capacity == 0 {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }
}
