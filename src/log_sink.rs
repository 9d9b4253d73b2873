//! Destinations for the pipeline's user-facing log lines.
//!
//! The pipeline never touches global or session state for its log; callers
//! hand it a [`LogSink`] instead. A dashboard typically keeps a
//! [`MemoryLogSink`] per session and renders its lines next to the chart.

use chrono::{DateTime, Utc};
use log::Level;
use std::fmt;
use std::sync::{Mutex, PoisonError};

pub trait LogSink: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

/// One line of a [`MemoryLogSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<5} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Append-only, in-memory log buffer.
///
/// # Examples
///
/// ```
/// use netatmo_temps::{LogSink, MemoryLogSink};
/// use log::Level;
///
/// let sink = MemoryLogSink::new();
/// sink.record(Level::Info, "fetched 3 devices");
/// assert_eq!(sink.len(), 1);
/// assert!(sink.lines()[0].ends_with("INFO  fetched 3 devices"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries recorded so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries formatted for display.
    pub fn lines(&self) -> Vec<String> {
        self.entries().iter().map(LogEntry::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.to_string(),
            });
    }
}

/// Forwards every line to the `log` facade. Used when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardingLogSink;

impl LogSink for ForwardingLogSink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: "netatmo_temps::pipeline", level, "{}", message);
    }
}
