//! Per-run logging context.
//!
//! Each simulation run owns one [`RunLog`]. Entries are kept in order for later
//! inspection and forwarded to the `log` facade tagged with the run id.
use log::Level;
use serde::{Deserialize, Serialize};

const TARGET: &str = "novelty_board";

/// Severity of a recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const fn as_log(self) -> Level {
        match self {
            Self::Debug => Level::Debug,
            Self::Info => Level::Info,
            Self::Warn => Level::Warn,
            Self::Error => Level::Error,
        }
    }
}

/// One recorded log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Logging context passed explicitly into every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLog {
    run_id: String,
    entries: Vec<LogEntry>,
}

impl RunLog {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at or above `level`.
    pub fn at_least(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |entry| entry.level >= level)
    }

    pub fn record(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        log::log!(target: TARGET, level.as_log(), "[{}] {}", self.run_id, message);
        self.entries.push(LogEntry { level, message });
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Error, message);
    }
}
