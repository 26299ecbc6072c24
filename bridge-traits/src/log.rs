//! Host Log Forwarding
//!
//! Instrumentation code has no console of its own. Structured log events are
//! mirrored into the host's log channel (the interception engine's log, or
//! the platform logger) through a [`LoggerSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

use crate::error::Result;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Target module/component
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
    /// Name of the innermost active span
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// Single-line rendering used by line-oriented host logs.
    pub fn render(&self) -> String {
        let mut line = format!(
            "[{}] {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level.as_str(),
            self.target,
            self.message
        );
        let mut keys: Vec<_> = self.fields.keys().collect();
        keys.sort();
        for key in keys {
            line.push_str(&format!(" {}={}", key, self.fields[key]));
        }
        line
    }
}

/// Forwards structured logs to the host log channel.
///
/// Implementations must not log secrets; the core already avoids emitting
/// them but host sinks may add their own redaction.
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are dropped before reaching the sink.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Sink writing rendered entries to stderr.
#[derive(Debug, Clone)]
pub struct StderrSink {
    pub min_level: LogLevel,
}

impl Default for StderrSink {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for StderrSink {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            writeln!(std::io::stderr(), "{}", entry.render())?;
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}
