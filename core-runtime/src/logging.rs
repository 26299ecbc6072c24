//! # Logging & Tracing Infrastructure
//!
//! Structured logging with the `tracing` crate:
//! - Pretty, JSON and compact output formats
//! - Module-level filtering across every workspace crate
//! - Redaction of sensitive field values before they reach the host log
//! - Mirroring into the host log channel via `LoggerSink`
//!
//! ## Overview
//!
//! Code running inside a host process has no console of its own that a user
//! will ever see. Every event that survives filtering is written by the
//! selected `fmt` layer and, when a sink is configured, mirrored to the host
//! as a [`LogEntry`].
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::log::{LogLevel, StderrSink};
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug)
//!     .with_logger_sink(Arc::new(StderrSink::default()));
//!
//! init_logging(config)?;
//! tracing::info!(target: "core_service", "Attached");
//! ```

use crate::error::{Error, Result};
use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};
use core_async::runtime;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Crates whose events pass the default filter at the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "hookbridge",
    "core_runtime",
    "core_mappings",
    "core_sync",
    "core_service",
    "bridge_local",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Structured JSON, one object per line
    Json,
    /// Single-line format
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Compact;
    }
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Minimum level for workspace crates
    pub level: LogLevel,
    /// Redact sensitive field values mirrored to the host sink
    pub redact_pii: bool,
    /// Custom filter string (e.g., "core_mappings=debug,core_sync=trace")
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Emit span enter/exit events
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            redact_pii: true,
            filter: None,
            logger_sink: None,
            enable_spans: false,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("redact_pii", &self.redact_pii)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_pii_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Installs the global subscriber.
///
/// Call once per process. A second call fails with [`Error::Config`] because
/// a global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(config.display_target)
            .with_thread_ids(config.display_thread_info)
            .with_thread_names(config.display_thread_info)
            .with_span_events(span_events)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .with_target(config.display_target)
            .with_thread_ids(config.display_thread_info)
            .with_thread_names(config.display_thread_info)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(config.display_target)
            .with_thread_ids(config.display_thread_info)
            .with_thread_names(config.display_thread_info)
            .with_span_events(span_events)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(LoggerSinkLayer::new(
            config.logger_sink.clone(),
            config.redact_pii,
        ))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str().to_lowercase();
            let mut directives: Vec<String> = WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, level))
                .collect();
            directives.insert(0, "warn".to_string());
            directives.join(",")
        }
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Layer that forwards events to a `LoggerSink`.
struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Option<Arc<dyn LoggerSink>>, redact: bool) -> Self {
        Self { sink, redact }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        let level = tracing_level_to_log_level(*metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut visitor = SinkVisitor::new(self.redact);
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        for (key, value) in visitor.fields {
            entry = entry.with_field(key, value);
        }
        if let Some(span) = ctx.lookup_current() {
            entry = entry.with_span(span.name());
        }

        let sink = Arc::clone(sink);

        // Host hooks fire on arbitrary threads; only spawn when a runtime is
        // already driving this one.
        if let Ok(handle) = runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = sink.log(entry).await {
                    eprintln!("LoggerSink error: {}", err);
                }
            });
            return;
        }

        match runtime::block_on(async move { sink.log(entry).await }) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => eprintln!("LoggerSink error: {}", err),
            Err(err) => eprintln!("LoggerSink runtime error: {}", err),
        }
    }
}

struct SinkVisitor {
    redact: bool,
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl SinkVisitor {
    fn new(redact: bool) -> Self {
        Self {
            redact,
            message: None,
            fields: HashMap::new(),
        }
    }

    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else if self.redact {
            self.fields.insert(
                field.name().to_string(),
                redact_if_sensitive(field.name(), &value),
            );
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}

fn tracing_level_to_log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Redacts the value of a sensitive field.
///
/// Field names containing a secret-ish word are fully redacted. Values that
/// look like an email address keep only their first character.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("session_token", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("uri", "/a/b"), "/a/b");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
        "cookie",
        "phone",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        return "[REDACTED]".to_string();
    }

    match value.find('@') {
        Some(at_pos) if at_pos > 0 && value[at_pos..].contains('.') => {
            format!("{}***@[REDACTED]", &value[..1])
        }
        _ => value.to_string(),
    }
}

/// Strips a path down to its final component.
///
/// ```
/// use core_runtime::logging::strip_path;
///
/// assert_eq!(strip_path("/data/app/base.apk"), "base.apk");
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
