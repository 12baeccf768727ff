//! Time and Host Logging
//!
//! Injectable time source used to judge sample freshness, and the sink through
//! which core logs reach the host logger (os_log, Logcat, stderr).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::Result;

/// Time source trait
///
/// Abstracts system time so sample freshness can be judged deterministically
/// in tests and against the host's notion of "now".
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn sample_age_millis(clock: &dyn Clock, captured_at: i64) -> i64 {
///     clock.unix_timestamp_millis() - captured_at
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
///
/// Time only moves when [`ManualClock::advance_millis`] or
/// [`ManualClock::set_millis`] is called.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::from_millis(start.timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn unix_timestamp_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Severity of a forwarded log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log line as handed to the host.
///
/// Fields are kept sorted by key so the rendered line is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Emitting crate or module, e.g. `core_location::pipeline`
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
    /// Name of the span the event was recorded in
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: BTreeMap::new(),
            span: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn in_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// `message key=value key=value`, the shape host loggers expect on one line.
    pub fn render(&self) -> String {
        let mut line = self.message.clone();
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }
}

/// Host logging pipeline.
///
/// On iOS this is os_log under the bridge's subsystem, on Android Logcat, on
/// desktop stderr. Entries reach the sink after redaction, so implementations
/// may write them as-is.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
///
/// async fn report(sink: &dyn LoggerSink) {
///     let entry = LogEntry::new(LogLevel::Warn, "core_location", "Grant expired")
///         .with_field("handle", "grant#3");
///     sink.log(entry).await.ok();
/// }
/// ```
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are not forwarded.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }

    fn accepts(&self, level: LogLevel) -> bool {
        level >= self.min_level()
    }
}

/// Writes entries to stderr, one line each.
#[derive(Debug, Clone)]
pub struct StderrLogger {
    pub min_level: LogLevel,
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for StderrLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if self.accepts(entry.level) {
            eprintln!(
                "{} {:>5} {}: {}",
                entry.timestamp.format("%H:%M:%S%.3f"),
                entry.level.as_str().to_uppercase(),
                entry.target,
                entry.render()
            );
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let before = Utc::now().timestamp_millis();
        let now = clock.unix_timestamp_millis();

        assert!(now >= before);
        assert_eq!(clock.unix_timestamp(), clock.now().timestamp());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::from_millis(1_700_000_000_000);
        assert_eq!(clock.unix_timestamp_millis(), 1_700_000_000_000);

        clock.advance_millis(4_999);
        assert_eq!(clock.unix_timestamp_millis(), 1_700_000_004_999);
        assert_eq!(clock.now().timestamp_millis(), 1_700_000_004_999);

        clock.set_millis(0);
        assert_eq!(clock.unix_timestamp(), 0);
    }

    #[test]
    fn test_manual_clock_from_datetime() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let clock = ManualClock::new(start);

        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_entry_renders_sorted_fields() {
        let entry = LogEntry::new(LogLevel::Debug, "core_location", "Forwarding location sample")
            .with_field("lon", "106.70")
            .with_field("lat", "10.78")
            .in_span("handle_method_call");

        assert_eq!(entry.render(), "Forwarding location sample lat=10.78 lon=106.70");
        assert_eq!(entry.span.as_deref(), Some("handle_method_call"));
    }

    #[test]
    fn test_level_ordering_and_names() {
        assert!(LogLevel::Warn > LogLevel::Info);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"error\"");
    }

    #[tokio::test]
    async fn test_stderr_logger_respects_min_level() {
        let logger = StderrLogger {
            min_level: LogLevel::Warn,
        };

        assert!(!logger.accepts(LogLevel::Info));
        assert!(logger.accepts(LogLevel::Error));
        logger
            .log(LogEntry::new(LogLevel::Error, "test", "Grant expired"))
            .await
            .unwrap();
    }
}
