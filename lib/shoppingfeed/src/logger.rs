//! Logger sink used by the logging hook and the rate-limit handler.
//!
//! The SDK emits its own diagnostics with `tracing`. The [`Logger`] trait is the
//! user-facing sink configured through [`ClientOptions`](crate::ClientOptions):
//! when one is set, every physical exchange and every scheduled rate-limit
//! retry is reported to it.

use std::sync::{Arc, Mutex, PoisonError};

use derive_more::Display;

/// Severity of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum LogLevel {
    /// Request/response details.
    #[display("debug")]
    Debug,
    /// Successful exchanges.
    #[display("info")]
    Info,
    /// Failed exchanges and scheduled retries.
    #[display("warn")]
    Warn,
    /// Unrecoverable failures.
    #[display("error")]
    Error,
}

/// A sink for SDK log messages.
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::{LogLevel, Logger};
///
/// #[derive(Debug)]
/// struct Stderr;
///
/// impl Logger for Stderr {
///     fn log(&self, level: LogLevel, message: &str) {
///         eprintln!("[{level}] {message}");
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Record a message at the given level.
    fn log(&self, level: LogLevel, message: &str);

    /// Record an informational message.
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Record a warning.
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }
}

/// Shared handle on a logger sink.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger forwarding every message to `tracing` under the `shoppingfeed` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a shared tracing logger, ready for [`ClientOptions`](crate::ClientOptions).
    #[must_use]
    pub fn shared() -> SharedLogger {
        Arc::new(Self)
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "shoppingfeed", "{message}"),
            LogLevel::Info => tracing::info!(target: "shoppingfeed", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "shoppingfeed", "{message}"),
            LogLevel::Error => tracing::error!(target: "shoppingfeed", "{message}"),
        }
    }
}

/// Logger keeping every message in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded messages with their level.
    #[must_use]
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded messages of one level.
    #[must_use]
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn helpers_forward_levels() {
        let logger = MemoryLogger::new();
        logger.info("sent");
        logger.warn("throttled");

        let entries = logger.entries();
        check!(
            entries
                == vec![
                    (LogLevel::Info, "sent".to_string()),
                    (LogLevel::Warn, "throttled".to_string())
                ]
        );
    }

    #[test]
    fn messages_filters_by_level() {
        let logger = MemoryLogger::new();
        logger.info("first");
        logger.warn("second");
        logger.info("third");

        check!(logger.messages(LogLevel::Info) == vec!["first", "third"]);
        check!(logger.messages(LogLevel::Error).is_empty());
    }

    #[test]
    fn level_display_and_order() {
        check!(LogLevel::Warn.to_string() == "warn");
        check!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn tracing_logger_accepts_every_level() {
        let logger = TracingLogger::shared();
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            logger.log(level, "message");
        }
    }
}
