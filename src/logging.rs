//! # Logging
//!
//! Components receive a [`CallbackLogger`] handle at construction instead of
//! reaching for a global logger. The default handle forwards to `tracing`,
//! so applications keep full control through their subscriber; tests and
//! embedders can swap in a callback to capture output.
//!
//! | Level | Used for |
//! |-------|----------|
//! | Debug | frame dumps, loaded configuration |
//! | Info | simulated TX/RX lines, run statistics |
//! | Warn | checksum mismatches, dropped transcoder bytes |
//! | Error | configuration and simulation failures |

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, trace, warn};

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User supplied sink for log records.
pub type LogCallback = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Shared record buffer filled by [`CallbackLogger::buffered`].
pub type LogRecords = Arc<Mutex<Vec<(LogLevel, String)>>>;

/// Where log records go.
#[derive(Clone, Default)]
pub enum LoggingMode {
    /// Forward to the `tracing` macros
    #[default]
    Tracing,
    /// Hand records to a callback
    Callback(LogCallback),
    /// Drop everything
    Disabled,
}

impl fmt::Debug for LoggingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingMode::Tracing => f.write_str("Tracing"),
            LoggingMode::Callback(_) => f.write_str("Callback(..)"),
            LoggingMode::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Cloneable logging handle injected into each component.
#[derive(Debug, Clone)]
pub struct CallbackLogger {
    mode: LoggingMode,
    min_level: LogLevel,
}

impl Default for CallbackLogger {
    fn default() -> Self {
        Self {
            mode: LoggingMode::Tracing,
            min_level: LogLevel::Trace,
        }
    }
}

impl CallbackLogger {
    /// Logger that forwards to `tracing`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that hands every record to `callback`.
    pub fn with_callback(callback: LogCallback) -> Self {
        Self {
            mode: LoggingMode::Callback(callback),
            min_level: LogLevel::Trace,
        }
    }

    /// Logger that appends every record to a shared buffer.
    pub fn buffered() -> (Self, LogRecords) {
        let records: LogRecords = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        let logger = Self::with_callback(Arc::new(move |level: LogLevel, msg: &str| {
            if let Ok(mut records) = sink.lock() {
                records.push((level, msg.to_string()));
            }
        }));
        (logger, records)
    }

    /// Logger that discards everything.
    pub fn disabled() -> Self {
        Self {
            mode: LoggingMode::Disabled,
            min_level: LogLevel::Error,
        }
    }

    /// Drop records below `level`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn mode(&self) -> &LoggingMode {
        &self.mode
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        !matches!(self.mode, LoggingMode::Disabled) && level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.is_enabled(level) {
            return;
        }
        match &self.mode {
            LoggingMode::Tracing => match level {
                LogLevel::Trace => trace!("{}", message),
                LogLevel::Debug => debug!("{}", message),
                LogLevel::Info => info!("{}", message),
                LogLevel::Warn => warn!("{}", message),
                LogLevel::Error => error!("{}", message),
            },
            LoggingMode::Callback(callback) => callback(level, message),
            LoggingMode::Disabled => {}
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Debug dump of a frame as spaced hex, e.g. `TX frame [3]: 11 F0 3E`.
    pub fn log_frame(&self, label: &str, data: &[u8]) {
        if !self.is_enabled(LogLevel::Debug) {
            return;
        }
        self.debug(&format!(
            "{} frame [{}]: {}",
            label,
            data.len(),
            format_hex_packet(data)
        ));
    }
}

/// Format raw bytes as a space separated uppercase hex string
pub fn format_hex_packet(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
