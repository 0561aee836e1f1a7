//! Run statistics and the end-of-run elapsed-time report

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::logging::CallbackLogger;

/// Per-run transaction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub transactions: u64,
    pub successes: u64,
    pub checksum_failures: u64,
    pub missing_templates: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl TransactionStats {
    pub fn record_success(&mut self, sent: usize, received: usize) {
        self.transactions += 1;
        self.successes += 1;
        self.add_bytes(sent, received);
    }

    pub fn record_checksum_failure(&mut self, sent: usize, received: usize) {
        self.transactions += 1;
        self.checksum_failures += 1;
        self.add_bytes(sent, received);
    }

    pub fn record_missing_template(&mut self) {
        self.transactions += 1;
        self.missing_templates += 1;
    }

    /// Transactions that did not succeed.
    pub fn failures(&self) -> u64 {
        self.transactions - self.successes
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }

    fn add_bytes(&mut self, sent: usize, received: usize) {
        self.bytes_sent += sent as u64;
        self.bytes_received += received as u64;
    }
}

/// Wall-clock timer for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunTimer {
    started_at: DateTime<Utc>,
    start: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and produce the report.
    pub fn finish(self, stats: TransactionStats) -> RunReport {
        RunReport {
            started_at: self.started_at,
            elapsed: self.elapsed(),
            stats,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub stats: TransactionStats,
}

impl RunReport {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// True when every transaction succeeded.
    pub fn is_success(&self) -> bool {
        self.stats.all_succeeded()
    }

    pub fn log(&self, logger: &CallbackLogger) {
        let s = &self.stats;
        logger.info(&format!(
            "Transactions: {} total, {} ok, {} checksum failures, {} missing templates ({} bytes sent, {} bytes received)",
            s.transactions,
            s.successes,
            s.checksum_failures,
            s.missing_templates,
            s.bytes_sent,
            s.bytes_received
        ));
        logger.info(&format!(
            "Statistics: Elapsed time={:.6} seconds",
            self.elapsed_seconds()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_counters() {
        let mut stats = TransactionStats::default();
        stats.record_success(8, 9);
        stats.record_checksum_failure(8, 9);
        stats.record_missing_template();

        assert_eq!(stats.transactions, 3);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures(), 2);
        assert_eq!(stats.bytes_sent, 16);
        assert_eq!(stats.bytes_received, 18);
        assert!(!stats.all_succeeded());
    }

    #[test]
    fn test_empty_run_is_success() {
        let report = RunTimer::start().finish(TransactionStats::default());
        assert!(report.is_success());
        assert!(report.elapsed_seconds() >= 0.0);
    }

    #[test]
    fn test_report_logs_elapsed_time() {
        let (logger, records) = CallbackLogger::buffered();
        let mut stats = TransactionStats::default();
        stats.record_success(3, 9);
        RunTimer::start().finish(stats).log(&logger);

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].0, LogLevel::Info);
        assert!(records[1].1.starts_with("Statistics: Elapsed time="));
        assert!(records[1].1.ends_with(" seconds"));
    }
}
