//! # Protocol
//!
//! Aggregate root built once from a schema and read-only afterwards. It owns
//! the frame templates, the devices with their messages, and the frame
//! builder, and drives the loop-back run:
//!
//! ```text
//! prepare transmit frames (cached once per message)
//! for each device
//!   for each message
//!     for each round
//!       build receive frame -> simulate TX/RX -> validate receive checksum
//! log statistics
//! ```
//!
//! A checksum mismatch or a message without a template fails only its own
//! transaction. Build, transcode and simulation errors abort the run.
//!
//! # Example
//!
//! ```rust
//! use modbus_schema::{load_from_str, CallbackLogger, Protocol, RunOptions};
//!
//! let schema = load_from_str(r#"{ "protocol": {
//!     "prototype": [ { "name": "ping",
//!         "transmit": [ { "name": "slave_address", "bits": 8 }, { "name": "error_check", "bits": 16 } ],
//!         "receive":  [ { "name": "slave_address", "bits": 8 }, { "name": "error_check", "bits": 16 } ] } ],
//!     "device": [ { "address": 1, "message": [ { "name": "ping" } ] } ]
//! } }"#).unwrap();
//!
//! let options = RunOptions::new().with_rounds(2).with_seed(42);
//! let mut protocol = Protocol::from_schema(schema, options, CallbackLogger::disabled()).unwrap();
//! let report = protocol.run().unwrap();
//! assert_eq!(report.stats.transactions, 2);
//! assert!(report.is_success());
//! ```

use std::path::Path;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::builder::{time_seeded_rng, FrameBuilder};
use crate::checksum::{Checksum, ChecksumAlgorithm};
use crate::constants::DEFAULT_ROUNDS;
use crate::conversion::{Conversion, TranscodeMode};
use crate::device::Device;
use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;
use crate::message::Message;
use crate::prototype::{Direction, Prototype};
use crate::schema::{self, Schema};
use crate::simulation::Simulation;
use crate::stats::{RunReport, RunTimer, TransactionStats};

// ============================================================================
// Settings
// ============================================================================

/// Protocol-level schema keys.
///
/// | Key | Default |
/// |-----|---------|
/// | prefix | `""` |
/// | suffix | `""` |
/// | timeout | 0 (accepted, never enforced) |
/// | source_address | 0 |
/// | transmission_mode | hex |
/// | checksum_calculation | CRC16 |
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolSettings {
    prefix: String,
    suffix: String,
    timeout: u64,
    source_address: u64,
    mode: TranscodeMode,
    algorithm: ChecksumAlgorithm,
}

impl ProtocolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source_address(mut self, address: u64) -> Self {
        self.source_address = address;
        self
    }

    pub fn with_mode(mut self, mode: TranscodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn source_address(&self) -> u64 {
        self.source_address
    }

    pub fn mode(&self) -> TranscodeMode {
        self.mode
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }
}

/// Options for one simulation run.
///
/// ```rust
/// use modbus_schema::RunOptions;
///
/// let options = RunOptions::new().with_rounds(3).with_seed(7);
/// assert_eq!(options.rounds, 3);
/// assert_eq!(options.seed, Some(7));
/// assert!(!options.strict_ascii);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Transactions per message.
    pub rounds: usize,
    /// Fail instead of dropping untranscodable bytes in ASCII mode.
    pub strict_ascii: bool,
    /// Fixed seed for filler bytes; wall-clock seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            strict_ascii: false,
            seed: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_strict_ascii(mut self, strict: bool) -> Self {
        self.strict_ascii = strict;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of one transaction that did not abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Frames were exchanged; `checksum_valid` tells whether the reply checked out.
    Completed {
        sent: usize,
        received: usize,
        checksum_valid: bool,
    },
    /// The message has no template of the same name.
    MissingTemplate,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::Completed {
                checksum_valid: true,
                ..
            }
        )
    }
}

// ============================================================================
// Protocol
// ============================================================================

/// Loaded protocol with its frame builder and loop-back transport.
pub struct Protocol<R: RngCore = StdRng> {
    settings: ProtocolSettings,
    options: RunOptions,
    templates: Vec<Prototype>,
    devices: Vec<Device>,
    builder: FrameBuilder<R>,
    simulation: Simulation,
    logger: CallbackLogger,
}

impl Protocol<StdRng> {
    /// Default options and a wall-clock seeded random source.
    pub fn new(schema: Schema, logger: CallbackLogger) -> FrameResult<Self> {
        Self::from_schema(schema, RunOptions::default(), logger)
    }

    /// Seeded from `options.seed`, or from the wall clock when unset.
    pub fn from_schema(schema: Schema, options: RunOptions, logger: CallbackLogger) -> FrameResult<Self> {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => time_seeded_rng(),
        };
        Self::with_rng(schema, options, rng, logger)
    }

    /// Load the schema file at `path` and build the protocol.
    pub fn load(path: impl AsRef<Path>, options: RunOptions, logger: CallbackLogger) -> FrameResult<Self> {
        let schema = schema::load_from_path(path).inspect_err(|e| {
            logger.error(&format!("Failed to load schema: {}", e));
        })?;
        Self::from_schema(schema, options, logger)
    }
}

impl<R: RngCore> Protocol<R> {
    /// Build with an explicit random source.
    pub fn with_rng(schema: Schema, options: RunOptions, rng: R, logger: CallbackLogger) -> FrameResult<Self> {
        let Schema {
            settings,
            templates,
            devices,
        } = schema;

        if templates.is_empty() {
            return Err(FrameError::config("prototype", "at least one prototype is required"));
        }
        if devices.is_empty() {
            return Err(FrameError::config("device", "at least one device is required"));
        }
        if settings.algorithm() == ChecksumAlgorithm::Unknown {
            logger.warn("Unknown checksum calculation method, checksums will be 0");
        }

        let conversion =
            Conversion::new(settings.mode(), logger.clone()).with_strict(options.strict_ascii);
        let checksum = Checksum::new(settings.algorithm(), conversion.clone(), logger.clone());
        let builder = FrameBuilder::new(
            settings.prefix(),
            settings.suffix(),
            conversion.clone(),
            checksum,
            rng,
            logger.clone(),
        );
        let simulation = Simulation::new(conversion, logger.clone());

        Ok(Self {
            settings,
            options,
            templates,
            devices,
            builder,
            simulation,
            logger,
        })
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn templates(&self) -> &[Prototype] {
        &self.templates
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn checksum(&self) -> &Checksum {
        self.builder.checksum()
    }

    pub fn conversion(&self) -> &Conversion {
        self.builder.conversion()
    }

    /// Template by name; `None` on miss.
    pub fn template(&self, name: &str) -> Option<&Prototype> {
        find_template(&self.templates, name)
    }

    /// Build a frame with this protocol's prefix, suffix, checksum and mode.
    pub fn build_frame(
        &mut self,
        template: &Prototype,
        direction: Direction,
        message: &Message,
        device: &Device,
    ) -> FrameResult<Bytes> {
        self.builder.build_frame(template, direction, message, device)
    }

    /// Validate the checksum embedded in a wire frame.
    pub fn validate(&self, frame: &[u8]) -> FrameResult<bool> {
        self.builder
            .checksum()
            .validate(frame, self.settings.prefix(), self.settings.suffix())
    }

    /// Build and cache the transmit frame of every message that has a template.
    ///
    /// Messages whose cache is already set keep their frame.
    pub fn prepare_transmit_frames(&mut self) -> FrameResult<()> {
        let Self {
            templates,
            devices,
            builder,
            logger,
            ..
        } = self;

        for device in devices.iter() {
            for message in device.messages() {
                if message.byte_buffer().is_some() {
                    continue;
                }
                let Some(template) = find_template(templates, message.name()) else {
                    logger.debug(&format!(
                        "No prototype for message {}, transmit frame not prepared",
                        message.name()
                    ));
                    continue;
                };
                let frame = builder.build_frame(template, Direction::Transmit, message, device)?;
                message.set_byte_buffer(frame);
            }
        }
        Ok(())
    }

    /// Run one transaction for message `message_index` of device `device_index`.
    pub fn transact(&mut self, device_index: usize, message_index: usize) -> FrameResult<TransactionOutcome> {
        let Self {
            settings,
            templates,
            devices,
            builder,
            simulation,
            logger,
            ..
        } = self;

        let device = devices.get(device_index).ok_or_else(|| {
            FrameError::simulation(format!("no device at index {}", device_index))
        })?;
        let message = device.messages().get(message_index).ok_or_else(|| {
            FrameError::simulation(format!(
                "device {} has no message at index {}",
                device.name(),
                message_index
            ))
        })?;

        let Some(template) = find_template(templates, message.name()) else {
            logger.error(&format!(
                "Unable to find prototype for message {}",
                message.name()
            ));
            return Ok(TransactionOutcome::MissingTemplate);
        };

        if message.byte_buffer().is_none() {
            let frame = builder.build_frame(template, Direction::Transmit, message, device)?;
            message.set_byte_buffer(frame);
        }
        let receive = builder.build_frame(template, Direction::Receive, message, device)?;
        let transmit = message.byte_buffer().map(|b| &b[..]);

        simulation.simulate_transaction(transmit, Some(receive.as_ref()))?;

        let checksum_valid = builder
            .checksum()
            .validate(&receive, settings.prefix(), settings.suffix())?;
        if !checksum_valid {
            logger.warn(&format!(
                "Transaction failed for message {} on device {}: checksum mismatch",
                message.name(),
                device.address()
            ));
        }

        Ok(TransactionOutcome::Completed {
            sent: transmit.map_or(0, <[u8]>::len),
            received: receive.len(),
            checksum_valid,
        })
    }

    /// Run every message of every device for the configured number of rounds.
    ///
    /// Returns the report even when some transactions failed; only fatal
    /// errors are returned as `Err`.
    pub fn run(&mut self) -> FrameResult<RunReport> {
        let timer = RunTimer::start();
        self.logger.info(&format!(
            "Starting simulation: {} devices, {} prototypes, {} rounds",
            self.devices.len(),
            self.templates.len(),
            self.options.rounds
        ));

        let result = self.run_rounds();
        let stats = match result {
            Ok(stats) => stats,
            Err(e) => {
                self.logger
                    .error(&format!("Simulation aborted ({} error): {}", e.kind(), e));
                return Err(e);
            }
        };

        let report = timer.finish(stats);
        report.log(&self.logger);
        Ok(report)
    }

    fn run_rounds(&mut self) -> FrameResult<TransactionStats> {
        self.prepare_transmit_frames()?;

        let mut stats = TransactionStats::default();
        for device_index in 0..self.devices.len() {
            let message_count = self.devices[device_index].messages().len();
            for message_index in 0..message_count {
                for _ in 0..self.options.rounds {
                    match self.transact(device_index, message_index)? {
                        TransactionOutcome::Completed {
                            sent,
                            received,
                            checksum_valid: true,
                        } => stats.record_success(sent, received),
                        TransactionOutcome::Completed { sent, received, .. } => {
                            stats.record_checksum_failure(sent, received)
                        }
                        TransactionOutcome::MissingTemplate => stats.record_missing_template(),
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Debug dump of the loaded configuration.
    pub fn log(&self) {
        let s = &self.settings;
        self.logger.debug(&format!(
            "Protocol: prefix={:?} suffix={:?} timeout={} source_address={} mode={} checksum={}",
            s.prefix(),
            s.suffix(),
            s.timeout(),
            s.source_address(),
            s.mode(),
            s.algorithm()
        ));
        for template in &self.templates {
            template.log(&self.logger);
        }
        for device in &self.devices {
            device.log(&self.logger);
        }
    }
}

fn find_template<'a>(templates: &'a [Prototype], name: &str) -> Option<&'a Prototype> {
    templates.iter().find(|t| t.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::crc16;
    use crate::logging::LogLevel;
    use crate::schema::load_from_str;
    use crate::segment::Segment;

    const SCHEMA: &str = r#"{ "protocol": {
        "prototype": [ {
            "name": "holding_regs",
            "transmit": [
                { "name": "slave_address", "bits": 8 },
                { "name": "function", "bits": 8 },
                { "name": "error_check", "bits": 16 }
            ],
            "receive": [
                { "name": "slave_address", "bits": 8 },
                { "name": "byte_count", "bits": 8 },
                { "name": "data_bytes", "bits": 8 },
                { "name": "error_check", "bits": 16 }
            ]
        } ],
        "device": [ {
            "name": "meter", "address": 17,
            "message": [
                { "name": "holding_regs", "length": 2, "function": 3 },
                { "name": "orphan" }
            ]
        } ]
    } }"#;

    fn protocol(logger: CallbackLogger) -> Protocol<StdRng> {
        let schema = load_from_str(SCHEMA).unwrap();
        Protocol::with_rng(schema, RunOptions::new().with_rounds(3), StdRng::seed_from_u64(1), logger)
            .unwrap()
    }

    #[test]
    fn test_template_lookup() {
        let p = protocol(CallbackLogger::disabled());
        assert!(p.template("holding_regs").is_some());
        assert!(p.template("orphan").is_none());
    }

    #[test]
    fn test_transmit_cached_once() {
        let mut p = protocol(CallbackLogger::disabled());
        p.prepare_transmit_frames().unwrap();
        let first = p.devices()[0].messages()[0].byte_buffer().cloned().unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(&first[..2], &[0x11, 0x03]);
        assert_eq!(&first[2..], &crc16(&[0x11, 0x03]).to_be_bytes());

        p.transact(0, 0).unwrap();
        p.prepare_transmit_frames().unwrap();
        assert_eq!(p.devices()[0].messages()[0].byte_buffer(), Some(&first));
    }

    #[test]
    fn test_transaction_validates_reply() {
        let mut p = protocol(CallbackLogger::disabled());
        let outcome = p.transact(0, 0).unwrap();
        assert_eq!(
            outcome,
            TransactionOutcome::Completed {
                sent: 4,
                received: 1 + 1 + 4 + 2,
                checksum_valid: true
            }
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn test_missing_template_is_per_transaction() {
        let (logger, records) = CallbackLogger::buffered();
        let mut p = protocol(logger);
        assert_eq!(p.transact(0, 1).unwrap(), TransactionOutcome::MissingTemplate);
        assert!(records
            .lock()
            .unwrap()
            .iter()
            .any(|(level, msg)| *level == LogLevel::Error && msg.contains("orphan")));
    }

    #[test]
    fn test_bad_index_is_error() {
        let mut p = protocol(CallbackLogger::disabled());
        assert!(p.transact(3, 0).is_err());
        assert!(p.transact(0, 9).is_err());
    }

    #[test]
    fn test_run_counts_transactions() {
        let mut p = protocol(CallbackLogger::disabled());
        let report = p.run().unwrap();
        assert_eq!(report.stats.transactions, 6);
        assert_eq!(report.stats.successes, 3);
        assert_eq!(report.stats.missing_templates, 3);
        assert_eq!(report.stats.bytes_sent, 12);
        assert_eq!(report.stats.bytes_received, 24);
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_transmit_aborts_run() {
        let schema = Schema {
            settings: ProtocolSettings::default(),
            templates: vec![Prototype::new(
                "m",
                vec![],
                vec![Segment::new("slave_address", 8).unwrap()],
            )],
            devices: vec![Device::new("d", 1).with_message(Message::new("m"))],
        };
        let mut p = Protocol::with_rng(
            schema,
            RunOptions::new().with_rounds(1),
            StdRng::seed_from_u64(0),
            CallbackLogger::disabled(),
        )
        .unwrap();
        assert!(matches!(p.run(), Err(FrameError::Simulation { .. })));
    }

    #[test]
    fn test_build_error_aborts_run() {
        let schema = Schema {
            settings: ProtocolSettings::default(),
            templates: vec![Prototype::new(
                "m",
                vec![Segment::new("register", 16).unwrap()],
                vec![],
            )],
            devices: vec![Device::new("d", 1).with_message(Message::new("m"))],
        };
        let mut p = Protocol::with_rng(
            schema,
            RunOptions::default(),
            StdRng::seed_from_u64(0),
            CallbackLogger::disabled(),
        )
        .unwrap();
        assert!(matches!(p.run(), Err(FrameError::Build { .. })));
    }

    #[test]
    fn test_requires_templates_and_devices() {
        let schema = Schema {
            settings: ProtocolSettings::default(),
            templates: vec![],
            devices: vec![Device::default()],
        };
        assert!(matches!(
            Protocol::new(schema, CallbackLogger::disabled()),
            Err(FrameError::Config { .. })
        ));
    }

    #[test]
    fn test_checksum_failure_does_not_abort_run() {
        // CRC16 needs two bytes but the reply only carries one
        let schema = Schema {
            settings: ProtocolSettings::default(),
            templates: vec![Prototype::new(
                "status",
                vec![Segment::new("slave_address", 8).unwrap()],
                vec![
                    Segment::new("slave_address", 8).unwrap(),
                    Segment::new("error_check", 8).unwrap(),
                ],
            )],
            devices: vec![Device::new("d", 0x11).with_message(Message::new("status"))],
        };
        let (logger, records) = CallbackLogger::buffered();
        let mut p = Protocol::with_rng(
            schema,
            RunOptions::new().with_rounds(3),
            StdRng::seed_from_u64(0),
            logger,
        )
        .unwrap();

        let outcome = p.transact(0, 0).unwrap();
        assert!(matches!(
            outcome,
            TransactionOutcome::Completed {
                checksum_valid: false,
                ..
            }
        ));
        assert!(!outcome.is_success());

        let report = p.run().unwrap();
        assert_eq!(report.stats.transactions, 3);
        assert_eq!(report.stats.successes, 0);
        assert_eq!(report.stats.checksum_failures, 3);
        assert!(!report.is_success());

        let records = records.lock().unwrap();
        assert!(records
            .iter()
            .any(|(level, msg)| *level == LogLevel::Warn && msg.contains("status")));
        assert!(records
            .iter()
            .all(|(level, _)| *level != LogLevel::Error));
    }

    #[test]
    fn test_abort_is_logged_with_error_kind() {
        let schema = Schema {
            settings: ProtocolSettings::default(),
            templates: vec![Prototype::new(
                "m",
                vec![Segment::new("register", 16).unwrap()],
                vec![],
            )],
            devices: vec![Device::new("d", 1).with_message(Message::new("m"))],
        };
        let (logger, records) = CallbackLogger::buffered();
        let mut p =
            Protocol::with_rng(schema, RunOptions::default(), StdRng::seed_from_u64(0), logger)
                .unwrap();
        assert!(p.run().is_err());
        assert!(records.lock().unwrap().iter().any(|(level, msg)| {
            *level == LogLevel::Error && msg.starts_with("Simulation aborted (build error)")
        }));
    }

    #[test]
    fn test_unknown_checksum_warns_once() {
        let (logger, records) = CallbackLogger::buffered();
        let schema = Schema {
            settings: ProtocolSettings::default().with_algorithm(ChecksumAlgorithm::Unknown),
            templates: vec![Prototype::new("m", vec![], vec![])],
            devices: vec![Device::default()],
        };
        let _ = Protocol::new(schema, logger).unwrap();
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Warn);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let build = || {
            let schema = load_from_str(SCHEMA).unwrap();
            let mut p =
                Protocol::from_schema(schema, RunOptions::new().with_seed(9), CallbackLogger::disabled())
                    .unwrap();
            let template = p.template("holding_regs").cloned().unwrap();
            let device = p.devices()[0].clone();
            p.build_frame(&template, Direction::Receive, &device.messages()[0], &device)
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_log_dumps_configuration() {
        let (logger, records) = CallbackLogger::buffered();
        protocol(logger).log();
        let records = records.lock().unwrap();
        assert!(records[0].1.starts_with("Protocol: "));
        assert!(records.iter().any(|(_, m)| m.contains("Device Name: meter")));
    }
}
