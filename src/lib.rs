//! # Modbus Schema - Schema-Driven Modbus Frame Builder
//!
//! Builds and validates Modbus RTU/ASCII style frames from a declarative
//! JSON schema, then checks them through a loop-back simulation.
//!
//! ## Features
//!
//! - **Schema Driven**: frame layouts are lists of named, fixed-width segments
//! - **Checksums**: LRC and CRC16 (Modbus) computed over exact byte ranges
//! - **Transcoding**: raw binary (`hex`) or printable hex (`ascii`) wire form,
//!   with prefix/suffix aware pass-through
//! - **Loop-back Simulation**: every message is exchanged and its reply validated
//! - **Injectable Logging**: `tracing` by default, callbacks for embedding
//!
//! ## Reserved Segment Names
//!
//! | Segment | Value |
//! |---------|-------|
//! | `slave_address` | device address |
//! | `error_check` | checksum of the bytes before it |
//! | `byte_count` | payload size of the message |
//! | `data_bytes` | random filler payload |
//!
//! Any other segment takes the message field of the same name.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modbus_schema::{CallbackLogger, FrameResult, Protocol, RunOptions};
//!
//! fn main() -> FrameResult<()> {
//!     let options = RunOptions::new().with_rounds(5);
//!     let mut protocol = Protocol::load("schemas/modbus_rtu.json", options, CallbackLogger::new())?;
//!     protocol.log();
//!
//!     let report = protocol.run()?;
//!     println!("{} of {} transactions ok", report.stats.successes, report.stats.transactions);
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Error types and result handling
pub mod error;

/// Reserved names, schema keys and defaults
pub mod constants;

/// Injectable logging sink
pub mod logging;

/// Tagged field values and data type sizes
pub mod value;

// ============================================================================
// Frame model
// ============================================================================

/// Field descriptors
pub mod segment;

/// Segment value packing
pub mod codec;

/// Frame templates
pub mod prototype;

/// Messages
pub mod message;

/// Devices
pub mod device;

// ============================================================================
// Frame pipeline
// ============================================================================

/// Hex/ASCII transcoding
pub mod conversion;

/// LRC and CRC16
pub mod checksum;

/// Frame assembly
pub mod builder;

/// Loop-back transport
pub mod simulation;

/// Run statistics
pub mod stats;

/// JSON schema loading
pub mod schema;

/// Protocol aggregate and run loop
pub mod protocol;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Error handling ===
pub use error::{FrameError, FrameResult};

// === Frame model ===
pub use codec::FieldCodec;
pub use device::Device;
pub use message::Message;
pub use prototype::{Direction, Prototype};
pub use segment::Segment;
pub use value::{DataType, FieldValue};

// === Pipeline ===
pub use builder::FrameBuilder;
pub use checksum::{Checksum, ChecksumAlgorithm, ChecksumCheck};
pub use conversion::{Conversion, TranscodeMode};
pub use simulation::Simulation;

// === Protocol ===
pub use protocol::{Protocol, ProtocolSettings, RunOptions, TransactionOutcome};
pub use schema::{load_from_path, load_from_str, ProtocolDocument, Schema};
pub use stats::{RunReport, TransactionStats};

// === Logging ===
pub use logging::{CallbackLogger, LogCallback, LogLevel, LoggingMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library information
pub fn info() -> String {
    format!("Modbus Schema v{} - Schema-driven Modbus frame builder", VERSION)
}
