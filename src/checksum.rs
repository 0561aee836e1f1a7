//! # Checksum Engine
//!
//! LRC and CRC16 (Modbus) computation and validation. Both checksums cover
//! the frame body: the prefix literal is always excluded.
//!
//! | Algorithm | Size | Wire order |
//! |-----------|------|------------|
//! | LRC | 1 byte | - |
//! | CRC16 | 2 bytes | low byte of the CRC register first |
//!
//! [`Checksum::calculate`] returns the CRC16 with its bytes already swapped,
//! so writing the value most significant byte first puts the register's low
//! byte on the wire first, as Modbus RTU requires.

use std::fmt;

use crc::{Crc, CRC_16_MODBUS};

use crate::constants::{CRC16_SIZE, LRC_SIZE};
use crate::conversion::Conversion;
use crate::error::FrameResult;
use crate::logging::CallbackLogger;

/// CRC calculator for RTU (poly 0xA001 reflected, init 0xFFFF)
const CRC_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Checksum algorithm, resolved once from the schema string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumAlgorithm {
    Lrc,
    #[default]
    Crc16,
    /// Unrecognized name: checksums compute as 0 and occupy no bytes
    Unknown,
}

impl ChecksumAlgorithm {
    /// Resolve by prefix: `LRC*` is LRC, `CRC*` is CRC16 (case-sensitive).
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("LRC") {
            ChecksumAlgorithm::Lrc
        } else if name.starts_with("CRC") {
            ChecksumAlgorithm::Crc16
        } else {
            ChecksumAlgorithm::Unknown
        }
    }

    /// Checksum width in bytes.
    pub fn size(&self) -> usize {
        match self {
            ChecksumAlgorithm::Lrc => LRC_SIZE,
            ChecksumAlgorithm::Crc16 => CRC16_SIZE,
            ChecksumAlgorithm::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Lrc => "LRC",
            ChecksumAlgorithm::Crc16 => "CRC16",
            ChecksumAlgorithm::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longitudinal redundancy check: two's complement of the byte sum.
///
/// ```rust
/// use modbus_schema::checksum::lrc;
///
/// assert_eq!(lrc(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x02]), 0xFA);
/// ```
pub fn lrc(data: &[u8]) -> u8 {
    let sum: u64 = data.iter().map(|&b| u64::from(b)).sum();
    (((sum ^ 0xFF) + 1) & 0xFF) as u8
}

/// Modbus CRC16, byte-swapped for most-significant-first encoding.
///
/// ```rust
/// use modbus_schema::checksum::crc16;
///
/// // register 0x0A84, sent as 84 0A
/// assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]), 0x840A);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    CRC_MODBUS.checksum(data).swap_bytes()
}

/// Outcome of comparing a frame's embedded checksum with a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumCheck {
    /// Recomputed over the received payload
    pub calculated: u16,
    /// Read from the frame tail
    pub received: u16,
}

impl ChecksumCheck {
    pub fn is_valid(&self) -> bool {
        self.calculated == self.received
    }
}

/// Computes and validates frame checksums.
#[derive(Debug, Clone, Default)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    conversion: Conversion,
    logger: CallbackLogger,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, conversion: Conversion, logger: CallbackLogger) -> Self {
        Self {
            algorithm,
            conversion,
            logger,
        }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Checksum width in bytes (0 for an unknown algorithm).
    pub fn size(&self) -> usize {
        self.algorithm.size()
    }

    /// Checksum of `data` with the first `prefix.len()` bytes excluded.
    pub fn calculate(&self, data: &[u8], prefix: &str) -> u16 {
        let body = &data[prefix.len().min(data.len())..];
        match self.algorithm {
            ChecksumAlgorithm::Lrc => u16::from(lrc(body)),
            ChecksumAlgorithm::Crc16 => crc16(body),
            ChecksumAlgorithm::Unknown => {
                self.logger
                    .warn("Unknown checksum calculation method, using 0");
                0
            }
        }
    }

    /// Compare the checksum embedded in a wire frame against a recomputation.
    ///
    /// The frame is first brought back to binary (ASCII mode), then the
    /// suffix and checksum tail are sliced off to get the payload. Returns
    /// `None` when the frame is shorter than prefix, checksum and suffix.
    pub fn check(&self, frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<Option<ChecksumCheck>> {
        let view = self.conversion.from_wire(frame, prefix, suffix)?;
        let size = self.size();
        if view.len() < prefix.len() + size + suffix.len() {
            self.logger.warn(&format!(
                "Frame too short for checksum validation: {} bytes",
                view.len()
            ));
            return Ok(None);
        }

        let end = view.len() - suffix.len() - size;
        let calculated = self.calculate(&view[..end], prefix);
        let received = self.received_checksum(&view[end..end + size]);
        Ok(Some(ChecksumCheck {
            calculated,
            received,
        }))
    }

    /// Validate the checksum embedded in a wire frame.
    ///
    /// A mismatch is logged as a warning with both values and reported as
    /// `false`; only transcoding failures are errors.
    pub fn validate(&self, frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<bool> {
        let Some(check) = self.check(frame, prefix, suffix)? else {
            return Ok(false);
        };
        if check.is_valid() {
            self.logger
                .debug(&format!("checksum valid: {:04X}", check.received));
            Ok(true)
        } else {
            self.logger.warn(&format!(
                "checksum invalid: {:04X} instead of {:04X}",
                check.calculated, check.received
            ));
            Ok(false)
        }
    }

    fn received_checksum(&self, tail: &[u8]) -> u16 {
        match self.algorithm {
            ChecksumAlgorithm::Lrc => u16::from(tail[0]),
            ChecksumAlgorithm::Crc16 => u16::from_be_bytes([tail[0], tail[1]]),
            ChecksumAlgorithm::Unknown => 0,
        }
    }
}
