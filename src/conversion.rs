//! # Hex/ASCII Transcoding
//!
//! In `Hex` mode frames travel as raw binary and both directions are
//! identity functions. In `Ascii` mode every binary byte is rendered as two
//! uppercase hex digits, e.g. `0x1A` becomes `b"1A"`.
//!
//! Bytes that cannot be rendered as a hex pair may still pass through
//! unchanged when they sit inside the prefix window (index < prefix length)
//! or the suffix window (index ≥ length − suffix length) and appear in the
//! corresponding literal. Anything else is dropped with a warning on the way
//! out (or rejected in strict mode) and rejected on the way in.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;

/// Wire representation of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranscodeMode {
    /// Raw binary
    #[default]
    Hex,
    /// Printable hex digits
    Ascii,
}

impl TranscodeMode {
    /// Parse a mode name (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Some(Self::Hex),
            "ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Ascii => "ascii",
        }
    }
}

impl fmt::Display for TranscodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts frames between their binary form and their wire form.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    mode: TranscodeMode,
    strict: bool,
    logger: CallbackLogger,
}

impl Conversion {
    pub fn new(mode: TranscodeMode, logger: CallbackLogger) -> Self {
        Self {
            mode,
            strict: false,
            logger,
        }
    }

    /// Fail instead of dropping bytes that cannot be rendered on the way out.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn mode(&self) -> TranscodeMode {
        self.mode
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Binary frame to wire form (outbound).
    pub fn to_wire(&self, frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<Bytes> {
        match self.mode {
            TranscodeMode::Hex => Ok(Bytes::copy_from_slice(frame)),
            TranscodeMode::Ascii => self.hex_to_ascii(frame, prefix, suffix),
        }
    }

    /// Wire form to binary frame (inbound).
    pub fn from_wire(&self, frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<Vec<u8>> {
        match self.mode {
            TranscodeMode::Hex => Ok(frame.to_vec()),
            TranscodeMode::Ascii => Self::ascii_to_hex(frame, prefix, suffix),
        }
    }

    /// Human readable rendering for TX/RX log lines.
    pub fn display(&self, frame: &[u8]) -> String {
        match self.mode {
            TranscodeMode::Ascii => String::from_utf8_lossy(frame).into_owned(),
            TranscodeMode::Hex => frame.iter().map(|b| format!("{:02X}", b)).collect(),
        }
    }

    fn hex_to_ascii(&self, frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<Bytes> {
        let length = frame.len();
        let mut encoded = BytesMut::with_capacity(length * 2);
        for (index, &byte) in frame.iter().enumerate() {
            let [high, low] = byte_to_ascii_hex(byte);
            if is_hex_char(high) && is_hex_char(low) {
                encoded.put_u8(high);
                encoded.put_u8(low);
            } else if is_allowed(byte, prefix, suffix, index, length) {
                encoded.put_u8(byte);
            } else if self.strict {
                return Err(FrameError::transcode(
                    index,
                    byte,
                    "byte cannot be rendered as ASCII hex",
                ));
            } else {
                self.logger.warn(&format!(
                    "Byte {:02X} is not allowed in conversion at index {}, dropped",
                    byte, index
                ));
            }
        }
        Ok(encoded.freeze())
    }

    fn ascii_to_hex(frame: &[u8], prefix: &str, suffix: &str) -> FrameResult<Vec<u8>> {
        let length = frame.len();
        let mut decoded = Vec::with_capacity(length / 2 + prefix.len() + suffix.len());
        let mut index = 0;
        while index < length {
            let byte = frame[index];
            if is_hex_char(byte) {
                if index + 1 >= length {
                    return Err(FrameError::transcode(
                        index,
                        byte,
                        "incomplete hex pair at end of frame",
                    ));
                }
                decoded.push(ascii_hex_to_byte(frame, index)?);
                index += 2;
            } else if is_allowed(byte, prefix, suffix, index, length) {
                decoded.push(byte);
                index += 1;
            } else {
                return Err(FrameError::transcode(
                    index,
                    byte,
                    "invalid ASCII character in message",
                ));
            }
        }
        Ok(decoded)
    }
}

/// Check whether a byte is an ASCII hex digit (`0-9`, `A-F`, `a-f`).
#[inline]
#[allow(clippy::manual_range_contains)]
pub fn is_hex_char(byte: u8) -> bool {
    (byte >= b'0' && byte <= b'9') || (byte >= b'A' && byte <= b'F') || (byte >= b'a' && byte <= b'f')
}

/// Check whether a byte may pass through untranscoded as part of the
/// prefix or suffix literal.
pub fn is_allowed(byte: u8, prefix: &str, suffix: &str, index: usize, length: usize) -> bool {
    if !byte.is_ascii() {
        return false;
    }
    let ch = byte as char;
    if index < prefix.len() && prefix.contains(ch) {
        return true;
    }
    index >= length.saturating_sub(suffix.len()) && suffix.contains(ch)
}

/// Convert byte to its two uppercase ASCII hex digits
///
/// ```text
/// 0x01 -> "01"
/// 0xFF -> "FF"
/// ```
#[inline]
fn byte_to_ascii_hex(byte: u8) -> [u8; 2] {
    let high = (byte >> 4) & 0x0F;
    let low = byte & 0x0F;
    [nibble_to_char(high), nibble_to_char(low)]
}

#[inline]
fn nibble_to_char(nibble: u8) -> u8 {
    if nibble < 10 {
        b'0' + nibble
    } else {
        b'A' + (nibble - 10)
    }
}

/// Decode the hex pair starting at `index`.
fn ascii_hex_to_byte(frame: &[u8], index: usize) -> FrameResult<u8> {
    let high = ascii_char_to_hex(frame[index], index)?;
    let low = ascii_char_to_hex(frame[index + 1], index + 1)?;
    Ok((high << 4) | low)
}

fn ascii_char_to_hex(c: u8, index: usize) -> FrameResult<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(FrameError::transcode(index, c, "invalid hex digit in pair")),
    }
}
