//! Field descriptor: a named, fixed-width unit of a frame

use std::fmt;

use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;

/// A named field of `bits` width with an optional description.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    bits: u32,
    desc: String,
}

impl Segment {
    /// Create a segment. The name must be non-empty and the width at least 1 bit.
    pub fn new(name: impl Into<String>, bits: u32) -> FrameResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(FrameError::config("segment", "name must not be empty"));
        }
        if bits == 0 {
            return Err(FrameError::config(
                format!("segment '{}'", name),
                "bits must be at least 1",
            ));
        }
        Ok(Self {
            name,
            bits,
            desc: String::new(),
        })
    }

    /// Attach a description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Bytes occupied by one value of this segment: `ceil(bits / 8)`.
    #[inline]
    pub fn byte_width(&self) -> usize {
        self.bits.div_ceil(8) as usize
    }

    pub fn log(&self, logger: &CallbackLogger) {
        logger.debug(&format!(
            "Segment Name: {} ({}), Bits: {}",
            self.name, self.desc, self.bits
        ));
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bits)", self.name, self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_width_rounds_up() {
        assert_eq!(Segment::new("a", 1).unwrap().byte_width(), 1);
        assert_eq!(Segment::new("a", 8).unwrap().byte_width(), 1);
        assert_eq!(Segment::new("a", 9).unwrap().byte_width(), 2);
        assert_eq!(Segment::new("a", 16).unwrap().byte_width(), 2);
        assert_eq!(Segment::new("a", 24).unwrap().byte_width(), 3);
    }

    #[test]
    fn test_required_fields() {
        assert!(matches!(
            Segment::new("", 8),
            Err(FrameError::Config { .. })
        ));
        let err = Segment::new("function", 0).unwrap_err();
        assert!(err.to_string().contains("function"));
    }

    #[test]
    fn test_description() {
        let seg = Segment::new("function", 8).unwrap().with_desc("function code");
        assert_eq!(seg.desc(), "function code");
        assert_eq!(seg.to_string(), "function (8 bits)");
    }
}
