//! Messages: named parameter sets that supply segment values
//!
//! Every schema key other than `name` becomes a field. Two fields have
//! meaning to the frame builder:
//!
//! - `length`: element count (defaults to 1)
//! - `data_type`: element type (defaults to `int16`)
//!
//! A message also caches its transmit frame. The cache is write-once: the
//! first non-empty frame committed is reused for the rest of the run.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use bytes::Bytes;

use crate::constants::{ATTR_DATA_TYPE, ATTR_LENGTH, DEFAULT_DATA_LENGTH};
use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;
use crate::value::{DataType, FieldValue};

/// Named parameter source for one message type of a device.
#[derive(Debug, Clone, Default)]
pub struct Message {
    name: String,
    fields: BTreeMap<String, FieldValue>,
    byte_buffer: OnceLock<Bytes>,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            byte_buffer: OnceLock::new(),
        }
    }

    /// Add or replace a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Look up a field, `None` on miss.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Look up a field, failing with [`FrameError::UnknownField`] on miss.
    pub fn field(&self, key: &str) -> FrameResult<&FieldValue> {
        self.fields
            .get(key)
            .ok_or_else(|| FrameError::unknown_field(key))
    }

    /// Element count from the `length` field.
    ///
    /// Only a non-negative integer counts; 1 when absent or of another kind.
    pub fn data_length(&self) -> u64 {
        match self.fields.get(ATTR_LENGTH) {
            Some(FieldValue::Unsigned(length)) => *length,
            _ => DEFAULT_DATA_LENGTH,
        }
    }

    /// Element type from the `data_type` field, `int16` when absent or unknown.
    pub fn data_type(&self) -> DataType {
        self.fields
            .get(ATTR_DATA_TYPE)
            .and_then(FieldValue::as_str)
            .and_then(DataType::from_str)
            .unwrap_or_default()
    }

    /// Payload size in bytes for this message.
    pub fn data_byte_count(&self) -> u64 {
        self.data_type().byte_count(self.data_length())
    }

    /// Cached transmit frame, if one has been committed.
    pub fn byte_buffer(&self) -> Option<&Bytes> {
        self.byte_buffer.get()
    }

    /// Commit a frame to the cache.
    ///
    /// Only the first non-empty frame is kept; returns whether this call
    /// stored `frame`.
    pub fn set_byte_buffer(&self, frame: Bytes) -> bool {
        if frame.is_empty() {
            return false;
        }
        self.byte_buffer.set(frame).is_ok()
    }

    pub fn log(&self, logger: &CallbackLogger) {
        logger.debug(&format!("Message Name: {}", self.name));
        for (key, value) in &self.fields {
            logger.debug(&format!("Message Dictionary Item: {} => {}", key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_count_defaults() {
        let msg = Message::new("read");
        assert_eq!(msg.data_length(), 1);
        assert_eq!(msg.data_type(), DataType::Int16);
        assert_eq!(msg.data_byte_count(), 2);
    }

    #[test]
    fn test_byte_count_by_type() {
        let msg = Message::new("regs").with_field("length", 4u64);
        assert_eq!(msg.data_byte_count(), 8);

        let msg = Message::new("regs")
            .with_field("length", 3u64)
            .with_field("data_type", "INT32");
        assert_eq!(msg.data_byte_count(), 12);

        let msg = Message::new("coils")
            .with_field("length", 10u64)
            .with_field("data_type", "bit");
        assert_eq!(msg.data_byte_count(), 2);
    }

    #[test]
    fn test_unknown_data_type_falls_back_to_int16() {
        let msg = Message::new("m")
            .with_field("length", 2u64)
            .with_field("data_type", "quaternion");
        assert_eq!(msg.data_byte_count(), 4);
    }

    #[test]
    fn test_non_integer_length_uses_default() {
        let msg = Message::new("m").with_field("length", -1i64);
        assert_eq!(msg.data_length(), 1);
        assert_eq!(msg.data_byte_count(), 2);

        let msg = Message::new("m").with_field("length", 2.6);
        assert_eq!(msg.data_length(), 1);
    }

    #[test]
    fn test_field_lookup() {
        let msg = Message::new("m").with_field("function", 3u64);
        assert_eq!(msg.field("function").unwrap(), &FieldValue::Unsigned(3));
        assert!(matches!(
            msg.field("quantity"),
            Err(FrameError::UnknownField { ref field }) if field == "quantity"
        ));
    }

    #[test]
    fn test_byte_buffer_is_write_once() {
        let msg = Message::new("m");
        assert!(msg.byte_buffer().is_none());

        assert!(msg.set_byte_buffer(Bytes::from_static(&[0x01, 0x02])));
        assert!(!msg.set_byte_buffer(Bytes::from_static(&[0x03])));
        assert_eq!(msg.byte_buffer().unwrap().as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn test_empty_buffer_is_ignored() {
        let msg = Message::new("m");
        assert!(!msg.set_byte_buffer(Bytes::new()));
        assert!(msg.byte_buffer().is_none());
        assert!(msg.set_byte_buffer(Bytes::from_static(&[0xAA])));
    }
}
