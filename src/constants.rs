//! Schema keys, reserved segment names and configuration defaults
//!
//! Reserved segment names are resolved by the frame builder without looking
//! at the message's own fields; every other segment name is a message
//! attribute lookup.

// ============================================================================
// Reserved Segment Names
// ============================================================================

/// Slave (device) address segment, filled from the device's `address`
pub const SEG_SLAVE_ADDRESS: &str = "slave_address";

/// Checksum segment, computed over the bytes accumulated so far
pub const SEG_ERROR_CHECK: &str = "error_check";

/// Data byte count segment, computed from the message's length and data type
pub const SEG_BYTE_COUNT: &str = "byte_count";

/// Filler payload segment (one random byte per data byte)
pub const SEG_DATA_BYTES: &str = "data_bytes";

// ============================================================================
// Schema Keys
// ============================================================================

/// Root object key
pub const KEY_PROTOCOL: &str = "protocol";

/// Frame template array key
pub const KEY_PROTOTYPE: &str = "prototype";

/// Device array key
pub const KEY_DEVICE: &str = "device";

/// Message array key (inside a device)
pub const KEY_MESSAGE: &str = "message";

/// Transmit segment list key
pub const KEY_TRANSMIT: &str = "transmit";

/// Receive segment list key
pub const KEY_RECEIVE: &str = "receive";

/// Message attribute holding the element count
pub const ATTR_LENGTH: &str = "length";

/// Message attribute holding the element data type
pub const ATTR_DATA_TYPE: &str = "data_type";

// ============================================================================
// Defaults
// ============================================================================

/// Transaction rounds per run
pub const DEFAULT_ROUNDS: usize = 10;

/// Checksum algorithm used when the schema omits `checksum_calculation`
pub const DEFAULT_CHECKSUM: &str = "CRC16";

/// Element count used when a message has no `length` attribute
pub const DEFAULT_DATA_LENGTH: u64 = 1;

/// Upper bound on filler values produced for one `data_bytes` segment
pub const MAX_FILLER_VALUES: u64 = 65_535;

/// LRC checksum width in bytes
pub const LRC_SIZE: usize = 1;

/// CRC16 checksum width in bytes
pub const CRC16_SIZE: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_sizes() {
        assert_eq!(LRC_SIZE, 1);
        assert_eq!(CRC16_SIZE, 2);
    }

    #[test]
    fn test_reserved_names_are_distinct() {
        let names = [
            SEG_SLAVE_ADDRESS,
            SEG_ERROR_CHECK,
            SEG_BYTE_COUNT,
            SEG_DATA_BYTES,
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
