//! # Field Codec
//!
//! Packs resolved segment values into bytes. Every value of a segment
//! occupies `ceil(bits / 8)` bytes, most significant byte first, zero
//! padded on the left.
//!
//! | Bits | Value | Bytes |
//! |------|-------|-------|
//! | 8 | 0x11 | `11` |
//! | 16 | 5 | `00 05` |
//! | 1 | 8 | `08` |
//! | 24 | 0x0102 | `00 01 02` |
//!
//! Values wider than the segment keep their low-order bytes.

use bytes::{BufMut, BytesMut};

use crate::segment::Segment;

/// Field encoder for segment values.
pub struct FieldCodec;

impl FieldCodec {
    /// Append every value of `segment` to `out`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytes::BytesMut;
    /// use modbus_schema::{FieldCodec, Segment};
    ///
    /// let seg = Segment::new("quantity", 16).unwrap();
    /// let mut out = BytesMut::new();
    /// FieldCodec::encode(&seg, &[5, 0x1234], &mut out);
    /// assert_eq!(&out[..], &[0x00, 0x05, 0x12, 0x34]);
    /// ```
    pub fn encode(segment: &Segment, values: &[u64], out: &mut BytesMut) {
        let width = segment.byte_width();
        out.reserve(width * values.len());
        for &value in values {
            encode_value(value, width, out);
        }
    }

    /// Bytes produced for `count` values of `segment`.
    #[inline]
    pub fn encoded_len(segment: &Segment, count: usize) -> usize {
        segment.byte_width() * count
    }
}

/// Write `value` as `width` bytes, most significant first.
pub fn encode_value(value: u64, width: usize, out: &mut BytesMut) {
    for i in 0..width {
        let shift = 8 * (width - 1 - i);
        let byte = if shift >= u64::BITS as usize {
            0
        } else {
            ((value >> shift) & 0xFF) as u8
        };
        out.put_u8(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bits: u32, values: &[u64]) -> Vec<u8> {
        let seg = Segment::new("field", bits).unwrap();
        let mut out = BytesMut::new();
        FieldCodec::encode(&seg, values, &mut out);
        out.to_vec()
    }

    #[test]
    fn test_sixteen_bit_value() {
        assert_eq!(encode(16, &[5]), vec![0x00, 0x05]);
    }

    #[test]
    fn test_one_bit_field_takes_a_byte() {
        assert_eq!(encode(1, &[8]), vec![0x08]);
    }

    #[test]
    fn test_left_zero_padding() {
        assert_eq!(encode(24, &[0x0102]), vec![0x00, 0x01, 0x02]);
        assert_eq!(encode(80, &[0xAB]).len(), 10);
        assert_eq!(encode(80, &[0xAB])[9], 0xAB);
        assert!(encode(80, &[u64::MAX])[..2].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truncates_to_low_order_bytes() {
        assert_eq!(encode(8, &[0x1234]), vec![0x34]);
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(encode(8, &[1, 2, 3]), vec![1, 2, 3]);
        let seg = Segment::new("field", 12).unwrap();
        assert_eq!(FieldCodec::encoded_len(&seg, 3), 6);
    }

    #[test]
    fn test_no_values_no_bytes() {
        assert!(encode(16, &[]).is_empty());
    }
}
