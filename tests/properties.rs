//! Property tests for checksums, transcoding and field packing.

use bytes::BytesMut;
use proptest::prelude::*;

use modbus_schema::checksum::{crc16, lrc};
use modbus_schema::{
    CallbackLogger, Checksum, ChecksumAlgorithm, Conversion, FieldCodec, Segment, TranscodeMode,
};

fn conversion(mode: TranscodeMode) -> Conversion {
    Conversion::new(mode, CallbackLogger::disabled())
}

proptest! {
    #[test]
    fn prop_lrc_matches_formula(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let sum: u64 = data.iter().map(|&b| u64::from(b)).sum();
        let expected = (((sum ^ 0xFF) + 1) % 256) as u8;
        prop_assert_eq!(lrc(&data), expected);
    }

    #[test]
    fn prop_lrc_frame_sums_to_zero(data in proptest::collection::vec(any::<u8>(), 1..128)) {
        let total = data.iter().fold(lrc(&data), |acc, &b| acc.wrapping_add(b));
        prop_assert_eq!(total, 0);
    }

    #[test]
    fn prop_hex_mode_is_identity(
        frame in proptest::collection::vec(any::<u8>(), 0..128),
        prefix in "[:#]{0,2}",
        suffix in "[\r\n]{0,2}",
    ) {
        let conv = conversion(TranscodeMode::Hex);
        let wire = conv.to_wire(&frame, &prefix, &suffix).unwrap();
        prop_assert_eq!(wire.as_ref(), frame.as_slice());
        prop_assert_eq!(conv.from_wire(&frame, &prefix, &suffix).unwrap(), frame);
    }

    #[test]
    fn prop_ascii_round_trip(
        frame in proptest::collection::vec(any::<u8>(), 0..128),
        prefix in "[:#]{0,2}",
        suffix in "[\r\n]{0,2}",
    ) {
        let conv = conversion(TranscodeMode::Ascii);
        let wire = conv.to_wire(&frame, &prefix, &suffix).unwrap();
        prop_assert_eq!(wire.len(), frame.len() * 2);
        prop_assert_eq!(conv.from_wire(&wire, &prefix, &suffix).unwrap(), frame);
    }

    #[test]
    fn prop_crc_appended_frame_validates(data in proptest::collection::vec(any::<u8>(), 1..64)) {
        let logger = CallbackLogger::disabled();
        let checksum = Checksum::new(
            ChecksumAlgorithm::Crc16,
            conversion(TranscodeMode::Hex),
            logger,
        );
        let mut frame = data.clone();
        frame.extend_from_slice(&crc16(&data).to_be_bytes());
        prop_assert!(checksum.validate(&frame, "", "").unwrap());
    }

    #[test]
    fn prop_field_width_is_ceil_bits(bits in 1u32..=128, value in any::<u64>()) {
        let segment = Segment::new("field", bits).unwrap();
        let mut out = BytesMut::new();
        FieldCodec::encode(&segment, &[value], &mut out);
        prop_assert_eq!(out.len(), bits.div_ceil(8) as usize);

        let low = out.iter().rev().take(8).enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)));
        let mask = if out.len() >= 8 { u64::MAX } else { (1u64 << (8 * out.len())) - 1 };
        prop_assert_eq!(low, value & mask);
    }
}
