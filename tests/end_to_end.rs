//! End-to-end runs over complete schemas.

use std::io::Write;

use modbus_schema::checksum::{crc16, lrc};
use modbus_schema::{
    load_from_path, load_from_str, CallbackLogger, Checksum, ChecksumAlgorithm, Conversion,
    Direction, FrameError, LogLevel, Protocol, RunOptions, TranscodeMode,
};
use tempfile::NamedTempFile;

const HOLDING_REGS: &str = r#"{
    "protocol": {
        "prototype": [
            {
                "name": "holding_regs",
                "transmit": [
                    { "name": "slave_address", "bits": 8 },
                    { "name": "error_check", "bits": 16 }
                ],
                "receive": [
                    { "name": "slave_address", "bits": 8 },
                    { "name": "byte_count", "bits": 8 },
                    { "name": "data_bytes", "bits": 8 },
                    { "name": "error_check", "bits": 16 }
                ]
            }
        ],
        "device": [
            {
                "name": "meter",
                "address": 17,
                "message": [ { "name": "holding_regs", "length": 2, "data_type": "int16" } ]
            }
        ]
    }
}"#;

fn schema_path(name: &str) -> String {
    format!("{}/schemas/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_single_round_holding_registers() {
    let schema = load_from_str(HOLDING_REGS).unwrap();
    let options = RunOptions::new().with_rounds(1).with_seed(17);
    let mut protocol = Protocol::from_schema(schema, options, CallbackLogger::disabled()).unwrap();

    let report = protocol.run().unwrap();
    assert_eq!(report.stats.transactions, 1);
    assert_eq!(report.stats.successes, 1);
    assert!(report.is_success());

    let transmit = protocol.devices()[0].messages()[0]
        .byte_buffer()
        .cloned()
        .unwrap();
    assert_eq!(transmit.len(), 3);
    assert_eq!(transmit[0], 0x11);
    assert_eq!(&transmit[1..], &crc16(&[0x11]).to_be_bytes());

    // slave_address + byte_count + 4 filler bytes + crc
    assert_eq!(report.stats.bytes_received, 8);
}

#[test]
fn test_receive_frame_checks_its_own_checksum() {
    let schema = load_from_str(HOLDING_REGS).unwrap();
    let mut protocol = Protocol::new(schema, CallbackLogger::disabled()).unwrap();
    let template = protocol.template("holding_regs").cloned().unwrap();
    let device = protocol.devices()[0].clone();
    let message = device.messages()[0].clone();

    for _ in 0..5 {
        let frame = protocol
            .build_frame(&template, Direction::Receive, &message, &device)
            .unwrap();
        assert_eq!(frame.len(), 8);
        assert_eq!(&frame[..2], &[0x11, 0x04]);
        assert!(protocol.validate(&frame).unwrap());
    }
}

#[test]
fn test_read_holding_validation_scenario() {
    let (logger, records) = CallbackLogger::buffered();
    let checksum = Checksum::new(
        ChecksumAlgorithm::Crc16,
        Conversion::new(TranscodeMode::Hex, logger.clone()),
        logger,
    );

    let mut frame = vec![0x01, 0x03, 0x00, 0x6B, 0x00, 0x03];
    frame.extend_from_slice(&crc16(&frame).to_be_bytes());
    assert_eq!(&frame[6..], &[0x74, 0x17]);
    assert!(checksum.validate(&frame, "", "").unwrap());

    frame[6] ^= 0xFF;
    assert!(!checksum.validate(&frame, "", "").unwrap());

    let records = records.lock().unwrap();
    let (_, warning) = records
        .iter()
        .find(|(level, _)| *level == LogLevel::Warn)
        .unwrap();
    assert!(warning.contains("7417"));
    assert!(warning.contains("8B17"));
}

#[test]
fn test_ascii_schema_run() {
    let schema = load_from_path(schema_path("modbus_ascii.json")).unwrap();
    let options = RunOptions::new().with_rounds(4).with_strict_ascii(true);
    let mut protocol = Protocol::from_schema(schema, options, CallbackLogger::disabled()).unwrap();

    let report = protocol.run().unwrap();
    assert_eq!(report.stats.transactions, 4);
    assert!(report.is_success());

    let transmit = protocol.devices()[0].messages()[0]
        .byte_buffer()
        .cloned()
        .unwrap();
    // ':' 01 04 0008 0002 LRC CR LF, two characters per byte
    assert_eq!(transmit.len(), 2 * 10);
    assert!(transmit.starts_with(b"3A0104"));
    assert!(transmit.ends_with(b"0D0A"));
    assert!(transmit.iter().all(u8::is_ascii_hexdigit));

    let body = [0x01, 0x04, 0x00, 0x08, 0x00, 0x02];
    let expected = format!("{:02X}", lrc(&body));
    assert_eq!(&transmit[14..16], expected.as_bytes());
}

#[test]
fn test_rtu_schema_run() {
    let schema = load_from_path(schema_path("modbus_rtu.json")).unwrap();
    let (logger, records) = CallbackLogger::buffered();
    let options = RunOptions::new().with_rounds(3).with_seed(1);
    let mut protocol = Protocol::from_schema(schema, options, logger).unwrap();

    let report = protocol.run().unwrap();
    assert_eq!(report.stats.transactions, 6);
    assert_eq!(report.stats.successes, 6);

    let records = records.lock().unwrap();
    let tx_lines = records
        .iter()
        .filter(|(level, msg)| *level == LogLevel::Info && msg.starts_with("Simulated TX: "))
        .count();
    assert_eq!(tx_lines, 6);
    assert!(records
        .iter()
        .any(|(_, msg)| msg.starts_with("Statistics: Elapsed time=")));
    assert!(records
        .iter()
        .any(|(_, msg)| msg == "Simulated TX: 1103006B00037687"));
}

#[test]
fn test_load_schema_from_temp_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(HOLDING_REGS.as_bytes()).unwrap();

    let mut protocol = Protocol::load(
        file.path(),
        RunOptions::new().with_rounds(2),
        CallbackLogger::disabled(),
    )
    .unwrap();
    assert_eq!(protocol.run().unwrap().stats.successes, 2);
}

#[test]
fn test_missing_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_from_path(dir.path().join("absent.json"));
    assert!(matches!(result, Err(FrameError::Io(_))));
}

#[test]
fn test_unknown_checksum_run_still_validates() {
    let json = HOLDING_REGS.replace(
        "\"prototype\"",
        "\"checksum_calculation\": \"SUM8\", \"prototype\"",
    );
    let schema = load_from_str(&json).unwrap();
    let mut protocol = Protocol::from_schema(
        schema,
        RunOptions::new().with_rounds(1),
        CallbackLogger::disabled(),
    )
    .unwrap();
    assert_eq!(protocol.checksum().size(), 0);
    assert!(protocol.run().unwrap().is_success());
}
