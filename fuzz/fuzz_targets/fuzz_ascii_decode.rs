#![no_main]

use libfuzzer_sys::fuzz_target;
use modbus_schema::{CallbackLogger, Checksum, ChecksumAlgorithm, Conversion, TranscodeMode};

fuzz_target!(|data: &[u8]| {
    let conversion = Conversion::new(TranscodeMode::Ascii, CallbackLogger::disabled());

    // Inbound decoding must fail cleanly, never panic
    if let Ok(binary) = conversion.from_wire(data, ":", "\r\n") {
        assert!(binary.len() <= data.len());
    }

    for algorithm in [ChecksumAlgorithm::Lrc, ChecksumAlgorithm::Crc16] {
        let checksum = Checksum::new(algorithm, conversion.clone(), CallbackLogger::disabled());
        let _ = checksum.validate(data, ":", "\r\n");
    }
});
