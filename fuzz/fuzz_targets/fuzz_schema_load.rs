#![no_main]

use libfuzzer_sys::fuzz_target;
use modbus_schema::{load_from_str, CallbackLogger, Protocol, RunOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(schema) = load_from_str(json) else {
        return;
    };

    // Any schema that loads must build and run without panicking
    let options = RunOptions::new().with_rounds(1).with_seed(0);
    if let Ok(mut protocol) = Protocol::from_schema(schema, options, CallbackLogger::disabled()) {
        let _ = protocol.run();
    }
});
