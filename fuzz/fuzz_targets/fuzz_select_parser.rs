#![no_main]

use libfuzzer_sys::fuzz_target;
use vitrine_core::query::Parser;

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = std::str::from_utf8(data) else {
        return;
    };
    if spec.len() > 10_000 {
        return;
    }

    // Must reject, never panic
    if let Ok(mut parser) = Parser::new(spec) {
        let _ = parser.parse();
    }
});
