#![no_main]

use libfuzzer_sys::fuzz_target;
use vitrine_snapshot::format;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }

    let _ = format::decode(data);
});
