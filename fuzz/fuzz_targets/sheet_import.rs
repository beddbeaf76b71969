#![no_main]
use libfuzzer_sys::fuzz_target;
use libnetworth::import::parse_sheet;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(batch) = parse_sheet(s) {
            for record in &batch.records {
                for key in record.assets().keys() {
                    assert!(batch.detected_keys.contains(key));
                }
            }
        }
    }
});
