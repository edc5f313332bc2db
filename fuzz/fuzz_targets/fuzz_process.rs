#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(record) = ubl_monetary::process(data) {
        assert_eq!(
            record.corrected_payable,
            record.stated_payable - record.retention.amount
        );
    }
});
