#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = ubl_monetary::parse_amount(s);
        let _ = ubl_monetary::parse_xml_decimal(s);
    }
});
