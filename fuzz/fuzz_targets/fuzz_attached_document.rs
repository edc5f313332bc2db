#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Escaped markup inside a wrapper takes the unwrap path.
        let escaped = s
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        let wrapper = format!(
            "<AttachedDocument><cac:Attachment><cac:ExternalReference><cbc:Description>{escaped}</cbc:Description></cac:ExternalReference></cac:Attachment></AttachedDocument>"
        );
        let _ = ubl_monetary::xml::ParsedDocument::load(wrapper.as_bytes());
    }
});
