#![no_main]
use dirpack_core::{Header, HEADER_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(Some(header)) = Header::parse(data) {
        // Anything that parses must survive a re-parse of its own bytes
        assert_eq!(header.as_bytes(), &data[..HEADER_SIZE]);
        assert!(Header::parse(header.as_bytes()).is_ok());
    }
});
