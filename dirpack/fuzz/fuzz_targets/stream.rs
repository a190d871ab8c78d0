#![no_main]
use std::io;

use dirpack::ArchiveReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = ArchiveReader::new(data);
    while let Ok(Some(_entry)) = reader.next_entry() {
        let _ = io::copy(&mut reader, &mut io::sink());
    }
});
