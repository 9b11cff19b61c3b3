#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_angst::framed::LZ4FrameReader;
use std::io::{Cursor, Read};

fuzz_target!(|data: &[u8]| {
    if let Ok(reader) = LZ4FrameReader::new(Cursor::new(data)) {
        let mut reader = reader.into_read();
        let mut buffer = vec![0; 4096];
        while let Ok(n) = reader.read(&mut buffer) {
            if n == 0 {
                break;
            }
        }
    }
});
