#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_angst::framed::{decompress_frame, CompressionSettings};
use std::io::{Cursor, Write};

fuzz_target!(|data: &[u8]| {
    let mut writer = CompressionSettings::default()
        .block_size(64 * 1024)
        .writer(Vec::new())
        .expect("could not create the frame writer");
    writer.write_all(data).expect("could not compress input data");
    let compressed = writer.finish().expect("could not finish the frame");

    let roundtripped =
        decompress_frame(Cursor::new(&compressed)).expect("could not read back our own frame");
    assert_eq!(roundtripped, data, "round trip changed the data");
});
