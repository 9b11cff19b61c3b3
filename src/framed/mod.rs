//! The LZ4 frame format.
//!
//! An lz4-compressed file typically consists of a single frame.
//!
//! The frame format is self-terminating: a frame ends with an explicit
//! end-mark, so it can be embedded without an outer length prefix and
//! frames can be concatenated back to back.
//!
//! This implementation covers the independent-blocks subset of the
//! format. The writer never emits the optional header fields; the reader
//! parses them but refuses frames that declare any of them.

mod compress;
mod decompress;
mod header;

/// The four magic bytes at the start of every LZ4 frame (little endian).
pub const MAGIC: u32 = 0x184D2204;
/// The frame format sets the high bit of a block's length field when the
/// payload is stored verbatim instead of compressed.
const UNCOMPRESSED: u32 = 1 << 31;

pub use compress::*;
pub use decompress::*;
pub use header::ParseError;
