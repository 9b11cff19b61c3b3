#![forbid(unsafe_code)]
#![allow(non_upper_case_globals)]

//! A streaming codec for a subset of the LZ4 frame format.
//!
//! The crate is split the same way the format is:
//!
//! * [`raw`] implements the block format: a greedy single-probe match
//!   finder on the compression side and a bounds-checked sequence decoder
//!   on the decompression side. Blocks are self-contained, at most 4 MiB,
//!   and never reference data outside themselves.
//! * [`framed`] wraps blocks into the recognizable LZ4 container: magic
//!   number, flag and block-descriptor bytes, header checksum, length
//!   prefixes and the terminating end-mark. This is the layer you want:
//!   [`framed::LZ4FrameWriter`] implements [`std::io::Write`] and
//!   [`framed::LZ4FrameReader`] turns into a [`std::io::Read`].
//!
//! Only independent blocks are supported. Frames declaring block
//! checksums, a content checksum, a content size or a dictionary id are
//! rejected on read and never produced on write.

pub mod raw;
pub mod framed;

pub use framed::{
    decompress_frame, CompressionError, CompressionSettings, DecompressionError, LZ4FrameIoReader,
    LZ4FrameReader, LZ4FrameWriter,
};
