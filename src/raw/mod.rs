//! The raw LZ4 block format.
//!
//! Using this directly saves you the overhead of framing (~11 bytes) but you
//! lose the container's features, most notably the uncompressed-payload
//! escape hatch and the end-mark that tells a reader where to stop.
//! A block stands entirely on its own: matches may only reference bytes
//! decoded earlier in the same block.

mod compress;
mod decompress;

/// Largest block the codec will accept, compressed or not.
pub const MAX_BLOCK_SIZE: usize = 4 * 1024 * 1024;

pub use compress::*;
pub use decompress::*;
