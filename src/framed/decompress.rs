use byteorder::{LE, ReadBytesExt};
use std::cmp;
use std::hash::Hasher;
use std::io::{self, BufRead, ErrorKind, Read};
use twox_hash::XxHash32;
use thiserror::Error;
use fehler::{throw, throws};

use super::{MAGIC, UNCOMPRESSED};
use super::header::{self, BlockDescriptor, Flags};
use crate::raw::{self, compress_bound};

/// Errors when decompressing an LZ4 frame.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("error reading from the input you gave me")]
    InputError(#[from] io::Error),
    #[error("the raw LZ4 decompression failed (data corruption?)")]
    CodecError(#[from] raw::DecodeError),
    #[error("invalid header")]
    HeaderParseError(#[from] header::ParseError),
    #[error("wrong magic number in file header: {0:08x}")]
    WrongMagic(u32),
    #[error("the header checksum was invalid")]
    HeaderChecksumFail,
    #[error("this decoder only supports frames with independent blocks")]
    DependentBlocks,
    #[error("this decoder does not support the optional {0} feature")]
    UnsupportedFeature(&'static str),
    #[error("stream declares a block larger than the frame's block maximum size")]
    BlockSizeOverflow,
}
type Error = DecompressionError; // do it this way for better docs

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// Read an LZ4-compressed frame, block by block.
pub struct LZ4FrameReader<R: Read> {
    reader: R,
    block_maxsize: usize,
    read_buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> LZ4FrameReader<R> {
    /// Parse and validate the frame header.
    ///
    /// Frames that use a feature this decoder does not support are
    /// rejected here, before a single block record is consumed.
    #[throws]
    pub fn new(mut reader: R) -> Self {
        let magic = reader.read_u32::<LE>()?;
        if magic != MAGIC {
            throw!(Error::WrongMagic(magic));
        }

        let flags_byte = reader.read_u8()?;
        let flags = Flags::parse(flags_byte)?;
        let bd = BlockDescriptor::parse(reader.read_u8()?)?;
        let block_maxsize = bd.block_maxsize()?;

        let mut hasher = XxHash32::with_seed(0);
        hasher.write_u8(flags_byte);
        hasher.write_u8(bd.0);

        // the wire format may carry these fields even though such frames
        // are refused below
        if flags.content_size() {
            hasher.write_u64(reader.read_u64::<LE>()?);
        }
        if flags.dictionary_id() {
            hasher.write_u32(reader.read_u32::<LE>()?);
        }

        if !flags.independent_blocks() {
            throw!(Error::DependentBlocks);
        }
        if flags.block_checksums() {
            throw!(Error::UnsupportedFeature("block checksum"));
        }
        if flags.content_size() {
            throw!(Error::UnsupportedFeature("content size"));
        }
        if flags.content_checksum() {
            throw!(Error::UnsupportedFeature("content checksum"));
        }
        if flags.dictionary_id() {
            throw!(Error::UnsupportedFeature("dictionary id"));
        }

        let header_checksum_desired = reader.read_u8()?;
        let header_checksum_actual = (hasher.finish() >> 8) as u8;
        if header_checksum_desired != header_checksum_actual {
            throw!(Error::HeaderChecksumFail);
        }

        LZ4FrameReader {
            reader,
            block_maxsize,
            // compressed payloads of incompressible blocks may slightly
            // exceed the block maximum size, so the scratch buffer is
            // sized to the encoder's worst case
            read_buf: Vec::with_capacity(compress_bound(block_maxsize)),
            finished: false,
        }
    }

    /// Maximum decoded size of a single block in this frame.
    pub fn block_size(&self) -> usize {
        self.block_maxsize
    }

    pub fn into_read(self) -> LZ4FrameIoReader<R> {
        LZ4FrameIoReader {
            buffer: Vec::with_capacity(self.block_size()),
            bytes_taken: 0,
            frame_reader: self,
        }
    }

    /// Read the next block record and append its decoded payload to
    /// `output`. Appends nothing once the end-mark has been seen.
    #[throws]
    pub fn decode_block(&mut self, output: &mut Vec<u8>) {
        assert!(output.is_empty(), "You must pass an empty buffer to this interface.");

        if self.finished {
            return;
        }

        let reader = &mut self.reader;

        let block_length = reader.read_u32::<LE>()?;
        if block_length == 0 {
            self.finished = true;
            return;
        }

        let is_compressed = block_length & UNCOMPRESSED == 0;
        let block_length = (block_length & !UNCOMPRESSED) as usize;

        let scratch_limit = if is_compressed {
            compress_bound(self.block_maxsize)
        } else {
            self.block_maxsize
        };
        if block_length > scratch_limit {
            throw!(Error::BlockSizeOverflow);
        }

        let buf = &mut self.read_buf;
        buf.resize(block_length, 0);
        reader.read_exact(buf.as_mut_slice())?;

        if is_compressed {
            raw::decompress_block(buf, output, self.block_maxsize)?;
        } else {
            output.extend_from_slice(buf);
        }
    }
}

/// Wrapper around [`LZ4FrameReader`] that implements `Read` and `BufRead`.
///
/// Decoded bytes the caller's buffer could not absorb stay parked here
/// and are handed out first on later calls; the next block record is only
/// touched once the previous block is fully drained. End of stream is
/// reported once the end-mark has been seen and the carry-over is empty.
pub struct LZ4FrameIoReader<R: Read> {
    frame_reader: LZ4FrameReader<R>,
    bytes_taken: usize,
    buffer: Vec<u8>,
}

impl<R: Read> Read for LZ4FrameIoReader<R> {
    #[throws(io::Error)]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mybuf = self.fill_buf()?;
        let bytes_to_take = cmp::min(mybuf.len(), buf.len());
        buf[..bytes_to_take].copy_from_slice(&mybuf[..bytes_to_take]);
        self.consume(bytes_to_take);
        bytes_to_take
    }
}

impl<R: Read> BufRead for LZ4FrameIoReader<R> {
    #[throws(io::Error)]
    fn fill_buf(&mut self) -> &[u8] {
        if self.bytes_taken == self.buffer.len() {
            self.buffer.clear();
            self.frame_reader.decode_block(&mut self.buffer)?;
            self.bytes_taken = 0;
        }
        &self.buffer[self.bytes_taken..]
    }

    fn consume(&mut self, amt: usize) {
        self.bytes_taken += amt;
        assert!(
            self.bytes_taken <= self.buffer.len(),
            "You consumed more bytes than I even gave you!"
        );
    }
}

/// Convenience wrapper around [`LZ4FrameReader`] that reads everything into a vector and returns it.
#[throws]
pub fn decompress_frame<R: Read>(reader: R) -> Vec<u8> {
    let mut plaintext = Vec::new();
    LZ4FrameReader::new(reader)?.into_read().read_to_end(&mut plaintext)?;
    plaintext
}
