use byteorder::{LE, WriteBytesExt};
use std::hash::Hasher;
use std::io::{self, ErrorKind, Read, Write};
use std::mem;
use twox_hash::XxHash32;
use thiserror::Error;
use fehler::{throw, throws};

use super::MAGIC;
use super::header::{BlockDescriptor, Flags};
use crate::raw::{compress_block, compress_bound, PositionTable};

/// Errors when compressing an LZ4 frame.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("error reading from the input you gave me")]
    ReadError(io::Error),
    #[error("error writing to the output you gave me")]
    WriteError(#[from] io::Error),
    #[error("the block size you asked for is not supported")]
    InvalidBlockSize,
    #[error("a compressed block outgrew its worst-case sized destination")]
    DestinationTooSmall,
}
type Error = CompressionError; // do it this way for better docs
impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// A builder-style struct that configures compression settings.
/// This is how you compress LZ4 frames.
///
/// Create it using `Default::default()`.
pub struct CompressionSettings {
    block_size: usize,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self { block_size: 4 * 1024 * 1024 }
    }
}

impl CompressionSettings {
    /// Only valid values are 4 MiB, 1 MiB, 256 KiB, 64 KiB.
    ///
    /// The default block size is 4 MiB.
    pub fn block_size(&mut self, v: usize) -> &mut Self {
        self.block_size = v;
        self
    }

    /// Wrap `writer` into a streaming [`LZ4FrameWriter`].
    #[throws]
    pub fn writer<W: Write>(&self, writer: W) -> LZ4FrameWriter<W> {
        let bd = BlockDescriptor::new(self.block_size).ok_or(Error::InvalidBlockSize)?;
        LZ4FrameWriter {
            inner: Some(writer),
            block_size: self.block_size,
            bd_byte: bd.0,
            table: PositionTable::default(),
            out_buffer: vec![0u8; compress_bound(self.block_size)],
            header_written: false,
        }
    }

    /// Compress everything `reader` yields into a single frame, always
    /// feeding the encoder full-size blocks, and hand `writer` back once
    /// the end-mark is out.
    #[throws]
    pub fn compress<R: Read, W: Write>(&self, mut reader: R, writer: W) -> W {
        let mut frame_writer = self.writer(writer)?;
        let mut block = Vec::with_capacity(self.block_size);
        loop {
            block.clear();

            // We basically want read_exact semantics, except at the end.
            // Sadly read_exact specifies the buffer contents to be undefined
            // on error, so we have to use this construction instead.
            reader
                .by_ref()
                .take(self.block_size as u64)
                .read_to_end(&mut block)
                .map_err(Error::ReadError)?;
            if block.is_empty() {
                break;
            }

            frame_writer.emit_header()?;
            frame_writer.emit_block(&block)?;
        }
        frame_writer.finish()?
    }
}

/// Streaming frame compressor around any [`Write`].
///
/// Every `write` call is sliced into chunks of at most the configured
/// block size and each chunk becomes one block record on the spot;
/// nothing is buffered between calls, so many small writes produce many
/// small blocks. The frame header goes out with the first payload byte.
///
/// Remember to call [`finish`](LZ4FrameWriter::finish): a frame without
/// its end-mark is truncated. Dropping the writer finalizes the frame
/// too, but has to swallow any error doing so.
pub struct LZ4FrameWriter<W: Write> {
    /// Taken by `finish`, so `Drop` knows not to finalize twice.
    inner: Option<W>,
    block_size: usize,
    bd_byte: u8,
    table: PositionTable,
    out_buffer: Vec<u8>,
    header_written: bool,
}

impl<W: Write> LZ4FrameWriter<W> {
    /// Emit the 7-byte frame header. Does nothing the second time.
    #[throws]
    fn emit_header(&mut self) {
        if self.header_written {
            return;
        }

        let version = 1 << 6;
        let flag_byte = version | Flags::IndependentBlocks.bits();

        let mut header = Vec::new();
        header.write_u32::<LE>(MAGIC)?;
        header.write_u8(flag_byte)?;
        header.write_u8(self.bd_byte)?;

        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&header[4..]); // the magic is not covered by the header checksum
        header.write_u8((hasher.finish() >> 8) as u8)?;

        if let Some(writer) = self.inner.as_mut() {
            writer.write_all(&header)?;
        }
        self.header_written = true;
    }

    /// Compress one chunk of at most `block_size` bytes and emit its
    /// length-prefixed block record.
    #[throws]
    fn emit_block(&mut self, chunk: &[u8]) {
        let bound = compress_bound(chunk.len());
        let mut destination = NoPartialWrites(&mut self.out_buffer[..bound]);
        match compress_block(chunk, &mut self.table, &mut destination) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::ConnectionAborted => throw!(Error::DestinationTooSmall),
            Err(e) => throw!(Error::WriteError(e)),
        }
        let written = bound - destination.0.len();

        if let Some(writer) = self.inner.as_mut() {
            writer.write_u32::<LE>(written as u32)?;
            writer.write_all(&self.out_buffer[..written])?;
        }
    }

    /// Emit the header (even if nothing was ever written) and the
    /// end-mark, then hand back the inner writer.
    #[throws]
    pub fn finish(mut self) -> W {
        self.emit_header()?;
        let mut writer = self.inner.take().expect("inner writer already taken");
        writer.write_u32::<LE>(0)?; // end-mark
        writer
    }
}

impl<W: Write> Write for LZ4FrameWriter<W> {
    #[throws(io::Error)]
    fn write(&mut self, buf: &[u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        self.emit_header()?;
        for chunk in buf.chunks(self.block_size) {
            self.emit_block(chunk)?;
        }
        buf.len()
    }

    #[throws(io::Error)]
    fn flush(&mut self) {
        if let Some(writer) = self.inner.as_mut() {
            writer.flush()?;
        }
    }
}

impl<W: Write> Drop for LZ4FrameWriter<W> {
    /// Attempt to finalize the frame on drop. Errors are silently
    /// discarded here; call [`LZ4FrameWriter::finish`] to see them.
    fn drop(&mut self) {
        if self.inner.is_none() {
            return; // finish() already ran
        }
        let _ = self.emit_header();
        if let Some(writer) = self.inner.as_mut() {
            let _ = writer.write_u32::<LE>(0);
        }
    }
}

/// Destination wrapper that takes every write in full or not at all.
///
/// The stock `Write` impl for byte slices accepts as many bytes as still
/// fit before erroring, which splits a multi-byte value near the end of
/// the buffer into per-byte writes with a range check each. A partially
/// written block is discarded anyway, so this wrapper refuses the write
/// outright instead: one length comparison per value, and running out of
/// room becomes an error the block emitter can tell apart from transport
/// failures.
struct NoPartialWrites<'a>(&'a mut [u8]);

impl<'a> Write for NoPartialWrites<'a> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.0.len() < data.len() {
            // only the kind matters; emit_block matches on it
            return Err(ErrorKind::ConnectionAborted.into());
        }

        let (target, rest) = mem::take(&mut self.0).split_at_mut(data.len());
        target.copy_from_slice(data);
        self.0 = rest;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
