//! The block compression algorithm.
//!
//! Duplicates are found through a flat positions-by-hash table with a
//! single cell per hash. That trades some ratio for fixed memory usage and
//! a completely predictable encoding loop: one probe per input position,
//! no chain walking, no lazy parsing.

use std::cmp;
use std::io::Write;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt, LE};
use fehler::throws;

use super::MAX_BLOCK_SIZE;

type Error = std::io::Error;

/// Number of slots in the position table.
///
/// Every slot holds the most recent position whose leading four bytes
/// hashed to it; older positions are simply overwritten.
const TABLE_SIZE: usize = 1 << HASHLOG;
const HASHLOG: usize = 16;
/// Matches shorter than this cost more to encode than to copy literally.
const MINMATCH: usize = 4;
/// Both the match length and the backwards offset must fit in 16 bits.
const MAX_MATCH: usize = 0xFFFF;
const MAX_OFFSET: usize = 0xFFFF;
/// Slot value meaning "nothing recorded here since the last reset".
const EMPTY: u32 = u32::MAX;

/// Worst-case compressed size for `input_len` bytes of input.
///
/// Destinations passed to the block compressor must be at least this
/// large; incompressible data grows by one extension byte per 255
/// literals plus a constant for the token and trailing slack.
pub fn compress_bound(input_len: usize) -> usize {
    input_len + input_len / 255 + 16
}

fn hash(sequence: u32) -> usize {
    (sequence.wrapping_mul(2654435761) >> (32 - HASHLOG)) as usize & (TABLE_SIZE - 1)
}

/// The match finder's positions-by-hash arena.
///
/// 65,536 32-bit slots, 256 KiB total. A writer keeps one of these for its
/// entire lifetime; [`reset`](PositionTable::reset) refills it with the
/// sentinel instead of reallocating. A valid slot always holds a position
/// strictly below the position currently being scanned.
pub struct PositionTable {
    slots: Box<[u32]>,
}

impl Default for PositionTable {
    fn default() -> Self {
        PositionTable { slots: vec![EMPTY; TABLE_SIZE].into_boxed_slice() }
    }
}

impl PositionTable {
    /// Forget every recorded position.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = EMPTY;
        }
    }

    /// Record `pos` for `sequence` and return what the slot held before.
    fn replace(&mut self, sequence: u32, pos: usize) -> u32 {
        let slot = &mut self.slots[hash(sequence)];
        let previous = *slot;
        *slot = pos as u32;
        previous
    }
}

/// Compress a single block of at most [`MAX_BLOCK_SIZE`] bytes.
///
/// Writes the encoded sequence stream to `writer` and nothing else: no
/// length prefix, no framing. An empty input produces no output at all.
/// The destination must be able to absorb [`compress_bound`] bytes; a
/// writer that refuses the excess makes its error surface here.
#[throws]
pub fn compress_block<W: Write>(input: &[u8], table: &mut PositionTable, mut writer: W) {
    assert!(input.len() <= MAX_BLOCK_SIZE, "block larger than 4 MiB");

    table.reset();

    let mut cursor = 0;
    let mut anchor = 0;
    while cursor + MINMATCH <= input.len() {
        let sequence = LittleEndian::read_u32(&input[cursor..]);
        let candidate = table.replace(sequence, cursor);

        if candidate == EMPTY || cursor - candidate as usize > MAX_OFFSET {
            cursor += 1;
            continue;
        }
        let candidate = candidate as usize;

        // the table may produce hash collisions, so the probe only counts
        // if at least MINMATCH bytes actually compare equal
        let limit = cmp::min(input.len() - cursor, MAX_MATCH);
        let match_len = count_matching_bytes(&input[cursor..cursor + limit], &input[candidate..]);
        if match_len < MINMATCH {
            cursor += 1;
            continue;
        }

        let offset = (cursor - candidate) as u16;
        write_group(&mut writer, &input[anchor..cursor], offset, match_len - MINMATCH)?;

        cursor += match_len;
        anchor = cursor;
    }

    if anchor < input.len() {
        write_literal_run(&mut writer, &input[anchor..])?;
    }
}

/// Count how many leading bytes of `a` and `b` are equal.
///
/// `b` may overlap the region `a` was sliced from; comparing byte by byte
/// keeps that well-defined (a self-overlapping match is just a run).
fn count_matching_bytes(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|&(x, y)| x == y).count()
}

/// One full sequence: token, literals, offset, match length.
#[throws]
fn write_group<W: Write>(writer: &mut W, literals: &[u8], offset: u16, match_extra: usize) {
    let mut token = 0;
    write_length_head(&mut token, 4, literals.len());
    write_length_head(&mut token, 0, match_extra);

    writer.write_u8(token)?;
    write_length_tail(writer, literals.len())?;
    writer.write_all(literals)?;
    writer.write_u16::<LE>(offset)?;
    write_length_tail(writer, match_extra)?;
}

/// The trailing sequence carries literals only: no offset, no match.
#[throws]
fn write_literal_run<W: Write>(writer: &mut W, literals: &[u8]) {
    let mut token = 0;
    write_length_head(&mut token, 4, literals.len());

    writer.write_u8(token)?;
    write_length_tail(writer, literals.len())?;
    writer.write_all(literals)?;
}

fn write_length_head(token: &mut u8, shift: usize, value: usize) {
    *token |= (cmp::min(value, 0xF) as u8) << shift;
}

/// Values of 15 and above continue past the token nibble: a run of 0xFF
/// bytes, then one byte below 0xFF, all summed up by the decoder.
#[throws]
fn write_length_tail<W: Write>(writer: &mut W, mut value: usize) {
    if value < 0xF {
        return;
    }

    value -= 0xF;
    while value >= 0xFF {
        writer.write_u8(0xFF)?;
        value -= 0xFF;
    }
    writer.write_u8(value as u8)?;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(input: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        compress_block(input, &mut PositionTable::default(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn empty_input_writes_nothing() {
        assert!(compress(b"").is_empty());
    }

    #[test]
    fn short_input_is_a_literal_run() {
        assert_eq!(compress(b"a49"), [0x30, b'a', b'4', b'9']);
    }

    #[test]
    fn zero_run_is_one_literal_then_a_match() {
        // the first zero has nothing to match against; the second matches
        // it at offset 1 and the run extends over the remaining 255 bytes
        assert_eq!(compress(&[0u8; 256]), [0x1F, 0x00, 0x01, 0x00, 0xEC]);
    }

    #[test]
    fn incompressible_input_becomes_a_literal_run() {
        // every four-byte window starts with a distinct byte, so nothing
        // can ever match and the whole input ends up as one literal run
        let input: Vec<u8> = (0u8..=255).collect();
        let mut expected = vec![0xF0, 0xF1];
        expected.extend_from_slice(&input);
        let compressed = compress(&input);
        assert_eq!(compressed, expected);
        assert!(compressed.len() <= compress_bound(input.len()));
    }
}
