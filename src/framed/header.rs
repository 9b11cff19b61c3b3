#![allow(non_upper_case_globals)]

use thiserror::Error;
use fehler::{throw, throws};
use bitflags::bitflags;

bitflags! {
    /// Feature bits of the FLG byte, named after the frame format's own
    /// vocabulary. Bits 6..=7 carry the version and bit 1 is reserved;
    /// neither is representable here, [`Flags::parse`] screens them out.
    pub struct Flags: u8 {
        const IndependentBlocks = 1 << 5;
        const BlockChecksums    = 1 << 4;
        const ContentSize       = 1 << 3;
        const ContentChecksum   = 1 << 2;
        const DictionaryId      = 1 << 0;
    }
}

/// The one FLG bit with no assigned meaning; it must stay clear.
const RESERVED_FLG_BIT: u8 = 1 << 1;

/// Mask of every BD bit outside the block maximum size selector.
const RESERVED_BD_BITS: u8 = !(0b111 << 4);

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("frame version {0} not supported")]
    UnsupportedVersion(u8),
    #[error("reserved bit set in the FLG byte")]
    ReservedFlagBitsSet,
    #[error("reserved bits set in the BD byte")]
    ReservedBdBitsSet,
    #[error("block maximum size selector {0} is reserved")]
    UnimplementedBlocksize(u8),
}

impl Flags {
    /// Screen the version and reserved bits, then keep the feature bits.
    #[throws(ParseError)]
    pub fn parse(byte: u8) -> Self {
        match byte >> 6 {
            1 => {}
            version => throw!(ParseError::UnsupportedVersion(version)),
        }
        if byte & RESERVED_FLG_BIT != 0 {
            throw!(ParseError::ReservedFlagBitsSet);
        }

        Flags::from_bits_truncate(byte)
    }

    pub fn independent_blocks(&self) -> bool {
        self.contains(Flags::IndependentBlocks)
    }

    pub fn block_checksums(&self) -> bool {
        self.contains(Flags::BlockChecksums)
    }

    pub fn content_size(&self) -> bool {
        self.contains(Flags::ContentSize)
    }

    pub fn content_checksum(&self) -> bool {
        self.contains(Flags::ContentChecksum)
    }

    pub fn dictionary_id(&self) -> bool {
        self.contains(Flags::DictionaryId)
    }
}

/// The BD byte. The block maximum size selector sits in bits 4..=6; every
/// other bit is reserved and must stay clear.
pub struct BlockDescriptor(pub u8);

impl BlockDescriptor {
    /// Encode a block maximum size, if it is one the format can express.
    pub fn new(block_maxsize: usize) -> Option<Self> {
        let selector = block_maxsize.trailing_zeros().saturating_sub(8) / 2;
        if !(4..8).contains(&selector) {
            return None;
        }
        let bd = BlockDescriptor((selector as u8) << 4);
        match bd.block_maxsize() {
            Ok(size) if size == block_maxsize => Some(bd),
            _ => None,
        }
    }

    #[throws(ParseError)]
    pub fn parse(byte: u8) -> Self {
        if byte & RESERVED_BD_BITS != 0 {
            throw!(ParseError::ReservedBdBitsSet);
        }
        BlockDescriptor(byte)
    }

    #[throws(ParseError)]
    pub fn block_maxsize(&self) -> usize {
        let selector = self.0 >> 4;
        match selector {
            4..=7 => 1 << (selector * 2 + 8),
            _ => throw!(ParseError::UnimplementedBlocksize(selector)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_map_to_the_four_legal_sizes() {
        for &(selector, size) in
            &[(4u8, 64 * 1024), (5, 256 * 1024), (6, 1024 * 1024), (7, 4 * 1024 * 1024)]
        {
            let bd = BlockDescriptor::parse(selector << 4).unwrap();
            assert_eq!(bd.block_maxsize().unwrap(), size);
            assert_eq!(BlockDescriptor::new(size).unwrap().0, selector << 4);
        }
    }

    #[test]
    fn odd_block_sizes_are_refused() {
        assert!(BlockDescriptor::new(0).is_none());
        assert!(BlockDescriptor::new(1).is_none());
        assert!(BlockDescriptor::new(32 * 1024).is_none());
        assert!(BlockDescriptor::new(3 * 1024 * 1024).is_none());
        assert!(BlockDescriptor::new(8 * 1024 * 1024).is_none());
    }

    #[test]
    fn version_and_reserved_bits_are_checked() {
        assert!(Flags::parse(0x60).is_ok());
        assert!(matches!(Flags::parse(0x20), Err(ParseError::UnsupportedVersion(0))));
        assert!(matches!(Flags::parse(0x80), Err(ParseError::UnsupportedVersion(2))));
        assert!(matches!(Flags::parse(0x62), Err(ParseError::ReservedFlagBitsSet)));
        assert!(matches!(BlockDescriptor::parse(0x71), Err(ParseError::ReservedBdBitsSet)));
    }
}
