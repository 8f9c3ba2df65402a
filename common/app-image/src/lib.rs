// Licensed under the Apache-2.0 license

//! Binary formats shared between the packaging tools and the on-device
//! loader: the external-app artifact header, the tagged-chunk companion
//! container, and the word-sum checksum trailer.

#![cfg_attr(not(test), no_std)]

use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const APP_HEADER_SIZE: usize = core::mem::size_of::<ExternalAppHeader>();
pub const APP_FORMAT_VERSION: u32 = 0x0000_0001;
pub const NO_COMPANION_TAG: [u8; 4] = [0; 4];

/// Fixed 80-byte header at the start of every external-app image.
///
/// `load_address` and `companion_offset` are placeholders in the linked
/// image and are patched during composition. The metadata block (name,
/// icon, menu placement) is consumed by the loader only and is opaque to
/// the packaging pipeline.
#[repr(C)]
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct ExternalAppHeader {
    pub load_address: U32<LittleEndian>,
    pub entry_word: U32<LittleEndian>,
    pub format_version: U32<LittleEndian>,
    pub metadata: [u8; 60],
    pub companion_tag: [u8; 4],
    pub companion_offset: U32<LittleEndian>,
}

impl ExternalAppHeader {
    pub fn has_companion(&self) -> bool {
        self.companion_tag != NO_COMPANION_TAG
    }

    /// Base of the compile-time placeholder window: the high half of the
    /// entry word, by build convention.
    pub fn search_window_base(&self) -> u32 {
        self.entry_word.get() & 0xFFFF_0000
    }
}

pub const CHUNK_HEADER_SIZE: usize = 8;

/// A chunk length field ran past the end of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedChunk {
    pub offset: usize,
}

impl core::fmt::Display for TruncatedChunk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "truncated chunk at offset {:#x}", self.offset)
    }
}

/// Walks a `tag | length | payload` chunk container and returns the
/// payload of the first chunk matching `tag`, or `None` if the container
/// ends cleanly without one.
pub fn find_chunk<'a>(
    container: &'a [u8],
    tag: &[u8; 4],
) -> Result<Option<&'a [u8]>, TruncatedChunk> {
    let mut offset = 0;
    while offset < container.len() {
        if container.len() - offset < CHUNK_HEADER_SIZE {
            return Err(TruncatedChunk { offset });
        }
        let length = u32::from_le_bytes(container[offset + 4..offset + 8].try_into().unwrap());
        let payload_start = offset + CHUNK_HEADER_SIZE;
        let payload_end = payload_start
            .checked_add(length as usize)
            .ok_or(TruncatedChunk { offset })?;
        if payload_end > container.len() {
            return Err(TruncatedChunk { offset });
        }
        if &container[offset..offset + 4] == tag {
            return Ok(Some(&container[payload_start..payload_end]));
        }
        offset = payload_end;
    }
    Ok(None)
}

/// Wrapping sum of all little-endian u32 words. Trailing bytes beyond the
/// last whole word are ignored; artifacts are word-aligned by construction.
pub fn word_sum(data: &[u8]) -> u32 {
    data.chunks_exact(4).fold(0u32, |acc, word| {
        acc.wrapping_add(u32::from_le_bytes(word.try_into().unwrap()))
    })
}

/// Trailer bytes that bring the artifact's word-sum to 0 mod 2^32.
pub fn checksum_trailer(data: &[u8]) -> [u8; 4] {
    word_sum(data).wrapping_neg().to_le_bytes()
}

/// True iff `data` is word-aligned and its word-sum (trailer included)
/// is zero.
pub fn verify_checksum(data: &[u8]) -> bool {
    data.len() % 4 == 0 && word_sum(data) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn header_is_80_bytes_with_fixed_tag_offsets() {
        assert_eq!(APP_HEADER_SIZE, 80);
        assert_eq!(core::mem::offset_of!(ExternalAppHeader, companion_tag), 72);
        assert_eq!(
            core::mem::offset_of!(ExternalAppHeader, companion_offset),
            76
        );
    }

    #[test]
    fn header_parse_and_patch() {
        let mut raw = [0u8; APP_HEADER_SIZE];
        raw[4..8].copy_from_slice(&0xADB1_0109u32.to_le_bytes());
        raw[72..76].copy_from_slice(b"BASB");

        let mut header = ExternalAppHeader::read_from_bytes(&raw[..]).unwrap();
        assert_eq!(header.search_window_base(), 0xADB1_0000);
        assert!(header.has_companion());

        header.load_address = 0x1008_0000u32.into();
        let bytes = header.as_bytes();
        assert_eq!(&bytes[0..4], &0x1008_0000u32.to_le_bytes());
    }

    #[test]
    fn find_chunk_walks_past_unrelated_tags() {
        let mut container = chunk(b"WFAX", &[1, 2, 3, 4]);
        container.extend_from_slice(&chunk(b"BASB", &[9, 9, 9, 9, 8, 8, 8, 8]));

        assert_eq!(
            find_chunk(&container, b"BASB").unwrap(),
            Some(&[9, 9, 9, 9, 8, 8, 8, 8][..])
        );
        assert_eq!(find_chunk(&container, b"NONE").unwrap(), None);
    }

    #[test]
    fn find_chunk_rejects_truncated_container() {
        let mut container = chunk(b"BASB", &[1, 2, 3, 4]);
        container.extend_from_slice(b"WFAX");
        container.extend_from_slice(&100u32.to_le_bytes()); // runs past the end

        let err = find_chunk(&container, b"NONE").unwrap_err();
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn checksum_trailer_zeroes_the_word_sum() {
        let mut data = vec![0x12, 0x34, 0x56, 0x78, 0xFF, 0xFF, 0xFF, 0xFF];
        let trailer = checksum_trailer(&data);
        data.extend_from_slice(&trailer);
        assert_eq!(word_sum(&data), 0);
        assert!(verify_checksum(&data));
    }

    #[test]
    fn verify_rejects_unaligned_buffers() {
        assert!(!verify_checksum(&[0, 0, 0]));
    }
}
