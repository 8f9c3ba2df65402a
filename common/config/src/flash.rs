// Licensed under the Apache-2.0 license

//! Fixed flash layout for the flat firmware image.

/// Total SPI flash capacity; the last 4 bytes hold the checksum trailer.
pub const FLASH_SIZE: usize = 1024 * 1024;

/// Byte value of erased flash, used for all padding.
pub const ERASE_FILL: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRegionSpec {
    pub name: &'static str,
    /// Declared capacity in bytes; region contents are padded up to this.
    pub size: usize,
}

pub const APPLICATION_REGION: FlashRegionSpec = FlashRegionSpec {
    name: "application",
    size: 768 * 1024,
};

pub const BASEBAND_REGION: FlashRegionSpec = FlashRegionSpec {
    name: "baseband",
    size: 192 * 1024,
};

/// Region order in flash. The assembler lays these out back to back
/// starting at offset zero.
pub const FLASH_REGIONS: &[FlashRegionSpec] = &[APPLICATION_REGION, BASEBAND_REGION];
