// Licensed under the Apache-2.0 license

use crate::PackError;

/// Rewrites word-aligned 32-bit values in the placeholder window to their
/// runtime equivalents.
///
/// Every little-endian word `W` with
/// `search_address < W < search_address + window_size` becomes
/// `replace_address + (W - search_address)`; everything else passes
/// through untouched. The scan is value-based, not table-based: it relies
/// on the build convention that no other 32-bit constant lands inside the
/// search window.
pub fn relocate(
    image: &[u8],
    search_address: u32,
    replace_address: u32,
    window_size: u32,
) -> Result<Vec<u8>, PackError> {
    if image.len() % 4 != 0 {
        return Err(PackError::Format(format!(
            "image length {} is not a multiple of 4",
            image.len()
        )));
    }
    let window_end = search_address as u64 + window_size as u64;
    let mut out = Vec::with_capacity(image.len());
    for word in image.chunks_exact(4) {
        let value = u32::from_le_bytes(word.try_into().unwrap());
        let patched = if value > search_address && (value as u64) < window_end {
            replace_address.wrapping_add(value - search_address)
        } else {
            value
        };
        out.extend_from_slice(&patched.to_le_bytes());
    }
    Ok(out)
}
