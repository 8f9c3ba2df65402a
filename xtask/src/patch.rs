// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use fw_config::AppMemoryLayout;
use std::path::Path;

/// Pure relocation pass over a flat binary, with the canonical window
/// size. No header patching, no companion, no checksum.
pub fn patch_external_app(
    input: &Path,
    output: &Path,
    search_address: u32,
    replace_address: u32,
) -> Result<()> {
    let layout = AppMemoryLayout::default();
    let image = std::fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let patched = fw_packager::relocate(
        &image,
        search_address,
        replace_address,
        layout.max_app_size,
    )?;
    std::fs::write(output, &patched)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!(
        "relocated {} ({} bytes, window {:#010x} -> {:#010x})",
        output.display(),
        patched.len(),
        search_address,
        replace_address
    );
    Ok(())
}
