// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use fw_config::flash::{APPLICATION_REGION, BASEBAND_REGION, FLASH_SIZE};
use fw_config::AppMemoryLayout;
use fw_packager::{assemble, report_leaks, FlashRegion};
use std::path::Path;

/// Builds the flat flash image from the core firmware binaries. Budget
/// violations are fatal; the leak scan and free-space report are
/// informational only.
pub fn assemble_flash_image(
    application_bin: &Path,
    baseband_bin: &Path,
    output_bin: &Path,
) -> Result<()> {
    let application = std::fs::read(application_bin)
        .with_context(|| format!("cannot read {}", application_bin.display()))?;
    let baseband = std::fs::read(baseband_bin)
        .with_context(|| format!("cannot read {}", baseband_bin.display()))?;

    let regions = [
        FlashRegion {
            spec: APPLICATION_REGION,
            data: &application,
        },
        FlashRegion {
            spec: BASEBAND_REGION,
            data: &baseband,
        },
    ];
    let layout = AppMemoryLayout::default();
    let assembly = assemble(&regions, FLASH_SIZE, &layout)?;

    report_leaks("flash image", &assembly.leaks);
    log::info!(
        "flash image free space: {} bytes ({:.1}%)",
        assembly.free_bytes,
        assembly.free_percent()
    );

    std::fs::write(output_bin, &assembly.image)
        .with_context(|| format!("cannot write {}", output_bin.display()))?;
    println!(
        "assembled {} ({} bytes)",
        output_bin.display(),
        assembly.image.len()
    );
    Ok(())
}
