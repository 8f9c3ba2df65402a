// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use fw_config::AppMemoryLayout;
use std::path::Path;

/// Read-only leak scan over any composed binary. Findings are printed;
/// the command succeeds either way.
pub fn scan_for_leaked_addresses(binary: &Path) -> Result<()> {
    let image =
        std::fs::read(binary).with_context(|| format!("cannot read {}", binary.display()))?;
    let layout = AppMemoryLayout::default();

    let findings = fw_packager::scan_for_leaks(&image, &layout);
    for finding in &findings {
        println!(
            "{:#010x} at offset {:#x}",
            finding.value, finding.offset
        );
    }
    println!(
        "{}: {} possible leaked window address(es)",
        binary.display(),
        findings.len()
    );
    Ok(())
}
