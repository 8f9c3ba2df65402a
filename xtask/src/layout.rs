// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use fw_config::linker::{parse_memory_regions, REGION_PREFIX};
use fw_config::{builtin_app_regions, AppMemoryLayout};
use std::path::Path;

/// Validates the declared external-app memory layout, either from the
/// given linker script or from the built-in production table.
///
/// Findings are warnings by design: the validator is run on every build
/// and must not turn a heuristic disagreement into a broken build. A
/// caller that wants a hard failure can grep the summary.
pub fn validate_address_layout(linker_script: Option<&Path>) -> Result<()> {
    let regions = match linker_script {
        Some(path) => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            parse_memory_regions(&script, REGION_PREFIX)
        }
        None => builtin_app_regions(),
    };

    let layout = AppMemoryLayout::default();
    let report = layout.validate(&regions);
    if report.ok() {
        println!("address layout OK ({} regions)", regions.len());
    } else {
        for violation in &report.violations {
            log::warn!("{}", violation);
        }
        println!(
            "address layout: {} violation(s) in {} region(s)",
            report.violations.len(),
            regions.len()
        );
    }
    Ok(())
}
