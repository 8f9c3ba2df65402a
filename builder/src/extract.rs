// Licensed under the Apache-2.0 license

use crate::PackError;
use std::path::Path;
use std::process::Command;

/// Pulls one named section out of a linked application image as a flat
/// binary, via the toolchain's objcopy.
///
/// objcopy writes the section to `out_path`; the bytes are read back and
/// returned. An absent or empty section is a tool failure, not an empty
/// success: the build would otherwise silently package a zero-length app.
pub fn extract_section(
    objcopy: &Path,
    elf_path: &Path,
    section: &str,
    out_path: &Path,
) -> Result<Vec<u8>, PackError> {
    let mut cmd = Command::new(objcopy);
    cmd.arg("-O")
        .arg("binary")
        .arg(format!("--only-section={}", section))
        .arg(elf_path)
        .arg(out_path);
    log::debug!("executing {:?}", cmd);

    let output = cmd.output().map_err(|e| {
        PackError::ToolInvocation(format!("failed to run {}: {}", objcopy.display(), e))
    })?;
    if !output.status.success() {
        return Err(PackError::ToolInvocation(format!(
            "{} failed for section {}: {}",
            objcopy.display(),
            section,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let bytes = std::fs::read(out_path).map_err(|e| {
        PackError::ToolInvocation(format!(
            "cannot read extracted section {}: {}",
            out_path.display(),
            e
        ))
    })?;
    if bytes.is_empty() {
        return Err(PackError::ToolInvocation(format!(
            "section {} is missing or empty in {}",
            section,
            elf_path.display()
        )));
    }
    Ok(bytes)
}
