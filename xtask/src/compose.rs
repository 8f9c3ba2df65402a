// Licensed under the Apache-2.0 license

use anyhow::{bail, Context, Result};
use fw_config::AppMemoryLayout;
use fw_packager::PackError;
use std::path::{Path, PathBuf};

/// Packages each named external app. A failing app is reported and
/// skipped so one broken app cannot block the rest of the build; the
/// command still exits non-zero at the end if anything failed.
pub fn compose_external_apps(
    src_dir: &Path,
    binary_dir: &Path,
    objcopy: &Path,
    app_prefixes: &[String],
) -> Result<()> {
    let elf_path = binary_dir.join("application.elf");
    let container_path = src_dir.join("baseband.img");
    let layout = AppMemoryLayout::default();

    let mut failed = 0;
    for prefix in app_prefixes {
        match compose_one(&elf_path, &container_path, objcopy, binary_dir, &layout, prefix) {
            Ok(out_path) => println!("composed {}", out_path.display()),
            Err(e) => {
                log::error!("skipping app '{}': {:#}", prefix, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!(
            "{} of {} external apps failed to compose",
            failed,
            app_prefixes.len()
        );
    }
    Ok(())
}

fn compose_one(
    elf_path: &Path,
    container_path: &Path,
    objcopy: &Path,
    binary_dir: &Path,
    layout: &AppMemoryLayout,
    prefix: &str,
) -> Result<PathBuf> {
    let section = format!(".external_app_{}", prefix);
    let raw_path = binary_dir.join(format!("{}.raw", prefix));
    let image = fw_packager::extract_section(objcopy, elf_path, &section, &raw_path)?;

    // The companion container is only opened when the app actually names
    // a companion tag.
    let artifact = fw_packager::compose(&image, layout, |tag| {
        let container = std::fs::read(container_path).map_err(|e| {
            PackError::ToolInvocation(format!(
                "cannot read companion container {}: {}",
                container_path.display(),
                e
            ))
        })?;
        fw_packager::lookup_companion(&container, tag)
    })?;

    let out_path = binary_dir.join(format!("{}.bin", prefix));
    std::fs::write(&out_path, &artifact)
        .with_context(|| format!("cannot write {}", out_path.display()))?;
    Ok(out_path)
}
