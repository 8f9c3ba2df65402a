// Licensed under the Apache-2.0 license

//! Extraction of external-app regions from a GNU linker script.
//!
//! The build declares one MEMORY region per external app:
//!
//! ```text
//! MEMORY
//! {
//!     ram_external_app_afsk_rx (rwx) : org = 0xADB10000, len = 32k
//!     ...
//! }
//! ```
//!
//! Only `org`/`len` pairs on region lines matching the given name prefix
//! are read; everything else in the script is ignored.

use crate::AppRegion;

/// Region-name prefix used by the production linker script.
pub const REGION_PREFIX: &str = "ram_external_app_";

pub fn parse_memory_regions(script: &str, prefix: &str) -> Vec<AppRegion> {
    let mut regions = Vec::new();
    for line in script.lines() {
        let line = line.trim();
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let Some(address) = parse_assignment(line, "org").and_then(parse_number) else {
            continue;
        };
        let Some(length) = parse_assignment(line, "len").and_then(parse_number) else {
            continue;
        };
        regions.push(AppRegion::new(name, address, length));
    }
    regions
}

/// Pulls the value out of `key = value` on a region line, stopping at a
/// comma or the end of the line.
fn parse_assignment<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let rest = rest.strip_prefix('=')?;
    let value = match rest.find([',', ';']) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(value.trim())
}

/// Linker-script numeric literal: hex with `0x`, or decimal with an
/// optional `k`/`m` binary suffix.
fn parse_number(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    if let Some(kib) = value.strip_suffix(['k', 'K']) {
        return kib.trim().parse::<u32>().ok()?.checked_mul(1024);
    }
    if let Some(mib) = value.strip_suffix(['m', 'M']) {
        return mib.trim().parse::<u32>().ok()?.checked_mul(1024 * 1024);
    }
    value.parse().ok()
}
