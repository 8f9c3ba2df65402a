// Licensed under the Apache-2.0 license

//! Memory-layout policy for external applications.
//!
//! These are the shared constants the relocator, the leak scanner, and the
//! layout validator all agree on. The defaults match the production build;
//! tests thread in smaller synthetic layouts.

pub mod flash;
pub mod linker;

use std::fmt;

/// The address-window configuration threaded through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMemoryLayout {
    /// Start of the shared window all external apps are compiled into.
    pub window_start: u32,
    /// One past the last address of the shared window.
    pub window_end: u32,
    /// Compile-time origin of the first per-app region.
    pub base_address: u32,
    /// Distance between consecutive per-app origins.
    pub stride: u32,
    /// Declared size of every per-app region.
    pub per_app_size: u32,
    /// Capacity limit for a relocated application payload, and the
    /// canonical relocation window size.
    pub max_app_size: u32,
    /// Runtime base the placeholder addresses are rewritten to.
    pub runtime_base: u32,
}

impl Default for AppMemoryLayout {
    fn default() -> Self {
        AppMemoryLayout {
            window_start: 0xADB0_0000,
            window_end: 0xADC0_0000,
            base_address: 0xADB1_0000,
            stride: 0x0001_0000,
            per_app_size: 32 * 1024,
            max_app_size: 32 * 1024,
            runtime_base: 0x1008_0000,
        }
    }
}

/// A declared per-app memory region, usually read from the linker script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRegion {
    pub name: String,
    pub address: u32,
    pub length: u32,
}

impl AppRegion {
    pub fn new(name: &str, address: u32, length: u32) -> Self {
        AppRegion {
            name: name.to_string(),
            address,
            length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutViolation {
    /// No regions were declared at all.
    LayoutMissing,
    /// The lowest region does not sit at the layout's base address.
    BaseMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    /// A region's origin is off the base + index * stride grid.
    StrideMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    /// A region's declared length differs from the per-app size.
    SizeMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    /// A region runs into its successor's origin.
    Overlap { name: String, next: String },
}

impl fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutViolation::LayoutMissing => write!(f, "no external-app regions declared"),
            LayoutViolation::BaseMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "region '{}' starts at {:#010x}, layout base is {:#010x}",
                name, actual, expected
            ),
            LayoutViolation::StrideMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "region '{}' starts at {:#010x}, expected {:#010x} from the stride",
                name, actual, expected
            ),
            LayoutViolation::SizeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "region '{}' is {} bytes, expected {}",
                name, actual, expected
            ),
            LayoutViolation::Overlap { name, next } => {
                write!(f, "region '{}' overlaps the start of '{}'", name, next)
            }
        }
    }
}

/// Result of a layout validation run. Violations are collected, never
/// short-circuited, so one run reports everything that is wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub violations: Vec<LayoutViolation>,
}

impl LayoutReport {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }
}

impl AppMemoryLayout {
    /// Checks a declared region table against this layout. Input order is
    /// not trusted; regions are sorted by origin first.
    pub fn validate(&self, regions: &[AppRegion]) -> LayoutReport {
        let mut report = LayoutReport::default();
        if regions.is_empty() {
            report.violations.push(LayoutViolation::LayoutMissing);
            return report;
        }

        let mut sorted: Vec<&AppRegion> = regions.iter().collect();
        sorted.sort_by_key(|r| r.address);

        for (index, region) in sorted.iter().enumerate() {
            let expected = self.base_address.wrapping_add(index as u32 * self.stride);
            if region.address != expected {
                let violation = if index == 0 {
                    LayoutViolation::BaseMismatch {
                        name: region.name.clone(),
                        expected,
                        actual: region.address,
                    }
                } else {
                    LayoutViolation::StrideMismatch {
                        name: region.name.clone(),
                        expected,
                        actual: region.address,
                    }
                };
                report.violations.push(violation);
            }
            if region.length != self.per_app_size {
                report.violations.push(LayoutViolation::SizeMismatch {
                    name: region.name.clone(),
                    expected: self.per_app_size,
                    actual: region.length,
                });
            }
            if let Some(next) = sorted.get(index + 1) {
                if region.address as u64 + region.length as u64 > next.address as u64 {
                    report.violations.push(LayoutViolation::Overlap {
                        name: region.name.clone(),
                        next: next.name.clone(),
                    });
                }
            }
        }
        report
    }
}

/// The production external-app region table, kept in sync with the
/// linker script. `validate-address-layout` falls back to this when no
/// script path is given.
pub const EXTERNAL_APP_REGIONS: &[(&str, u32, u32)] = &[
    ("afsk_rx", 0xADB1_0000, 32 * 1024),
    ("calculator", 0xADB2_0000, 32 * 1024),
    ("font_viewer", 0xADB3_0000, 32 * 1024),
    ("pacman", 0xADB4_0000, 32 * 1024),
    ("snake", 0xADB5_0000, 32 * 1024),
    ("tetris", 0xADB6_0000, 32 * 1024),
];

pub fn builtin_app_regions() -> Vec<AppRegion> {
    EXTERNAL_APP_REGIONS
        .iter()
        .map(|&(name, address, length)| AppRegion::new(name, address, length))
        .collect()
}
