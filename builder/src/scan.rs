// Licensed under the Apache-2.0 license

use fw_config::AppMemoryLayout;

/// A word that still looks like a shared-window address after composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakFinding {
    pub offset: usize,
    pub value: u32,
}

/// Re-scans a composed image for words inside the shared runtime window
/// whose low half is below the per-app capacity. Such a word is very
/// likely a pointer the relocator missed.
///
/// Advisory only: a hit does not prove corruption and a clean scan does
/// not prove correctness. Callers report findings and carry on.
pub fn scan_for_leaks(image: &[u8], layout: &AppMemoryLayout) -> Vec<LeakFinding> {
    image
        .chunks_exact(4)
        .enumerate()
        .filter_map(|(index, word)| {
            let value = u32::from_le_bytes(word.try_into().unwrap());
            let in_window = value >= layout.window_start && value < layout.window_end;
            if in_window && (value & 0xFFFF) < layout.max_app_size {
                Some(LeakFinding {
                    offset: index * 4,
                    value,
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn report_leaks(what: &str, findings: &[LeakFinding]) {
    for finding in findings {
        log::warn!(
            "{}: possible leaked window address {:#010x} at offset {:#x}",
            what,
            finding.value,
            finding.offset
        );
    }
}
