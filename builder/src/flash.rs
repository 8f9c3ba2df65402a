// Licensed under the Apache-2.0 license

use crate::scan::{scan_for_leaks, LeakFinding};
use crate::PackError;
use fw_config::flash::{FlashRegionSpec, ERASE_FILL};
use fw_config::AppMemoryLayout;

/// One firmware region's contents, paired with its declared capacity.
pub struct FlashRegion<'a> {
    pub spec: FlashRegionSpec,
    pub data: &'a [u8],
}

/// The assembled flash image plus the advisory findings gathered along
/// the way.
#[derive(Debug)]
pub struct FlashAssembly {
    pub image: Vec<u8>,
    pub leaks: Vec<LeakFinding>,
    pub free_bytes: usize,
}

impl FlashAssembly {
    pub fn free_percent(&self) -> f64 {
        self.free_bytes as f64 * 100.0 / self.image.len() as f64
    }
}

/// Lays the regions out back to back in their declared order, each padded
/// to its declared size with the erase byte, pads the whole image to
/// `flash_size - 4`, and appends the checksum trailer.
///
/// Oversized regions and content spilling into the trailer are fatal; the
/// final leak scan is advisory and comes back in the assembly report.
pub fn assemble(
    regions: &[FlashRegion],
    flash_size: usize,
    layout: &AppMemoryLayout,
) -> Result<FlashAssembly, PackError> {
    if flash_size % 4 != 0 || flash_size < 4 {
        return Err(PackError::Format(format!(
            "flash size {} is not a multiple of 4",
            flash_size
        )));
    }

    let mut image = Vec::with_capacity(flash_size);
    for region in regions {
        if region.data.len() > region.spec.size {
            return Err(PackError::Budget {
                what: format!("{} region", region.spec.name),
                actual: region.data.len(),
                limit: region.spec.size,
            });
        }
        image.extend_from_slice(region.data);
        image.resize(image.len() + region.spec.size - region.data.len(), ERASE_FILL);
    }

    let content_len = image.len();
    if content_len > flash_size - 4 {
        return Err(PackError::Budget {
            what: "flash content".to_string(),
            actual: content_len,
            limit: flash_size - 4,
        });
    }
    image.resize(flash_size - 4, ERASE_FILL);

    let leaks = scan_for_leaks(&image, layout);
    image.extend_from_slice(&app_image::checksum_trailer(&image));

    Ok(FlashAssembly {
        image,
        leaks,
        free_bytes: flash_size - 4 - content_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &'static str, size: usize) -> FlashRegionSpec {
        FlashRegionSpec { name, size }
    }

    // Tiny synthetic flash so the tests stay readable.
    const FLASH: usize = 64;

    #[test]
    fn regions_are_padded_and_checksummed() {
        let layout = AppMemoryLayout::default();
        let app = [0x11u8; 6];
        let baseband = [0x22u8; 4];
        let regions = [
            FlashRegion {
                spec: spec("application", 16),
                data: &app,
            },
            FlashRegion {
                spec: spec("baseband", 8),
                data: &baseband,
            },
        ];

        let assembly = assemble(&regions, FLASH, &layout).unwrap();
        assert_eq!(assembly.image.len(), FLASH);
        assert!(app_image::verify_checksum(&assembly.image));

        assert_eq!(&assembly.image[..6], &app);
        assert_eq!(&assembly.image[6..16], &[ERASE_FILL; 10]);
        assert_eq!(&assembly.image[16..20], &baseband);
        assert_eq!(&assembly.image[20..24], &[ERASE_FILL; 4]);
        // Free space runs from the end of the last region to the trailer.
        assert_eq!(&assembly.image[24..FLASH - 4], &[ERASE_FILL; FLASH - 28]);
        assert_eq!(assembly.free_bytes, FLASH - 4 - 24);
    }

    #[test]
    fn oversized_region_is_fatal() {
        let layout = AppMemoryLayout::default();
        let data = [0u8; 20];
        let regions = [FlashRegion {
            spec: spec("application", 16),
            data: &data,
        }];
        let err = assemble(&regions, FLASH, &layout).unwrap_err();
        assert!(matches!(err, PackError::Budget { .. }));
    }

    #[test]
    fn content_must_leave_room_for_the_trailer() {
        let layout = AppMemoryLayout::default();
        let data = [0u8; 0];
        let regions = [FlashRegion {
            spec: spec("application", FLASH),
            data: &data,
        }];
        let err = assemble(&regions, FLASH, &layout).unwrap_err();
        assert!(matches!(err, PackError::Budget { .. }));
    }

    #[test]
    fn leak_scan_covers_the_whole_image() {
        let layout = AppMemoryLayout::default();
        let mut data = vec![0u8; 8];
        data[4..8].copy_from_slice(&0xADB1_0040u32.to_le_bytes());
        let regions = [FlashRegion {
            spec: spec("application", 16),
            data: &data,
        }];

        let assembly = assemble(&regions, FLASH, &layout).unwrap();
        assert_eq!(
            assembly.leaks,
            vec![LeakFinding {
                offset: 4,
                value: 0xADB1_0040
            }]
        );
        // Advisory only: the image still assembled.
        assert!(app_image::verify_checksum(&assembly.image));
    }

    #[test]
    fn production_layout_assembles() {
        use fw_config::flash::{APPLICATION_REGION, BASEBAND_REGION, FLASH_SIZE};

        let layout = AppMemoryLayout::default();
        let app = vec![0xA5u8; 1000];
        let baseband = vec![0x5Au8; 500];
        let regions = [
            FlashRegion {
                spec: APPLICATION_REGION,
                data: &app,
            },
            FlashRegion {
                spec: BASEBAND_REGION,
                data: &baseband,
            },
        ];

        let assembly = assemble(&regions, FLASH_SIZE, &layout).unwrap();
        assert_eq!(assembly.image.len(), FLASH_SIZE);
        assert!(app_image::verify_checksum(&assembly.image));
        assert_eq!(
            assembly.free_bytes,
            FLASH_SIZE - 4 - APPLICATION_REGION.size - BASEBAND_REGION.size
        );
        assert_eq!(&assembly.image[..4], &[0xA5; 4]);
        assert_eq!(
            &assembly.image[APPLICATION_REGION.size..APPLICATION_REGION.size + 4],
            &[0x5A; 4]
        );
    }
}
