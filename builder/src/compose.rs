// Licensed under the Apache-2.0 license

use crate::relocate::relocate;
use crate::PackError;
use app_image::{ExternalAppHeader, APP_FORMAT_VERSION, APP_HEADER_SIZE};
use fw_config::AppMemoryLayout;
use zerocopy::FromBytes;

/// Builds the final external-app artifact from an extracted image.
///
/// The search window comes from the high half of the entry word; the
/// replace address is the runtime base, pushed up by the companion's
/// length when one is attached so the application lands immediately after
/// it. The companion is only fetched when the header names a tag, so
/// `companion_lookup` never runs for standalone apps.
pub fn compose<F>(
    image: &[u8],
    layout: &AppMemoryLayout,
    companion_lookup: F,
) -> Result<Vec<u8>, PackError>
where
    F: FnOnce(&[u8; 4]) -> Result<Vec<u8>, PackError>,
{
    if image.len() < APP_HEADER_SIZE {
        return Err(PackError::Format(format!(
            "image is {} bytes, shorter than the {}-byte header",
            image.len(),
            APP_HEADER_SIZE
        )));
    }
    if image.len() % 4 != 0 {
        return Err(PackError::Format(format!(
            "image length {} is not a multiple of 4",
            image.len()
        )));
    }
    let header = ExternalAppHeader::read_from_bytes(&image[..APP_HEADER_SIZE])
        .map_err(|_| PackError::Format("unreadable application header".to_string()))?;
    if header.format_version.get() != APP_FORMAT_VERSION {
        return Err(PackError::Format(format!(
            "unsupported header format version {:#x}",
            header.format_version.get()
        )));
    }

    let payload_len = image.len() - APP_HEADER_SIZE;
    if payload_len > layout.max_app_size as usize {
        return Err(PackError::Budget {
            what: "application payload".to_string(),
            actual: payload_len,
            limit: layout.max_app_size as usize,
        });
    }

    let companion = if header.has_companion() {
        let bytes = companion_lookup(&header.companion_tag)?;
        if bytes.len() % 4 != 0 {
            return Err(PackError::Format(format!(
                "companion '{}' payload length {} is not a multiple of 4",
                tag_name(&header.companion_tag),
                bytes.len()
            )));
        }
        Some(bytes)
    } else {
        None
    };

    let replace_address = layout
        .runtime_base
        .wrapping_add(companion.as_ref().map_or(0, |c| c.len() as u32));
    let search_address = header.search_window_base();

    let mut artifact = relocate(image, search_address, replace_address, layout.max_app_size)?;

    // Relocation ran over the header words too; the loader-facing fields
    // are patched afterwards with their final values.
    let patched = ExternalAppHeader::mut_from_bytes(&mut artifact[..APP_HEADER_SIZE])
        .map_err(|_| PackError::Format("unreadable application header".to_string()))?;
    patched.load_address = replace_address.into();
    if companion.is_some() {
        patched.companion_offset = (payload_len as u32).into();
    }

    if let Some(companion) = companion {
        artifact.extend_from_slice(&companion);
    }
    artifact.extend_from_slice(&app_image::checksum_trailer(&artifact));
    Ok(artifact)
}

/// Companion lookup over a tagged-chunk container file, for use as the
/// `compose` callback.
pub fn lookup_companion(container: &[u8], tag: &[u8; 4]) -> Result<Vec<u8>, PackError> {
    match app_image::find_chunk(container, tag) {
        Ok(Some(payload)) => Ok(payload.to_vec()),
        Ok(None) => Err(PackError::Format(format!(
            "companion module '{}' not present in container",
            tag_name(tag)
        ))),
        Err(e) => Err(PackError::Format(format!("companion container: {}", e))),
    }
}

fn tag_name(tag: &[u8; 4]) -> String {
    if tag.iter().all(|b| b.is_ascii_graphic()) {
        String::from_utf8_lossy(tag).into_owned()
    } else {
        hex::encode(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_image::NO_COMPANION_TAG;
    use zerocopy::IntoBytes;

    fn test_image(payload_words: &[u32], entry_word: u32, tag: [u8; 4]) -> Vec<u8> {
        let header = ExternalAppHeader {
            load_address: 0xADB1_0000u32.into(),
            entry_word: entry_word.into(),
            format_version: APP_FORMAT_VERSION.into(),
            metadata: [0; 60],
            companion_tag: tag,
            companion_offset: 0u32.into(),
        };
        let mut image = header.as_bytes().to_vec();
        for word in payload_words {
            image.extend_from_slice(&word.to_le_bytes());
        }
        image
    }

    fn no_companion(_tag: &[u8; 4]) -> Result<Vec<u8>, PackError> {
        panic!("companion lookup must not run without a tag");
    }

    fn header_of(artifact: &[u8]) -> ExternalAppHeader {
        ExternalAppHeader::read_from_bytes(&artifact[..APP_HEADER_SIZE]).unwrap()
    }

    #[test]
    fn standalone_app_is_relocated_and_checksummed() {
        let layout = AppMemoryLayout::default();
        let image = test_image(
            &[0xADB1_0100, 0x1234_5678, 0xADB1_7FFC],
            0xADB1_0081,
            NO_COMPANION_TAG,
        );
        let artifact = compose(&image, &layout, no_companion).unwrap();

        assert_eq!(artifact.len(), image.len() + 4);
        assert!(app_image::verify_checksum(&artifact));

        let header = header_of(&artifact);
        assert_eq!(header.load_address.get(), 0x1008_0000);
        // The entry word sat inside the window and moved with everything else.
        assert_eq!(header.entry_word.get(), 0x1008_0081);

        let payload = &artifact[APP_HEADER_SIZE..artifact.len() - 4];
        assert_eq!(&payload[0..4], &0x1008_0100u32.to_le_bytes());
        assert_eq!(&payload[4..8], &0x1234_5678u32.to_le_bytes());
        assert_eq!(&payload[8..12], &0x1008_7FFCu32.to_le_bytes());
    }

    #[test]
    fn companion_shifts_the_runtime_home() {
        let layout = AppMemoryLayout::default();
        let payload = [0xADB1_0100u32; 25]; // 100-byte payload
        let image = test_image(&payload, 0xADB1_0081, *b"BASB");
        let companion = vec![0xEEu8; 48];

        let artifact = compose(&image, &layout, |tag| {
            assert_eq!(tag, b"BASB");
            Ok(companion.clone())
        })
        .unwrap();

        // header + payload + companion + trailer
        assert_eq!(artifact.len(), 80 + 100 + 48 + 4);
        assert!(app_image::verify_checksum(&artifact));

        let header = header_of(&artifact);
        assert_eq!(header.load_address.get(), 0x1008_0000 + 48);
        assert_eq!(header.companion_offset.get(), 100);
        assert_eq!(
            &artifact[APP_HEADER_SIZE + 100..APP_HEADER_SIZE + 148],
            &companion[..]
        );
    }

    #[test]
    fn misaligned_companion_is_a_format_error() {
        let layout = AppMemoryLayout::default();
        let image = test_image(&[0xADB1_0100], 0xADB1_0081, *b"BASB");
        let err = compose(&image, &layout, |_| Ok(vec![0u8; 50])).unwrap_err();
        assert!(matches!(err, PackError::Format(_)));
    }

    #[test]
    fn payload_budget_boundary() {
        let layout = AppMemoryLayout::default();
        let max_words = (layout.max_app_size / 4) as usize;

        let at_limit = test_image(&vec![0u32; max_words], 0xADB1_0081, NO_COMPANION_TAG);
        assert!(compose(&at_limit, &layout, no_companion).is_ok());

        let over = test_image(&vec![0u32; max_words + 1], 0xADB1_0081, NO_COMPANION_TAG);
        let err = compose(&over, &layout, no_companion).unwrap_err();
        assert!(matches!(err, PackError::Budget { .. }));
    }

    #[test]
    fn truncated_image_is_a_format_error() {
        let layout = AppMemoryLayout::default();
        let err = compose(&[0u8; 40], &layout, no_companion).unwrap_err();
        assert!(matches!(err, PackError::Format(_)));
    }

    #[test]
    fn lookup_companion_reads_the_container() {
        let mut container = b"WFAX".to_vec();
        container.extend_from_slice(&4u32.to_le_bytes());
        container.extend_from_slice(&[1, 2, 3, 4]);
        container.extend_from_slice(b"BASB");
        container.extend_from_slice(&8u32.to_le_bytes());
        container.extend_from_slice(&[5, 6, 7, 8, 9, 10, 11, 12]);

        let payload = lookup_companion(&container, b"BASB").unwrap();
        assert_eq!(payload, vec![5, 6, 7, 8, 9, 10, 11, 12]);

        let err = lookup_companion(&container, b"NONE").unwrap_err();
        assert!(matches!(err, PackError::Format(_)));
    }
}
