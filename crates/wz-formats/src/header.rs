//! Fixed archive header

use crate::error::{WzError, WzResult};
use crate::reader::WzReader;
use serde::Serialize;
use tracing::debug;

/// Magic bytes opening every archive
pub const WZ_MAGIC: &str = "PKG1";

/// Header at the start of an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WzHeader {
    /// Always [`WZ_MAGIC`] once parsed
    pub magic: String,
    /// Declared size of the data after the header; not validated
    pub data_size: u64,
    /// Absolute offset of the root directory
    pub content_start: u32,
    /// Free-form copyright text
    pub description: String,
}

impl WzHeader {
    /// Parse the header at the reader's current position
    ///
    /// Leaves the reader just past the description's NUL terminator.
    pub fn read<D: AsRef<[u8]>>(reader: &mut WzReader<D>) -> WzResult<Self> {
        let magic = reader.read_fixed_ascii(WZ_MAGIC.len())?;
        if magic != WZ_MAGIC {
            return Err(WzError::BadMagic { found: magic });
        }

        let data_size = reader.read_u64()?;
        let content_start = reader.read_u32()?;
        let description = reader.read_null_terminated_ascii()?;

        debug!(
            data_size,
            content_start,
            description = %description,
            "Parsed WZ header"
        );

        Ok(Self {
            magic,
            data_size,
            content_start,
            description,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wz_crypto::WzVariant;
    use wz_test_utils::ArchiveFixture;

    #[test]
    fn test_parse_header() {
        let built = ArchiveFixture::new(WzVariant::Classic, false)
            .description("Package file v1.0 Copyright 2002 Wizet, ZMS")
            .image("a.img")
            .build();
        let mut reader = WzReader::new(built.bytes, WzVariant::Classic, false);
        let header = WzHeader::read(&mut reader).unwrap();

        assert_eq!(
            header,
            WzHeader {
                magic: "PKG1".to_string(),
                data_size: (reader.len() - built.content_start as usize) as u64,
                content_start: built.content_start,
                description: "Package file v1.0 Copyright 2002 Wizet, ZMS".to_string(),
            }
        );
        assert_eq!(reader.position(), built.content_start as usize);
    }

    #[test]
    fn test_padding_after_description() {
        let built = ArchiveFixture::new(WzVariant::Classic, false)
            .padding(2)
            .image("a.img")
            .build();
        let mut reader = WzReader::new(built.bytes, WzVariant::Classic, false);
        let header = WzHeader::read(&mut reader).unwrap();
        assert_eq!(reader.position() + 2, header.content_start as usize);
    }

    #[test]
    fn test_bad_magic() {
        let built = ArchiveFixture::new(WzVariant::Classic, false)
            .magic(*b"PKG2")
            .build();
        let mut reader = WzReader::new(built.bytes, WzVariant::Classic, false);
        match WzHeader::read(&mut reader) {
            Err(WzError::BadMagic { found }) => assert_eq!(found, "PKG2"),
            other => panic!("expected BadMagic, got {other:?}"),
        }
    }

    #[test]
    fn test_short_file() {
        let mut reader = WzReader::new(b"PK".to_vec(), WzVariant::Classic, false);
        assert!(matches!(
            WzHeader::read(&mut reader),
            Err(WzError::TruncatedInput { .. })
        ));
    }
}
