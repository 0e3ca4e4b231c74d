//! Directory entries
//!
//! A directory is a var-int count followed by entries, each introduced by
//! one tag byte:
//!
//! | tag | record                                                     |
//! |-----|------------------------------------------------------------|
//! | 1   | continuation, 10 opaque bytes                              |
//! | 2   | i32 offset from content start to a `tag + name` record     |
//! | 3   | subdirectory, inline obfuscated name                       |
//! | 4   | image, inline obfuscated name                              |
//!
//! Every non-continuation entry then carries a var-int size, a var-int
//! checksum and 4 obfuscated offset bytes.

use crate::error::{WzError, WzResult};
use crate::reader::WzReader;
use serde::Serialize;

/// Bytes following a continuation tag
pub const CONTINUATION_LEN: usize = 10;

/// Width of an obfuscated offset field
pub const OFFSET_FIELD_LEN: usize = 4;

/// Tag byte introducing a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryTag {
    /// Opaque continuation record
    Continuation = 1,
    /// Name and kind stored elsewhere
    Reference = 2,
    /// Subdirectory with inline name
    Directory = 3,
    /// Image with inline name
    Image = 4,
}

impl TryFrom<u8> for EntryTag {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Continuation),
            2 => Ok(Self::Reference),
            3 => Ok(Self::Directory),
            4 => Ok(Self::Image),
            other => Err(other),
        }
    }
}

/// What a directory entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A nested directory
    Directory,
    /// A property image
    Image,
    /// A back-reference target holding some other tag byte
    Other(u8),
}

impl EntryKind {
    /// Kind named by the tag found at a back-reference target
    ///
    /// Referenced records are not validated; any tag other than 3 or 4 is
    /// carried as is and the entry is treated as a non-image.
    pub const fn from_referenced_tag(tag: u8) -> Self {
        match tag {
            3 => Self::Directory,
            4 => Self::Image,
            other => Self::Other(other),
        }
    }
}

/// Name of an entry, possibly not yet read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryName {
    /// Name read from the entry itself
    Inline(String),
    /// Name stored after the tag byte at this absolute position
    Reference {
        /// Position of the referenced tag byte
        position: usize,
    },
}

/// A subdirectory or image entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Directory or image
    pub kind: EntryKind,
    /// Inline or back-referenced name
    pub name: EntryName,
    /// Declared size of the entry's data
    pub size: i32,
    /// Declared checksum of the entry's data
    pub checksum: i32,
    /// Absolute position of the obfuscated offset bytes
    pub offset_position: usize,
}

/// One record of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRecord {
    /// Skipped filler
    Continuation,
    /// A real entry
    Entry(DirectoryEntry),
}

impl EntryRecord {
    /// Read one record at the reader's position
    ///
    /// On success the reader sits at the next record. Back-referenced names
    /// are not read; only the referenced kind is looked up.
    pub fn read<D: AsRef<[u8]>>(reader: &mut WzReader<D>, content_start: u32) -> WzResult<Self> {
        let tag_position = reader.position();
        let tag = reader.read_u8()?;

        let (kind, name) = match EntryTag::try_from(tag) {
            Ok(EntryTag::Continuation) => {
                reader.skip(CONTINUATION_LEN)?;
                return Ok(Self::Continuation);
            }
            Ok(EntryTag::Reference) => {
                let relative = reader.read_i32()?;
                let position = reference_target(reader, content_start, relative)?;
                let referenced = reader.peek(|r| {
                    r.jump(position)?;
                    r.read_u8()
                })?;
                (
                    EntryKind::from_referenced_tag(referenced),
                    EntryName::Reference { position },
                )
            }
            Ok(EntryTag::Directory) => (
                EntryKind::Directory,
                EntryName::Inline(reader.read_obfuscated_string()?),
            ),
            Ok(EntryTag::Image) => (
                EntryKind::Image,
                EntryName::Inline(reader.read_obfuscated_string()?),
            ),
            Err(tag) => {
                return Err(WzError::UnknownEntryKind {
                    tag,
                    position: tag_position,
                });
            }
        };

        let size = reader.read_var_int()?;
        let checksum = reader.read_var_int()?;
        let offset_position = reader.position();
        reader.skip(OFFSET_FIELD_LEN)?;

        Ok(Self::Entry(DirectoryEntry {
            kind,
            name,
            size,
            checksum,
            offset_position,
        }))
    }
}

/// Absolute position of a back-reference target
///
/// A target outside the data fails like a one-byte read there would.
fn reference_target<D: AsRef<[u8]>>(
    reader: &WzReader<D>,
    content_start: u32,
    relative: i32,
) -> WzResult<usize> {
    let target = (content_start as usize).wrapping_add_signed(relative as isize);
    if target < reader.len() {
        Ok(target)
    } else {
        Err(reader.truncated(target, 1))
    }
}

impl DirectoryEntry {
    /// Whether this entry is an image
    pub fn is_image(&self) -> bool {
        self.kind == EntryKind::Image
    }

    /// Read the entry's name, following a back-reference if needed
    ///
    /// The reader position is left unchanged.
    pub fn resolve_name<D: AsRef<[u8]>>(&self, reader: &mut WzReader<D>) -> WzResult<String> {
        match &self.name {
            EntryName::Inline(name) => Ok(name.clone()),
            EntryName::Reference { position } => reader.peek(|r| {
                r.jump(position + 1)?;
                r.read_obfuscated_string()
            }),
        }
    }

    /// Decode the entry's data offset with the reader's committed hash
    ///
    /// The reader position is left unchanged.
    pub fn decode_offset<D: AsRef<[u8]>>(&self, reader: &mut WzReader<D>, content_start: u32) -> WzResult<u32> {
        reader.peek(|r| {
            r.jump(self.offset_position)?;
            r.read_obfuscated_offset(content_start)
        })
    }

    /// Decode the entry's data offset with an explicit version hash
    ///
    /// The reader position is left unchanged.
    pub fn decode_offset_with<D: AsRef<[u8]>>(
        &self,
        reader: &mut WzReader<D>,
        content_start: u32,
        version_hash: u32,
    ) -> WzResult<u32> {
        reader.peek(|r| {
            r.jump(self.offset_position)?;
            r.read_obfuscated_offset_with(content_start, version_hash)
        })
    }

    /// Resolve the name and offset into a listing row
    pub fn resolve<D: AsRef<[u8]>>(&self, reader: &mut WzReader<D>, content_start: u32) -> WzResult<ResolvedEntry> {
        Ok(ResolvedEntry {
            kind: self.kind,
            name: self.resolve_name(reader)?,
            size: self.size,
            checksum: self.checksum,
            offset: self.decode_offset(reader, content_start)?,
        })
    }
}

/// A directory entry with its name and offset decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    /// Directory or image
    pub kind: EntryKind,
    /// Entry name
    pub name: String,
    /// Declared size
    pub size: i32,
    /// Declared checksum
    pub checksum: i32,
    /// Absolute offset of the entry's data
    pub offset: u32,
}
