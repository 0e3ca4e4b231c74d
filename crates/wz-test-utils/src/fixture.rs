//! Synthetic WZ archive builder
//!
//! Produces small archives laid out the way real ones are: header, root
//! directory, a table of names for back-referenced entries, then one body
//! per entry. Image bodies start with the property marker and the
//! `"Property"` name so that version detection can anchor on them.

use std::io::Write;
use std::path::{Path, PathBuf};
use wz_crypto::string::{unmask_narrow, unmask_wide};
use wz_crypto::{VersionHash, WzKeystream, WzVariant, encode_offset};

/// Byte opening every image body
pub const PROPERTY_MARKER: u8 = 0x73;

/// Encoding used for an obfuscated string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringForm {
    /// 8-bit characters, negative length marker
    Narrow,
    /// UTF-16 code units, positive length marker
    Wide,
}

/// Append a compact integer
pub fn write_var_int(buf: &mut Vec<u8>, value: i32) {
    match i8::try_from(value) {
        Ok(small) if small != i8::MIN => buf.push(small as u8),
        _ => {
            buf.push(0x80);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Append an obfuscated string, choosing the narrow form when every
/// character fits in a byte
pub fn write_obfuscated_string(buf: &mut Vec<u8>, text: &str, keystream: Option<&mut WzKeystream>) {
    let form = if text.chars().all(|c| u32::from(c) <= 0xFF) {
        StringForm::Narrow
    } else {
        StringForm::Wide
    };
    write_obfuscated_string_as(buf, text, form, keystream);
}

/// Append an obfuscated string in the given form
///
/// With a keystream the units are XOR-ed with the rolling mask and the
/// keystream; without one they are written as they are, the way unencrypted
/// archives store names. Characters above `U+00FF` are written as `?` in the
/// narrow form.
pub fn write_obfuscated_string_as(
    buf: &mut Vec<u8>,
    text: &str,
    form: StringForm,
    keystream: Option<&mut WzKeystream>,
) {
    match form {
        StringForm::Narrow => {
            let mut bytes: Vec<u8> = text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect();
            let len = bytes.len();
            if len == 0 {
                buf.push(0);
                return;
            }
            if len <= 127 {
                buf.push((-(len as i32)) as i8 as u8);
            } else {
                buf.push(0x80);
                buf.extend_from_slice(&(len as i32).to_le_bytes());
            }
            if let Some(keystream) = keystream {
                unmask_narrow(&mut bytes, keystream.derive(len));
            }
            buf.extend_from_slice(&bytes);
        }
        StringForm::Wide => {
            let mut units: Vec<u16> = text.encode_utf16().collect();
            let len = units.len();
            if len == 0 {
                buf.push(0);
                return;
            }
            if len < 127 {
                buf.push(len as u8);
            } else {
                buf.push(0x7F);
                buf.extend_from_slice(&(len as i32).to_le_bytes());
            }
            if let Some(keystream) = keystream {
                unmask_wide(&mut units, keystream.derive(len * 2));
            }
            for unit in units {
                buf.extend_from_slice(&unit.to_le_bytes());
            }
        }
    }
}

#[derive(Debug, Clone)]
enum FixtureEntry {
    Continuation,
    Raw(u8),
    Named {
        tag: u8,
        name: String,
        by_reference: bool,
    },
}

/// Builder for a synthetic archive
#[derive(Debug, Clone)]
pub struct ArchiveFixture {
    variant: WzVariant,
    encrypted: bool,
    version: u16,
    magic: [u8; 4],
    description: String,
    padding: usize,
    stored_version: Option<i16>,
    entry_count: Option<i32>,
    property_name: String,
    property_keystream: bool,
    entries: Vec<FixtureEntry>,
}

/// Output of [`ArchiveFixture::build`]
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    /// Complete archive bytes
    pub bytes: Vec<u8>,
    /// Offset of the root directory
    pub content_start: u32,
    /// Version the offsets were encoded with
    pub version: u16,
    /// Body offset of each named entry, in directory order
    pub targets: Vec<u32>,
}

impl ArchiveFixture {
    /// Start an archive with no entries, version 83 and the standard
    /// description
    pub fn new(variant: WzVariant, encrypted: bool) -> Self {
        Self {
            variant,
            encrypted,
            version: 83,
            magic: *b"PKG1",
            description: "Package file v1.0 Copyright 2002 Wizet, ZMS".to_string(),
            padding: 0,
            stored_version: None,
            entry_count: None,
            property_name: "Property".to_string(),
            property_keystream: true,
            entries: Vec::new(),
        }
    }

    /// Set the version used for the checksum and offset encoding
    #[must_use]
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Replace the 4-byte magic
    #[must_use]
    pub fn magic(mut self, magic: [u8; 4]) -> Self {
        self.magic = magic;
        self
    }

    /// Replace the header description
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Insert zero bytes between the header and the root directory
    #[must_use]
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Store this checksum instead of the one computed from the version
    #[must_use]
    pub fn stored_version(mut self, stored: i16) -> Self {
        self.stored_version = Some(stored);
        self
    }

    /// Store this entry count instead of the number of added entries
    #[must_use]
    pub fn entry_count(mut self, count: i32) -> Self {
        self.entry_count = Some(count);
        self
    }

    /// Name written after the property marker in image bodies
    #[must_use]
    pub fn property_name(mut self, name: &str) -> Self {
        self.property_name = name.to_string();
        self
    }

    /// Whether image body names are keystream-encrypted when the archive is
    #[must_use]
    pub fn property_keystream(mut self, apply: bool) -> Self {
        self.property_keystream = apply;
        self
    }

    /// Add a subdirectory entry with an inline name
    #[must_use]
    pub fn directory(self, name: &str) -> Self {
        self.named(3, name, false)
    }

    /// Add an image entry with an inline name
    #[must_use]
    pub fn image(self, name: &str) -> Self {
        self.named(4, name, false)
    }

    /// Add a subdirectory entry whose name is stored elsewhere
    #[must_use]
    pub fn directory_reference(self, name: &str) -> Self {
        self.named(3, name, true)
    }

    /// Add an image entry whose name is stored elsewhere
    #[must_use]
    pub fn image_reference(self, name: &str) -> Self {
        self.named(4, name, true)
    }

    /// Add a back-reference whose target record holds `tag` and an empty name
    #[must_use]
    pub fn reference_to_tag(self, tag: u8) -> Self {
        self.named(tag, "", true)
    }

    /// Add a 10-byte continuation record
    #[must_use]
    pub fn continuation(mut self) -> Self {
        self.entries.push(FixtureEntry::Continuation);
        self
    }

    /// Add a lone tag byte with nothing after it
    #[must_use]
    pub fn raw_tag(mut self, tag: u8) -> Self {
        self.entries.push(FixtureEntry::Raw(tag));
        self
    }

    fn named(mut self, tag: u8, name: &str, by_reference: bool) -> Self {
        self.entries.push(FixtureEntry::Named {
            tag,
            name: name.to_string(),
            by_reference,
        });
        self
    }

    /// Lay out the archive
    pub fn build(&self) -> BuiltArchive {
        let mut keystream = WzKeystream::new(self.variant);
        let hash = VersionHash::compute(self.version);

        let mut out = Vec::new();
        out.extend_from_slice(&self.magic);
        let data_size_at = out.len();
        out.extend_from_slice(&0u64.to_le_bytes());
        let content_start_at = out.len();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(self.description.as_bytes());
        out.push(0);
        out.resize(out.len() + self.padding, 0);

        let content_start = out.len() as u32;
        out[content_start_at..content_start_at + 4].copy_from_slice(&content_start.to_le_bytes());

        let stored = self
            .stored_version
            .unwrap_or_else(|| i16::from(hash.check_byte()));
        out.extend_from_slice(&stored.to_le_bytes());
        let count = self.entry_count.unwrap_or(self.entries.len() as i32);
        write_var_int(&mut out, count);

        // Pending fixups: (field position, entry index) for offsets and
        // (field position, name) for references.
        let mut offset_fields = Vec::new();
        let mut reference_fields = Vec::new();

        for entry in &self.entries {
            match entry {
                FixtureEntry::Continuation => {
                    out.push(1);
                    out.extend_from_slice(&[0u8; 10]);
                }
                FixtureEntry::Raw(tag) => out.push(*tag),
                FixtureEntry::Named {
                    tag,
                    name,
                    by_reference,
                } => {
                    if *by_reference {
                        out.push(2);
                        reference_fields.push((out.len(), *tag, name.clone()));
                        out.extend_from_slice(&0i32.to_le_bytes());
                    } else {
                        out.push(*tag);
                        self.write_name(&mut out, name, &mut keystream);
                    }
                    let body = self.body(*tag, &mut keystream);
                    write_var_int(&mut out, body.len() as i32);
                    write_var_int(&mut out, checksum(&body));
                    offset_fields.push((out.len(), body));
                    out.extend_from_slice(&0u32.to_le_bytes());
                }
            }
        }

        for (field, tag, name) in reference_fields {
            let relative = out.len() as i32 - content_start as i32;
            out[field..field + 4].copy_from_slice(&relative.to_le_bytes());
            out.push(tag);
            self.write_name(&mut out, &name, &mut keystream);
        }

        let mut targets = Vec::with_capacity(offset_fields.len());
        for (field, body) in offset_fields {
            let target = out.len() as u32;
            let raw = encode_offset(field as u32, content_start, hash.value(), target);
            out[field..field + 4].copy_from_slice(&raw.to_le_bytes());
            out.extend_from_slice(&body);
            targets.push(target);
        }

        let data_size = (out.len() as u64).saturating_sub(u64::from(content_start));
        out[data_size_at..data_size_at + 8].copy_from_slice(&data_size.to_le_bytes());

        BuiltArchive {
            bytes: out,
            content_start,
            version: self.version,
            targets,
        }
    }

    fn write_name(&self, out: &mut Vec<u8>, name: &str, keystream: &mut WzKeystream) {
        write_obfuscated_string(out, name, self.encrypted.then_some(keystream));
    }

    fn body(&self, tag: u8, keystream: &mut WzKeystream) -> Vec<u8> {
        let mut body = Vec::new();
        if tag == 4 {
            body.push(PROPERTY_MARKER);
            let apply = self.encrypted && self.property_keystream;
            write_obfuscated_string(&mut body, &self.property_name, apply.then_some(keystream));
            body.extend_from_slice(&[0, 0]);
        } else {
            // Empty subdirectory
            body.extend_from_slice(&[0, 0]);
        }
        body
    }
}

fn checksum(body: &[u8]) -> i32 {
    body.iter()
        .fold(0i32, |acc, &b| acc.wrapping_add(i32::from(b)))
}

impl BuiltArchive {
    /// Write the archive to `dir/name`
    pub fn write_to(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Write the archive to a named temporary file
    pub fn to_temp_file(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".wz").tempfile()?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        Ok(file)
    }
}
