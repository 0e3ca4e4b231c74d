//! Inspection report

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use wz_crypto::WzVariant;
use wz_formats::{ResolvedEntry, WzArchive, WzHeader};

/// Everything the inspector prints about one archive
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Path the archive was opened from
    pub origin: String,
    /// Keystream variant used
    pub variant: WzVariant,
    /// Whether names were decrypted with the keystream
    pub encrypted: bool,
    /// Parsed header
    pub header: WzHeader,
    /// Checksum stored in the root directory
    pub stored_version: i16,
    /// Declared number of root entries
    pub entry_count: i32,
    /// Recovered version number
    pub version: u16,
    /// Confirmed version hash
    pub version_hash: u32,
    /// Candidates tried before the match
    pub trials: usize,
    /// Root listing, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<ResolvedEntry>>,
}

impl Report {
    /// Collect a report from an opened archive
    pub fn collect(archive: &mut WzArchive, list: bool) -> Result<Self> {
        let entries = if list {
            Some(archive.root_entries()?)
        } else {
            None
        };
        let detection = archive.detection();

        Ok(Self {
            origin: archive.origin().to_string(),
            variant: archive.variant(),
            encrypted: archive.is_encrypted(),
            header: detection.header.clone(),
            stored_version: detection.stored_version,
            entry_count: detection.entry_count,
            version: detection.version,
            version_hash: detection.version_hash,
            trials: detection.trials,
            entries,
        })
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as plain text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Archive:        {}", self.origin);
        let _ = writeln!(
            out,
            "Variant:        {} ({})",
            self.variant,
            if self.encrypted { "encrypted" } else { "unencrypted" }
        );
        let _ = writeln!(out, "Description:    {}", self.header.description);
        let _ = writeln!(out, "Data size:      {}", self.header.data_size);
        let _ = writeln!(out, "Content start:  {}", self.header.content_start);
        let _ = writeln!(out, "Entries:        {}", self.entry_count);
        let _ = writeln!(
            out,
            "Version:        {} (hash {:#010x}, check {}, {} trials)",
            self.version, self.version_hash, self.stored_version, self.trials
        );

        if let Some(entries) = &self.entries {
            out.push('\n');
            for entry in entries {
                let kind = match entry.kind {
                    wz_formats::EntryKind::Directory => "dir",
                    wz_formats::EntryKind::Image => "img",
                    wz_formats::EntryKind::Other(_) => "???",
                };
                let _ = writeln!(
                    out,
                    "  {kind}  {:<32} size {:>10}  offset {:#010x}",
                    entry.name, entry.size, entry.offset
                );
            }
        }
        out
    }
}
