//! Version detection
//!
//! The version hash keying every obfuscated offset is not stored in the
//! archive. Only one checksum byte of it is, at the top of the root
//! directory. [`VersionDetector`] recovers the full hash by trying each
//! 16-bit version whose checksum matches and following the first image
//! entry's offset with it: the right hash lands on an image body, which
//! always opens with the property marker and the name `"Property"`.

use crate::entry::{DirectoryEntry, EntryRecord};
use crate::error::{WzError, WzResult};
use crate::header::WzHeader;
use crate::reader::WzReader;
use serde::Serialize;
use tracing::{debug, trace};
use wz_crypto::VersionHash;

/// First byte of an image body
pub const PROPERTY_MARKER: u8 = 0x73;

/// Name following the marker in an image body
pub const PROPERTY_NAME: &str = "Property";

/// Result of trial-decoding the anchor with one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The candidate led to an image body
    Accepted(VersionHash),
    /// The candidate did not check out
    Rejected,
}

/// What detection established about an archive
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Parsed header
    pub header: WzHeader,
    /// Checksum stored at the top of the root directory
    pub stored_version: i16,
    /// Declared number of root entries
    pub entry_count: i32,
    /// Recovered version number
    pub version: u16,
    /// Hash of [`Self::version`], now committed to the reader
    pub version_hash: u32,
    /// First image entry of the root directory
    #[serde(skip)]
    pub anchor: DirectoryEntry,
    /// Candidates trial-decoded before one was accepted
    pub trials: usize,
}

/// Drives a fresh reader through the header and the version search
#[derive(Debug)]
pub struct VersionDetector<'r, D> {
    reader: &'r mut WzReader<D>,
}

impl<'r, D: AsRef<[u8]>> VersionDetector<'r, D> {
    /// Wrap a reader; detection starts from offset 0 regardless of its
    /// current position
    pub fn new(reader: &'r mut WzReader<D>) -> Self {
        Self { reader }
    }

    /// Run detection to completion
    ///
    /// On success the version hash is committed to the reader and the
    /// reader sits at the content start. On failure nothing is committed.
    pub fn run(mut self) -> WzResult<Detection> {
        self.reader.jump(0)?;
        let header = WzHeader::read(self.reader)?;
        let content_start = header.content_start;

        let (stored_version, entry_count) = self.read_directory_header(content_start)?;
        let anchor = self.find_anchor(content_start, entry_count)?;
        let (hash, trials) = self.search(&anchor, content_start, stored_version)?;

        debug!(
            version = hash.version(),
            version_hash = hash.value(),
            trials,
            "Detected archive version"
        );

        self.reader.commit_version_hash(hash.value());
        self.reader.jump(content_start as usize)?;

        Ok(Detection {
            header,
            stored_version,
            entry_count,
            version: hash.version(),
            version_hash: hash.value(),
            anchor,
            trials,
        })
    }

    /// Read the stored checksum and the entry count of the root directory
    fn read_directory_header(&mut self, content_start: u32) -> WzResult<(i16, i32)> {
        self.reader.jump(content_start as usize)?;
        let stored_version = self.reader.read_i16()?;
        let entry_count = self.reader.read_var_int()?;

        debug!(stored_version, entry_count, "Read root directory header");

        if entry_count == 0 {
            return Err(WzError::EmptyArchive { content_start });
        }
        Ok((stored_version, entry_count))
    }

    /// Scan root entries up to the first image
    fn find_anchor(&mut self, content_start: u32, entry_count: i32) -> WzResult<DirectoryEntry> {
        let count = usize::try_from(entry_count).unwrap_or(0);
        for index in 0..count {
            match EntryRecord::read(self.reader, content_start)? {
                EntryRecord::Continuation => trace!(index, "Skipped continuation"),
                EntryRecord::Entry(entry) => {
                    trace!(
                        index,
                        kind = ?entry.kind,
                        size = entry.size,
                        offset_position = entry.offset_position,
                        "Scanned entry"
                    );
                    if entry.is_image() {
                        debug!(
                            index,
                            offset_position = entry.offset_position,
                            "Found anchor image"
                        );
                        return Ok(entry);
                    }
                }
            }
        }
        Err(WzError::NoImageEntries { scanned: count })
    }

    /// Try candidates in ascending order until one is accepted
    fn search(
        &mut self,
        anchor: &DirectoryEntry,
        content_start: u32,
        stored_version: i16,
    ) -> WzResult<(VersionHash, usize)> {
        let mut trials = 0;
        for candidate in VersionHash::candidates().filter(|c| c.matches(stored_version)) {
            trials += 1;
            match self.trial(anchor, content_start, candidate) {
                TrialOutcome::Accepted(hash) => return Ok((hash, trials)),
                TrialOutcome::Rejected => {}
            }
        }
        Err(WzError::VersionGuessExhausted {
            stored_version,
            trials,
        })
    }

    /// Trial-decode the anchor with one candidate
    ///
    /// Never commits anything and never fails: read errors are rejections.
    pub fn trial(
        &mut self,
        anchor: &DirectoryEntry,
        content_start: u32,
        candidate: VersionHash,
    ) -> TrialOutcome {
        match self.check_anchor(anchor, content_start, candidate.value()) {
            Ok(true) => TrialOutcome::Accepted(candidate),
            Ok(false) => {
                trace!(version = candidate.version(), "Rejected candidate");
                TrialOutcome::Rejected
            }
            Err(err) => {
                trace!(version = candidate.version(), error = %err, "Rejected candidate");
                TrialOutcome::Rejected
            }
        }
    }

    fn check_anchor(&mut self, anchor: &DirectoryEntry, content_start: u32, hash: u32) -> WzResult<bool> {
        self.reader.peek(|r| {
            r.jump(anchor.offset_position)?;
            let target = r.read_obfuscated_offset_with(content_start, hash)?;
            r.jump(target as usize)?;
            if r.read_u8()? != PROPERTY_MARKER {
                return Ok(false);
            }
            // Only a name as long as the expected one can match
            let limit = PROPERTY_NAME.len();
            let decrypt = r.is_encrypted();
            let decoded = r.peek(|r| r.read_obfuscated_string_bounded(decrypt, limit));
            if decoded.is_ok_and(|name| name == PROPERTY_NAME) {
                return Ok(true);
            }
            let bypassed = r.peek(|r| r.read_obfuscated_string_bounded(false, limit))?;
            Ok(bypassed == PROPERTY_NAME)
        })
    }
}

/// Run detection on `reader`
pub fn detect<D: AsRef<[u8]>>(reader: &mut WzReader<D>) -> WzResult<Detection> {
    VersionDetector::new(reader).run()
}
