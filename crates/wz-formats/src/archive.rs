//! Opened archive handle
//!
//! [`WzArchive`] owns the archive bytes, either memory-mapped from a file or
//! held in a buffer, and a reader whose version hash has been confirmed.
//! Opening runs the whole bootstrap: header, root directory scan and version
//! search. A failed open leaves nothing behind.

use crate::config::ArchiveConfig;
use crate::detect::{Detection, VersionDetector};
use crate::entry::{EntryKind, EntryRecord, ResolvedEntry};
use crate::error::{ArchiveOpenError, WzError, WzResult};
use crate::header::WzHeader;
use crate::reader::WzReader;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, trace};
use wz_crypto::WzVariant;

/// Read-only bytes behind an archive
pub enum Storage {
    /// Memory-mapped file
    Mapped {
        /// The mapping
        map: Mmap,
        /// File it was mapped from
        path: PathBuf,
    },
    /// Owned buffer
    Buffered(Vec<u8>),
}

impl Storage {
    /// Memory-map the file at `path` read-only
    pub fn map(path: impl AsRef<Path>) -> WzResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        // SAFETY: mapped read-only; archives are not modified while open
        #[allow(unsafe_code)]
        let map = unsafe { MmapOptions::new().map(&file)? };

        Ok(Self::Mapped {
            map,
            path: path.to_path_buf(),
        })
    }

    /// Human-readable label for error messages and logs
    pub fn origin(&self) -> String {
        match self {
            Self::Mapped { path, .. } => path.display().to_string(),
            Self::Buffered(bytes) => format!("<memory, {} bytes>", bytes.len()),
        }
    }
}

impl AsRef<[u8]> for Storage {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Mapped { map, .. } => map.as_ref(),
            Self::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapped { map, path } => f
                .debug_struct("Mapped")
                .field("path", path)
                .field("len", &map.len())
                .finish(),
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
        }
    }
}

/// An archive whose version hash has been confirmed
#[derive(Debug)]
pub struct WzArchive {
    origin: String,
    config: ArchiveConfig,
    detection: Detection,
    reader: WzReader<Storage>,
}

impl WzArchive {
    /// Open an archive over `storage`
    pub fn open(storage: Storage, variant: WzVariant, encrypted: bool) -> Result<Self, ArchiveOpenError> {
        Self::open_with(storage, ArchiveConfig::new(variant, encrypted))
    }

    /// Open an archive over `storage` with explicit options
    pub fn open_with(storage: Storage, config: ArchiveConfig) -> Result<Self, ArchiveOpenError> {
        let origin = storage.origin();
        let mut reader = WzReader::new(storage, config.variant, config.encrypted);
        let detection = VersionDetector::new(&mut reader)
            .run()
            .map_err(|e| ArchiveOpenError::new(origin.clone(), e))?;

        info!(
            origin = %origin,
            variant = %config.variant,
            encrypted = config.encrypted,
            version = detection.version,
            content_start = detection.header.content_start,
            "Opened WZ archive"
        );

        Ok(Self {
            origin,
            config,
            detection,
            reader,
        })
    }

    /// Memory-map and open the archive at `path`
    pub fn open_path(path: impl AsRef<Path>, variant: WzVariant, encrypted: bool) -> Result<Self, ArchiveOpenError> {
        Self::open_path_with(path, ArchiveConfig::new(variant, encrypted))
    }

    /// Memory-map and open the archive at `path` with explicit options
    pub fn open_path_with(path: impl AsRef<Path>, config: ArchiveConfig) -> Result<Self, ArchiveOpenError> {
        let path = path.as_ref();
        let storage =
            Storage::map(path).map_err(|e| ArchiveOpenError::new(path.display().to_string(), e))?;
        Self::open_with(storage, config)
    }

    /// Open an archive held in memory
    pub fn from_bytes(bytes: Vec<u8>, variant: WzVariant, encrypted: bool) -> Result<Self, ArchiveOpenError> {
        Self::open(Storage::Buffered(bytes), variant, encrypted)
    }

    /// Path or label the archive was opened from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Options the archive was opened with
    pub const fn config(&self) -> ArchiveConfig {
        self.config
    }

    /// Keystream variant
    pub const fn variant(&self) -> WzVariant {
        self.config.variant
    }

    /// Whether strings are keystream-encrypted
    pub const fn is_encrypted(&self) -> bool {
        self.config.encrypted
    }

    /// Parsed header
    pub const fn header(&self) -> &WzHeader {
        &self.detection.header
    }

    /// Everything detection established
    pub const fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Absolute offset of the root directory
    pub const fn content_start(&self) -> u32 {
        self.detection.header.content_start
    }

    /// Recovered version number
    pub const fn version(&self) -> u16 {
        self.detection.version
    }

    /// Confirmed version hash
    pub const fn version_hash(&self) -> u32 {
        self.detection.version_hash
    }

    /// The primed reader, for walking the directory tree
    pub fn reader(&mut self) -> &mut WzReader<Storage> {
        &mut self.reader
    }

    /// Put the reader back at the root directory
    pub fn rewind(&mut self) -> WzResult<()> {
        self.reader.jump(self.content_start() as usize)
    }

    /// List the root directory with names and offsets decoded
    ///
    /// Continuations and back-references to records that are neither
    /// directories nor images are skipped. Subdirectories are listed, not
    /// entered.
    /// The reader position is left unchanged.
    pub fn root_entries(&mut self) -> WzResult<Vec<ResolvedEntry>> {
        let content_start = self.content_start();
        self.reader.peek(|r| {
            r.jump(content_start as usize)?;
            r.read_i16()?;
            let count = usize::try_from(r.read_var_int()?).unwrap_or(0);

            let mut entries = Vec::new();
            for index in 0..count {
                match EntryRecord::read(r, content_start)? {
                    EntryRecord::Continuation => {}
                    EntryRecord::Entry(entry) => {
                        if let EntryKind::Other(tag) = entry.kind {
                            trace!(index, tag, "Skipped reference to non-entry record");
                            continue;
                        }
                        entries.push(entry.resolve(r, content_start)?);
                    }
                }
            }
            Ok(entries)
        })
    }

    /// Release the archive and its backing storage
    pub fn close(self) {
        drop(self);
    }

    /// Release the archive, returning its backing storage
    pub fn into_storage(self) -> Storage {
        self.reader.into_inner()
    }
}

impl TryFrom<Vec<u8>> for WzArchive {
    type Error = ArchiveOpenError;

    /// Open with the default options
    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::open_with(Storage::Buffered(bytes), ArchiveConfig::default())
    }
}

/// Convenience for callers that only need the cause
impl From<ArchiveOpenError> for WzError {
    fn from(err: ArchiveOpenError) -> Self {
        err.into_cause()
    }
}
