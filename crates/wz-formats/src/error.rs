//! Error types for WZ archive decoding

use thiserror::Error;

/// Errors raised while decoding a WZ archive
#[derive(Debug, Error)]
pub enum WzError {
    /// The file does not start with `"PKG1"`
    #[error("invalid magic: expected \"PKG1\", found {found:?}")]
    BadMagic {
        /// The four characters actually present
        found: String,
    },

    /// The root directory declares zero entries
    #[error("root directory at offset {content_start} has no entries")]
    EmptyArchive {
        /// Offset of the root directory
        content_start: u32,
    },

    /// A directory entry tag outside `1..=4`
    #[error("unknown directory entry kind {tag} at offset {position}")]
    UnknownEntryKind {
        /// The tag byte read
        tag: u8,
        /// Absolute position of the tag byte
        position: usize,
    },

    /// The directory scan found no image entry to anchor detection on
    #[error("root directory has no image entries ({scanned} entries scanned)")]
    NoImageEntries {
        /// Number of entries scanned
        scanned: usize,
    },

    /// No 16-bit version produced a confirmed hash
    #[error(
        "failed to guess archive version: no candidate matched checksum {stored_version} ({trials} candidates tried)"
    )]
    VersionGuessExhausted {
        /// Checksum value stored in the directory header
        stored_version: i16,
        /// Candidates whose checksum matched and were trial-decoded
        trials: usize,
    },

    /// A read or jump ran past the end of the data
    #[error("truncated input: {needed} bytes requested at offset {offset}, data length is {len}")]
    TruncatedInput {
        /// Position of the request
        offset: usize,
        /// Bytes requested
        needed: usize,
        /// Total length of the data
        len: usize,
    },

    /// A string declared an impossible length or held invalid text
    #[error("malformed string at offset {position}: {reason}")]
    MalformedString {
        /// Position of the length marker
        position: usize,
        /// What was wrong
        reason: String,
    },

    /// An obfuscated offset was decoded before the version hash was known
    #[error("version hash has not been established")]
    VersionHashUnset,

    /// Open options could not be parsed
    #[error("invalid archive configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// Opening or mapping the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WzError {
    /// Whether this error comes from a reader primitive running out of data
    /// or hitting garbage, as opposed to a structural archive problem
    pub const fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::TruncatedInput { .. } | Self::MalformedString { .. }
        )
    }
}

/// Result type for WZ decoding
pub type WzResult<T> = Result<T, WzError>;

/// Failure to open an archive, carrying the specific cause
#[derive(Debug, Error)]
#[error("failed to open WZ archive {origin}: {source}")]
pub struct ArchiveOpenError {
    origin: String,
    #[source]
    source: WzError,
}

impl ArchiveOpenError {
    /// Wrap `source` for the archive identified by `origin`
    pub fn new(origin: impl Into<String>, source: WzError) -> Self {
        Self {
            origin: origin.into(),
            source,
        }
    }

    /// Path or label of the archive that failed to open
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The underlying cause
    pub const fn cause(&self) -> &WzError {
        &self.source
    }

    /// Consume the error, returning the underlying cause
    pub fn into_cause(self) -> WzError {
        self.source
    }
}
