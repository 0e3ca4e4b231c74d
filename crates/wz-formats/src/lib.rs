//! Bootstrap decoder for WZ game-asset archives
//!
#![allow(clippy::cast_possible_truncation)] // 32-bit archive offsets
#![allow(clippy::cast_possible_wrap)] // Signed length markers
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // Format terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::missing_const_for_fn)] // Readers are not const-friendly
//! An archive opens with a `"PKG1"` header and a root directory whose entry
//! names, sizes and offsets are obfuscated. Every offset is keyed on a
//! version hash that is not stored in the file, so nothing past the root
//! directory can be read until that hash has been recovered. This crate
//! does exactly that and hands back a reader primed for a directory walker.
//!
//! # Components
//!
//! - **Reader**: [`WzReader`] with little-endian, var-int, obfuscated string
//!   and obfuscated offset primitives plus nestable [`WzReader::peek`]
//! - **Header**: [`WzHeader`]
//! - **Entries**: [`EntryRecord`] and [`DirectoryEntry`] for root directory
//!   records, with lazy back-reference name resolution
//! - **Detection**: [`VersionDetector`] runs the brute-force version search
//! - **Archive**: [`WzArchive`] opens a file or buffer and runs detection
//!
//! # Example
//!
//! ```no_run
//! use wz_crypto::WzVariant;
//! use wz_formats::WzArchive;
//!
//! let mut archive = WzArchive::open_path("Base.wz", WzVariant::Gms, true)?;
//! println!("version {} (hash {:#x})", archive.version(), archive.version_hash());
//! for entry in archive.root_entries()? {
//!     println!("{:?} {} @ {}", entry.kind, entry.name, entry.offset);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod detect;
pub mod entry;
pub mod error;
pub mod header;
pub mod reader;

pub use archive::{Storage, WzArchive};
pub use config::ArchiveConfig;
pub use detect::{
    Detection, PROPERTY_MARKER, PROPERTY_NAME, TrialOutcome, VersionDetector, detect,
};
pub use entry::{DirectoryEntry, EntryKind, EntryName, EntryRecord, EntryTag, ResolvedEntry};
pub use error::{ArchiveOpenError, WzError, WzResult};
pub use header::{WZ_MAGIC, WzHeader};
pub use reader::WzReader;

pub use wz_crypto::{VersionHash, WzVariant};
