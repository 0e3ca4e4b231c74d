//! Cryptographic primitives for WZ game-asset archives
//!
//! WZ archives never store their directory in the clear. Entry names are
//! XOR-obfuscated with a rolling mask and, for most regional clients, an
//! AES-derived keystream. Entry offsets are scrambled with a formula keyed on
//! a *version hash* that is itself never written to the file.
//!
//! # Components
//!
//! - **Variants**: [`WzVariant`] selects the regional keystream parameters
//! - **Keystream**: [`WzKeystream`] derives and caches keystream bytes
//! - **Version hashing**: [`VersionHash`] computes candidate hashes and their
//!   one-byte checksum stored in the directory header
//! - **Offsets**: [`decode_offset`]/[`encode_offset`] implement the pointer
//!   obfuscation
//! - **Strings**: [`string`] applies the rolling mask and keystream to name data
//!
//! # Examples
//!
//! ## Deriving keystream bytes
//!
//! ```
//! use wz_crypto::{WzKeystream, WzVariant};
//!
//! let mut keystream = WzKeystream::new(WzVariant::Gms);
//! let first = keystream.derive(32).to_vec();
//! assert_eq!(first.len(), 32);
//!
//! // Shorter requests are served from the cache
//! assert_eq!(keystream.derive(16), &first[..16]);
//! ```
//!
//! ## Version hashes
//!
//! ```
//! use wz_crypto::VersionHash;
//!
//! let hash = VersionHash::compute(100);
//! assert_eq!(hash.value(), 52817);
//! assert_eq!(hash.check_byte(), 0x60);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod keystream;
pub mod offset;
pub mod string;
pub mod variant;
pub mod version;

pub use error::CryptoError;

// Re-export commonly used types
pub use keystream::WzKeystream;
pub use offset::{OFFSET_KEY, decode_offset, encode_offset};
pub use variant::WzVariant;
pub use version::VersionHash;
