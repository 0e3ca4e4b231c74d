//! Archive open options

use crate::error::WzResult;
use serde::{Deserialize, Serialize};
use wz_crypto::WzVariant;

/// How to open an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Keystream variant for string decryption
    pub variant: WzVariant,
    /// Whether strings are keystream-encrypted
    pub encrypted: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            variant: WzVariant::Gms,
            encrypted: true,
        }
    }
}

impl ArchiveConfig {
    /// Options for the given variant and encryption flag
    pub const fn new(variant: WzVariant, encrypted: bool) -> Self {
        Self { variant, encrypted }
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> WzResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
