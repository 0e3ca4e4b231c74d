//! Command-line options
//!
//! Options come from CLI flags, then environment variables (`WZ_VARIANT`,
//! `WZ_ENCRYPTED`, `WZ_CONFIG`), then an optional JSON config file, then
//! defaults.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wz_crypto::WzVariant;
use wz_formats::ArchiveConfig;

/// Inspector options
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wz-inspect",
    about = "Open a WZ archive, detect its version and list the root directory",
    version
)]
pub struct InspectArgs {
    /// Archive file to open
    pub path: PathBuf,

    /// Keystream variant: gms, msea, kms or classic
    #[arg(long, env = "WZ_VARIANT")]
    pub variant: Option<WzVariant>,

    /// Whether names are keystream-encrypted (defaults to false for classic)
    #[arg(long, env = "WZ_ENCRYPTED")]
    pub encrypted: Option<bool>,

    /// JSON file with `variant` and `encrypted` fields
    #[arg(long, env = "WZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// List root directory entries
    #[arg(long)]
    pub list: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectArgs {
    /// Parse options from the process arguments
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Resolve the archive options
    ///
    /// Flags override the config file. A variant given without an explicit
    /// encryption flag turns encryption off for zero-IV variants.
    pub fn archive_config(&self) -> Result<ArchiveConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                ArchiveConfig::from_json_str(&json)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => ArchiveConfig::default(),
        };

        if let Some(variant) = self.variant {
            config.variant = variant;
            if self.encrypted.is_none() && variant.has_zero_iv() {
                config.encrypted = false;
            }
        }
        if let Some(encrypted) = self.encrypted {
            config.encrypted = encrypted;
        }
        Ok(config)
    }
}
