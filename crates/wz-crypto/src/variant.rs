//! Regional archive variants
//!
//! Each regional client ships archives encrypted with the same AES key but a
//! different 4-byte IV. Classic clients (and several private-server builds)
//! use an all-zero IV, which yields an all-zero keystream.

use crate::error::CryptoError;
use std::fmt;
use std::str::FromStr;

/// Keystream parameter set used by an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WzVariant {
    /// Global client
    #[default]
    Gms,
    /// South-East Asian client
    Msea,
    /// Korean client (shares the MSEA IV)
    Kms,
    /// Zero IV: names are masked but not keystream-encrypted
    Classic,
}

impl WzVariant {
    /// All variants in a stable order
    pub const ALL: [Self; 4] = [Self::Gms, Self::Msea, Self::Kms, Self::Classic];

    /// The 4-byte IV seeding this variant's keystream
    pub const fn iv(self) -> [u8; 4] {
        match self {
            Self::Gms => [0x4D, 0x23, 0xC7, 0x2B],
            Self::Msea | Self::Kms => [0xB9, 0x7D, 0x63, 0xE9],
            Self::Classic => [0x00; 4],
        }
    }

    /// Whether the keystream for this variant is all zeros
    pub const fn has_zero_iv(self) -> bool {
        matches!(self, Self::Classic)
    }

    /// Lowercase selector name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gms => "gms",
            Self::Msea => "msea",
            Self::Kms => "kms",
            Self::Classic => "classic",
        }
    }
}

impl fmt::Display for WzVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WzVariant {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gms" | "global" => Ok(Self::Gms),
            "msea" | "sea" => Ok(Self::Msea),
            "kms" => Ok(Self::Kms),
            "classic" | "bms" | "none" => Ok(Self::Classic),
            _ => Err(CryptoError::UnknownVariant(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for variant in WzVariant::ALL {
            let parsed: WzVariant = variant.to_string().parse().unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Global".parse::<WzVariant>().unwrap(), WzVariant::Gms);
        assert_eq!(" BMS ".parse::<WzVariant>().unwrap(), WzVariant::Classic);
        assert_eq!("sea".parse::<WzVariant>().unwrap(), WzVariant::Msea);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "jms".parse::<WzVariant>().unwrap_err();
        assert_eq!(err, CryptoError::UnknownVariant("jms".to_string()));
    }

    #[test]
    fn test_kms_shares_msea_iv() {
        assert_eq!(WzVariant::Kms.iv(), WzVariant::Msea.iv());
        assert_ne!(WzVariant::Gms.iv(), WzVariant::Msea.iv());
        assert!(WzVariant::Classic.has_zero_iv());
        assert!(!WzVariant::Gms.has_zero_iv());
    }
}
