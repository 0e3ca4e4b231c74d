//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Variant name not recognised when parsing a selector
    #[error("Unknown WZ variant: {0} (expected one of gms, msea, kms, classic)")]
    UnknownVariant(String),
}
