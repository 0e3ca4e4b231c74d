//! Keystream generation for WZ string decryption
//!
//! The keystream is AES-256 run as a chained block generator: the first
//! 16-byte block is the variant IV repeated four times, and every keystream
//! block is the encryption of the previous one. The result only depends on
//! the variant, so bytes are derived once and cached.

use crate::variant::WzVariant;
use aes::{Aes256, Block};
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

/// AES-256 key shared by every regional client
const AES_USER_KEY: [u8; 32] = [
    0x13, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0xB4, 0x00, 0x00,
    0x00, 0x1B, 0x00, 0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x33, 0x00, 0x00, 0x00, 0x52, 0x00,
    0x00, 0x00,
];

const BLOCK_SIZE: usize = 16;

/// Cached keystream for a single variant
pub struct WzKeystream {
    variant: WzVariant,
    /// `None` for zero-IV variants
    cipher: Option<Aes256>,
    /// Last generated block, input for the next one
    block: [u8; BLOCK_SIZE],
    cache: Vec<u8>,
}

impl WzKeystream {
    /// Create a keystream generator for `variant`
    ///
    /// No bytes are derived until they are first requested.
    pub fn new(variant: WzVariant) -> Self {
        let iv = variant.iv();
        let mut block = [0u8; BLOCK_SIZE];
        for chunk in block.chunks_exact_mut(iv.len()) {
            chunk.copy_from_slice(&iv);
        }

        let cipher = if variant.has_zero_iv() {
            None
        } else {
            Some(Aes256::new(GenericArray::from_slice(&AES_USER_KEY)))
        };

        Self {
            variant,
            cipher,
            block,
            cache: Vec::new(),
        }
    }

    /// Variant this keystream was built for
    pub const fn variant(&self) -> WzVariant {
        self.variant
    }

    /// Number of bytes derived so far
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Return the first `len` keystream bytes, extending the cache if needed
    pub fn derive(&mut self, len: usize) -> &[u8] {
        self.extend_to(len);
        &self.cache[..len]
    }

    /// XOR `data` with the keystream starting at index 0
    pub fn apply(&mut self, data: &mut [u8]) {
        let key = self.derive(data.len());
        for (byte, k) in data.iter_mut().zip(key) {
            *byte ^= k;
        }
    }

    fn extend_to(&mut self, len: usize) {
        if self.cache.len() >= len {
            return;
        }

        match &self.cipher {
            None => self.cache.resize(len, 0),
            Some(cipher) => {
                self.cache.reserve(len.next_multiple_of(BLOCK_SIZE) - self.cache.len());
                while self.cache.len() < len {
                    let mut block = Block::clone_from_slice(&self.block);
                    cipher.encrypt_block(&mut block);
                    self.block.copy_from_slice(&block);
                    self.cache.extend_from_slice(&self.block);
                }
            }
        }
    }
}

impl std::fmt::Debug for WzKeystream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WzKeystream")
            .field("variant", &self.variant)
            .field("cached_len", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_per_variant() {
        let mut a = WzKeystream::new(WzVariant::Gms);
        let mut b = WzKeystream::new(WzVariant::Gms);
        assert_eq!(a.derive(100), b.derive(100));
    }

    #[test]
    fn test_cache_prefix_consistency() {
        let mut grown = WzKeystream::new(WzVariant::Msea);
        let short = grown.derive(5).to_vec();
        let long = grown.derive(70).to_vec();
        assert_eq!(&long[..5], &short[..]);

        let mut fresh = WzKeystream::new(WzVariant::Msea);
        assert_eq!(fresh.derive(70), &long[..]);
        assert_eq!(grown.derive(5), &short[..]);
    }

    #[test]
    fn test_cache_grows_in_blocks() {
        let mut keystream = WzKeystream::new(WzVariant::Gms);
        assert_eq!(keystream.cached_len(), 0);
        keystream.derive(1);
        assert_eq!(keystream.cached_len(), 16);
        keystream.derive(17);
        assert_eq!(keystream.cached_len(), 32);
        keystream.derive(3);
        assert_eq!(keystream.cached_len(), 32);
    }

    #[test]
    fn test_variants_differ() {
        let mut gms = WzKeystream::new(WzVariant::Gms);
        let mut msea = WzKeystream::new(WzVariant::Msea);
        assert_ne!(gms.derive(32), msea.derive(32));
    }

    #[test]
    fn test_kms_matches_msea() {
        let mut kms = WzKeystream::new(WzVariant::Kms);
        let mut msea = WzKeystream::new(WzVariant::Msea);
        assert_eq!(kms.derive(48), msea.derive(48));
    }

    #[test]
    fn test_classic_is_zero() {
        let mut classic = WzKeystream::new(WzVariant::Classic);
        assert!(classic.derive(33).iter().all(|&b| b == 0));
        assert_eq!(classic.cached_len(), 33);
    }

    #[test]
    fn test_apply_is_involution() {
        let mut keystream = WzKeystream::new(WzVariant::Gms);
        let original = b"Property".to_vec();
        let mut data = original.clone();
        keystream.apply(&mut data);
        assert_ne!(data, original);
        keystream.apply(&mut data);
        assert_eq!(data, original);
    }
}
