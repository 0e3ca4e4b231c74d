//! Version hash computation
//!
//! The client version number (e.g. 83) is folded over its decimal ASCII
//! digits into a 32-bit hash. Only a single checksum byte of that hash is
//! stored in the archive, so readers recover the full hash by trying every
//! 16-bit version whose checksum matches.

/// Seed XOR-ed into the checksum byte
pub const VERSION_CHECK_SEED: u8 = 0xFF;

/// A candidate version number together with its 32-bit hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionHash {
    version: u16,
    hash: u32,
}

impl VersionHash {
    /// Compute the hash of `version`
    ///
    /// Each decimal digit `d` (as its ASCII byte) updates the accumulator as
    /// `acc = acc * 32 + d + 1`, wrapping on overflow.
    pub fn compute(version: u16) -> Self {
        let mut buf = [0u8; 5];
        let hash = decimal_digits(version, &mut buf)
            .iter()
            .fold(0u32, |acc, &digit| {
                acc.wrapping_mul(32)
                    .wrapping_add(u32::from(digit))
                    .wrapping_add(1)
            });
        Self { version, hash }
    }

    /// Iterate over every 16-bit candidate in ascending order
    pub fn candidates() -> impl Iterator<Item = Self> {
        (0..=u16::MAX).map(Self::compute)
    }

    /// The version number this hash was computed from
    pub const fn version(&self) -> u16 {
        self.version
    }

    /// The 32-bit hash value
    pub const fn value(&self) -> u32 {
        self.hash
    }

    /// Checksum byte as stored in the directory header
    pub fn check_byte(&self) -> u8 {
        let [b0, b1, b2, b3] = self.hash.to_le_bytes();
        VERSION_CHECK_SEED ^ b0 ^ b1 ^ b2 ^ b3
    }

    /// Whether this candidate's checksum equals the stored header value
    ///
    /// The header field is a signed 16-bit integer; values outside `0..=255`
    /// never match.
    pub fn matches(&self, stored: i16) -> bool {
        i16::from(self.check_byte()) == stored
    }
}

/// Write the decimal representation of `value` into the tail of `buf`
fn decimal_digits(mut value: u16, buf: &mut [u8; 5]) -> &[u8] {
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buf[start..]
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_of_zero() {
        // '0' = 0x30 -> 0 * 32 + 0x30 + 1
        let hash = VersionHash::compute(0);
        assert_eq!(hash.value(), 49);
        assert_eq!(hash.version(), 0);
    }

    #[test]
    fn test_hash_of_hundred() {
        // '1' -> 50, '0' -> 50 * 32 + 49 = 1649, '0' -> 1649 * 32 + 49 = 52817
        assert_eq!(VersionHash::compute(100).value(), 52817);
    }

    #[test]
    fn test_hash_of_one() {
        assert_eq!(VersionHash::compute(1).value(), 50);
    }

    #[test]
    fn test_hash_matches_string_fold() {
        for version in [7u16, 55, 83, 176, 9999, u16::MAX] {
            let expected = version
                .to_string()
                .bytes()
                .fold(0u32, |acc, b| acc.wrapping_mul(32).wrapping_add(u32::from(b) + 1));
            assert_eq!(VersionHash::compute(version).value(), expected);
        }
    }

    #[test]
    fn test_check_byte() {
        // 49 = 0x31 -> 0xFF ^ 0x31
        assert_eq!(VersionHash::compute(0).check_byte(), 0xCE);
        // 50 = 0x32 -> 0xFF ^ 0x32
        assert_eq!(VersionHash::compute(1).check_byte(), 0xCD);
        // 52817 = 0xCE51 -> 0xFF ^ 0x51 ^ 0xCE
        assert_eq!(VersionHash::compute(100).check_byte(), 0x60);
    }

    #[test]
    fn test_matches_stored_value() {
        let hash = VersionHash::compute(1);
        assert!(hash.matches(0xCD));
        assert!(!hash.matches(0xCE));
        assert!(!hash.matches(-51));
    }

    #[test]
    fn test_candidates_ascending_and_complete() {
        let mut count = 0usize;
        let mut previous = None;
        for candidate in VersionHash::candidates() {
            if let Some(prev) = previous {
                assert!(candidate.version() > prev);
            }
            previous = Some(candidate.version());
            count += 1;
        }
        assert_eq!(count, 65536);
    }

    #[test]
    fn test_decimal_digits() {
        let mut buf = [0u8; 5];
        assert_eq!(decimal_digits(0, &mut buf), b"0");
        assert_eq!(decimal_digits(65535, &mut buf), b"65535");
        assert_eq!(decimal_digits(305, &mut buf), b"305");
    }
}
