//! String obfuscation
//!
//! Names in encrypted archives are stored either as 8-bit characters or as
//! UTF-16 code units. Every unit is XOR-ed with a rolling mask that starts at
//! `0xAA` (`0xAAAA` for wide strings) and increments per unit, and with the
//! keystream byte(s) at the unit's index. Zero-IV variants have an all-zero
//! keystream, which leaves the mask alone. Unencrypted archives store names
//! as plain bytes and skip both.
//!
//! Both operations are involutions, so the functions here serve for encoding
//! as well as decoding.

/// Initial mask for 8-bit strings
pub const NARROW_MASK_SEED: u8 = 0xAA;

/// Initial mask for UTF-16 strings
pub const WIDE_MASK_SEED: u16 = 0xAAAA;

/// Apply the narrow mask and the keystream to `data` in place
///
/// Missing keystream bytes are treated as zero.
pub fn unmask_narrow(data: &mut [u8], key: &[u8]) {
    let mut mask = NARROW_MASK_SEED;
    for (i, byte) in data.iter_mut().enumerate() {
        let k = key.get(i).copied().unwrap_or(0);
        *byte ^= mask ^ k;
        mask = mask.wrapping_add(1);
    }
}

/// Apply the wide mask and the keystream to `units` in place
///
/// Unit `i` uses keystream bytes `2i` and `2i + 1` as a little-endian `u16`.
pub fn unmask_wide(units: &mut [u16], key: &[u8]) {
    let mut mask = WIDE_MASK_SEED;
    for (i, unit) in units.iter_mut().enumerate() {
        let k = key
            .get(2 * i..2 * i + 2)
            .map_or(0, |pair| u16::from_le_bytes([pair[0], pair[1]]));
        *unit ^= mask ^ k;
        mask = mask.wrapping_add(1);
    }
}
