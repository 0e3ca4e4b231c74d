//! Obfuscated directory offsets
//!
//! Every directory entry stores the absolute offset of its data as 4 bytes
//! XOR-ed with a mask derived from the field's own position, the content
//! start and the version hash. The mask is an involution over the stored
//! value, so the same routine encodes and decodes.

/// Constant subtracted while mixing the offset mask
pub const OFFSET_KEY: u32 = 0x581C_3F6D;

/// Mask applied to the stored 4 bytes of an offset field
///
/// `position` is the absolute position of the offset field.
pub fn offset_mask(position: u32, content_start: u32, version_hash: u32) -> u32 {
    let mixed = (position.wrapping_sub(content_start) ^ u32::MAX)
        .wrapping_mul(version_hash)
        .wrapping_sub(OFFSET_KEY);
    mixed.rotate_left(mixed & 0x1F)
}

/// Decode a stored offset field into an absolute file offset
///
/// The mask-removed value is relative to `content_start` and is itself
/// biased by one more `content_start`, hence the doubled addition.
pub fn decode_offset(position: u32, content_start: u32, version_hash: u32, raw: u32) -> u32 {
    (offset_mask(position, content_start, version_hash) ^ raw)
        .wrapping_add(content_start.wrapping_mul(2))
}

/// Encode an absolute file offset as it would be stored at `position`
pub fn encode_offset(position: u32, content_start: u32, version_hash: u32, target: u32) -> u32 {
    target.wrapping_sub(content_start.wrapping_mul(2))
        ^ offset_mask(position, content_start, version_hash)
}
