//! Positioned reader over WZ archive bytes
//!
//! [`WzReader`] is a cursor with the decoding primitives every WZ structure
//! is built from: little-endian integers, the compact variable-width integer,
//! obfuscated strings and obfuscated offsets. All reads advance the cursor;
//! [`WzReader::peek`] runs a closure and puts the cursor back afterwards.
//!
//! ```
//! use wz_crypto::WzVariant;
//! use wz_formats::reader::WzReader;
//!
//! let data = vec![0x05, 0x80, 0x00, 0x01, 0x00, 0x00];
//! let mut reader = WzReader::new(data, WzVariant::Classic, false);
//!
//! assert_eq!(reader.read_var_int()?, 5);
//! let long = reader.peek(|r| r.read_var_int())?;
//! assert_eq!(long, 256);
//! assert_eq!(reader.position(), 1);
//! # Ok::<(), wz_formats::WzError>(())
//! ```

use crate::error::{WzError, WzResult};
use wz_crypto::string::{unmask_narrow, unmask_wide};
use wz_crypto::{WzKeystream, WzVariant, decode_offset};

/// Marker byte announcing a 4-byte variable-width integer
const VAR_INT_SENTINEL: i8 = i8::MIN;

/// Length marker announcing a 4-byte length for 8-bit strings
const NARROW_LEN_SENTINEL: i8 = i8::MIN;

/// Length marker announcing a 4-byte length for UTF-16 strings
const WIDE_LEN_SENTINEL: i8 = i8::MAX;

/// Cursor over archive bytes with WZ decoding primitives
pub struct WzReader<D> {
    data: D,
    pos: usize,
    /// Saved cursor positions of enclosing peeks, innermost last
    saved: Vec<usize>,
    keystream: WzKeystream,
    encrypted: bool,
    version_hash: Option<u32>,
}

impl<D: AsRef<[u8]>> WzReader<D> {
    /// Create a reader at position 0
    ///
    /// `encrypted` controls whether string reads decrypt by default. The
    /// keystream is created either way.
    pub fn new(data: D, variant: WzVariant, encrypted: bool) -> Self {
        Self {
            data,
            pos: 0,
            saved: Vec::new(),
            keystream: WzKeystream::new(variant),
            encrypted,
            version_hash: None,
        }
    }

    /// All bytes behind this reader
    pub fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Total length of the data
    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Whether the data is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos)
    }

    /// Keystream variant used for string decryption
    pub const fn variant(&self) -> WzVariant {
        self.keystream.variant()
    }

    /// Whether string reads apply the keystream by default
    pub const fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// The committed version hash, once detection has succeeded
    pub const fn version_hash(&self) -> Option<u32> {
        self.version_hash
    }

    /// Number of peeks currently open
    pub fn peek_depth(&self) -> usize {
        self.saved.len()
    }

    /// Release the reader, returning the underlying data
    pub fn into_inner(self) -> D {
        self.data
    }

    /// Fix the version hash used by [`Self::read_obfuscated_offset`]
    pub(crate) fn commit_version_hash(&mut self, hash: u32) {
        debug_assert!(
            self.version_hash.is_none_or(|current| current == hash),
            "version hash committed twice with different values"
        );
        self.version_hash = Some(hash);
    }

    /// Keystream used for decryption
    pub const fn keystream(&self) -> &WzKeystream {
        &self.keystream
    }

    pub(crate) fn truncated(&self, offset: usize, needed: usize) -> WzError {
        WzError::TruncatedInput {
            offset,
            needed,
            len: self.len(),
        }
    }

    fn take(&mut self, n: usize) -> WzResult<&[u8]> {
        let start = self.pos;
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.len())
            .ok_or_else(|| self.truncated(start, n))?;
        self.pos = end;
        Ok(&self.data.as_ref()[start..end])
    }

    fn take_array<const N: usize>(&mut self) -> WzResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> WzResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read one signed byte
    pub fn read_i8(&mut self) -> WzResult<i8> {
        Ok(i8::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `u16`
    pub fn read_u16(&mut self) -> WzResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `i16`
    pub fn read_i16(&mut self) -> WzResult<i16> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> WzResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> WzResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `u64`
    pub fn read_u64(&mut self) -> WzResult<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Read `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> WzResult<&[u8]> {
        self.take(n)
    }

    /// Advance the cursor by `n` bytes
    pub fn skip(&mut self, n: usize) -> WzResult<()> {
        self.take(n).map(|_| ())
    }

    /// Move the cursor to an absolute offset
    ///
    /// Offsets up to and including the end of the data are accepted.
    pub fn jump(&mut self, offset: usize) -> WzResult<()> {
        if offset > self.len() {
            return Err(self.truncated(offset, 0));
        }
        self.pos = offset;
        Ok(())
    }

    /// Run `f` at the current position, then restore the position
    ///
    /// The cursor is restored whether `f` succeeds or fails. Peeks nest: each
    /// level pushes its own saved position and pops it on return.
    pub fn peek<T>(&mut self, f: impl FnOnce(&mut Self) -> WzResult<T>) -> WzResult<T> {
        self.saved.push(self.pos);
        let result = f(self);
        if let Some(saved) = self.saved.pop() {
            self.pos = saved;
        }
        result
    }

    /// Read exactly `n` bytes as 8-bit text
    pub fn read_fixed_ascii(&mut self, n: usize) -> WzResult<String> {
        Ok(self.take(n)?.iter().copied().map(char::from).collect())
    }

    /// Read bytes up to a NUL terminator, consuming the terminator
    pub fn read_null_terminated_ascii(&mut self) -> WzResult<String> {
        let start = self.pos;
        let rest = &self.data.as_ref()[start.min(self.len())..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(self.truncated(start, rest.len() + 1));
        };
        let text = rest[..nul].iter().copied().map(char::from).collect();
        self.pos = start + nul + 1;
        Ok(text)
    }

    /// Read a compact integer
    ///
    /// A single signed byte holds the value unless it is `-128`, in which
    /// case the value is the following little-endian `i32`.
    pub fn read_var_int(&mut self) -> WzResult<i32> {
        match self.read_i8()? {
            VAR_INT_SENTINEL => self.read_i32(),
            small => Ok(i32::from(small)),
        }
    }

    /// Read an obfuscated string, decrypting it if the archive is encrypted
    pub fn read_obfuscated_string(&mut self) -> WzResult<String> {
        self.read_obfuscated_string_with(self.encrypted)
    }

    /// Read an obfuscated string with explicit decryption handling
    ///
    /// The sign of the length byte selects the encoding: negative for 8-bit
    /// characters, positive for UTF-16 code units. With `decrypt` set each
    /// unit is XOR-ed with the rolling mask and the keystream; otherwise the
    /// stored units are returned as they are.
    pub fn read_obfuscated_string_with(&mut self, decrypt: bool) -> WzResult<String> {
        self.read_string(decrypt, usize::MAX)
    }

    /// Read an obfuscated string declaring at most `max_units` units
    ///
    /// Longer declarations fail with [`WzError::MalformedString`] before any
    /// data is read or keystream derived. Used where only a short known name
    /// is acceptable.
    pub fn read_obfuscated_string_bounded(&mut self, decrypt: bool, max_units: usize) -> WzResult<String> {
        self.read_string(decrypt, max_units)
    }

    fn read_string(&mut self, decrypt: bool, max_units: usize) -> WzResult<String> {
        let start = self.pos;
        let marker = self.read_i8()?;
        let (wide, len) = match marker {
            0 => return Ok(String::new()),
            WIDE_LEN_SENTINEL => (true, self.read_i32()?),
            1.. => (true, i32::from(marker)),
            NARROW_LEN_SENTINEL => (false, self.read_i32()?),
            _ => (false, -i32::from(marker)),
        };
        if wide {
            let units = self.string_units(start, len, 2, max_units)?;
            self.read_wide(start, units, decrypt)
        } else {
            let units = self.string_units(start, len, 1, max_units)?;
            self.read_narrow(units, decrypt)
        }
    }

    /// Validate a declared string length against the limit and the
    /// remaining bytes
    fn string_units(&self, start: usize, len: i32, unit_size: usize, max_units: usize) -> WzResult<usize> {
        let units = usize::try_from(len).map_err(|_| WzError::MalformedString {
            position: start,
            reason: format!("negative length {len}"),
        })?;
        if units > max_units {
            return Err(WzError::MalformedString {
                position: start,
                reason: format!("declared {units} units, at most {max_units} accepted"),
            });
        }
        match units.checked_mul(unit_size) {
            Some(bytes) if bytes <= self.remaining() => Ok(units),
            _ => Err(WzError::MalformedString {
                position: start,
                reason: format!(
                    "declared {units} units of {unit_size} bytes, {} bytes remain",
                    self.remaining()
                ),
            }),
        }
    }

    fn read_narrow(&mut self, units: usize, decrypt: bool) -> WzResult<String> {
        let mut buf = self.take(units)?.to_vec();
        if decrypt {
            unmask_narrow(&mut buf, self.keystream.derive(units));
        }
        Ok(buf.into_iter().map(char::from).collect())
    }

    fn read_wide(&mut self, start: usize, units: usize, decrypt: bool) -> WzResult<String> {
        let mut buf: Vec<u16> = self
            .take(units * 2)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if decrypt {
            unmask_wide(&mut buf, self.keystream.derive(units * 2));
        }
        String::from_utf16(&buf).map_err(|_| WzError::MalformedString {
            position: start,
            reason: "invalid UTF-16".to_string(),
        })
    }

    /// Decode an obfuscated offset using the committed version hash
    ///
    /// Fails with [`WzError::VersionHashUnset`] before detection has run.
    pub fn read_obfuscated_offset(&mut self, content_start: u32) -> WzResult<u32> {
        let hash = self.version_hash.ok_or(WzError::VersionHashUnset)?;
        self.read_obfuscated_offset_with(content_start, hash)
    }

    /// Decode an obfuscated offset with an explicit version hash
    ///
    /// Returns the absolute file offset the field points to. Archives are
    /// addressed with 32-bit offsets, so the cursor position is truncated to
    /// `u32` for the mask computation.
    pub fn read_obfuscated_offset_with(&mut self, content_start: u32, version_hash: u32) -> WzResult<u32> {
        let position = self.pos as u32;
        let raw = self.read_u32()?;
        Ok(decode_offset(position, content_start, version_hash, raw))
    }
}

impl<D> std::fmt::Debug for WzReader<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WzReader")
            .field("pos", &self.pos)
            .field("peek_depth", &self.saved.len())
            .field("keystream", &self.keystream)
            .field("encrypted", &self.encrypted)
            .field("version_hash", &self.version_hash)
            .finish_non_exhaustive()
    }
}
