//! Casper `bytesrepr` primitives.
//!
//! Encoding rules:
//! - Fixed-width integers: little-endian
//! - bool: one byte, 0 or 1
//! - Bytes / String: u32 length, then data
//! - Option: 0 (none) or 1 followed by the value
//! - Big integers (U128/U256/U512): one length byte, then little-endian bytes
//!
//! # Security
//!
//! - Validates all length fields against the remaining input before access
//! - No allocation is sized from an unchecked length field

use thiserror::Error;

/// Codec errors for untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input too short for declared length.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// Unknown variant tag.
    #[error("invalid tag {0}")]
    InvalidTag(u8),
    /// Boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
    /// String bytes are not UTF-8.
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    /// Length or count exceeds what the input can hold.
    #[error("length {0} exceeds remaining input")]
    LengthOverflow(usize),
    /// Extra data after the value.
    #[error("{0} trailing bytes")]
    TrailingData(usize),
    /// Exceeded maximum nesting depth.
    #[error("nesting exceeds depth limit")]
    TooDeep,
    /// Hex string could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    /// JSON document has an unexpected shape.
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

impl From<hex::FromHexError> for CodecError {
    fn from(e: hex::FromHexError) -> Self {
        CodecError::InvalidHex(e.to_string())
    }
}

/// Cursor over untrusted bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the unread bytes and consumes them.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads a fixed-size array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn bool(&mut self) -> Result<bool, CodecError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(CodecError::InvalidBool(b)),
        }
    }

    pub fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// Reads a u32 length and checks it against the remaining input.
    pub fn length(&mut self) -> Result<usize, CodecError> {
        let len = self.u32()? as usize;
        if len > self.remaining() {
            return Err(CodecError::LengthOverflow(len));
        }
        Ok(len)
    }

    /// Reads u32-length-prefixed bytes.
    pub fn bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.length()?;
        self.take(len)
    }

    /// Reads a u32-length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<String, CodecError> {
        let raw = self.bytes()?;
        core::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// Reads a big unsigned integer of at most `max_len` bytes.
    pub fn big_uint(&mut self, max_len: usize) -> Result<num_bigint::BigUint, CodecError> {
        let len = self.u8()? as usize;
        if len > max_len {
            return Err(CodecError::LengthOverflow(len));
        }
        Ok(num_bigint::BigUint::from_bytes_le(self.take(len)?))
    }

    /// Fails if any byte remains unread.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingData(n)),
        }
    }
}

/// Growable output buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.u8(v as u8)
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.raw(&v.to_le_bytes())
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.raw(&v.to_le_bytes())
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.raw(&v.to_le_bytes())
    }

    /// Appends bytes without a length prefix.
    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Appends u32-length-prefixed bytes.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.u32(data.len() as u32).raw(data)
    }

    /// Appends a u32-length-prefixed UTF-8 string.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes())
    }

    /// Appends an optional u32.
    pub fn option_u32(&mut self, v: Option<u32>) -> &mut Self {
        match v {
            Some(v) => self.u8(1).u32(v),
            None => self.u8(0),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
