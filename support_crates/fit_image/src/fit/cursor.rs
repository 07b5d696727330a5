//! Bounds-checked sequential reading of a byte buffer

use core::ffi::CStr;
use core::mem;
use thiserror_no_std::Error;

/// A read would have touched bytes outside of the underlying buffer
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("Reading {len} bytes at offset {offset} would cross the end of the buffer at {end}")]
pub struct OutOfRange {
    /// Offset at which the read was attempted
    pub offset: usize,
    /// How many bytes were requested (for strings: everything up to the end of the buffer)
    pub len: usize,
    /// Logical end of the buffer
    pub end: usize,
}

/// A read position inside a byte buffer.
///
/// Every read first checks that it stays inside the buffer and then advances the position past the consumed
/// bytes so that nothing is read twice.
/// Failed reads leave the position untouched.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ByteCursor<'buf> {
    buf: &'buf [u8],
    pos: usize,
}

impl<'buf> ByteCursor<'buf> {
    /// Create a cursor positioned at the start of `buf`
    pub fn new(buf: &'buf [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Create a cursor positioned at `pos` inside of `buf`
    pub fn at(buf: &'buf [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// The current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// How many bytes are left between the current position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// All bytes that have not been consumed yet
    pub fn rest(&self) -> &'buf [u8] {
        self.buf.get(self.pos..).unwrap_or(&[])
    }

    fn out_of_range(&self, len: usize) -> OutOfRange {
        OutOfRange {
            offset: self.pos,
            len,
            end: self.buf.len(),
        }
    }

    /// Consume `len` bytes and return them as a slice of the underlying buffer
    pub fn read_bytes(&mut self, len: usize) -> Result<&'buf [u8], OutOfRange> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| self.out_of_range(len))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfRange> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Consume a big-endian encoded `u32`
    pub fn read_u32_be(&mut self) -> Result<u32, OutOfRange> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Consume a little-endian encoded `u32`
    pub fn read_u32_le(&mut self) -> Result<u32, OutOfRange> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Consume `len` bytes without looking at them
    pub fn skip(&mut self, len: usize) -> Result<(), OutOfRange> {
        self.read_bytes(len).map(|_| ())
    }

    /// Consume a nul-terminated string in place.
    ///
    /// The terminator must be located inside the buffer.
    pub fn read_cstr(&mut self) -> Result<&'buf CStr, OutOfRange> {
        let s = self
            .buf
            .get(self.pos..)
            .and_then(|rest| CStr::from_bytes_until_nul(rest).ok())
            .ok_or_else(|| self.out_of_range(self.remaining() + 1))?;
        self.pos += s.to_bytes_with_nul().len();
        Ok(s)
    }

    /// Move forward to the next offset at which a structure token may start
    pub fn align_to_token(&mut self) {
        self.pos = align_to_token(self.pos);
    }
}

/// Align a number (typically a buffer index) so that it can be used to access aligned FIT tokens
#[inline]
pub(crate) const fn align_to_token(n: usize) -> usize {
    const ALIGNMENT: usize = mem::size_of::<u32>();
    (n + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}
