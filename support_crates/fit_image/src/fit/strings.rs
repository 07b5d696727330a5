//! Handling of the *strings* block
//!
//! Property names are not stored inline but as offsets into this block of nul-terminated strings.
//! This is implemented according to [Devicetree Spec Section 5.5](https://devicetree-specification.readthedocs.io/en/v0.3/flattened-format.html#strings-block).

use crate::fit::cursor::{ByteCursor, OutOfRange};
use core::ffi::CStr;

/// A view of the strings block of an image
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Strings<'buf> {
    /// The whole image, bounding every lookup
    image: &'buf [u8],
    /// Offset of the strings block inside the image
    base: usize,
}

impl<'buf> Strings<'buf> {
    pub fn new(image: &'buf [u8], base: usize) -> Self {
        Self { image, base }
    }

    /// Resolve the string starting `offset` bytes into the strings block.
    ///
    /// Both the start of the string and its terminator must lie inside the image.
    pub fn get_string(&self, offset: u32) -> Result<&'buf CStr, OutOfRange> {
        let pos = self.base.checked_add(offset as usize).ok_or(OutOfRange {
            offset: self.base,
            len: offset as usize,
            end: self.image.len(),
        })?;
        ByteCursor::at(self.image, pos).read_cstr()
    }
}
