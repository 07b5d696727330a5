//! Record-by-record traversal of the structure block

use crate::fit::cursor::{ByteCursor, OutOfRange};
use crate::fit::structure::{FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_NOP, FDT_PROP};
use core::ffi::CStr;
use thiserror_no_std::Error;

/// Errors that abort a walk over the structure block
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum ScanError {
    /// The requested property does not exist on the requested node
    #[error("The requested property could not be found")]
    NotFound,
    /// A record or string would have been read from outside of the image
    #[error("The structure block is malformed: {0}")]
    OutOfRange(#[from] OutOfRange),
    /// A tag that is not part of the encoding was encountered
    #[error("Unknown tag {tag:#x} at offset {offset:#x}")]
    UnknownTag { tag: u32, offset: usize },
}

/// The content of a single record
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Token<'buf> {
    /// Start of a node with the given unit name (empty for the root node)
    BeginNode { name: &'buf CStr },
    /// End of the most recently opened node
    EndNode,
    /// A property of the most recently opened node
    Prop(RawProperty<'buf>),
    /// Filler without meaning
    Nop,
    /// End of the structure block
    End,
}

/// A property record whose name has not been resolved yet
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct RawProperty<'buf> {
    /// Offset of the property's name inside the strings block
    pub name_offset: u32,
    /// The property value, borrowed from the image
    pub value: &'buf [u8],
}

/// A record together with the image offset its tag was read from
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Record<'buf> {
    pub offset: usize,
    pub token: Token<'buf>,
}

/// A linear walker over the records of a structure block.
///
/// The walker yields records until (and including) the `FDT_END` record or until the first error.
/// It never reads past the end of the image it was created with.
#[derive(Debug, Clone)]
pub struct StructureWalker<'buf> {
    cursor: ByteCursor<'buf>,
    finished: bool,
}

impl<'buf> StructureWalker<'buf> {
    /// Create a walker over `image` whose structure block starts at `off_dt_struct`
    pub fn new(image: &'buf [u8], off_dt_struct: usize) -> Self {
        Self {
            cursor: ByteCursor::at(image, off_dt_struct),
            finished: false,
        }
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` once the `FDT_END` record has been handed out.
    pub fn next_record(&mut self) -> Result<Option<Record<'buf>>, ScanError> {
        if self.finished {
            return Ok(None);
        }

        let offset = self.cursor.position();
        let token = match self.cursor.read_u32_be()? {
            FDT_BEGIN_NODE => Token::BeginNode {
                name: self.cursor.read_cstr()?,
            },
            FDT_PROP => {
                let len = self.cursor.read_u32_be()?;
                let name_offset = self.cursor.read_u32_be()?;
                let value = self.cursor.read_bytes(len as usize)?;
                Token::Prop(RawProperty { name_offset, value })
            }
            FDT_END_NODE => Token::EndNode,
            FDT_NOP => Token::Nop,
            FDT_END => {
                self.finished = true;
                Token::End
            }
            tag => return Err(ScanError::UnknownTag { tag, offset }),
        };
        self.cursor.align_to_token();

        Ok(Some(Record { offset, token }))
    }
}

impl<'buf> Iterator for StructureWalker<'buf> {
    type Item = Result<Record<'buf>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.next_record().transpose();
        if matches!(result, Some(Err(_))) {
            self.finished = true;
        }
        result
    }
}
