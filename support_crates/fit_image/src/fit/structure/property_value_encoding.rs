use core::ffi::CStr;
use core::mem;
use thiserror_no_std::Error;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("The raw property value had an invalid length of {0} bytes")]
pub struct InvalidValueLength(pub usize);

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum StringError {
    #[error("The raw property value is not null-terminated")]
    NoNullTerminator,
    #[error("The raw property is not valid UTF-8")]
    Utf8Error,
}

/// The value of a property, borrowed from the image it was found in.
///
/// Typed interpretations are available through the `TryFrom` implementations for `u32`, `u64` and `&str`.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct PropertyValue<'buf>(&'buf [u8]);

impl<'buf> PropertyValue<'buf> {
    pub fn new(bytes: &'buf [u8]) -> Self {
        Self(bytes)
    }

    /// The raw value bytes
    pub fn bytes(&self) -> &'buf [u8] {
        self.0
    }

    /// Length of the value in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the value as an address made up of either one or two 32-bit cells
    pub fn address(&self) -> Result<u64, InvalidValueLength> {
        match self.len() {
            4 => u32::try_from(*self).map(u64::from),
            8 => u64::try_from(*self),
            len => Err(InvalidValueLength(len)),
        }
    }
}

impl<'buf> TryFrom<PropertyValue<'buf>> for u32 {
    type Error = InvalidValueLength;

    fn try_from(value: PropertyValue<'buf>) -> Result<Self, Self::Error> {
        let bytes: [u8; mem::size_of::<u32>()] = value
            .0
            .try_into()
            .map_err(|_| InvalidValueLength(value.len()))?;
        Ok(u32::from_be_bytes(bytes))
    }
}

impl<'buf> TryFrom<PropertyValue<'buf>> for u64 {
    type Error = InvalidValueLength;

    fn try_from(value: PropertyValue<'buf>) -> Result<Self, Self::Error> {
        let bytes: [u8; mem::size_of::<u64>()] = value
            .0
            .try_into()
            .map_err(|_| InvalidValueLength(value.len()))?;
        Ok(u64::from_be_bytes(bytes))
    }
}

impl<'buf> TryFrom<PropertyValue<'buf>> for &'buf str {
    type Error = StringError;

    fn try_from(value: PropertyValue<'buf>) -> Result<Self, Self::Error> {
        let cstr = CStr::from_bytes_with_nul(value.0).map_err(|_| StringError::NoNullTerminator)?;
        let str = cstr.to_str().map_err(|_| StringError::Utf8Error)?;
        Ok(str)
    }
}
