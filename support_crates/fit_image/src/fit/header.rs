use crate::fit::cursor::{ByteCursor, OutOfRange};
use thiserror_no_std::Error;

/// Magic value every FIT image starts with
pub const FIT_MAGIC: u32 = 0xd00dfeed;

/// Oldest structure version that is understood
pub const FIRST_SUPPORTED_VERSION: u32 = 0x10;

/// Newest structure version an image may declare backwards compatibility with
pub const LAST_SUPPORTED_VERSION: u32 = 0x11;

/// Size of the encoded header in bytes
pub const HEADER_SIZE: usize = 40;

/// Errors that can occur when validating the FIT header
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum HeaderError {
    /// The provided buffer did not contain the required magic bytes at the start
    #[error("The provided buffer did not contain the required magic bytes at the start (found {0:#x})")]
    BadMagic(u32),
    /// The provided buffer is smaller than what the header requires
    #[error("The image requires {required} bytes but the provided buffer only holds {available}")]
    Truncated { required: usize, available: usize },
    /// The image is encoded using a version that is too old
    #[error("The image is encoded using version {0:#x} which is older than the first supported version 0x10")]
    UnsupportedVersion(u32),
    /// The image is only backwards compatible with versions that are too new
    #[error("The image is only compatible down to version {0:#x} but at most 0x11 is supported")]
    CompatVersionTooNew(u32),
    /// The structure block offset does not point into the image
    #[error("The structure block offset {0:#x} does not point into the image")]
    StructOffsetOutOfRange(u32),
    /// The strings block offset does not point into the image
    #[error("The strings block offset {0:#x} does not point into the image")]
    StringsOffsetOutOfRange(u32),
}

/// The header present at the start of every FIT image.
/// All the header fields are 32-bit integers, stored in big-endian format.
///
/// The layout is shared with device tree blobs and modelled according to the
/// [Devicetree Spec Section 5.2](https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html#header).
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct FitHeader {
    /// This field shall contain the value 0xd00dfeed (big-endian).
    pub magic: u32,
    /// Total size in bytes of the image, including all blocks and the free space between them.
    pub total_size: u32,
    /// Offset in bytes of the structure block from the beginning of the header.
    pub off_dt_struct: u32,
    /// Offset in bytes of the strings block from the beginning of the header.
    pub off_dt_strings: u32,
    /// Offset in bytes of the memory reservation block from the beginning of the header.
    pub off_mem_rsvmap: u32,
    /// Version of the encoding.
    pub version: u32,
    /// Lowest version of the encoding with which the used version is backwards compatible.
    pub last_comp_version: u32,
    /// Physical ID of the boot CPU (meaningless for most FIT images).
    pub boot_cpuid_phys: u32,
    /// Length in bytes of the strings block.
    pub size_dt_strings: u32,
    /// Length in bytes of the structure block.
    pub size_dt_struct: u32,
}

impl FitHeader {
    /// Read the header from the start of `buf` and check that the image it describes can be traversed.
    ///
    /// The checks are performed in a fixed order and the first failing one is reported:
    /// magic, buffer size, version, compatible version, structure offset, strings offset.
    pub fn validate(buf: &[u8]) -> Result<Self, HeaderError> {
        let truncated = |_: OutOfRange| HeaderError::Truncated {
            required: HEADER_SIZE,
            available: buf.len(),
        };
        let mut cursor = ByteCursor::new(buf);

        let magic = cursor.read_u32_be().map_err(truncated)?;
        if magic != FIT_MAGIC {
            return Err(HeaderError::BadMagic(magic));
        }

        let total_size = cursor.read_u32_be().map_err(truncated)?;
        let off_dt_struct = cursor.read_u32_be().map_err(truncated)?;
        let off_dt_strings = cursor.read_u32_be().map_err(truncated)?;
        let off_mem_rsvmap = cursor.read_u32_be().map_err(truncated)?;
        let version = cursor.read_u32_be().map_err(truncated)?;
        let last_comp_version = cursor.read_u32_be().map_err(truncated)?;
        let boot_cpuid_phys = cursor.read_u32_be().map_err(truncated)?;
        let size_dt_strings = cursor.read_u32_be().map_err(truncated)?;
        let size_dt_struct = cursor.read_u32_be().map_err(truncated)?;

        if buf.len() < total_size as usize {
            return Err(HeaderError::Truncated {
                required: total_size as usize,
                available: buf.len(),
            });
        }
        if version < FIRST_SUPPORTED_VERSION {
            return Err(HeaderError::UnsupportedVersion(version));
        }
        if last_comp_version > LAST_SUPPORTED_VERSION {
            return Err(HeaderError::CompatVersionTooNew(last_comp_version));
        }
        if off_dt_struct == 0 || off_dt_struct >= total_size {
            return Err(HeaderError::StructOffsetOutOfRange(off_dt_struct));
        }
        if off_dt_strings == 0 || off_dt_strings >= total_size {
            return Err(HeaderError::StringsOffsetOutOfRange(off_dt_strings));
        }

        log::trace!(
            "valid fit header: version {:#x} (compatible down to {:#x}), {} bytes, structure at {:#x}, strings at {:#x}",
            version,
            last_comp_version,
            total_size,
            off_dt_struct,
            off_dt_strings
        );

        Ok(Self {
            magic,
            total_size,
            off_dt_struct,
            off_dt_strings,
            off_mem_rsvmap,
            version,
            last_comp_version,
            boot_cpuid_phys,
            size_dt_strings,
            size_dt_struct,
        })
    }

    /// Try to read and validate a header from a provided memory location
    ///
    /// # Safety
    /// The given pointer must be valid and the backing memory must be readable for at least `len` bytes after it.
    pub unsafe fn from_ptr(ptr: *const u8, len: usize) -> Result<Self, HeaderError> {
        let buf = core::slice::from_raw_parts::<u8>(ptr, len);
        Self::validate(buf)
    }
}
