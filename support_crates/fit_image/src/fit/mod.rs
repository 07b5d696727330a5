//! Flattened Image Tree handling
//!
//! A FIT image encodes a tree of nodes and properties within a single, linear, pointerless data structure.
//! It consists of a small header (see [`FitHeader`]), followed by three variable sized sections:
//!
//! - the memory reservation block (unused by FIT images but still present),
//! - the structure block, a sequence of tagged records describing nodes and their properties,
//! - and the strings block, holding the names of all properties.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ struct FitHeader         │
//! ├──────────────────────────┤
//! │ memory reservation block │
//! ├──────────────────────────┤
//! │ structure block          │
//! │   / {                    │
//! │     description          │
//! │     images {             │
//! │       kernel@1 {         │
//! │         data, load, …    │
//! │       }                  │
//! │     }                    │
//! │   }                      │
//! ├──────────────────────────┤
//! │ strings block            │
//! └──────────────────────────┘
//! ```
//!
//! Payloads such as a compressed kernel are stored as the `data` property of their image node and can be located
//! without building any in-memory tree.
//!
//! # Example
//!
//! Read the load address of the kernel inside a sample image
//!
//! ```rust
//! # use align_data::{include_aligned, Align64};
//! # use fit_image::fit::FitImage;
//! # static ITB: &[u8] = include_aligned!(Align64, "../../test/data/kernel_lzma.itb");
//! let image = FitImage::from_buffer(ITB).unwrap();
//! let load = image.find_property("kernel@1", "load").unwrap();
//! assert_eq!(load.address(), Ok(0x8100_0000));
//! ```

mod cursor;
mod dump;
mod header;
mod image;
mod strings;
mod structure;

pub use cursor::{ByteCursor, OutOfRange};
pub use dump::{dump, DumpError};
pub use header::{
    FitHeader, HeaderError, FIRST_SUPPORTED_VERSION, FIT_MAGIC, HEADER_SIZE,
    LAST_SUPPORTED_VERSION,
};
pub use image::{locate, FitError, FitImage};
pub use strings::Strings;
pub use structure::property_value_encoding::{InvalidValueLength, PropertyValue, StringError};
pub use structure::walker::{RawProperty, Record, ScanError, StructureWalker, Token};
