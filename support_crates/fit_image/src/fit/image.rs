//! Handling of the FIT image as a whole

use crate::fit::header::{FitHeader, HeaderError};
use crate::fit::strings::Strings;
use crate::fit::structure::property_value_encoding::PropertyValue;
use crate::fit::structure::scanner;
use crate::fit::structure::walker::{ScanError, StructureWalker};
use thiserror_no_std::Error;

/// The error that can occur when looking something up in a FIT image
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum FitError {
    /// The image header is not acceptable
    #[error("Could not validate the fit header: {0}")]
    Header(#[from] HeaderError),
    /// The structure block could not be traversed
    #[error("Could not scan the structure block: {0}")]
    Scan(#[from] ScanError),
}

/// A handle to a FIT image whose header has been validated
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct FitImage<'buf> {
    /// Metadata information about the image
    pub header: FitHeader,
    /// The image bytes, cut down to the size declared in the header
    pub buf: &'buf [u8],
}

impl<'buf> FitImage<'buf> {
    /// Validate the header at the start of `buf` and wrap the image.
    ///
    /// `buf` may be larger than the image, in which case the surplus is ignored.
    pub fn from_buffer(buf: &'buf [u8]) -> Result<Self, HeaderError> {
        let header = FitHeader::validate(buf)?;
        Ok(Self {
            header,
            buf: &buf[..header.total_size as usize],
        })
    }

    /// Try to read a FIT image from a raw pointer
    ///
    /// # Safety
    /// The given pointer must be valid and the backing memory must be readable for at least `len` bytes after it.
    ///
    /// The underlying memory must also be valid and unmodified for as long as the resulting instance is used.
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Result<Self, HeaderError> {
        let buf = core::slice::from_raw_parts::<u8>(ptr, len);
        Self::from_buffer(buf)
    }

    /// A fresh walker over all records of the structure block
    pub fn records(&self) -> StructureWalker<'buf> {
        StructureWalker::new(self.buf, self.header.off_dt_struct as usize)
    }

    /// The strings block holding property names
    pub fn strings(&self) -> Strings<'buf> {
        Strings::new(self.buf, self.header.off_dt_strings as usize)
    }

    /// Look up the property `property_name` of the node with the unit name `node_name`.
    ///
    /// The root node is addressed with an empty name.
    /// The returned value borrows from the image and is never copied.
    pub fn find_property(
        &self,
        node_name: &str,
        property_name: &str,
    ) -> Result<PropertyValue<'buf>, ScanError> {
        scanner::find_property(self.records(), &self.strings(), node_name, property_name)
    }
}

/// Validate `buf` as a FIT image and look up a single property in it.
pub fn locate<'buf>(
    buf: &'buf [u8],
    node_name: &str,
    property_name: &str,
) -> Result<PropertyValue<'buf>, FitError> {
    let image = FitImage::from_buffer(buf)?;
    Ok(image.find_property(node_name, property_name)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use align_data::{include_aligned, Align64};
    extern crate std;

    static ITB: &[u8] = include_aligned!(Align64, "../../test/data/kernel_lzma.itb");

    #[test]
    fn parsing_kernel_lzma_itb_works() {
        let image = FitImage::from_buffer(ITB).unwrap();
        assert_eq!(image.header.version, 0x11);
        assert_eq!(image.header.last_comp_version, 0x10);
        assert_eq!(image.buf.len(), ITB.len());

        let description = image.find_property("", "description").unwrap();
        assert_eq!(<&str>::try_from(description), Ok("test"));

        let compression = image.find_property("kernel@1", "compression").unwrap();
        assert_eq!(<&str>::try_from(compression), Ok("lzma"));
        assert_eq!(
            image.find_property("kernel@1", "load").unwrap().address(),
            Ok(0x8100_0000)
        );
        assert_eq!(
            u32::try_from(image.find_property("kernel@1", "entry").unwrap()),
            Ok(0x8100_0000)
        );
        assert_eq!(
            image.find_property("kernel@1", "data").unwrap().len(),
            565
        );
        assert_eq!(
            image.find_property("fdt@1", "data").unwrap().bytes(),
            &core::array::from_fn::<u8, 32, _>(|i| i as u8)
        );
    }

    #[test]
    fn scoping_distinguishes_equally_named_properties() {
        let image = FitImage::from_buffer(ITB).unwrap();
        let kernel = image.find_property("kernel@1", "description").unwrap();
        let fdt = image.find_property("fdt@1", "description").unwrap();
        let config = image.find_property("config@1", "description").unwrap();
        assert_eq!(<&str>::try_from(kernel), Ok("ARM OpenWrt Linux-4.14"));
        assert_eq!(
            <&str>::try_from(fdt),
            Ok("ARM OpenWrt qcom-ipq4029-mr33 device tree blob")
        );
        assert_eq!(<&str>::try_from(config), Ok("OpenWrt"));
        assert_eq!(
            u32::try_from(image.find_property("hash@1", "value").unwrap()),
            Ok(0x1234_5678)
        );
    }

    #[test]
    fn missing_properties_are_not_found() {
        let image = FitImage::from_buffer(ITB).unwrap();
        assert_eq!(
            image.find_property("kernel@1", "signature"),
            Err(ScanError::NotFound)
        );
        assert_eq!(
            image.find_property("kernel@2", "data"),
            Err(ScanError::NotFound)
        );
        // properties of child nodes are not visible through their parent
        assert_eq!(
            image.find_property("images", "data"),
            Err(ScanError::NotFound)
        );
    }

    #[test]
    fn lookups_are_repeatable() {
        let image = FitImage::from_buffer(ITB).unwrap();
        let first = image.find_property("kernel@1", "data");
        for _ in 0..3 {
            assert_eq!(image.find_property("kernel@1", "data"), first);
        }
        assert_eq!(locate(ITB, "kernel@1", "data"), first.map_err(FitError::from));
    }

    #[test]
    fn values_point_into_the_image() {
        let image = FitImage::from_buffer(ITB).unwrap();
        let data = image.find_property("kernel@1", "data").unwrap().bytes();
        let image_range = ITB.as_ptr_range();
        assert!(image_range.contains(&data.as_ptr()));
        assert!(data.as_ptr_range().end <= image_range.end);
    }

    #[test]
    fn locate_rejects_invalid_headers() {
        assert_eq!(
            locate(&ITB[..20], "", "description"),
            Err(FitError::Header(HeaderError::Truncated {
                required: 40,
                available: 20
            }))
        );
        assert_eq!(
            locate(&ITB[..ITB.len() - 1], "", "description"),
            Err(FitError::Header(HeaderError::Truncated {
                required: ITB.len(),
                available: ITB.len() - 1
            }))
        );
    }

    /// Corrupt or cut the image in many ways and check that lookups only ever fail with a classified error
    #[test]
    fn corrupted_images_only_produce_classified_errors() {
        use std::vec::Vec;

        let header = FitHeader::validate(ITB).unwrap();
        let struct_start = header.off_dt_struct as usize;

        for cut in (struct_start + 1..ITB.len()).step_by(7) {
            // pretend the image ends early by rewriting the declared size
            let mut buf: Vec<u8> = ITB[..cut].to_vec();
            buf[4..8].copy_from_slice(&(cut as u32).to_be_bytes());
            let strings_offset = header.off_dt_strings.min(cut as u32 - 1);
            buf[12..16].copy_from_slice(&strings_offset.to_be_bytes());

            let image = FitImage::from_buffer(&buf).unwrap();
            for (node, prop) in [("kernel@1", "data"), ("fdt@1", "data"), ("", "nothing")] {
                match image.find_property(node, prop) {
                    Ok(value) => assert!(value.bytes().as_ptr_range().end <= buf.as_ptr_range().end),
                    Err(ScanError::NotFound | ScanError::OutOfRange(_) | ScanError::UnknownTag { .. }) => {}
                }
            }
        }

        let mut seed = 0x2545_f491u32;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let mut buf: Vec<u8> = ITB.to_vec();
            let pos = struct_start + (seed as usize % (ITB.len() - struct_start));
            buf[pos] = (seed >> 24) as u8;

            let image = FitImage::from_buffer(&buf).unwrap();
            if let Ok(value) = image.find_property("kernel@1", "data") {
                assert!(value.bytes().as_ptr_range().end <= buf.as_ptr_range().end);
            }
        }
    }
}
