//! The description of a kernel image node

use core::str::FromStr;
use fit_image::fit::{FitImage, InvalidValueLength, PropertyValue, ScanError, StringError};
use thiserror_no_std::Error;

/// The compression schemes that FIT images name in the `compression` property of an image node
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Compression {
    None,
    Lzma,
    Gzip,
    Bzip2,
    Lzo,
    Lz4,
    Zstd,
}

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("Unknown compression scheme")]
pub struct UnknownCompression;

impl FromStr for Compression {
    type Err = UnknownCompression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "lzma" => Ok(Self::Lzma),
            "gzip" => Ok(Self::Gzip),
            "bzip2" => Ok(Self::Bzip2),
            "lzo" => Ok(Self::Lzo),
            "lz4" => Ok(Self::Lz4),
            "zstd" => Ok(Self::Zstd),
            _ => Err(UnknownCompression),
        }
    }
}

impl Compression {
    /// The name used for this scheme inside FIT images
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzma => "lzma",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Lzo => "lzo",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum ImageError {
    #[error("Could not read property {property}: {reason}")]
    Scan {
        property: &'static str,
        reason: ScanError,
    },
    #[error("Property {property} is not a valid string: {reason}")]
    String {
        property: &'static str,
        reason: StringError,
    },
    #[error("Property {property} is not a valid address: {reason}")]
    Address {
        property: &'static str,
        reason: InvalidValueLength,
    },
    #[error("The image uses an unknown compression")]
    UnknownCompression,
}

/// Everything needed to load one image node of a FIT image
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct KernelImage<'buf> {
    /// The (possibly compressed) image payload
    pub data: &'buf [u8],
    pub compression: Compression,
    /// Where the uncompressed payload must be placed
    pub load: u64,
    /// Where execution starts, defaults to `load`
    pub entry: u64,
    pub description: Option<&'buf str>,
}

impl<'buf> KernelImage<'buf> {
    /// Read the image description from the node `node_name`
    pub fn from_node(image: &FitImage<'buf>, node_name: &str) -> Result<Self, ImageError> {
        let data = required(image, node_name, "data")?.bytes();
        let load = address(required(image, node_name, "load")?, "load")?;
        let entry = match optional(image, node_name, "entry")? {
            Some(value) => address(value, "entry")?,
            None => load,
        };
        let compression = string(required(image, node_name, "compression")?, "compression")?;
        let compression = compression.parse::<Compression>().map_err(|_| {
            log::warn!("image {} uses unknown compression {:?}", node_name, compression);
            ImageError::UnknownCompression
        })?;
        let description = optional(image, node_name, "description")?
            .map(|value| string(value, "description"))
            .transpose()?;

        log::debug!(
            "image {}: {} bytes {} compressed, load = {:#x}, entry = {:#x}",
            node_name,
            data.len(),
            compression.name(),
            load,
            entry
        );

        Ok(Self {
            data,
            compression,
            load,
            entry,
            description,
        })
    }
}

fn required<'buf>(
    image: &FitImage<'buf>,
    node_name: &str,
    property: &'static str,
) -> Result<PropertyValue<'buf>, ImageError> {
    image
        .find_property(node_name, property)
        .map_err(|reason| ImageError::Scan { property, reason })
}

fn optional<'buf>(
    image: &FitImage<'buf>,
    node_name: &str,
    property: &'static str,
) -> Result<Option<PropertyValue<'buf>>, ImageError> {
    match image.find_property(node_name, property) {
        Ok(value) => Ok(Some(value)),
        Err(ScanError::NotFound) => Ok(None),
        Err(reason) => Err(ImageError::Scan { property, reason }),
    }
}

fn address(value: PropertyValue<'_>, property: &'static str) -> Result<u64, ImageError> {
    value
        .address()
        .map_err(|reason| ImageError::Address { property, reason })
}

fn string<'buf>(value: PropertyValue<'buf>, property: &'static str) -> Result<&'buf str, ImageError> {
    <&str>::try_from(value).map_err(|reason| ImageError::String { property, reason })
}

#[cfg(test)]
mod test {
    use super::*;
    use align_data::{include_aligned, Align64};

    static ITB: &[u8] = include_aligned!(Align64, "../tests/data/kernel_lzma.itb");

    #[test]
    fn kernel_node_is_described() {
        let image = FitImage::from_buffer(ITB).unwrap();
        let kernel = KernelImage::from_node(&image, "kernel@1").unwrap();
        assert_eq!(kernel.compression, Compression::Lzma);
        assert_eq!(kernel.load, 0x8100_0000);
        assert_eq!(kernel.entry, 0x8100_0000);
        assert_eq!(kernel.data.len(), 565);
        assert_eq!(kernel.description, Some("ARM OpenWrt Linux-4.14"));
    }

    #[test]
    fn missing_required_properties_are_errors() {
        let image = FitImage::from_buffer(ITB).unwrap();
        // the device tree node has no load address
        assert_eq!(
            KernelImage::from_node(&image, "fdt@1"),
            Err(ImageError::Scan {
                property: "load",
                reason: ScanError::NotFound
            })
        );
        assert_eq!(
            KernelImage::from_node(&image, "kernel@2"),
            Err(ImageError::Scan {
                property: "data",
                reason: ScanError::NotFound
            })
        );
    }

    #[test]
    fn compression_names_are_parsed() {
        for compression in [
            Compression::None,
            Compression::Lzma,
            Compression::Gzip,
            Compression::Bzip2,
            Compression::Lzo,
            Compression::Lz4,
            Compression::Zstd,
        ] {
            assert_eq!(compression.name().parse(), Ok(compression));
        }
        assert_eq!("LZMA".parse::<Compression>(), Err(UnknownCompression));
        assert_eq!("".parse::<Compression>(), Err(UnknownCompression));
    }
}
