//! Loading the kernel out of a FIT image

use crate::args::{ArgsError, LoaderArgs};
use crate::codec::LzmaCodec;
use crate::decompress::{extract_and_decompress, DecodeCapability, DecompressError};
use crate::kernel_image::{Compression, ImageError, KernelImage};
use crate::scratch::{ScratchBusy, SCRATCH};
use fit_image::fit::{FitImage, HeaderError};
use thiserror_no_std::Error;

/// The error that can occur while loading a kernel
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum LoaderError {
    #[error("Invalid loader arguments: {0}")]
    Args(#[from] ArgsError),
    #[error("Invalid FIT image: {0}")]
    Header(#[from] HeaderError),
    #[error("Invalid kernel image node: {0}")]
    Image(#[from] ImageError),
    #[error("Could not decompress the kernel: {0}")]
    Decompress(#[from] DecompressError),
    #[error("Could not get decoder scratch memory: {0}")]
    Scratch(#[from] ScratchBusy),
    #[error("The kernel uses the unsupported compression {}", .0.name())]
    UnsupportedCompression(Compression),
    #[error("The kernel is {size} bytes large but only {capacity} bytes are available")]
    TooLarge { size: usize, capacity: usize },
    #[error("The address {0:#x} is not addressable on this machine")]
    AddressOutOfRange(u64),
}

/// Where a kernel has been placed
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct LoadedKernel {
    pub load: u64,
    pub entry: u64,
    /// Number of bytes written to the load region
    pub size: usize,
}

/// Load the image described by the node `node_name` of `image` into `load_region`.
///
/// `load_region` is expected to start at the load address of the image.
pub fn load_kernel<D: DecodeCapability>(
    image: &FitImage<'_>,
    node_name: &str,
    decoder: &mut D,
    load_region: &mut [u8],
) -> Result<LoadedKernel, LoaderError> {
    let kernel = KernelImage::from_node(image, node_name)?;
    load_image(&kernel, decoder, load_region)
}

fn load_image<D: DecodeCapability>(
    kernel: &KernelImage<'_>,
    decoder: &mut D,
    load_region: &mut [u8],
) -> Result<LoadedKernel, LoaderError> {
    let size = match kernel.compression {
        Compression::None => {
            let size = kernel.data.len();
            let capacity = load_region.len();
            load_region
                .get_mut(..size)
                .ok_or(LoaderError::TooLarge { size, capacity })?
                .copy_from_slice(kernel.data);
            size
        }
        Compression::Lzma => extract_and_decompress(decoder, kernel.data, load_region)?,
        other => return Err(LoaderError::UnsupportedCompression(other)),
    };

    log::info!(
        "loaded {} bytes of {} compressed kernel",
        size,
        kernel.compression.name()
    );
    Ok(LoadedKernel {
        load: kernel.load,
        entry: kernel.entry,
        size,
    })
}

/// Load the kernel as described by the loader arguments and return where it has been placed.
///
/// The kernel is written to the `load_addr=` argument if given and to the load address recorded in the image
/// otherwise. The entry point is moved along with the load address.
///
/// # Safety
/// The arguments must describe a readable FIT image and a writable load region which does not overlap the image.
/// Nothing else may access either region while this function runs.
pub unsafe fn boot(args: &LoaderArgs<'_>) -> Result<LoadedKernel, LoaderError> {
    log::info!(
        "loading {} from FIT image at {:p} ({} bytes)",
        args.kernel_node,
        args.image_addr,
        args.image_size
    );

    let image = FitImage::from_buffer(args.get_image())?;
    if let Ok(description) = image.find_property("", "description") {
        if let Ok(description) = <&str>::try_from(description) {
            log::info!("image description: {}", description);
        }
    }

    let kernel = KernelImage::from_node(&image, args.kernel_node)?;
    let load = match args.load_addr {
        Some(addr) => addr as u64,
        None => kernel.load,
    };
    let entry = load.wrapping_add(kernel.entry.wrapping_sub(kernel.load));
    let load_ptr = usize::try_from(load).map_err(|_| LoaderError::AddressOutOfRange(load))?;

    let load_region = core::slice::from_raw_parts_mut(load_ptr as *mut u8, args.load_size);
    let mut arena = SCRATCH.claim()?;
    let loaded = load_image(&kernel, &mut LzmaCodec::new(&mut arena), load_region)?;

    log::info!("kernel is ready at {:#x}, entry point {:#x}", load, entry);
    Ok(LoadedKernel {
        load,
        entry,
        size: loaded.size,
    })
}

/// Decompress the lzma payload `compressed` to `load_address` using the static scratch arena.
///
/// Returns the number of bytes written.
///
/// # Safety
/// `load_address` must be valid for writes of `capacity` bytes and must not overlap `compressed`.
/// Nothing else may access that region while this function runs.
pub unsafe fn load_and_decompress(
    load_address: *mut u8,
    compressed: &[u8],
    capacity: usize,
) -> Result<usize, LoaderError> {
    let output = core::slice::from_raw_parts_mut(load_address, capacity);
    let mut arena = SCRATCH.claim()?;
    Ok(extract_and_decompress(
        &mut LzmaCodec::new(&mut arena),
        compressed,
        output,
    )?)
}
