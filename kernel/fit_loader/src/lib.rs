//! Locates the kernel inside a FIT image and places it at its load address
//!
//! The loader is typically started by U-Boot with the address and size of a FIT image as arguments
//! (see [`LoaderArgs`]). It looks up the kernel image node, decompresses the kernel payload into the load region
//! and reports the entry point.
#![no_std]

mod args;
mod boot;
mod codec;
mod decompress;
mod kernel_image;
mod scratch;

pub use args::{ArgsError, CmdArgIter, LoaderArgs, DEFAULT_KERNEL_NODE, DEFAULT_LOAD_SIZE};
pub use boot::{boot, load_and_decompress, load_kernel, LoadedKernel, LoaderError};
pub use codec::LzmaCodec;
pub use decompress::{
    extract_and_decompress, DecodeCapability, DecodeFailure, Decoded, DecompressError,
    PropertiesRejected, LZMA_HEADER_SIZE,
};
pub use kernel_image::{Compression, ImageError, KernelImage, UnknownCompression};
pub use scratch::{ProbabilityArena, ScratchBusy, ScratchGuard, StaticScratch, SCRATCH};
