//! Loader argument handling
//!
//! Typically U-Boot passes parameters to a standalone application via an `argc`, `argv` pair.
//! The code in this module parses the relevant loader arguments from that iterator.

use core::ffi::CStr;
use thiserror_no_std::Error;

/// Node that is loaded when no `kernel=` argument is given
pub const DEFAULT_KERNEL_NODE: &str = "kernel@1";

/// Capacity of the load region when no `load_size=` argument is given
pub const DEFAULT_LOAD_SIZE: usize = 64 * 1024 * 1024;

/// An iterator over an *argc*, *argv* pair.
///
/// This is a typical c-style pattern for passing a list of argument strings.
/// It works like this:
///
/// - `argc` describes how many arguments are passed (think `argc = argument_count`)
/// - `argv` points to the start of an array of pointers to those arguments.
///   Each argument is expected to be a null-terminated string (CStr) and the array items point to the start of each arguments string.
///
/// To iterate over all arguments, one needs to dereference and add `1` to `argv` exactly `argc` times.
/// Arguments that are not valid UTF-8 are skipped.
pub struct CmdArgIter {
    argc: u32,
    current: u32,
    argv: *const *const core::ffi::c_char,
}

impl CmdArgIter {
    /// Create a new iterator from the given `argc`, `argv` pair
    ///
    /// # Safety
    /// `argv` must point to at least `argc` pointers to nul-terminated strings which stay valid and unmodified for
    /// the rest of the program.
    pub unsafe fn from_argc_argv(argc: u32, argv: *const *const core::ffi::c_char) -> Self {
        CmdArgIter {
            argc,
            argv,
            current: 0,
        }
    }
}

impl Iterator for CmdArgIter {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current < self.argc {
            let current = self.current;
            self.current += 1;
            // Safety: the creator of this iterator guaranteed that argv holds argc valid strings
            let cs = unsafe { CStr::from_ptr(*self.argv.add(current as usize)) };
            match cs.to_str() {
                Ok(s) => return Some(s),
                Err(_) => log::warn!("skipping argument {} because it is not valid UTF-8", current),
            }
        }
        None
    }
}

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum ArgsError {
    #[error("The required argument {0}= is missing")]
    Missing(&'static str),
    #[error("The value of argument {0}= is not a base 16 number")]
    InvalidNumber(&'static str),
}

/// Arguments given to the loader packed into a struct
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct LoaderArgs<'a> {
    /// The address of the FIT image (in physical memory).
    /// This image is usually placed there by u-boot before jumping into the loader.
    pub image_addr: *const u8,

    /// The size of the FIT image in bytes.
    pub image_size: usize,

    /// The name of the image node that holds the kernel
    pub kernel_node: &'a str,

    /// Where to place the kernel instead of the load address recorded in the image
    pub load_addr: Option<usize>,

    /// How many bytes may be written starting at the load address
    pub load_size: usize,
}

impl<'a> LoaderArgs<'a> {
    /// Parse a semantic `LoaderArgs` struct from an iterator over raw arguments
    pub fn from_args(args: impl Iterator<Item = &'a str>) -> Result<Self, ArgsError> {
        log::trace!("parsing loader parameters");

        let mut image_addr = None;
        let mut image_size = None;
        let mut kernel_node = None;
        let mut load_addr = None;
        let mut load_size = None;
        for arg in args {
            if let Some(addr_s) = arg.strip_prefix("image_addr=") {
                image_addr = Some(parse_hex("image_addr", addr_s)?);
            } else if let Some(size_s) = arg.strip_prefix("image_size=") {
                image_size = Some(parse_hex("image_size", size_s)?);
            } else if let Some(node) = arg.strip_prefix("kernel=") {
                kernel_node = Some(node);
            } else if let Some(addr_s) = arg.strip_prefix("load_addr=") {
                load_addr = Some(parse_hex("load_addr", addr_s)?);
            } else if let Some(size_s) = arg.strip_prefix("load_size=") {
                load_size = Some(parse_hex("load_size", size_s)?);
            } else {
                log::debug!("ignoring unknown argument {:?}", arg);
            }
        }

        // set sane argument defaults
        let load_size = load_size.unwrap_or_else(|| {
            log::warn!("no load_size= (capacity of the kernel load region in bytes) argument given; assuming 64MB");
            DEFAULT_LOAD_SIZE
        });

        Ok(Self {
            image_addr: image_addr.ok_or(ArgsError::Missing("image_addr"))? as *const u8,
            image_size: image_size.ok_or(ArgsError::Missing("image_size"))?,
            kernel_node: kernel_node.unwrap_or(DEFAULT_KERNEL_NODE),
            load_addr,
            load_size,
        })
    }

    /// Get a slice to the in-memory FIT image as indicated by the arguments
    ///
    /// # Safety
    /// `image_addr` and `image_size` must describe readable memory that is not modified while the slice is in use.
    pub unsafe fn get_image(&self) -> &'static [u8] {
        core::slice::from_raw_parts(self.image_addr, self.image_size)
    }
}

fn parse_hex(key: &'static str, value: &str) -> Result<usize, ArgsError> {
    usize::from_str_radix(value, 16).map_err(|_| ArgsError::InvalidNumber(key))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parsing_full_arguments_works() {
        let args = LoaderArgs::from_args(
            [
                "image_addr=84000000",
                "image_size=1a2b",
                "kernel=kernel@2",
                "load_addr=80008000",
                "load_size=200000",
            ]
            .into_iter(),
        )
        .unwrap();

        assert_eq!(args.image_addr, 0x8400_0000 as *const u8);
        assert_eq!(args.image_size, 0x1a2b);
        assert_eq!(args.kernel_node, "kernel@2");
        assert_eq!(args.load_addr, Some(0x8000_8000));
        assert_eq!(args.load_size, 0x20_0000);
    }

    #[test]
    fn defaults_are_applied() {
        let args =
            LoaderArgs::from_args(["console=ttyS0", "image_addr=1000", "image_size=10"].into_iter())
                .unwrap();
        assert_eq!(args.kernel_node, DEFAULT_KERNEL_NODE);
        assert_eq!(args.load_addr, None);
        assert_eq!(args.load_size, DEFAULT_LOAD_SIZE);
    }

    #[test]
    fn invalid_arguments_are_classified() {
        assert_eq!(
            LoaderArgs::from_args(["image_size=10"].into_iter()),
            Err(ArgsError::Missing("image_addr"))
        );
        assert_eq!(
            LoaderArgs::from_args(["image_addr=10"].into_iter()),
            Err(ArgsError::Missing("image_size"))
        );
        assert_eq!(
            LoaderArgs::from_args(["image_addr=0x10", "image_size=10"].into_iter()),
            Err(ArgsError::InvalidNumber("image_addr"))
        );
        assert_eq!(
            LoaderArgs::from_args(["image_addr=10", "image_size=10", "load_size=zz"].into_iter()),
            Err(ArgsError::InvalidNumber("load_size"))
        );
    }

    #[test]
    fn argc_argv_is_iterated() {
        let first = b"image_addr=10\0";
        let second = b"\xff\0";
        let third = b"image_size=20\0";
        let argv = [
            first.as_ptr() as *const core::ffi::c_char,
            second.as_ptr() as *const core::ffi::c_char,
            third.as_ptr() as *const core::ffi::c_char,
        ];

        let iter = unsafe { CmdArgIter::from_argc_argv(3, argv.as_ptr()) };
        let args = LoaderArgs::from_args(iter).unwrap();
        assert_eq!(args.image_addr, 0x10 as *const u8);
        assert_eq!(args.image_size, 0x20);
    }
}
