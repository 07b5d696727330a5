//! Library for reading [Flattened Image Tree](https://github.com/u-boot/u-boot/blob/master/doc/usage/fit/source_file_format.rst)
//! blobs (`.itb` files).
//!
//! A FIT image uses the same flattened encoding as a device tree blob ([fdt/dtb](https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html))
//! but carries boot payloads such as kernels and device trees as property values.
//! Nothing in here allocates or copies: every value handed out is a view into the original buffer.
#![no_std]

pub mod fit;
