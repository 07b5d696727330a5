//! Single-shot decoder for LZMA compressed data that works without a heap.
//!
//! The decoder is meant for loaders that know the uncompressed size in advance and have the whole compressed
//! stream in memory.
//! The output buffer doubles as the sliding dictionary, so the only additional memory required is the
//! probability model which lives in an arena supplied by the caller
//! (see [`LzmaProperties::probability_count`]).
#![no_std]

mod decoder;
mod properties;
mod range_coder;

pub use decoder::{decode, DecodeStatus, LzmaError};
pub use properties::{
    LzmaProperties, LZMA_BASE_SIZE, LZMA_LIT_SIZE, LZMA_PROPERTIES_SIZE, MAX_PROBABILITY_COUNT,
};
