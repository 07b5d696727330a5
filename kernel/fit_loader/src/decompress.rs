//! Decompression of an lzma-alone payload into a caller supplied buffer
//!
//! The payload starts with a 13 byte header:
//!
//! | offset | size | content                                         |
//! |--------|------|-------------------------------------------------|
//! | 0      | 5    | coder properties                                |
//! | 5      | 4    | uncompressed size, little-endian, lower half    |
//! | 9      | 4    | uncompressed size, little-endian, upper half    |
//!
//! followed by the compressed stream.

use fit_image::fit::ByteCursor;
use lzma_decode::LZMA_PROPERTIES_SIZE;
use thiserror_no_std::Error;

/// Size of the header in front of the compressed stream
pub const LZMA_HEADER_SIZE: usize = LZMA_PROPERTIES_SIZE + 8;

/// The coder properties were not accepted
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
#[error("The decoder rejected the stream properties")]
pub struct PropertiesRejected;

/// Why a decode capability failed
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum DecodeFailure {
    /// The compressed data is corrupt
    #[error("The compressed data is corrupt")]
    DataError,
    /// Any other failure of the decoder itself
    #[error("The decoder failed: {0}")]
    Other(&'static str),
}

/// Progress reported by a successful decode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Decoded {
    pub consumed: usize,
    pub produced: usize,
}

/// Something that can decode an lzma stream.
///
/// [`init_properties`](DecodeCapability::init_properties) is always called before
/// [`decode`](DecodeCapability::decode).
pub trait DecodeCapability {
    fn init_properties(
        &mut self,
        properties: &[u8; LZMA_PROPERTIES_SIZE],
    ) -> Result<(), PropertiesRejected>;

    /// Decode `input` until `output` is full or the stream ends
    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<Decoded, DecodeFailure>;
}

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum DecompressError {
    #[error("The compressed payload is only {available} bytes long which is too short for its header")]
    HeaderTruncated { available: usize },
    #[error("The compressed payload has invalid lzma properties")]
    PropertiesInvalid,
    #[error("The compressed payload is corrupt")]
    DataError,
    #[error("The payload decompresses to {declared} bytes but only {capacity} bytes are available")]
    TooLarge { declared: usize, capacity: usize },
    #[error("The decoder failed for an unknown reason")]
    UnknownDecodeError,
}

/// The parsed header of an lzma-alone payload
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
struct PayloadHeader<'a> {
    properties: [u8; LZMA_PROPERTIES_SIZE],
    declared_size: u32,
    size_high: u32,
    stream: &'a [u8],
}

impl<'a> PayloadHeader<'a> {
    fn parse(compressed: &'a [u8]) -> Result<Self, DecompressError> {
        let truncated = |_| DecompressError::HeaderTruncated {
            available: compressed.len(),
        };
        let mut cursor = ByteCursor::new(compressed);
        let mut properties = [0; LZMA_PROPERTIES_SIZE];
        properties.copy_from_slice(cursor.read_bytes(LZMA_PROPERTIES_SIZE).map_err(truncated)?);
        let declared_size = cursor.read_u32_le().map_err(truncated)?;
        let size_high = cursor.read_u32_le().map_err(truncated)?;

        Ok(Self {
            properties,
            declared_size,
            size_high,
            stream: cursor.rest(),
        })
    }
}

/// Decompress the lzma-alone payload `compressed` into `output`.
///
/// Only the lower 32 bits of the uncompressed size stored in the header are honored.
/// If that size exceeds the length of `output`, nothing is decoded and `output` is left untouched.
/// On success the number of bytes written to the start of `output` is returned.
/// On failure the content of `output` is unspecified.
pub fn extract_and_decompress<D: DecodeCapability>(
    decoder: &mut D,
    compressed: &[u8],
    output: &mut [u8],
) -> Result<usize, DecompressError> {
    let header = PayloadHeader::parse(compressed)?;
    log::debug!(
        "lzma payload: properties = {:02x?}, uncompressed size = {} bytes",
        header.properties,
        header.declared_size
    );

    decoder
        .init_properties(&header.properties)
        .map_err(|_| DecompressError::PropertiesInvalid)?;

    if header.size_high != 0 {
        log::warn!(
            "ignoring upper half {:#x} of the uncompressed size, assuming {} bytes",
            header.size_high,
            header.declared_size
        );
    }

    let declared = header.declared_size as usize;
    if declared > output.len() {
        return Err(DecompressError::TooLarge {
            declared,
            capacity: output.len(),
        });
    }

    let decoded = decoder
        .decode(header.stream, &mut output[..declared])
        .map_err(|e| {
            log::error!("decoding {} compressed bytes failed: {}", header.stream.len(), e);
            match e {
                DecodeFailure::DataError => DecompressError::DataError,
                DecodeFailure::Other(_) => DecompressError::UnknownDecodeError,
            }
        })?;

    if decoded.produced != declared {
        log::warn!(
            "stream ended after {} of {} announced bytes",
            decoded.produced,
            declared
        );
    }
    log::debug!(
        "decompressed {} bytes into {} bytes",
        decoded.consumed,
        decoded.produced
    );
    Ok(decoded.produced)
}

#[cfg(test)]
mod test {
    use super::*;
    extern crate std;
    use std::vec;
    use std::vec::Vec;

    /// A decoder that writes a fixed pattern and records how it was called
    struct MockDecoder {
        accept: bool,
        result: Result<usize, DecodeFailure>,
        properties: Option<[u8; LZMA_PROPERTIES_SIZE]>,
        seen_input: Vec<u8>,
        seen_capacity: Option<usize>,
    }

    impl MockDecoder {
        fn new(result: Result<usize, DecodeFailure>) -> Self {
            Self {
                accept: true,
                result,
                properties: None,
                seen_input: Vec::new(),
                seen_capacity: None,
            }
        }
    }

    impl DecodeCapability for MockDecoder {
        fn init_properties(
            &mut self,
            properties: &[u8; LZMA_PROPERTIES_SIZE],
        ) -> Result<(), PropertiesRejected> {
            self.properties = Some(*properties);
            if self.accept {
                Ok(())
            } else {
                Err(PropertiesRejected)
            }
        }

        fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<Decoded, DecodeFailure> {
            self.seen_input = input.to_vec();
            self.seen_capacity = Some(output.len());
            let produced = self.result?;
            output[..produced].fill(0xaa);
            Ok(Decoded {
                consumed: input.len(),
                produced,
            })
        }
    }

    fn payload(size: u32, size_high: u32, stream: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x5d, 0, 0, 0x80, 0];
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&size_high.to_le_bytes());
        buf.extend_from_slice(stream);
        buf
    }

    #[test]
    fn header_is_split_correctly() {
        let mut decoder = MockDecoder::new(Ok(16));
        let mut output = [0u8; 32];
        let result = extract_and_decompress(&mut decoder, &payload(16, 0, b"stream"), &mut output);

        assert_eq!(result, Ok(16));
        assert_eq!(decoder.properties, Some([0x5d, 0, 0, 0x80, 0]));
        assert_eq!(decoder.seen_input, b"stream");
        assert_eq!(decoder.seen_capacity, Some(16));
        assert_eq!(&output[..16], &[0xaa; 16]);
        assert_eq!(&output[16..], &[0; 16]);
    }

    #[test]
    fn short_payloads_are_truncated() {
        for len in 0..LZMA_HEADER_SIZE {
            let mut decoder = MockDecoder::new(Ok(0));
            let buf = payload(1, 0, &[]);
            assert_eq!(
                extract_and_decompress(&mut decoder, &buf[..len], &mut [0u8; 4]),
                Err(DecompressError::HeaderTruncated { available: len })
            );
            assert_eq!(decoder.seen_capacity, None);
        }
    }

    #[test]
    fn rejected_properties_are_invalid() {
        let mut decoder = MockDecoder::new(Ok(0));
        decoder.accept = false;
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(4, 0, &[1]), &mut [0u8; 4]),
            Err(DecompressError::PropertiesInvalid)
        );
        assert_eq!(decoder.seen_capacity, None);
    }

    #[test]
    fn too_large_payload_leaves_output_untouched() {
        let mut decoder = MockDecoder::new(Ok(0));
        let mut output = [0x5au8; 64];
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(65, 0, &[1, 2, 3]), &mut output),
            Err(DecompressError::TooLarge {
                declared: 65,
                capacity: 64
            })
        );
        assert_eq!(output, [0x5a; 64]);
        assert_eq!(decoder.seen_capacity, None);
    }

    #[test]
    fn exact_fit_is_accepted() {
        let mut decoder = MockDecoder::new(Ok(64));
        let mut output = [0u8; 64];
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(64, 0, &[]), &mut output),
            Ok(64)
        );
    }

    #[test]
    fn decoder_failures_are_classified() {
        let mut decoder = MockDecoder::new(Err(DecodeFailure::DataError));
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(8, 0, &[0]), &mut [0u8; 8]),
            Err(DecompressError::DataError)
        );

        let mut decoder = MockDecoder::new(Err(DecodeFailure::Other("out of scratch space")));
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(8, 0, &[0]), &mut [0u8; 8]),
            Err(DecompressError::UnknownDecodeError)
        );
    }

    #[test]
    fn upper_size_half_is_ignored() {
        let mut decoder = MockDecoder::new(Ok(8));
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(8, 1, &[0]), &mut [0u8; 8]),
            Ok(8)
        );
        assert_eq!(decoder.seen_capacity, Some(8));
    }

    #[test]
    fn early_stream_end_reports_produced_bytes() {
        let mut decoder = MockDecoder::new(Ok(3));
        assert_eq!(
            extract_and_decompress(&mut decoder, &payload(8, 0, &[0]), &mut [0u8; 8]),
            Ok(3)
        );
    }
}
