//! The [`DecodeCapability`] backed by the `lzma_decode` engine

use crate::decompress::{DecodeCapability, DecodeFailure, Decoded, PropertiesRejected};
use lzma_decode::{LzmaError, LzmaProperties, LZMA_PROPERTIES_SIZE};

/// An lzma decoder working in a caller provided probability arena
pub struct LzmaCodec<'arena> {
    arena: &'arena mut [u16],
    properties: Option<LzmaProperties>,
}

impl<'arena> LzmaCodec<'arena> {
    pub fn new(arena: &'arena mut [u16]) -> Self {
        Self {
            arena,
            properties: None,
        }
    }
}

impl DecodeCapability for LzmaCodec<'_> {
    fn init_properties(
        &mut self,
        properties: &[u8; LZMA_PROPERTIES_SIZE],
    ) -> Result<(), PropertiesRejected> {
        let properties = LzmaProperties::from_bytes(properties).map_err(|_| PropertiesRejected)?;
        if properties.probability_count() > self.arena.len() {
            log::warn!(
                "lzma properties need {} probabilities but the arena only holds {}",
                properties.probability_count(),
                self.arena.len()
            );
        }
        self.properties = Some(properties);
        Ok(())
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<Decoded, DecodeFailure> {
        let properties = self
            .properties
            .as_ref()
            .ok_or(DecodeFailure::Other("properties were not initialized"))?;

        let status = lzma_decode::decode(properties, self.arena, input, output).map_err(|e| {
            match e {
                LzmaError::DataError | LzmaError::InputExhausted => DecodeFailure::DataError,
                LzmaError::InvalidProperties => DecodeFailure::Other("invalid properties"),
                LzmaError::ArenaTooSmall { .. } => {
                    DecodeFailure::Other("probability arena too small")
                }
            }
        })?;

        Ok(Decoded {
            consumed: status.consumed,
            produced: status.produced,
        })
    }
}
