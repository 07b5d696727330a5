use crate::decoder::LzmaError;

/// Size of the encoded properties block at the start of an lzma-alone stream
pub const LZMA_PROPERTIES_SIZE: usize = 5;

/// Number of probabilities needed independently of the literal coder configuration
pub const LZMA_BASE_SIZE: usize = 1846;

/// Number of probabilities needed per literal coder
pub const LZMA_LIT_SIZE: usize = 0x300;

/// Probabilities needed by the most demanding valid configuration (`lc = 8`, `lp = 4`)
pub const MAX_PROBABILITY_COUNT: usize = LZMA_BASE_SIZE + (LZMA_LIT_SIZE << 12);

/// Coder configuration decoded from the properties block
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct LzmaProperties {
    /// Number of high bits of the previous byte used as literal context
    pub lc: u8,
    /// Number of low bits of the position used as literal context
    pub lp: u8,
    /// Number of low bits of the position used as general position state
    pub pb: u8,
    /// Dictionary size the stream was compressed with
    pub dict_size: u32,
}

impl LzmaProperties {
    /// Decode a properties block.
    ///
    /// The first byte encodes `(pb * 5 + lp) * 9 + lc` and must be smaller than `9 * 5 * 5`,
    /// the next four bytes hold the little-endian dictionary size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LzmaError> {
        let bytes: &[u8; LZMA_PROPERTIES_SIZE] = bytes
            .get(..LZMA_PROPERTIES_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(LzmaError::InvalidProperties)?;

        let mut d = bytes[0];
        if d >= 9 * 5 * 5 {
            return Err(LzmaError::InvalidProperties);
        }
        let lc = d % 9;
        d /= 9;
        let lp = d % 5;
        let pb = d / 5;

        Ok(Self {
            lc,
            lp,
            pb,
            dict_size: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        })
    }

    /// How many probabilities the decoder needs for this configuration
    pub fn probability_count(&self) -> usize {
        LZMA_BASE_SIZE + (LZMA_LIT_SIZE << (self.lc + self.lp))
    }
}
