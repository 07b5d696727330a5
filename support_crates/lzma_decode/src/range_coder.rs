//! Binary range decoder with adaptive probabilities

use crate::decoder::LzmaError;

const NUM_BIT_MODEL_TOTAL_BITS: u32 = 11;
const BIT_MODEL_TOTAL: u16 = 1 << NUM_BIT_MODEL_TOTAL_BITS;
const NUM_MOVE_BITS: u32 = 5;
const TOP_VALUE: u32 = 1 << 24;

/// Initial value of every probability: both bit values are equally likely
pub(crate) const PROB_INIT: u16 = BIT_MODEL_TOTAL / 2;

pub(crate) struct RangeDecoder<'a> {
    input: &'a [u8],
    pos: usize,
    range: u32,
    code: u32,
}

impl<'a> RangeDecoder<'a> {
    /// Prime the decoder with the first five bytes of the stream
    pub fn new(input: &'a [u8]) -> Result<Self, LzmaError> {
        let mut rc = Self {
            input,
            pos: 0,
            range: 0xffff_ffff,
            code: 0,
        };
        for _ in 0..5 {
            rc.code = (rc.code << 8) | rc.next_byte()? as u32;
        }
        Ok(rc)
    }

    /// How many input bytes have been consumed
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn next_byte(&mut self) -> Result<u8, LzmaError> {
        let byte = *self.input.get(self.pos).ok_or(LzmaError::InputExhausted)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn normalize(&mut self) -> Result<(), LzmaError> {
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.code = (self.code << 8) | self.next_byte()? as u32;
        }
        Ok(())
    }

    /// Decode one bit using (and updating) the probability at `probs[i]`
    #[inline]
    pub fn bit(&mut self, probs: &mut [u16], i: usize) -> Result<u32, LzmaError> {
        self.normalize()?;
        let prob = probs[i];
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * prob as u32;
        if self.code < bound {
            self.range = bound;
            probs[i] = prob + ((BIT_MODEL_TOTAL - prob) >> NUM_MOVE_BITS);
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            probs[i] = prob - (prob >> NUM_MOVE_BITS);
            Ok(1)
        }
    }

    /// Decode a `num_bits` wide symbol, most significant bit first, from the bit tree rooted at `probs[base + 1]`
    pub fn bit_tree(
        &mut self,
        probs: &mut [u16],
        base: usize,
        num_bits: u32,
    ) -> Result<u32, LzmaError> {
        let mut m = 1u32;
        for _ in 0..num_bits {
            m = (m << 1) | self.bit(probs, base + m as usize)?;
        }
        Ok(m - (1 << num_bits))
    }

    /// Like [`bit_tree`](Self::bit_tree) but least significant bit first
    pub fn reverse_bit_tree(
        &mut self,
        probs: &mut [u16],
        base: usize,
        num_bits: u32,
    ) -> Result<u32, LzmaError> {
        let mut m = 1u32;
        let mut symbol = 0u32;
        for i in 0..num_bits {
            let bit = self.bit(probs, base + m as usize)?;
            m = (m << 1) | bit;
            symbol |= bit << i;
        }
        Ok(symbol)
    }

    /// Decode `num_bits` bits with fixed, equal probabilities
    pub fn direct_bits(&mut self, num_bits: u32) -> Result<u32, LzmaError> {
        let mut result = 0u32;
        for _ in 0..num_bits {
            self.normalize()?;
            self.range >>= 1;
            result <<= 1;
            if self.code >= self.range {
                self.code -= self.range;
                result |= 1;
            }
        }
        Ok(result)
    }
}
