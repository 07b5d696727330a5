use crate::properties::LzmaProperties;
use crate::range_coder::{RangeDecoder, PROB_INIT};
use thiserror_no_std::Error;

const NUM_STATES: usize = 12;
const NUM_POS_BITS_MAX: usize = 4;
const NUM_LIT_STATES: usize = 7;

const NUM_LEN_TO_POS_STATES: usize = 4;
const NUM_POS_SLOT_BITS: u32 = 6;
const START_POS_MODEL_INDEX: u32 = 4;
const END_POS_MODEL_INDEX: u32 = 14;
const NUM_FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX >> 1);
const NUM_ALIGN_BITS: u32 = 4;
const MATCH_MIN_LEN: usize = 2;

const LEN_NUM_LOW_BITS: u32 = 3;
const LEN_NUM_MID_BITS: u32 = 3;
const LEN_NUM_HIGH_BITS: u32 = 8;
const LEN_LOW_SYMBOLS: usize = 1 << LEN_NUM_LOW_BITS;
const LEN_MID_SYMBOLS: usize = 1 << LEN_NUM_MID_BITS;

// layout of a length coder inside the probability arena
const LEN_CHOICE: usize = 0;
const LEN_CHOICE_2: usize = LEN_CHOICE + 1;
const LEN_LOW: usize = LEN_CHOICE_2 + 1;
const LEN_MID: usize = LEN_LOW + (LEN_LOW_SYMBOLS << NUM_POS_BITS_MAX);
const LEN_HIGH: usize = LEN_MID + (LEN_MID_SYMBOLS << NUM_POS_BITS_MAX);
const NUM_LEN_PROBS: usize = LEN_HIGH + (1 << LEN_NUM_HIGH_BITS);

// layout of the probability arena
const IS_MATCH: usize = 0;
const IS_REP: usize = IS_MATCH + (NUM_STATES << NUM_POS_BITS_MAX);
const IS_REP_G0: usize = IS_REP + NUM_STATES;
const IS_REP_G1: usize = IS_REP_G0 + NUM_STATES;
const IS_REP_G2: usize = IS_REP_G1 + NUM_STATES;
const IS_REP0_LONG: usize = IS_REP_G2 + NUM_STATES;
const POS_SLOT: usize = IS_REP0_LONG + (NUM_STATES << NUM_POS_BITS_MAX);
const SPEC_POS: usize = POS_SLOT + (NUM_LEN_TO_POS_STATES << NUM_POS_SLOT_BITS);
const ALIGN: usize = SPEC_POS + NUM_FULL_DISTANCES - END_POS_MODEL_INDEX as usize;
const LEN_CODER: usize = ALIGN + (1 << NUM_ALIGN_BITS);
const REP_LEN_CODER: usize = LEN_CODER + NUM_LEN_PROBS;
const LITERAL: usize = REP_LEN_CODER + NUM_LEN_PROBS;

const _: () = assert!(LITERAL == crate::properties::LZMA_BASE_SIZE);

/// Distance value that marks the end of the stream instead of a match
const END_MARKER: u32 = 0xffff_ffff;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum LzmaError {
    /// The properties block is malformed
    #[error("The lzma properties are invalid")]
    InvalidProperties,
    /// The stream references data that has not been decoded (yet)
    #[error("The compressed data is corrupt")]
    DataError,
    /// The stream ended before the output was complete
    #[error("The compressed data ended unexpectedly")]
    InputExhausted,
    /// The probability arena cannot hold the model of the given properties
    #[error("The probability arena holds {available} entries but {needed} are required")]
    ArenaTooSmall { needed: usize, available: usize },
}

/// Outcome of a successful decode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct DecodeStatus {
    /// Number of compressed bytes that were read
    pub consumed: usize,
    /// Number of bytes written to the start of the output
    pub produced: usize,
    /// Whether decoding stopped because of an end marker instead of a full output
    pub end_marker: bool,
}

/// Decode `input` (the compressed stream without its header) into `output`.
///
/// Decoding stops as soon as `output` is full or an end marker is found.
/// `arena` must hold at least [`LzmaProperties::probability_count`] entries; its previous content is irrelevant.
pub fn decode(
    props: &LzmaProperties,
    arena: &mut [u16],
    input: &[u8],
    output: &mut [u8],
) -> Result<DecodeStatus, LzmaError> {
    let needed = props.probability_count();
    let available = arena.len();
    let probs = arena
        .get_mut(..needed)
        .ok_or(LzmaError::ArenaTooSmall { needed, available })?;
    probs.fill(PROB_INIT);

    let mut decoder = Decoder {
        rc: RangeDecoder::new(input)?,
        probs,
        output,
        pos: 0,
        state: 0,
        reps: [0; 4],
        lc: props.lc as u32,
        lp_mask: (1 << props.lp) - 1,
        pb_mask: (1 << props.pb) - 1,
    };
    let end_marker = decoder.run()?;

    Ok(DecodeStatus {
        consumed: decoder.rc.consumed(),
        produced: decoder.pos,
        end_marker,
    })
}

struct Decoder<'a, 'p, 'o> {
    rc: RangeDecoder<'a>,
    probs: &'p mut [u16],
    output: &'o mut [u8],
    /// Number of bytes produced so far
    pos: usize,
    state: usize,
    /// The four most recent match distances (zero-based)
    reps: [u32; 4],
    lc: u32,
    lp_mask: usize,
    pb_mask: usize,
}

impl Decoder<'_, '_, '_> {
    /// Decode until the output is full (`Ok(false)`) or an end marker is found (`Ok(true)`)
    fn run(&mut self) -> Result<bool, LzmaError> {
        while self.pos < self.output.len() {
            let pos_state = self.pos & self.pb_mask;

            if self.bit(IS_MATCH + (self.state << NUM_POS_BITS_MAX) + pos_state)? == 0 {
                self.literal()?;
                continue;
            }

            let len = if self.bit(IS_REP + self.state)? == 1 {
                if self.pos == 0 {
                    return Err(LzmaError::DataError);
                }
                match self.rep_match(pos_state)? {
                    Some(len) => len,
                    None => continue,
                }
            } else {
                match self.simple_match(pos_state)? {
                    Some(len) => len,
                    None => return Ok(true),
                }
            };

            self.copy_match(len + MATCH_MIN_LEN)?;
        }

        Ok(false)
    }

    fn bit(&mut self, i: usize) -> Result<u32, LzmaError> {
        self.rc.bit(self.probs, i)
    }

    fn byte_at_distance(&self, distance: u32) -> Result<u8, LzmaError> {
        self.pos
            .checked_sub(distance as usize + 1)
            .map(|i| self.output[i])
            .ok_or(LzmaError::DataError)
    }

    fn put_byte(&mut self, byte: u8) {
        self.output[self.pos] = byte;
        self.pos += 1;
    }

    fn literal(&mut self) -> Result<(), LzmaError> {
        let prev_byte = if self.pos > 0 {
            self.output[self.pos - 1] as usize
        } else {
            0
        };
        let base = LITERAL
            + crate::properties::LZMA_LIT_SIZE
                * (((self.pos & self.lp_mask) << self.lc) + (prev_byte >> (8 - self.lc)));

        let mut symbol = 1usize;
        if self.state >= NUM_LIT_STATES {
            // after a match the byte at rep0 is used as additional context until the first mismatching bit
            let mut match_byte = self.byte_at_distance(self.reps[0])? as usize;
            while symbol < 0x100 {
                let match_bit = (match_byte >> 7) & 1;
                match_byte <<= 1;
                let bit = self.bit(base + ((1 + match_bit) << 8) + symbol)? as usize;
                symbol = (symbol << 1) | bit;
                if match_bit != bit {
                    break;
                }
            }
        }
        while symbol < 0x100 {
            symbol = (symbol << 1) | self.bit(base + symbol)? as usize;
        }

        self.put_byte(symbol as u8);
        self.state = match self.state {
            0..=3 => 0,
            4..=9 => self.state - 3,
            _ => self.state - 6,
        };
        Ok(())
    }

    /// Decode a match that reuses one of the recent distances.
    ///
    /// Returns `None` for a single byte "short rep" which has already been written.
    fn rep_match(&mut self, pos_state: usize) -> Result<Option<usize>, LzmaError> {
        if self.bit(IS_REP_G0 + self.state)? == 0 {
            if self.bit(IS_REP0_LONG + (self.state << NUM_POS_BITS_MAX) + pos_state)? == 0 {
                self.state = if self.state < NUM_LIT_STATES { 9 } else { 11 };
                let byte = self.byte_at_distance(self.reps[0])?;
                self.put_byte(byte);
                return Ok(None);
            }
        } else {
            let distance = if self.bit(IS_REP_G1 + self.state)? == 0 {
                self.reps[1]
            } else {
                let distance = if self.bit(IS_REP_G2 + self.state)? == 0 {
                    self.reps[2]
                } else {
                    let distance = self.reps[3];
                    self.reps[3] = self.reps[2];
                    distance
                };
                self.reps[2] = self.reps[1];
                distance
            };
            self.reps[1] = self.reps[0];
            self.reps[0] = distance;
        }

        let len = self.length(REP_LEN_CODER, pos_state)?;
        self.state = if self.state < NUM_LIT_STATES { 8 } else { 11 };
        Ok(Some(len))
    }

    /// Decode a match with a new distance.
    ///
    /// Returns `None` if the distance is the end marker.
    fn simple_match(&mut self, pos_state: usize) -> Result<Option<usize>, LzmaError> {
        self.reps[3] = self.reps[2];
        self.reps[2] = self.reps[1];
        self.reps[1] = self.reps[0];

        let len = self.length(LEN_CODER, pos_state)?;
        self.state = if self.state < NUM_LIT_STATES { 7 } else { 10 };

        let len_state = len.min(NUM_LEN_TO_POS_STATES - 1);
        let pos_slot = self.rc.bit_tree(
            self.probs,
            POS_SLOT + (len_state << NUM_POS_SLOT_BITS),
            NUM_POS_SLOT_BITS,
        )?;

        let distance = if pos_slot < START_POS_MODEL_INDEX {
            pos_slot
        } else {
            let num_direct_bits = (pos_slot >> 1) - 1;
            let mut distance = (2 | (pos_slot & 1)) << num_direct_bits;
            if pos_slot < END_POS_MODEL_INDEX {
                let base = SPEC_POS + distance as usize - pos_slot as usize - 1;
                distance += self.rc.reverse_bit_tree(self.probs, base, num_direct_bits)?;
            } else {
                distance += self.rc.direct_bits(num_direct_bits - NUM_ALIGN_BITS)? << NUM_ALIGN_BITS;
                distance += self.rc.reverse_bit_tree(self.probs, ALIGN, NUM_ALIGN_BITS)?;
                if distance == END_MARKER {
                    return Ok(None);
                }
            }
            distance
        };

        if distance as usize >= self.pos {
            return Err(LzmaError::DataError);
        }
        self.reps[0] = distance;
        Ok(Some(len))
    }

    /// Decode a match length (without the minimum match length) with the length coder at `coder`
    fn length(&mut self, coder: usize, pos_state: usize) -> Result<usize, LzmaError> {
        let len = if self.bit(coder + LEN_CHOICE)? == 0 {
            self.rc.bit_tree(
                self.probs,
                coder + LEN_LOW + (pos_state << LEN_NUM_LOW_BITS),
                LEN_NUM_LOW_BITS,
            )? as usize
        } else if self.bit(coder + LEN_CHOICE_2)? == 0 {
            LEN_LOW_SYMBOLS
                + self.rc.bit_tree(
                    self.probs,
                    coder + LEN_MID + (pos_state << LEN_NUM_MID_BITS),
                    LEN_NUM_MID_BITS,
                )? as usize
        } else {
            LEN_LOW_SYMBOLS
                + LEN_MID_SYMBOLS
                + self
                    .rc
                    .bit_tree(self.probs, coder + LEN_HIGH, LEN_NUM_HIGH_BITS)? as usize
        };
        Ok(len)
    }

    /// Repeat `len` bytes from distance `reps[0]`, clipped to the end of the output
    fn copy_match(&mut self, len: usize) -> Result<(), LzmaError> {
        let distance = self.reps[0] as usize + 1;
        if distance > self.pos {
            return Err(LzmaError::DataError);
        }
        let len = len.min(self.output.len() - self.pos);
        for _ in 0..len {
            self.output[self.pos] = self.output[self.pos - distance];
            self.pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::properties::LZMA_PROPERTIES_SIZE;
    extern crate std;
    use std::vec;

    /// `b"hello hello hello hello world\n"` repeated 20 times in lzma-alone format with an end marker
    static HELLO_LZMA: &[u8] = &[
        0x5d, 0x00, 0x00, 0x80, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x34,
        0x19, 0x49, 0xee, 0x8d, 0xe9, 0x56, 0x0c, 0x61, 0x2a, 0x6f, 0x6b, 0xd3, 0x05, 0xc7, 0xa0,
        0x42, 0x62, 0x9a, 0x45, 0x0d, 0xab, 0x98, 0x4f, 0xff, 0xfb, 0x23, 0xc0, 0x00,
    ];

    fn hello() -> std::vec::Vec<u8> {
        b"hello hello hello hello world\n".repeat(20)
    }

    fn split(stream: &[u8]) -> (LzmaProperties, &[u8]) {
        let props = LzmaProperties::from_bytes(stream).unwrap();
        (props, &stream[LZMA_PROPERTIES_SIZE + 8..])
    }

    #[test]
    fn decodes_known_stream() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0u16; props.probability_count()];
        let mut output = vec![0u8; hello().len()];

        let status = decode(&props, &mut arena, input, &mut output).unwrap();
        assert_eq!(status.produced, hello().len());
        assert!(!status.end_marker);
        assert!(status.consumed <= input.len());
        assert_eq!(output, hello());
    }

    #[test]
    fn stops_at_end_marker() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0u16; props.probability_count()];
        let mut output = vec![0u8; hello().len() + 100];

        let status = decode(&props, &mut arena, input, &mut output).unwrap();
        assert!(status.end_marker);
        assert_eq!(status.produced, hello().len());
        assert_eq!(status.consumed, input.len());
        assert_eq!(&output[..status.produced], &hello()[..]);
    }

    #[test]
    fn short_output_is_filled_exactly() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0u16; props.probability_count()];
        let mut output = vec![0u8; 7];

        let status = decode(&props, &mut arena, input, &mut output).unwrap();
        assert_eq!(status.produced, 7);
        assert_eq!(&output[..], b"hello h");
    }

    #[test]
    fn arena_is_reusable() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0xffffu16; props.probability_count() + 10];
        for _ in 0..2 {
            let mut output = vec![0u8; hello().len()];
            decode(&props, &mut arena, input, &mut output).unwrap();
            assert_eq!(output, hello());
        }
    }

    #[test]
    fn small_arena_is_rejected() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0u16; 100];
        let mut output = vec![0u8; 10];
        assert_eq!(
            decode(&props, &mut arena, input, &mut output),
            Err(LzmaError::ArenaTooSmall {
                needed: props.probability_count(),
                available: 100
            })
        );
    }

    #[test]
    fn truncated_input_is_reported() {
        let (props, input) = split(HELLO_LZMA);
        let mut arena = vec![0u16; props.probability_count()];
        let mut output = vec![0u8; hello().len()];
        let result = decode(&props, &mut arena, &input[..input.len() / 2], &mut output);
        assert!(matches!(
            result,
            Err(LzmaError::InputExhausted | LzmaError::DataError)
        ));
    }

    #[test]
    fn garbage_never_panics() {
        let props = LzmaProperties::from_bytes(&[0x5d, 0, 0, 1, 0]).unwrap();
        let mut arena = vec![0u16; props.probability_count()];
        let mut seed = 0x1234_5678u32;
        for round in 0..200 {
            let input: std::vec::Vec<u8> = (0..64 + round)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 17;
                    seed ^= seed << 5;
                    seed as u8
                })
                .collect();
            let mut output = vec![0u8; 512];
            let _ = decode(&props, &mut arena, &input, &mut output);
        }
    }
}
