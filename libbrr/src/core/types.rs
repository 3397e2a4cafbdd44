//! common types for the brr codec

use thiserror::Error;

// constants

/// bytes per brr block (1 header + 8 data)
pub const BYTES_PER_BLOCK: usize = 9;

/// pcm samples per brr block
pub const SAMPLES_PER_BLOCK: usize = 16;

/// header bit 0: last block of the sample
pub const HEADER_END_FLAG: u8 = 0x01;

/// header bit 1: jump to the loop point after this block
pub const HEADER_LOOP_FLAG: u8 = 0x02;

/// largest range the encoder will emit (13-15 are degenerate)
pub const MAX_RANGE: u8 = 12;

/// native output rate of the S-DSP
pub const DSP_SAMPLE_RATE: u32 = 32000;

/// pitch step for unity playback (1.0 in 4.12 fixed point)
pub const UNITY_PITCH: u16 = 0x1000;

/// largest pitch step the voice registers can hold
pub const MAX_PITCH: u16 = 0x3FFF;

// types

/// prediction filter selector
///
/// | Value | Prediction                            |
/// |-------|---------------------------------------|
/// | 0     | none                                  |
/// | 1     | prev1 * 15/16                         |
/// | 2     | prev1 * 61/32 - prev2 * 15/16         |
/// | 3     | prev1 * 115/64 - prev2 * 13/16        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Filter {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
}

impl Filter {
    /// all filters in search order
    pub const ALL: [Filter; 4] = [Filter::Zero, Filter::One, Filter::Two, Filter::Three];

    /// filter from the low two bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Filter::Zero,
            1 => Filter::One,
            2 => Filter::Two,
            _ => Filter::Three,
        }
    }

    /// filters 2 and 3 can overflow 16 bits and saturate
    pub fn saturates(self) -> bool {
        matches!(self, Filter::Two | Filter::Three)
    }
}

/// decoded block header byte
///
/// bit layout: `rrrr ff l e` (range, filter, loop, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHeader {
    pub range: u8,
    pub filter: Filter,
    pub loop_flag: bool,
    pub end_flag: bool,
}

impl BlockHeader {
    pub fn new(range: u8, filter: Filter) -> Self {
        BlockHeader {
            range: range & 0x0F,
            filter,
            loop_flag: false,
            end_flag: false,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = (self.range << 4) | ((self.filter as u8) << 2);
        if self.loop_flag {
            byte |= HEADER_LOOP_FLAG;
        }
        if self.end_flag {
            byte |= HEADER_END_FLAG;
        }
        byte
    }
}

impl From<u8> for BlockHeader {
    fn from(byte: u8) -> Self {
        BlockHeader {
            range: byte >> 4,
            filter: Filter::from_bits(byte >> 2),
            loop_flag: byte & HEADER_LOOP_FLAG != 0,
            end_flag: byte & HEADER_END_FLAG != 0,
        }
    }
}

impl From<BlockHeader> for u8 {
    fn from(header: BlockHeader) -> u8 {
        header.to_byte()
    }
}

/// one 9-byte brr block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrrBlock {
    pub header: BlockHeader,
    /// 16 signed nibbles (-8..=7) in decode order
    pub nibbles: [i8; SAMPLES_PER_BLOCK],
}

impl BrrBlock {
    /// fully silent block (header 0, all nibbles 0)
    pub fn silent() -> Self {
        BrrBlock {
            header: BlockHeader::from(0),
            nibbles: [0; SAMPLES_PER_BLOCK],
        }
    }

    /// parse a block; the high nibble of each data byte comes first
    pub fn from_bytes(bytes: &[u8; BYTES_PER_BLOCK]) -> Self {
        let mut nibbles = [0i8; SAMPLES_PER_BLOCK];
        for (i, &byte) in bytes[1..].iter().enumerate() {
            nibbles[i * 2] = sign_extend_nibble(byte >> 4);
            nibbles[i * 2 + 1] = sign_extend_nibble(byte & 0x0F);
        }
        BrrBlock {
            header: BlockHeader::from(bytes[0]),
            nibbles,
        }
    }

    pub fn to_bytes(&self) -> [u8; BYTES_PER_BLOCK] {
        let mut bytes = [0u8; BYTES_PER_BLOCK];
        bytes[0] = self.header.to_byte();
        for i in 0..8 {
            let hi = (self.nibbles[i * 2] as u8) & 0x0F;
            let lo = (self.nibbles[i * 2 + 1] as u8) & 0x0F;
            bytes[i + 1] = (hi << 4) | lo;
        }
        bytes
    }
}

/// 4-bit two's complement to i8
#[inline]
pub fn sign_extend_nibble(nibble: u8) -> i8 {
    (((nibble & 0x0F) ^ 8) as i8) - 8
}

// errors

/// errors raised by the brr codec and sample preparation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrrError {
    /// overflow correction could not make a block safe
    #[error("overflow correction gave up on block {block} after {attempts} attempts")]
    OverflowCorrectionExhausted { block: usize, attempts: u32 },

    /// progress observer asked to stop
    #[error("encoding cancelled after {block} committed blocks")]
    Cancelled { block: usize },

    /// only 8 and 16-bit pcm can be prepared
    #[error("unsupported sample bit depth: {0}")]
    UnsupportedBitDepth(u8),

    /// loop points outside the sample
    #[error("invalid loop {start}..{end} for {len} samples")]
    InvalidLoop {
        start: usize,
        end: usize,
        len: usize,
    },

    /// stream breaks the end/loop flag invariants
    #[error("malformed brr stream: {0}")]
    MalformedStream(String),

    /// msgpack failure
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// result type for brr stuff
pub type BrrResult<T> = Result<T, BrrError>;
