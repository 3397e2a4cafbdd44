use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::core::{
    BrrBlock, BrrError, BrrResult, BYTES_PER_BLOCK, DSP_SAMPLE_RATE, SAMPLES_PER_BLOCK,
    UNITY_PITCH,
};

/// brr reader
pub struct Reader;

impl Reader {
    /// new reader
    pub fn new() -> Self {
        Reader
    }

    /// take brr bytes, zero-padding a ragged tail to a whole block
    pub fn read(&self, data: &[u8]) -> BrrStream {
        BrrStream::from_bytes(data)
    }

    /// read a whole stream from `reader`
    pub fn read_from<R: Read>(&self, mut reader: R) -> std::io::Result<BrrStream> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(BrrStream::from_vec(data))
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

/// block-aligned brr data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrrStream {
    data: Vec<u8>,
}

impl BrrStream {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub fn from_vec(mut data: Vec<u8>) -> Self {
        let padded = data.len().div_ceil(BYTES_PER_BLOCK) * BYTES_PER_BLOCK;
        data.resize(padded, 0);
        BrrStream { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.data.len() / BYTES_PER_BLOCK
    }

    /// every block in the data, including any after the end block
    pub fn blocks(&self) -> impl Iterator<Item = BrrBlock> + '_ {
        self.data.chunks_exact(BYTES_PER_BLOCK).map(|chunk| {
            let mut bytes = [0u8; BYTES_PER_BLOCK];
            bytes.copy_from_slice(chunk);
            BrrBlock::from_bytes(&bytes)
        })
    }

    /// index of the first block with the end flag
    pub fn end_block(&self) -> Option<usize> {
        self.blocks().position(|b| b.header.end_flag)
    }

    /// blocks a decoder plays: up to the end block, or everything if the
    /// end flag is missing
    pub fn playable_blocks(&self) -> impl Iterator<Item = BrrBlock> + '_ {
        let count = self
            .end_block()
            .map_or(self.block_count(), |end| end + 1);
        self.blocks().take(count)
    }

    /// summary of the stream
    pub fn info(&self) -> StreamInfo {
        let end_block = self.end_block();
        let playable = end_block.map_or(self.block_count(), |end| end + 1);
        let looping = end_block
            .and_then(|end| self.blocks().nth(end))
            .is_some_and(|b| b.header.loop_flag);

        StreamInfo {
            size: self.data.len(),
            blocks: self.block_count(),
            samples: playable * SAMPLES_PER_BLOCK,
            end_block,
            looping,
        }
    }
}

/// info about a brr stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// bytes including padding
    pub size: usize,
    pub blocks: usize,
    /// samples decoded up to and including the end block
    pub samples: usize,
    pub end_block: Option<usize>,
    /// end block also carries the loop flag
    pub looping: bool,
}

impl StreamInfo {
    /// playback length at `pitch_step` without interpolation
    pub fn duration_secs(&self, pitch_step: u16) -> f64 {
        if pitch_step == 0 {
            return 0.0;
        }
        let rate = DSP_SAMPLE_RATE as f64 * pitch_step as f64 / UNITY_PITCH as f64;
        self.samples as f64 / rate
    }

    /// compression against 16-bit pcm of the same length
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        (self.samples * 2) as f64 / self.size as f64
    }
}

/// check the end/loop structure of raw brr bytes
///
/// Requires a non-empty, block-aligned stream whose only end-flagged block
/// is the last one. `loop_offset`, when given, must be a block-aligned byte
/// offset inside the stream, and the last block must carry the loop flag.
pub fn validate(data: &[u8], loop_offset: Option<usize>) -> BrrResult<()> {
    if data.is_empty() {
        return Err(BrrError::MalformedStream("stream is empty".to_string()));
    }
    if data.len() % BYTES_PER_BLOCK != 0 {
        return Err(BrrError::MalformedStream(format!(
            "length {} is not a multiple of {}",
            data.len(),
            BYTES_PER_BLOCK
        )));
    }

    let stream = BrrStream::from_bytes(data);
    let last = stream.block_count() - 1;
    let ends: Vec<usize> = stream
        .blocks()
        .enumerate()
        .filter(|(_, b)| b.header.end_flag)
        .map(|(i, _)| i)
        .collect();

    match ends.as_slice() {
        [end] if *end == last => {}
        [] => {
            return Err(BrrError::MalformedStream(
                "no block has the end flag".to_string(),
            ))
        }
        _ => {
            return Err(BrrError::MalformedStream(format!(
                "end flag on blocks {:?}, expected only block {}",
                ends, last
            )))
        }
    }

    if let Some(offset) = loop_offset {
        if offset % BYTES_PER_BLOCK != 0 || offset >= data.len() {
            return Err(BrrError::MalformedStream(format!(
                "loop offset {} is not a block inside the stream",
                offset
            )));
        }
        let looping = stream
            .blocks()
            .last()
            .is_some_and(|b| b.header.loop_flag);
        if !looping {
            return Err(BrrError::MalformedStream(
                "loop offset given but the last block has no loop flag".to_string(),
            ));
        }
    }

    Ok(())
}
