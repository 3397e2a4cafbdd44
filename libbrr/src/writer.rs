use crate::core::{BrrBlock, BYTES_PER_BLOCK, HEADER_END_FLAG, HEADER_LOOP_FLAG};

/// assembles encoded blocks into a brr stream
pub struct Writer;

impl Writer {
    /// new writer
    pub fn new() -> Self {
        Writer
    }

    /// serialize `blocks` and mark the end of the stream
    ///
    /// A silent block is appended when there are no blocks or the sample
    /// does not loop, so a one-shot sample always ends in silence. The last
    /// block gets the end flag, plus the loop flag when `looping`.
    pub fn write(&self, blocks: &[BrrBlock], looping: bool) -> Vec<u8> {
        let needs_terminator = blocks.is_empty() || !looping;
        let count = blocks.len() + usize::from(needs_terminator);

        let mut data = Vec::with_capacity(count * BYTES_PER_BLOCK);
        for block in blocks {
            data.extend_from_slice(&block.to_bytes());
        }
        if needs_terminator {
            data.extend_from_slice(&BrrBlock::silent().to_bytes());
        }

        let mut flags = HEADER_END_FLAG;
        if looping {
            flags |= HEADER_LOOP_FLAG;
        }
        let last = data.len() - BYTES_PER_BLOCK;
        data[last] |= flags;

        data
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
