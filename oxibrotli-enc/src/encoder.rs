//! The streaming driver and one-shot entry point.

use crate::backward_references::create_backward_references;
use crate::command::compute_distance_short_codes;
use crate::hash::Hasher;
use crate::literal_cost::estimate_bit_costs_for_literals;
use crate::metablock::{build_meta_block, EncodingParams};
use crate::store::store_meta_block;
use oxibrotli_core::bitstream::BitSink;
use oxibrotli_core::error::{OxibrotliError, Result};
use oxibrotli_core::ringbuffer::RingBuffer;

/// Default LZ window exponent.
pub const DEFAULT_WINDOW_BITS: u32 = 22;

/// Largest input a single meta-block may cover.
pub const MAX_META_BLOCK_SIZE: usize = 1 << META_BLOCK_SIZE_BITS;

const META_BLOCK_SIZE_BITS: u32 = 21;
const RING_BUFFER_BITS: u32 = 23;

/// The decoder may write this far ahead in its own ring buffer, so the
/// encoder gives up the same amount of backward reach.
const DECODER_WRITE_AHEAD_SLACK: u64 = 16;

/// Streaming encoder: one stream header, any number of meta-blocks, one
/// final marker.
///
/// The ring buffer, match-finder state and distance history persist across
/// meta-blocks, so later blocks may reference earlier ones.
#[derive(Debug)]
pub struct StreamEncoder {
    window_bits: u32,
    max_backward_distance: u64,
    params: EncodingParams,
    ring: RingBuffer,
    input_pos: u64,
    dist_history: [u32; 4],
    dist_history_idx: usize,
    literal_cost: Vec<f32>,
    hasher: Hasher,
    sink: BitSink,
}

impl StreamEncoder {
    /// Create an encoder with the default window and parameters.
    pub fn new() -> Self {
        Self::with_window_bits(DEFAULT_WINDOW_BITS).expect("default window is valid")
    }

    /// Create an encoder with an explicit window exponent in 16..=24.
    pub fn with_window_bits(window_bits: u32) -> Result<Self> {
        Self::with_params(window_bits, EncodingParams::default())
    }

    /// Create an encoder with explicit window and block parameters.
    pub fn with_params(window_bits: u32, params: EncodingParams) -> Result<Self> {
        if !(16..=24).contains(&window_bits) {
            return Err(OxibrotliError::invalid_window_bits(window_bits));
        }
        params.validate()?;
        Ok(Self {
            window_bits,
            max_backward_distance: (1u64 << window_bits) - DECODER_WRITE_AHEAD_SLACK,
            params,
            ring: RingBuffer::new(RING_BUFFER_BITS),
            input_pos: 0,
            dist_history: [4, 11, 15, 16],
            dist_history_idx: 0,
            literal_cost: vec![0.0; 1 << RING_BUFFER_BITS],
            hasher: Hasher::new(),
            sink: BitSink::with_capacity(2 << META_BLOCK_SIZE_BITS),
        })
    }

    /// Write the stream header: three zero bits (no embedded input size)
    /// and the window size.
    pub fn write_stream_header(&mut self) {
        self.sink.write_bits(3, 0);
        if self.window_bits == 16 {
            self.sink.write_bits(1, 0);
        } else {
            self.sink.write_bits(1, 1);
            self.sink.write_bits(3, u64::from(self.window_bits - 17));
        }
    }

    /// Encode `input` as one meta-block and return the stream bytes
    /// completed by it. Up to 7 bits stay buffered for the next call.
    pub fn write_meta_block(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Err(OxibrotliError::EmptyMetaBlock);
        }
        if input.len() > MAX_META_BLOCK_SIZE {
            return Err(OxibrotliError::meta_block_too_large(
                input.len(),
                MAX_META_BLOCK_SIZE,
            ));
        }

        self.ring.write(self.input_pos, input);
        let (ring, mask) = (self.ring.as_slice(), self.ring.mask());
        estimate_bit_costs_for_literals(
            self.input_pos,
            input.len(),
            mask,
            ring,
            &mut self.literal_cost,
        );
        let mut commands = create_backward_references(
            input.len(),
            self.input_pos,
            ring,
            mask,
            &self.literal_cost,
            self.max_backward_distance,
            &mut self.hasher,
        );
        compute_distance_short_codes(
            &mut commands,
            &mut self.dist_history,
            &mut self.dist_history_idx,
        );
        let mb = build_meta_block(self.params, &commands, ring, self.input_pos, mask);
        store_meta_block(&mb, ring, mask, &mut self.input_pos, &mut self.sink);
        Ok(self.sink.extract_whole_bytes())
    }

    /// Seal the stream: the final-empty meta-block marker plus whatever
    /// bits were still buffered, zero-padded to a byte.
    pub fn finish_stream(mut self) -> Vec<u8> {
        self.sink.write_bits(1, 1);
        self.sink.into_bytes()
    }
}

impl Default for StreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress `input` into a complete stream with default parameters.
///
/// The empty input encodes to the canonical two-byte stream `01 00`.
pub fn compress_buffer(input: &[u8]) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(vec![0x01, 0x00]);
    }
    let mut encoder = StreamEncoder::new();
    encoder.write_stream_header();
    let mut output = Vec::new();
    for chunk in input.chunks(MAX_META_BLOCK_SIZE) {
        output.extend(encoder.write_meta_block(chunk)?);
    }
    output.extend(encoder.finish_stream());
    Ok(output)
}
