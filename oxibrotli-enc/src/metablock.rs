//! Meta-block assembly: from commands to a fully parameterized block.

use crate::block_splitter::{compute_block_type_short_codes, split_block, BlockSplit};
use crate::cluster::{cluster_histograms, MAX_NUMBER_OF_HISTOGRAMS};
use crate::command::{compute_command_prefixes, Command};
use crate::context::{ContextMode, DISTANCE_CONTEXT_BITS, LITERAL_CONTEXT_BITS};
use crate::histogram::{build_histograms, Histogram};
use crate::prefix::{num_distance_codes, NUM_COMMAND_PREFIXES};
use oxibrotli_core::error::{OxibrotliError, Result};

/// Tunables of one meta-block's distance coding and literal contexts.
#[derive(Debug, Clone, Copy)]
pub struct EncodingParams {
    /// Distances encoded verbatim after the short codes, 0..=120.
    pub num_direct_distance_codes: u32,
    /// Low distance bits moved into the symbol, 0..=3.
    pub distance_postfix_bits: u32,
    /// Context mode applied to every literal block type.
    pub literal_context_mode: ContextMode,
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            num_direct_distance_codes: 12,
            distance_postfix_bits: 1,
            literal_context_mode: ContextMode::Signed,
        }
    }
}

impl EncodingParams {
    /// Validate the parameter combination against the wire format.
    pub fn validate(&self) -> Result<()> {
        if self.distance_postfix_bits > 3 {
            return Err(OxibrotliError::invalid_postfix_bits(self.distance_postfix_bits));
        }
        let ndirect = self.num_direct_distance_codes;
        let multiple = 1u32 << self.distance_postfix_bits;
        if ndirect > 120 || ndirect % multiple != 0 || (ndirect >> self.distance_postfix_bits) > 15 {
            return Err(OxibrotliError::invalid_direct_codes(
                ndirect,
                self.distance_postfix_bits,
            ));
        }
        Ok(())
    }
}

/// One meta-block, ready for bit emission.
#[derive(Debug)]
pub struct MetaBlock {
    /// The commands, with prefixes and distance payloads resolved.
    pub cmds: Vec<Command>,
    /// Parameters the block was built with.
    pub params: EncodingParams,
    /// Split of the literal stream.
    pub literal_split: BlockSplit,
    /// Split of the command stream.
    pub command_split: BlockSplit,
    /// Split of the distance stream.
    pub distance_split: BlockSplit,
    /// Context mode per literal block type.
    pub literal_context_modes: Vec<ContextMode>,
    /// Clustered histogram index per (literal type, context).
    pub literal_context_map: Vec<u32>,
    /// Clustered histogram index per (distance type, context).
    pub distance_context_map: Vec<u32>,
    /// Clustered literal histograms.
    pub literal_histograms: Vec<Histogram>,
    /// One command histogram per command block type.
    pub command_histograms: Vec<Histogram>,
    /// Clustered distance histograms.
    pub distance_histograms: Vec<Histogram>,
}

/// Build a meta-block from raw commands and the ring buffer they describe.
pub fn build_meta_block(
    params: EncodingParams,
    cmds: &[Command],
    ring: &[u8],
    pos: u64,
    mask: usize,
) -> MetaBlock {
    let mut cmds = cmds.to_vec();
    compute_command_prefixes(
        &mut cmds,
        params.num_direct_distance_codes,
        params.distance_postfix_bits,
    );
    let distance_alphabet = num_distance_codes(
        params.num_direct_distance_codes,
        params.distance_postfix_bits,
    );

    let (mut literal_split, mut command_split, mut distance_split) =
        split_block(&cmds, ring, pos, mask, distance_alphabet);
    compute_block_type_short_codes(&mut literal_split);
    compute_block_type_short_codes(&mut command_split);
    compute_block_type_short_codes(&mut distance_split);

    let literal_context_modes = vec![params.literal_context_mode; literal_split.num_types];

    let num_literal_contexts = literal_split.num_types << LITERAL_CONTEXT_BITS;
    let num_distance_contexts = distance_split.num_types << DISTANCE_CONTEXT_BITS;
    let mut literal_histograms = vec![Histogram::new(256); num_literal_contexts];
    let mut command_histograms =
        vec![Histogram::new(NUM_COMMAND_PREFIXES); command_split.num_types];
    let mut distance_histograms = vec![Histogram::new(distance_alphabet); num_distance_contexts];
    build_histograms(
        &cmds,
        &literal_split,
        &command_split,
        &distance_split,
        ring,
        pos,
        mask,
        &literal_context_modes,
        &mut literal_histograms,
        &mut command_histograms,
        &mut distance_histograms,
    );

    let (literal_histograms, literal_context_map) = cluster_histograms(
        literal_histograms,
        1 << LITERAL_CONTEXT_BITS,
        MAX_NUMBER_OF_HISTOGRAMS,
    );
    let (distance_histograms, distance_context_map) = cluster_histograms(
        distance_histograms,
        1 << DISTANCE_CONTEXT_BITS,
        MAX_NUMBER_OF_HISTOGRAMS,
    );

    MetaBlock {
        cmds,
        params,
        literal_split,
        command_split,
        distance_split,
        literal_context_modes,
        literal_context_map,
        distance_context_map,
        literal_histograms,
        command_histograms,
        distance_histograms,
    }
}
