//! Bit emission: everything that lands on the wire, in decoder order.
//!
//! The routines here serialize a built [`MetaBlock`]: length header, block
//! split codes, distance parameters, context maps, the Huffman codes
//! themselves (including the code that encodes the other codes' lengths),
//! and finally the command stream interleaved with literals and distances.

use crate::bit_cost::huffman_tree_bit_cost;
use crate::block_splitter::{BlockSplit, BlockSplitIterator};
use crate::command::Command;
use crate::context::{literal_context, distance_context, LITERAL_CONTEXT_BITS, DISTANCE_CONTEXT_BITS};
use crate::context_map::{best_max_zero_run_length_prefix, move_to_front_transform, run_length_code_zeros};
use crate::entropy::{build_entropy_code, write_huffman_tree, EntropyCode, CODE_LENGTH_CODES};
use crate::histogram::Histogram;
use crate::metablock::MetaBlock;
use crate::prefix::{
    block_length_extra_bits, block_length_offset, block_length_prefix, copy_length_extra_bits,
    copy_length_offset, insert_length_extra_bits, insert_length_offset, num_distance_codes,
    NUM_BLOCK_LEN_PREFIXES, NUM_COMMAND_PREFIXES,
};
use oxibrotli_core::bitstream::BitSink;
use oxibrotli_core::ringbuffer::ring_byte;

/// Emission order of the code-length code's own lengths.
const CODE_LENGTH_STORAGE_ORDER: [usize; CODE_LENGTH_CODES] =
    [1, 2, 3, 4, 0, 17, 18, 5, 6, 16, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// Fixed encoding of each code-length-code depth 0..=5: bit counts.
const CODE_LENGTH_DEPTH_NBITS: [u32; 6] = [2, 4, 3, 2, 2, 4];

/// Fixed encoding of each code-length-code depth 0..=5: bit patterns.
const CODE_LENGTH_DEPTH_BITS: [u64; 6] = [0, 7, 3, 1, 2, 15];

/// Write the meta-block length header for a block of `length` bytes.
///
/// One zero bit (not the final-empty marker), a 3-bit nibble count, then
/// `length - 1` in 4-bit nibbles, least significant first.
pub fn encode_meta_block_length(length: u64, sink: &mut BitSink) {
    debug_assert!(length >= 1);
    let value = length - 1;
    sink.write_bits(1, 0);
    let num_bits = if value == 0 { 0 } else { 64 - value.leading_zeros() };
    sink.write_bits(3, u64::from((num_bits + 3) >> 2));
    let mut v = value;
    let mut remaining = num_bits as i32;
    while remaining > 0 {
        sink.write_bits(4, v & 0xF);
        v >>= 4;
        remaining -= 4;
    }
}

fn log2_ceiling(x: u32) -> u32 {
    if x <= 1 {
        0
    } else {
        32 - (x - 1).leading_zeros()
    }
}

/// Store the lengths of the code-length code itself, in storage order with
/// trailing zeros dropped (but at least four entries kept).
fn store_huffman_tree_of_huffman_tree(code_length_bitdepth: &[u8], sink: &mut BitSink) {
    let mut codes_to_store = CODE_LENGTH_CODES;
    while codes_to_store > 4 {
        if code_length_bitdepth[CODE_LENGTH_STORAGE_ORDER[codes_to_store - 1]] != 0 {
            break;
        }
        codes_to_store -= 1;
    }
    sink.write_bits(4, (codes_to_store - 4) as u64);
    let skip_two_first = code_length_bitdepth[CODE_LENGTH_STORAGE_ORDER[0]] == 0
        && code_length_bitdepth[CODE_LENGTH_STORAGE_ORDER[1]] == 0;
    sink.write_bits(1, u64::from(skip_two_first));
    for &entry in CODE_LENGTH_STORAGE_ORDER[usize::from(skip_two_first) * 2..codes_to_store].iter() {
        let depth = code_length_bitdepth[entry] as usize;
        sink.write_bits(CODE_LENGTH_DEPTH_NBITS[depth], CODE_LENGTH_DEPTH_BITS[depth]);
    }
}

/// Emit a code-length symbol stream with its repeat extra bits.
fn store_huffman_tree_to_bit_mask(
    tree: &[u8],
    extra_bits: &[u8],
    code: &EntropyCode,
    sink: &mut BitSink,
) {
    for (&symbol, &extra) in tree.iter().zip(extra_bits) {
        code.write_symbol(symbol as usize, sink);
        match symbol {
            16 => sink.write_bits(2, u64::from(extra)),
            17 => sink.write_bits(3, u64::from(extra)),
            18 => sink.write_bits(7, u64::from(extra)),
            _ => {}
        }
    }
}

/// Serialize one Huffman code so a decoder can rebuild it knowing only the
/// alphabet size.
pub fn store_huffman_code(code: &EntropyCode, alphabet_size: usize, sink: &mut BitSink) {
    let mut max_bits = 0u32;
    let mut counter = alphabet_size - 1;
    while counter > 0 {
        counter >>= 1;
        max_bits += 1;
    }

    if code.count == 0 {
        // Minimal tree for an unused code: simple marker, one symbol, the
        // symbol is zero.
        sink.write_bits(3 + max_bits, 0x01);
        return;
    }

    if code.count <= 4 {
        let mut symbols = code.symbols;
        let listed = &mut symbols[..code.count];
        listed.sort_by_key(|&s| code.depth[s]);
        sink.write_bits(1, 1);
        sink.write_bits(2, (code.count - 1) as u64);
        for &symbol in listed.iter() {
            sink.write_bits(max_bits, symbol as u64);
        }
        if code.count == 4 {
            let balanced = listed.iter().all(|&s| code.depth[s] == 2);
            sink.write_bits(1, u64::from(!balanced));
        }
        return;
    }

    sink.write_bits(1, 0);
    let (tree, tree_extra) = write_huffman_tree(&code.depth, alphabet_size);

    let mut tree_histogram = Histogram::new(CODE_LENGTH_CODES);
    for &symbol in &tree {
        tree_histogram.add(symbol as usize);
    }
    let mut tree_code = build_entropy_code(&tree_histogram, 5, CODE_LENGTH_CODES);

    // Trailing zero-run symbols are implicit when the decoder knows the
    // alphabet size; dropping them pays off once the explicit length field
    // costs less than the symbols it removes.
    let mut tree_size = tree.len();
    let mut trimmed_histogram = tree_histogram.clone();
    let mut trimmed_size = tree.len();
    while trimmed_size > 0 {
        let symbol = tree[trimmed_size - 1];
        if symbol != 0 && symbol < 17 {
            break;
        }
        trimmed_histogram.remove(symbol as usize);
        trimmed_size -= 1;
    }
    let mut write_length = false;
    if trimmed_size > 1 && trimmed_size < tree.len() {
        let trimmed_code = build_entropy_code(&trimmed_histogram, 5, CODE_LENGTH_CODES);
        let full_cost = huffman_tree_bit_cost(&tree_histogram, &tree_code);
        let trimmed_cost = huffman_tree_bit_cost(&trimmed_histogram, &trimmed_code);
        let nbits = log2_ceiling(trimmed_size as u32 - 1);
        let nbitpairs = if nbits == 0 { 1 } else { (nbits + 1) / 2 };
        if trimmed_cost + 3 + 2 * u64::from(nbitpairs) < full_cost {
            write_length = true;
            tree_size = trimmed_size;
            tree_code = trimmed_code;
        }
    }

    store_huffman_tree_of_huffman_tree(&tree_code.depth, sink);
    sink.write_bits(1, u64::from(write_length));
    if write_length {
        let nbits = log2_ceiling(tree_size as u32 - 1);
        let nbitpairs = if nbits == 0 { 1 } else { (nbits + 1) / 2 };
        sink.write_bits(3, u64::from(nbitpairs - 1));
        sink.write_bits(nbitpairs * 2, tree_size as u64 - 2);
    }
    store_huffman_tree_to_bit_mask(&tree[..tree_size], &tree_extra[..tree_size], &tree_code, sink);
}

/// Emit a context map: cluster count, run-length parameters, the symbol
/// code, the MTF+RLE symbol stream, and the trailing MTF marker.
pub fn encode_context_map(context_map: &[u32], num_clusters: usize, sink: &mut BitSink) {
    sink.write_bits(8, num_clusters as u64 - 1);
    if num_clusters == 1 {
        return;
    }

    let transformed = move_to_front_transform(context_map);
    let mut max_run_length_prefix = best_max_zero_run_length_prefix(&transformed);
    let (rle_symbols, extra_bits) = run_length_code_zeros(&transformed, &mut max_run_length_prefix);

    let alphabet = num_clusters + max_run_length_prefix as usize;
    let mut symbol_histogram = Histogram::new(alphabet);
    for &s in &rle_symbols {
        symbol_histogram.add(s as usize);
    }
    let symbol_code = build_entropy_code(&symbol_histogram, 15, alphabet);

    let use_rle = max_run_length_prefix > 0;
    sink.write_bits(1, u64::from(use_rle));
    if use_rle {
        sink.write_bits(4, u64::from(max_run_length_prefix - 1));
    }
    store_huffman_code(&symbol_code, alphabet, sink);
    for (&symbol, &extra) in rle_symbols.iter().zip(&extra_bits) {
        symbol_code.write_symbol(symbol as usize, sink);
        if symbol > 0 && symbol <= max_run_length_prefix {
            sink.write_bits(symbol, u64::from(extra));
        }
    }
    sink.write_bits(1, 1); // move-to-front is in use
}

/// The pair of codes a block split is emitted with.
#[derive(Debug, Default)]
pub struct BlockSplitCode {
    block_type_code: EntropyCode,
    block_length_code: EntropyCode,
}

/// Emit a block length through the split's length code.
fn encode_block_length(code: &EntropyCode, length: u32, sink: &mut BitSink) {
    let len_code = block_length_prefix(length);
    let extra_bits = block_length_extra_bits(len_code);
    let extra_value = length - block_length_offset(len_code);
    code.write_symbol(len_code, sink);
    if extra_bits > 0 {
        sink.write_bits(extra_bits, u64::from(extra_value));
    }
}

/// Emit a split's header: type count, both codes, and the first block's
/// length. Single-type splits cost one bit.
pub fn build_and_encode_block_split_code(split: &BlockSplit, sink: &mut BitSink) -> BlockSplitCode {
    if split.num_types <= 1 {
        sink.write_bits(1, 0);
        return BlockSplitCode::default();
    }
    sink.write_bits(1, 1);

    let mut type_histogram = Histogram::new(split.num_types + 2);
    for &tc in &split.type_codes {
        type_histogram.add(tc as usize);
    }
    let mut length_histogram = Histogram::new(NUM_BLOCK_LEN_PREFIXES);
    for &len in &split.lengths {
        length_histogram.add(block_length_prefix(len));
    }
    let code = BlockSplitCode {
        block_type_code: build_entropy_code(&type_histogram, 15, split.num_types + 2),
        block_length_code: build_entropy_code(&length_histogram, 15, NUM_BLOCK_LEN_PREFIXES),
    };
    sink.write_bits(8, split.num_types as u64 - 1);
    store_huffman_code(&code.block_type_code, split.num_types + 2, sink);
    store_huffman_code(&code.block_length_code, NUM_BLOCK_LEN_PREFIXES, sink);
    encode_block_length(&code.block_length_code, split.lengths[0], sink);
    code
}

/// Step a split cursor, emitting the type and length codes at boundaries.
fn move_and_encode(code: &BlockSplitCode, it: &mut BlockSplitIterator<'_>, sink: &mut BitSink) {
    if let Some((type_code, length)) = it.step() {
        code.block_type_code.write_symbol(type_code as usize, sink);
        encode_block_length(&code.block_length_code, length, sink);
    }
}

/// Emit one command symbol with its insert and copy extra bits.
fn encode_command(cmd: &Command, code: &EntropyCode, sink: &mut BitSink) {
    code.write_symbol(cmd.command_prefix as usize, sink);
    let base = if cmd.command_prefix >= 128 {
        cmd.command_prefix - 128
    } else {
        cmd.command_prefix
    };
    let insert_extra = insert_length_extra_bits(base);
    if insert_extra > 0 {
        let value = cmd.insert_length - insert_length_offset(base);
        sink.write_bits(insert_extra, u64::from(value));
    }
    let copy_extra = copy_length_extra_bits(base);
    if copy_extra > 0 {
        let value = cmd.copy_length_code - copy_length_offset(base);
        sink.write_bits(copy_extra, u64::from(value));
    }
}

/// Serialize a built meta-block. `pos` is the absolute position of its
/// first byte and is advanced to its end.
pub fn store_meta_block(
    mb: &MetaBlock,
    ring: &[u8],
    mask: usize,
    pos: &mut u64,
    sink: &mut BitSink,
) {
    let length: u64 = mb.cmds.iter().map(Command::length).sum();
    let end_pos = *pos + length;
    encode_meta_block_length(length, sink);

    let literal_split_code = build_and_encode_block_split_code(&mb.literal_split, sink);
    let command_split_code = build_and_encode_block_split_code(&mb.command_split, sink);
    let distance_split_code = build_and_encode_block_split_code(&mb.distance_split, sink);

    sink.write_bits(2, u64::from(mb.params.distance_postfix_bits));
    sink.write_bits(
        4,
        u64::from(mb.params.num_direct_distance_codes >> mb.params.distance_postfix_bits),
    );
    let distance_alphabet = num_distance_codes(
        mb.params.num_direct_distance_codes,
        mb.params.distance_postfix_bits,
    );

    for &mode in &mb.literal_context_modes {
        sink.write_bits(2, mode.bits());
    }
    encode_context_map(&mb.literal_context_map, mb.literal_histograms.len(), sink);
    encode_context_map(&mb.distance_context_map, mb.distance_histograms.len(), sink);

    let literal_codes: Vec<EntropyCode> = mb
        .literal_histograms
        .iter()
        .map(|h| build_entropy_code(h, 15, 256))
        .collect();
    let command_codes: Vec<EntropyCode> = mb
        .command_histograms
        .iter()
        .map(|h| build_entropy_code(h, 15, NUM_COMMAND_PREFIXES))
        .collect();
    let distance_codes: Vec<EntropyCode> = mb
        .distance_histograms
        .iter()
        .map(|h| build_entropy_code(h, 15, distance_alphabet))
        .collect();
    for code in &literal_codes {
        store_huffman_code(code, 256, sink);
    }
    for code in &command_codes {
        store_huffman_code(code, NUM_COMMAND_PREFIXES, sink);
    }
    for code in &distance_codes {
        store_huffman_code(code, distance_alphabet, sink);
    }

    let mut literal_it = BlockSplitIterator::new(&mb.literal_split);
    let mut command_it = BlockSplitIterator::new(&mb.command_split);
    let mut distance_it = BlockSplitIterator::new(&mb.distance_split);
    for cmd in &mb.cmds {
        move_and_encode(&command_split_code, &mut command_it, sink);
        encode_command(cmd, &command_codes[command_it.block_type], sink);
        for _ in 0..cmd.insert_length {
            move_and_encode(&literal_split_code, &mut literal_it, sink);
            let prev1 = if *pos > 0 { ring_byte(ring, mask, *pos - 1) } else { 0 };
            let prev2 = if *pos > 1 { ring_byte(ring, mask, *pos - 2) } else { 0 };
            let context = (literal_it.block_type << LITERAL_CONTEXT_BITS)
                + literal_context(prev1, prev2, mb.literal_context_modes[literal_it.block_type]);
            let histogram_idx = mb.literal_context_map[context] as usize;
            literal_codes[histogram_idx].write_symbol(ring_byte(ring, mask, *pos) as usize, sink);
            *pos += 1;
        }
        if *pos < end_pos {
            if let Some(payload) = &cmd.distance {
                move_and_encode(&distance_split_code, &mut distance_it, sink);
                let context = (distance_it.block_type << DISTANCE_CONTEXT_BITS)
                    + distance_context(cmd.copy_length_code);
                let histogram_idx = mb.distance_context_map[context] as usize;
                distance_codes[histogram_idx].write_symbol(payload.prefix as usize, sink);
                if payload.extra_bits > 0 {
                    sink.write_bits(payload.extra_bits, u64::from(payload.extra_bits_value));
                }
            }
        }
        *pos += u64::from(cmd.copy_length);
    }
    debug_assert_eq!(*pos, end_pos);
}
