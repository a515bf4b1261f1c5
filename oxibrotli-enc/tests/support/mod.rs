//! Reference decoder for the integration tests.
//!
//! A deliberately straightforward, panic-on-malformed-input decoder for the
//! streams this encoder emits. It exists only to prove round-trips; it is
//! not a product surface.

// Each integration test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use oxibrotli_core::bitstream::BitReader;
use oxibrotli_enc::context::{distance_context, literal_context, ContextMode};
use oxibrotli_enc::prefix::{
    block_length_extra_bits, block_length_offset, copy_length_extra_bits, copy_length_offset,
    insert_length_extra_bits, insert_length_offset,
};

const CODE_LENGTH_STORAGE_ORDER: [usize; 19] =
    [1, 2, 3, 4, 0, 17, 18, 5, 6, 16, 7, 8, 9, 10, 11, 12, 13, 14, 15];

const SHORT_CODE_INDEX_OFFSET: [usize; 16] = [3, 2, 1, 0, 3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2];
const SHORT_CODE_VALUE_OFFSET: [i64; 16] = [0, 0, 0, 0, -1, 1, -2, 2, -3, 3, -1, 1, -2, 2, -3, 3];

/// Canonical prefix decoder built from per-symbol depths.
struct PrefixCode {
    count: usize,
    single_symbol: u16,
    counts: [u32; 16],
    offsets: [u32; 16],
    base: [u32; 16],
    symbols: Vec<u16>,
}

impl PrefixCode {
    fn single(symbol: u16) -> Self {
        Self {
            count: 1,
            single_symbol: symbol,
            counts: [0; 16],
            offsets: [0; 16],
            base: [0; 16],
            symbols: vec![symbol],
        }
    }

    fn from_depths(depths: &[u8]) -> Self {
        let mut counts = [0u32; 16];
        for &d in depths {
            if d > 0 {
                assert!(d <= 15, "depth out of range");
                counts[d as usize] += 1;
            }
        }
        let total: u32 = counts.iter().sum();
        if total == 1 {
            let symbol = depths.iter().position(|&d| d > 0).unwrap();
            return Self::single(symbol as u16);
        }
        let mut base = [0u32; 16];
        let mut offsets = [0u32; 16];
        let mut code = 0u32;
        let mut offset = 0u32;
        for len in 1..16 {
            code = (code + counts[len - 1]) << 1;
            base[len] = code;
            offsets[len] = offset;
            offset += counts[len];
        }
        // Symbols in (depth, symbol) order, matching canonical assignment.
        let mut symbols = vec![0u16; total as usize];
        let mut next = offsets;
        for (sym, &d) in depths.iter().enumerate() {
            if d > 0 {
                symbols[next[d as usize] as usize] = sym as u16;
                next[d as usize] += 1;
            }
        }
        Self {
            count: total as usize,
            single_symbol: 0,
            counts,
            offsets,
            base,
            symbols,
        }
    }

    fn read_symbol(&self, r: &mut BitReader<'_>) -> u16 {
        if self.count <= 1 {
            return self.single_symbol;
        }
        let mut code = 0u32;
        for len in 1..16 {
            code = (code << 1) | u32::from(r.read_bit().expect("bitstream"));
            let c = self.counts[len];
            if c > 0 && code >= self.base[len] && code < self.base[len] + c {
                return self.symbols[(self.offsets[len] + code - self.base[len]) as usize];
            }
        }
        panic!("invalid prefix code");
    }
}

/// The fixed 2..4-bit encoding of code-length-code depths.
fn read_code_length_depth(r: &mut BitReader<'_>) -> u8 {
    let b = |r: &mut BitReader<'_>| r.read_bit().expect("bitstream");
    if !b(r) {
        if !b(r) {
            0
        } else {
            4
        }
    } else if !b(r) {
        3
    } else if !b(r) {
        2
    } else if !b(r) {
        1
    } else {
        5
    }
}

fn max_bits_for(alphabet_size: usize) -> u32 {
    let mut max_bits = 0;
    let mut counter = alphabet_size - 1;
    while counter > 0 {
        counter >>= 1;
        max_bits += 1;
    }
    max_bits
}

/// Parse one stored Huffman code.
fn read_huffman_code(alphabet_size: usize, r: &mut BitReader<'_>) -> PrefixCode {
    let max_bits = max_bits_for(alphabet_size);
    if r.read_bit().expect("bitstream") {
        // Simple code: explicit symbol list.
        let count = r.read_bits(2).expect("bitstream") as usize + 1;
        let mut symbols = Vec::with_capacity(count);
        for _ in 0..count {
            let s = r.read_bits(max_bits).expect("bitstream") as usize;
            assert!(s < alphabet_size, "symbol out of alphabet");
            symbols.push(s as u16);
        }
        let depths: &[u8] = match count {
            1 => return PrefixCode::single(symbols[0]),
            2 => &[1, 1],
            3 => &[1, 2, 2],
            _ => {
                if r.read_bit().expect("bitstream") {
                    &[1, 2, 3, 3]
                } else {
                    &[2, 2, 2, 2]
                }
            }
        };
        let mut full = vec![0u8; alphabet_size];
        for (&s, &d) in symbols.iter().zip(depths) {
            full[s as usize] = d;
        }
        PrefixCode::from_depths(&full)
    } else {
        // Full code-length-coded tree.
        let num_codes = r.read_bits(4).expect("bitstream") as usize + 4;
        let skip_two = r.read_bit().expect("bitstream");
        let mut cl_depths = [0u8; 19];
        for &entry in &CODE_LENGTH_STORAGE_ORDER[usize::from(skip_two) * 2..num_codes] {
            cl_depths[entry] = read_code_length_depth(r);
        }
        let cl_code = PrefixCode::from_depths(&cl_depths);

        let explicit_size = if r.read_bit().expect("bitstream") {
            let nbitpairs = r.read_bits(3).expect("bitstream") as u32 + 1;
            Some(r.read_bits(2 * nbitpairs).expect("bitstream") as usize + 2)
        } else {
            None
        };

        let mut depths = vec![0u8; alphabet_size];
        let mut pos = 0usize;
        let mut prev = 8u8;
        let mut symbols_read = 0usize;
        while pos < alphabet_size && explicit_size.map_or(true, |n| symbols_read < n) {
            let s = cl_code.read_symbol(r);
            symbols_read += 1;
            match s {
                0..=15 => {
                    depths[pos] = s as u8;
                    pos += 1;
                    if s != 0 {
                        prev = s as u8;
                    }
                }
                16 => {
                    let reps = 3 + r.read_bits(2).expect("bitstream") as usize;
                    for _ in 0..reps {
                        depths[pos] = prev;
                        pos += 1;
                    }
                }
                17 => pos += 3 + r.read_bits(3).expect("bitstream") as usize,
                18 => pos += 11 + r.read_bits(7).expect("bitstream") as usize,
                _ => unreachable!(),
            }
        }
        assert!(pos <= alphabet_size, "tree overruns alphabet");
        PrefixCode::from_depths(&depths)
    }
}

fn read_block_length(code: &PrefixCode, r: &mut BitReader<'_>) -> u32 {
    let sym = code.read_symbol(r) as usize;
    let extra = block_length_extra_bits(sym);
    block_length_offset(sym) + r.read_bits(extra).expect("bitstream") as u32
}

fn inverse_mtf(values: &[u32], table_size: usize) -> Vec<u32> {
    let mut table: Vec<u32> = (0..table_size as u32).collect();
    let mut out = Vec::with_capacity(values.len());
    for &index in values {
        let value = table[index as usize];
        out.push(value);
        table.remove(index as usize);
        table.insert(0, value);
    }
    out
}

/// Parse a context map of `expected_len` entries; returns the map and the
/// number of histograms it refers to.
fn read_context_map(expected_len: usize, r: &mut BitReader<'_>) -> (Vec<u32>, usize) {
    let num_clusters = r.read_bits(8).expect("bitstream") as usize + 1;
    if num_clusters == 1 {
        return (vec![0; expected_len], 1);
    }
    let use_rle = r.read_bit().expect("bitstream");
    let max_prefix = if use_rle {
        r.read_bits(4).expect("bitstream") as u32 + 1
    } else {
        0
    };
    let code = read_huffman_code(num_clusters + max_prefix as usize, r);
    let mut values = Vec::with_capacity(expected_len);
    while values.len() < expected_len {
        let s = u32::from(code.read_symbol(r));
        if s == 0 {
            values.push(0);
        } else if s <= max_prefix {
            let run = (1u64 << s) + r.read_bits(s).expect("bitstream");
            for _ in 0..run {
                values.push(0);
            }
        } else {
            values.push(s - max_prefix);
        }
    }
    assert_eq!(values.len(), expected_len, "run overshot the context map");
    assert!(r.read_bit().expect("bitstream"), "expected the MTF marker");
    (inverse_mtf(&values, num_clusters), num_clusters)
}

/// Cursor over one block split, mirroring the encoder's iterator.
struct SplitState {
    num_types: usize,
    codes: Option<(PrefixCode, PrefixCode)>,
    cur_type: usize,
    remaining: u64,
    ring: [usize; 2],
    idx: usize,
}

impl SplitState {
    fn read(r: &mut BitReader<'_>) -> Self {
        if !r.read_bit().expect("bitstream") {
            return Self {
                num_types: 1,
                codes: None,
                cur_type: 0,
                remaining: 0,
                ring: [0, 1],
                idx: 1,
            };
        }
        let num_types = r.read_bits(8).expect("bitstream") as usize + 1;
        let type_code = read_huffman_code(num_types + 2, r);
        let length_code = read_huffman_code(26, r);
        let first_length = read_block_length(&length_code, r);
        Self {
            num_types,
            codes: Some((type_code, length_code)),
            cur_type: 0,
            remaining: u64::from(first_length),
            // The first block is type 0, already pushed through the ring.
            ring: [0, 1],
            idx: 1,
        }
    }

    fn step(&mut self, r: &mut BitReader<'_>) {
        let Some((type_code, length_code)) = &self.codes else {
            return;
        };
        if self.remaining == 0 {
            let code = type_code.read_symbol(r) as usize;
            let t = match code {
                0 => self.ring[self.idx & 1],
                1 => self.ring[self.idx.wrapping_sub(1) & 1] + 1,
                c => c - 2,
            };
            self.ring[self.idx & 1] = t;
            self.idx += 1;
            self.cur_type = t;
            self.remaining = u64::from(read_block_length(length_code, r));
        }
        self.remaining -= 1;
    }
}

fn context_mode_from_bits(bits: u64) -> ContextMode {
    match bits {
        0 => ContextMode::Lsb6,
        1 => ContextMode::Msb6,
        2 => ContextMode::Utf8,
        3 => ContextMode::Signed,
        _ => unreachable!(),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_distance(
    symbol: u32,
    num_direct: u32,
    postfix: u32,
    history: &mut [u32; 4],
    history_idx: &mut usize,
    r: &mut BitReader<'_>,
) -> u64 {
    let distance: u32;
    if symbol < 16 {
        let probe = i64::from(history[(*history_idx + SHORT_CODE_INDEX_OFFSET[symbol as usize]) & 3])
            + SHORT_CODE_VALUE_OFFSET[symbol as usize];
        assert!(probe > 0, "short code resolved to nonpositive distance");
        distance = probe as u32;
        if symbol != 0 {
            history[*history_idx & 3] = distance;
            *history_idx += 1;
        }
    } else if symbol < 16 + num_direct {
        distance = symbol - 16 + 1;
        history[*history_idx & 3] = distance;
        *history_idx += 1;
    } else {
        let t = symbol - 16 - num_direct;
        let postfix_val = t & ((1 << postfix) - 1);
        let u = t >> postfix;
        let nbits = u / 2 + 1;
        let prefix_bit = u & 1;
        let bucket = nbits + postfix;
        let offset = u64::from(2 + prefix_bit) << bucket;
        let extra = r.read_bits(nbits).expect("bitstream");
        let val = offset + (extra << postfix) + u64::from(postfix_val);
        distance = (val - (4u64 << postfix) + 1 + u64::from(num_direct)) as u32;
        history[*history_idx & 3] = distance;
        *history_idx += 1;
    }
    u64::from(distance)
}

/// Decode a full stream, returning the bytes and the meta-block count.
pub fn decompress_with_stats(stream: &[u8]) -> (Vec<u8>, usize) {
    if stream == [0x01, 0x00].as_slice() {
        return (Vec::new(), 0);
    }
    let mut r = BitReader::new(stream);
    assert_eq!(r.read_bits(3).expect("bitstream"), 0, "header prefix");
    let _window_bits = if r.read_bit().expect("bitstream") {
        17 + r.read_bits(3).expect("bitstream") as u32
    } else {
        16
    };

    let mut out: Vec<u8> = Vec::new();
    let mut history = [4u32, 11, 15, 16];
    let mut history_idx = 0usize;
    let mut meta_blocks = 0usize;

    loop {
        if r.read_bit().expect("bitstream") {
            break;
        }
        meta_blocks += 1;

        let nibbles = r.read_bits(3).expect("bitstream") as u32;
        let length = r.read_bits(4 * nibbles).expect("bitstream") + 1;

        let mut literal_split = SplitState::read(&mut r);
        let mut command_split = SplitState::read(&mut r);
        let mut distance_split = SplitState::read(&mut r);

        let postfix = r.read_bits(2).expect("bitstream") as u32;
        let num_direct = (r.read_bits(4).expect("bitstream") as u32) << postfix;

        let modes: Vec<ContextMode> = (0..literal_split.num_types)
            .map(|_| context_mode_from_bits(r.read_bits(2).expect("bitstream")))
            .collect();

        let (literal_map, num_literal_histograms) =
            read_context_map(literal_split.num_types << 6, &mut r);
        let (distance_map, num_distance_histograms) =
            read_context_map(distance_split.num_types << 2, &mut r);

        let literal_codes: Vec<PrefixCode> = (0..num_literal_histograms)
            .map(|_| read_huffman_code(256, &mut r))
            .collect();
        let command_codes: Vec<PrefixCode> = (0..command_split.num_types)
            .map(|_| read_huffman_code(704, &mut r))
            .collect();
        let distance_alphabet = 16 + num_direct as usize + (48usize << postfix);
        let distance_codes: Vec<PrefixCode> = (0..num_distance_histograms)
            .map(|_| read_huffman_code(distance_alphabet, &mut r))
            .collect();

        let block_end = out.len() as u64 + length;
        while (out.len() as u64) < block_end {
            command_split.step(&mut r);
            let symbol = command_codes[command_split.cur_type].read_symbol(&mut r);
            let base = if symbol >= 128 { symbol - 128 } else { symbol };
            let insert_length = insert_length_offset(base)
                + r.read_bits(insert_length_extra_bits(base)).expect("bitstream") as u32;
            let copy_length_code = copy_length_offset(base)
                + r.read_bits(copy_length_extra_bits(base)).expect("bitstream") as u32;

            for _ in 0..insert_length {
                literal_split.step(&mut r);
                let p1 = out.last().copied().unwrap_or(0);
                let p2 = if out.len() > 1 { out[out.len() - 2] } else { 0 };
                let context = (literal_split.cur_type << 6)
                    + literal_context(p1, p2, modes[literal_split.cur_type]);
                let byte =
                    literal_codes[literal_map[context] as usize].read_symbol(&mut r) as u8;
                out.push(byte);
            }

            if (out.len() as u64) < block_end {
                let distance = if symbol >= 128 {
                    distance_split.step(&mut r);
                    let context = (distance_split.cur_type << 2) + distance_context(copy_length_code);
                    let d = u32::from(
                        distance_codes[distance_map[context] as usize].read_symbol(&mut r),
                    );
                    resolve_distance(d, num_direct, postfix, &mut history, &mut history_idx, &mut r)
                } else {
                    u64::from(history[(history_idx + 3) & 3])
                };
                assert!(distance as usize <= out.len(), "distance past stream start");
                assert!(distance > 0);
                for _ in 0..copy_length_code {
                    let byte = out[out.len() - distance as usize];
                    out.push(byte);
                }
            }
        }
        assert_eq!(out.len() as u64, block_end, "meta-block over-produced");
    }
    (out, meta_blocks)
}

/// Decode a full stream.
pub fn decompress(stream: &[u8]) -> Vec<u8> {
    decompress_with_stats(stream).0
}

/// Deterministic pseudo-random bytes for test payloads.
pub fn lcg_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut state = seed;
    for _ in 0..len {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        data.push((state >> 33) as u8);
    }
    data
}
