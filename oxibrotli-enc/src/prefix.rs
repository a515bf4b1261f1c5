//! Static prefix-code range tables.
//!
//! Insert lengths, copy lengths, block lengths and copy distances are all
//! encoded as a prefix code selecting a value range plus extra bits giving
//! the offset within the range. The tables here are fixed by the wire
//! format; every range is `[offset, offset + 2^nbits)` and the ranges of a
//! table are contiguous.

/// Number of insert-length prefix codes.
pub const NUM_INSERT_LEN_PREFIXES: usize = 24;

/// Number of copy-length prefix codes.
pub const NUM_COPY_LEN_PREFIXES: usize = 24;

/// Number of combined insert-and-copy command prefix codes.
///
/// 24 insert prefixes times 24 copy prefixes, plus a reserved band of 128
/// symbols: commands that emit an explicit distance are shifted up by 128,
/// so symbols 0..=127 double as "copy from the last used distance".
pub const NUM_COMMAND_PREFIXES: usize = 704;

/// Number of block-length prefix codes.
pub const NUM_BLOCK_LEN_PREFIXES: usize = 26;

/// Number of short distance codes referring to the distance history.
pub const NUM_DISTANCE_SHORT_CODES: usize = 16;

/// A prefix code value range: `[offset, offset + 2^nbits)`.
#[derive(Debug, Clone, Copy)]
pub struct PrefixCodeRange {
    /// First value of the range.
    pub offset: u32,
    /// Number of extra bits selecting a value within the range.
    pub nbits: u32,
}

const fn range(offset: u32, nbits: u32) -> PrefixCodeRange {
    PrefixCodeRange { offset, nbits }
}

/// Insert-length ranges, code 0..=23.
pub static INSERT_LENGTH_PREFIXES: [PrefixCodeRange; NUM_INSERT_LEN_PREFIXES] = [
    range(0, 0),
    range(1, 0),
    range(2, 0),
    range(3, 0),
    range(4, 0),
    range(5, 0),
    range(6, 1),
    range(8, 1),
    range(10, 2),
    range(14, 2),
    range(18, 3),
    range(26, 3),
    range(34, 4),
    range(50, 4),
    range(66, 5),
    range(98, 5),
    range(130, 6),
    range(194, 7),
    range(322, 8),
    range(578, 9),
    range(1090, 10),
    range(2114, 12),
    range(6210, 14),
    range(22594, 24),
];

/// Copy-length ranges, code 0..=23. Copy lengths start at 2.
pub static COPY_LENGTH_PREFIXES: [PrefixCodeRange; NUM_COPY_LEN_PREFIXES] = [
    range(2, 0),
    range(3, 0),
    range(4, 0),
    range(5, 0),
    range(6, 0),
    range(7, 0),
    range(8, 0),
    range(9, 0),
    range(10, 1),
    range(12, 1),
    range(14, 2),
    range(18, 2),
    range(22, 3),
    range(30, 3),
    range(38, 4),
    range(54, 4),
    range(70, 5),
    range(102, 5),
    range(134, 6),
    range(198, 7),
    range(326, 8),
    range(582, 9),
    range(1094, 10),
    range(2118, 24),
];

/// Block-length ranges, code 0..=25. Block lengths start at 1.
pub static BLOCK_LENGTH_PREFIXES: [PrefixCodeRange; NUM_BLOCK_LEN_PREFIXES] = [
    range(1, 2),
    range(5, 2),
    range(9, 2),
    range(13, 2),
    range(17, 3),
    range(25, 3),
    range(33, 3),
    range(41, 3),
    range(49, 4),
    range(65, 4),
    range(81, 4),
    range(97, 4),
    range(113, 5),
    range(145, 5),
    range(177, 5),
    range(209, 5),
    range(241, 6),
    range(305, 6),
    range(369, 7),
    range(497, 8),
    range(753, 9),
    range(1265, 10),
    range(2289, 11),
    range(4337, 12),
    range(8433, 13),
    range(16625, 24),
];

/// Index of the range containing `value` in a contiguous range table.
fn prefix_for(table: &[PrefixCodeRange], value: u32) -> usize {
    debug_assert!(value >= table[0].offset, "value below table range");
    let mut code = table.len() - 1;
    while table[code].offset > value {
        code -= 1;
    }
    debug_assert!(value - table[code].offset < (1 << table[code].nbits));
    code
}

/// Insert-length prefix code for `insert_length`.
pub fn insert_length_prefix(insert_length: u32) -> usize {
    prefix_for(&INSERT_LENGTH_PREFIXES, insert_length)
}

/// Copy-length prefix code for `copy_length` (at least 2).
pub fn copy_length_prefix(copy_length: u32) -> usize {
    prefix_for(&COPY_LENGTH_PREFIXES, copy_length)
}

/// Block-length prefix code for `block_length` (at least 1).
pub fn block_length_prefix(block_length: u32) -> usize {
    prefix_for(&BLOCK_LENGTH_PREFIXES, block_length)
}

/// Extra-bit count for a block-length code.
pub fn block_length_extra_bits(code: usize) -> u32 {
    BLOCK_LENGTH_PREFIXES[code].nbits
}

/// First block length of a block-length code's range.
pub fn block_length_offset(code: usize) -> u32 {
    BLOCK_LENGTH_PREFIXES[code].offset
}

/// Combined command prefix for an insert length and copy-length code.
///
/// A zero copy-length code stands for the trailing literal-only command and
/// is bucketed as length 4; the decoder never consumes its copy. The result
/// is in 0..=575 before the has-distance marker is folded in.
pub fn command_prefix(insert_length: u32, copy_length_code: u32) -> u16 {
    let copy = if copy_length_code == 0 { 4 } else { copy_length_code };
    let insert_prefix = insert_length_prefix(insert_length);
    let copy_prefix = copy_length_prefix(copy);
    (insert_prefix * NUM_COPY_LEN_PREFIXES + copy_prefix) as u16
}

/// Extra-bit count of the insert-length half of an unmarked command code.
pub fn insert_length_extra_bits(code: u16) -> u32 {
    INSERT_LENGTH_PREFIXES[code as usize / NUM_COPY_LEN_PREFIXES].nbits
}

/// Range offset of the insert-length half of an unmarked command code.
pub fn insert_length_offset(code: u16) -> u32 {
    INSERT_LENGTH_PREFIXES[code as usize / NUM_COPY_LEN_PREFIXES].offset
}

/// Extra-bit count of the copy-length half of an unmarked command code.
pub fn copy_length_extra_bits(code: u16) -> u32 {
    COPY_LENGTH_PREFIXES[code as usize % NUM_COPY_LEN_PREFIXES].nbits
}

/// Range offset of the copy-length half of an unmarked command code.
pub fn copy_length_offset(code: u16) -> u32 {
    COPY_LENGTH_PREFIXES[code as usize % NUM_COPY_LEN_PREFIXES].offset
}

/// Total size of the distance symbol alphabet for the given parameters.
pub fn num_distance_codes(num_direct: u32, postfix_bits: u32) -> usize {
    NUM_DISTANCE_SHORT_CODES + num_direct as usize + (48 << postfix_bits)
}

/// Encode a resolved distance code as (symbol, extra bit count, extra bits).
///
/// `distance_code` is 1-based: 1..=16 name the short codes, and larger
/// values carry `distance + 16`. Symbol 0 is "repeat the last distance",
/// symbols `16..16 + num_direct` encode the distances `1..=num_direct`
/// directly, and the remainder bucket `distance - 1 - num_direct +
/// (4 << postfix_bits)` by its floor log2, with `postfix_bits` low bits
/// moved into the symbol.
pub fn prefix_encode_copy_distance(
    distance_code: u32,
    num_direct: u32,
    postfix_bits: u32,
) -> (u16, u32, u32) {
    debug_assert!(distance_code >= 1);
    let code = distance_code - 1;
    let direct_limit = NUM_DISTANCE_SHORT_CODES as u32 + num_direct;
    if code < direct_limit {
        return (code as u16, 0, 0);
    }
    let val = code - direct_limit + (1 << (postfix_bits + 2));
    let bucket = 31 - val.leading_zeros() - 1;
    let postfix_mask = (1 << postfix_bits) - 1;
    let postfix = val & postfix_mask;
    let prefix = (val >> bucket) & 1;
    let offset = (2 + prefix) << bucket;
    let nbits = bucket - postfix_bits;
    let symbol = direct_limit + ((2 * (nbits - 1) + prefix) << postfix_bits) + postfix;
    (symbol as u16, nbits, (val - offset) >> postfix_bits)
}
