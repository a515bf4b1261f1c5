//! Commands: the unit the meta-block encoder consumes.
//!
//! A command inserts a run of literals and then copies `copy_length` bytes
//! from `copy_distance` back. Before emission the distance is rewritten
//! against a 4-entry history of recent distances (short codes), and the
//! combined insert-and-copy prefix symbol is computed.

use crate::prefix::{command_prefix, prefix_encode_copy_distance};

/// Distance history slot probed by each of the 16 short codes.
const SHORT_CODE_INDEX_OFFSET: [usize; 16] = [3, 2, 1, 0, 3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2];

/// Delta applied to the probed history entry by each short code.
const SHORT_CODE_VALUE_OFFSET: [i64; 16] = [0, 0, 0, 0, -1, 1, -2, 2, -3, 3, -1, 1, -2, 2, -3, 3];

/// The distance half of a command once the prefix encoder has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistancePayload {
    /// Distance symbol in the meta-block's distance alphabet.
    pub prefix: u16,
    /// Number of extra bits following the symbol.
    pub extra_bits: u32,
    /// Value of those extra bits.
    pub extra_bits_value: u32,
}

/// One insert-and-copy command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Number of literal bytes inserted before the copy.
    pub insert_length: u32,
    /// Number of bytes copied; 0 only for the trailing literal-only command.
    pub copy_length: u32,
    /// Copy length as coded on the wire; 0 for the trailing command.
    pub copy_length_code: u32,
    /// Backward distance of the copy; 0 when there is no copy.
    pub copy_distance: u32,
    /// Resolved distance code: 1..=16 for short codes, `distance + 16`
    /// otherwise, 0 when there is no copy.
    pub distance_code: u32,
    /// Combined insert-and-copy symbol; +128 marks an explicit distance.
    pub command_prefix: u16,
    /// Distance symbol and extra bits, or `None` when the command reuses
    /// the last distance implicitly (or copies nothing).
    pub distance: Option<DistancePayload>,
}

impl Command {
    /// Create a raw command; prefix fields are filled in later.
    pub fn new(insert_length: u32, copy_length: u32, copy_length_code: u32, copy_distance: u32) -> Self {
        Self {
            insert_length,
            copy_length,
            copy_length_code,
            copy_distance,
            distance_code: 0,
            command_prefix: 0,
            distance: None,
        }
    }

    /// Bytes of output this command accounts for.
    pub fn length(&self) -> u64 {
        u64::from(self.insert_length) + u64::from(self.copy_length)
    }
}

/// Rewrite each command's distance against the shared distance history.
///
/// A distance matching `history[(idx + I[k]) & 3] + V[k]` becomes short code
/// `k + 1`; anything else becomes `distance + 16`. Distances below 11 only
/// consider codes 0, 1, 4 and 5, the offsets that stay popular at short
/// range. Every code other than "repeat last" pushes the distance into the
/// history. Stops at the first command without a copy distance.
pub fn compute_distance_short_codes(
    cmds: &mut [Command],
    history: &mut [u32; 4],
    history_idx: &mut usize,
) {
    for cmd in cmds.iter_mut() {
        let cur_dist = cmd.copy_distance;
        if cur_dist == 0 {
            break;
        }
        let mut dist_code = cur_dist + 16;
        for k in 0..16 {
            if cur_dist < 11 && ((2..4).contains(&k) || k >= 6) {
                continue;
            }
            let probe = history[(*history_idx + SHORT_CODE_INDEX_OFFSET[k]) & 3];
            if i64::from(cur_dist) == i64::from(probe) + SHORT_CODE_VALUE_OFFSET[k] {
                dist_code = (k + 1) as u32;
                break;
            }
        }
        if dist_code > 1 {
            history[*history_idx & 3] = cur_dist;
            *history_idx += 1;
        }
        cmd.distance_code = dist_code;
    }
}

/// Fill in the command prefix and distance payload of every command.
///
/// Commands whose distance symbol would be 0 ("repeat last distance") and
/// whose base prefix is below 128 drop the distance entirely; every other
/// distance-carrying command has 128 added to its prefix so the decoder
/// knows a distance symbol follows.
pub fn compute_command_prefixes(cmds: &mut [Command], num_direct: u32, postfix_bits: u32) {
    for cmd in cmds.iter_mut() {
        cmd.command_prefix = command_prefix(cmd.insert_length, cmd.copy_length_code);
        if cmd.copy_length_code > 0 {
            let (prefix, extra_bits, extra_bits_value) =
                prefix_encode_copy_distance(cmd.distance_code, num_direct, postfix_bits);
            if cmd.command_prefix < 128 && prefix == 0 {
                cmd.distance = None;
            } else {
                cmd.command_prefix += 128;
                cmd.distance = Some(DistancePayload {
                    prefix,
                    extra_bits,
                    extra_bits_value,
                });
            }
        } else {
            cmd.distance = None;
            if cmd.command_prefix >= 128 {
                cmd.command_prefix += 128;
            }
        }
    }
}
