//! Backward-reference search: turn raw input into commands.
//!
//! A greedy scan with bounded lazy evaluation: when a match is found, up to
//! four successive positions may steal it if their own match scores better
//! than taking the copy now and paying for one more literal.

use crate::command::Command;
use crate::hash::Hasher;

/// Longest run of deferred matches before the current one is taken.
const MAX_DELAYED_MATCHES: usize = 4;

/// Scan `num_bytes` of input at absolute position `position` and produce
/// the command stream covering it. A trailing literal-only command absorbs
/// any bytes after the last copy.
pub fn create_backward_references(
    num_bytes: usize,
    position: u64,
    ring: &[u8],
    mask: usize,
    literal_cost: &[f32],
    max_backward: u64,
    hasher: &mut Hasher,
) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut insert_length = 0u32;
    let mut pos = position;
    let end = position + num_bytes as u64;

    while pos + 2 < end {
        let max_length = (end - pos) as usize;
        let max_distance = pos.min(max_backward);
        let found = hasher.find_longest_match(ring, mask, literal_cost, pos, max_length, max_distance);
        if let Some(mut m) = found {
            // Lazy evaluation: look one byte ahead for a better match.
            let mut delayed = 0;
            while pos + 4 < end && delayed < MAX_DELAYED_MATCHES {
                hasher.store(ring, mask, pos);
                let next = hasher.find_longest_match(
                    ring,
                    mask,
                    literal_cost,
                    pos + 1,
                    (end - pos - 1) as usize,
                    (pos + 1).min(max_backward),
                );
                match next {
                    Some(n)
                        if n.score > m.score + f64::from(literal_cost[(pos as usize) & mask]) =>
                    {
                        insert_length += 1;
                        pos += 1;
                        m = n;
                        delayed += 1;
                    }
                    _ => break,
                }
            }
            commands.push(Command::new(
                insert_length,
                m.len as u32,
                m.len as u32,
                m.dist as u32,
            ));
            insert_length = 0;
            for j in 1..m.len {
                hasher.store(ring, mask, pos + j as u64);
            }
            pos += m.len as u64;
        } else {
            hasher.store(ring, mask, pos);
            insert_length += 1;
            pos += 1;
        }
    }

    insert_length += (end - pos) as u32;
    if insert_length > 0 {
        commands.push(Command::new(insert_length, 0, 0, 0));
    }
    commands
}
