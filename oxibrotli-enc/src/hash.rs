//! Bucketed match finder over the ring buffer.
//!
//! Positions are indexed by a multiplicative hash of their first four
//! bytes. Each bucket keeps the most recent 16 positions; candidates are
//! scored by the literal bits a copy would save minus an estimate of the
//! cost of coding the copy itself.

use oxibrotli_core::ringbuffer::ring_byte;

const BUCKET_BITS: u32 = 17;
const NUM_BUCKETS: usize = 1 << BUCKET_BITS;
const SLOTS_PER_BUCKET: usize = 16;

const HASH_MUL: u32 = 0x1E35_A7BD;

/// Fixed per-copy coding overhead in bits, on top of the distance bits.
const COPY_BASE_COST: f64 = 5.4;

/// A scored match candidate.
#[derive(Debug, Clone, Copy)]
pub struct Match {
    /// Copy length in bytes.
    pub len: usize,
    /// Backward distance.
    pub dist: u64,
    /// Estimated bits saved by taking this copy.
    pub score: f64,
}

/// Hash table of recent positions.
#[derive(Debug)]
pub struct Hasher {
    buckets: Vec<u32>,
    num: Vec<u16>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self {
            buckets: vec![0; NUM_BUCKETS * SLOTS_PER_BUCKET],
            num: vec![0; NUM_BUCKETS],
        }
    }

    #[inline]
    fn hash(ring: &[u8], mask: usize, pos: u64) -> usize {
        let word = u32::from_le_bytes([
            ring_byte(ring, mask, pos),
            ring_byte(ring, mask, pos + 1),
            ring_byte(ring, mask, pos + 2),
            ring_byte(ring, mask, pos + 3),
        ]);
        (word.wrapping_mul(HASH_MUL) >> (32 - BUCKET_BITS)) as usize
    }

    /// Record `pos` as a match candidate.
    #[inline]
    pub fn store(&mut self, ring: &[u8], mask: usize, pos: u64) {
        let bucket = Self::hash(ring, mask, pos);
        let slot = self.num[bucket] as usize % SLOTS_PER_BUCKET;
        self.buckets[bucket * SLOTS_PER_BUCKET + slot] = pos as u32;
        self.num[bucket] = self.num[bucket].wrapping_add(1);
    }

    /// Find the best-scoring match at `pos`, if any candidate scores
    /// positively.
    #[allow(clippy::too_many_arguments)]
    pub fn find_longest_match(
        &self,
        ring: &[u8],
        mask: usize,
        literal_cost: &[f32],
        pos: u64,
        max_length: usize,
        max_distance: u64,
    ) -> Option<Match> {
        if max_length < 3 || max_distance == 0 {
            return None;
        }
        let bucket = Self::hash(ring, mask, pos);
        let filled = (self.num[bucket] as usize).min(SLOTS_PER_BUCKET);
        let newest = self.num[bucket] as usize;
        let mut best: Option<Match> = None;

        for back in 1..=filled {
            let slot = (newest + SLOTS_PER_BUCKET - back) % SLOTS_PER_BUCKET;
            let candidate = u64::from(self.buckets[bucket * SLOTS_PER_BUCKET + slot]);
            if candidate >= pos {
                continue;
            }
            let dist = pos - candidate;
            if dist > max_distance {
                // Older entries in the bucket are only further away.
                break;
            }
            let len = match_length(ring, mask, candidate, pos, max_length);
            if len < 3 || (len == 3 && dist >= 64) {
                continue;
            }
            if let Some(m) = &best {
                if len <= m.len {
                    continue;
                }
            }
            let mut saved = 0.0f64;
            for i in 0..len {
                saved += f64::from(literal_cost[(pos as usize + i) & mask]);
            }
            let score = saved - COPY_BASE_COST - (dist as f64).log2();
            if score > best.map_or(0.0, |m| m.score) {
                best = Some(Match { len, dist, score });
            }
        }
        best
    }
}

/// Length of the common prefix of the bytes at `a` and `b`, up to `max`.
#[inline]
fn match_length(ring: &[u8], mask: usize, a: u64, b: u64, max: usize) -> usize {
    let mut len = 0;
    while len < max && ring_byte(ring, mask, a + len as u64) == ring_byte(ring, mask, b + len as u64)
    {
        len += 1;
    }
    len
}
