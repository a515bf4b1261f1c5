//! Bit-cost estimates used to steer clustering and run-length choices.

use crate::entropy::{EntropyCode, CODE_LENGTH_CODES};
use crate::histogram::Histogram;

/// Extra bits carried by each code-length alphabet symbol.
const CODE_LENGTH_EXTRA_BITS: [u32; CODE_LENGTH_CODES] =
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

/// Shannon entropy of a population in bits, floored at one bit per sample.
pub fn bits_entropy(population: &[u32]) -> f64 {
    let total: u64 = population.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0.0;
    }
    let log2total = (total as f64).log2();
    let mut bits = 0.0;
    for &count in population {
        if count > 0 {
            bits += f64::from(count) * (log2total - f64::from(count).log2());
        }
    }
    // Entropy can dip below one bit per sample for skewed populations, but
    // a prefix code cannot.
    bits.max(total as f64)
}

/// Exact cost in bits of a serialized code-length stream: code bits plus
/// the repeat symbols' extra bits.
pub fn huffman_tree_bit_cost(histogram: &Histogram, code: &EntropyCode) -> u64 {
    let mut bits = 0u64;
    for i in 0..CODE_LENGTH_CODES {
        bits += u64::from(histogram.counts[i])
            * (u64::from(code.depth[i]) + u64::from(CODE_LENGTH_EXTRA_BITS[i]));
    }
    bits
}

/// Estimated cost in bits of storing a prefix code for `histogram` and then
/// coding its population with it.
pub fn population_cost(histogram: &Histogram) -> f64 {
    if histogram.total == 0 {
        return 12.0;
    }
    let count = histogram.populated();
    if count == 1 {
        return 12.0;
    }
    if count == 2 {
        return 20.0 + f64::from(histogram.total);
    }
    if count <= 4 {
        // Small alphabets are stored as an explicit symbol list; the
        // payload cost comes from the real tree.
        let code = crate::entropy::build_entropy_code(histogram, 15, histogram.counts.len());
        let mut bits = 0.0;
        for (i, &c) in histogram.counts.iter().enumerate() {
            bits += f64::from(c) * f64::from(code.depth[i]);
        }
        return bits + if count == 3 { 28.0 } else { 37.0 };
    }

    // Entropy of the payload plus an estimate of the code-length stream:
    // depths approximated by rounded -log2(p), zero runs by 17/18 symbols.
    let mut bits = 0.0;
    let mut max_depth = 1usize;
    let mut depth_histo = [0u32; CODE_LENGTH_CODES];
    let log2total = f64::from(histogram.total).log2();
    let counts = &histogram.counts;
    let mut i = 0;
    while i < counts.len() {
        if counts[i] > 0 {
            let log2p = log2total - f64::from(counts[i]).log2();
            let mut depth = (log2p + 0.5) as usize;
            bits += f64::from(counts[i]) * log2p;
            depth = depth.clamp(1, 15);
            max_depth = max_depth.max(depth);
            depth_histo[depth] += 1;
            i += 1;
        } else {
            let mut reps = 1;
            while i + reps < counts.len() && counts[i + reps] == 0 {
                reps += 1;
            }
            i += reps;
            if i == counts.len() {
                // The trailing zero run is implicit.
                break;
            }
            if reps < 3 {
                depth_histo[0] += reps as u32;
            } else {
                while reps >= 11 {
                    depth_histo[18] += 1;
                    bits += 7.0;
                    reps -= reps.min(138);
                }
                if reps >= 3 {
                    depth_histo[17] += 1;
                    bits += 3.0;
                } else {
                    depth_histo[0] += reps as u32;
                }
            }
        }
    }
    bits += f64::from(18 + 2 * max_depth as u32);
    bits += bits_entropy(&depth_histo);
    bits
}
