//! Context-map transforms: move-to-front and zero-run-length coding.
//!
//! Context maps are long, dominated by runs of the same cluster id. They
//! are MTF-transformed so repeats become zeros, then zero runs are replaced
//! by run-length symbols below the shifted-up cluster ids.

use crate::bit_cost::population_cost;
use crate::histogram::Histogram;

/// Largest zero-run prefix the wire format can name.
pub const MAX_RUN_LENGTH_PREFIX: u32 = 16;

/// Move-to-front transform of `v`.
///
/// The table starts as the identity over `0..=max(v)`; each output value is
/// the input's current table index, after which that entry moves to front.
pub fn move_to_front_transform(v: &[u32]) -> Vec<u32> {
    if v.is_empty() {
        return Vec::new();
    }
    let max = *v.iter().max().expect("nonempty") as usize;
    let mut table: Vec<u32> = (0..=max as u32).collect();
    let mut result = Vec::with_capacity(v.len());
    for &value in v {
        let index = table.iter().position(|&t| t == value).expect("in table");
        result.push(index as u32);
        table.remove(index);
        table.insert(0, value);
    }
    result
}

/// Run-length code the zeros of `v`.
///
/// Zero runs of length `r` become symbol `floor(log2(r))` with that many
/// extra bits holding `r - 2^floor(log2(r))`; runs too long for the prefix
/// cap are chopped into maximal chunks first. Nonzero values are shifted up
/// by the prefix cap. `max_run_length_prefix` is lowered to the largest
/// prefix the data actually needs.
///
/// Returns the symbol stream and parallel extra-bit values.
pub fn run_length_code_zeros(v: &[u32], max_run_length_prefix: &mut u32) -> (Vec<u32>, Vec<u32>) {
    let mut max_reps = 0u32;
    let mut i = 0;
    while i < v.len() {
        while i < v.len() && v[i] != 0 {
            i += 1;
        }
        let mut reps = 0;
        while i < v.len() && v[i] == 0 {
            reps += 1;
            i += 1;
        }
        max_reps = max_reps.max(reps);
    }
    let max_prefix = if max_reps > 0 { 31 - max_reps.leading_zeros() } else { 0 };
    *max_run_length_prefix = (*max_run_length_prefix).min(max_prefix);

    let mut symbols = Vec::new();
    let mut extra = Vec::new();
    let prefix = *max_run_length_prefix;
    let mut i = 0;
    while i < v.len() {
        if v[i] != 0 {
            symbols.push(v[i] + prefix);
            extra.push(0);
            i += 1;
        } else {
            let mut reps = 1u32;
            while i + (reps as usize) < v.len() && v[i + reps as usize] == 0 {
                reps += 1;
            }
            i += reps as usize;
            while reps > 0 {
                if reps < (2 << prefix) {
                    let run_prefix = 31 - reps.leading_zeros();
                    symbols.push(run_prefix);
                    extra.push(reps - (1 << run_prefix));
                    break;
                } else {
                    symbols.push(prefix);
                    extra.push((1 << prefix) - 1);
                    reps -= (2 << prefix) - 1;
                }
            }
        }
    }
    (symbols, extra)
}

/// Pick the zero-run prefix cap that minimizes the coded size of `v`:
/// the population cost of the run-length symbols, plus 4 bits to name a
/// nonzero cap, plus the extra bits the runs carry.
pub fn best_max_zero_run_length_prefix(v: &[u32]) -> u32 {
    let mut min_cost = f64::INFINITY;
    let mut best_prefix = 0;
    for max_prefix in 0..=MAX_RUN_LENGTH_PREFIX {
        let mut effective = max_prefix;
        let (symbols, _) = run_length_code_zeros(v, &mut effective);
        if effective < max_prefix {
            break;
        }
        let mut histogram = Histogram::new(256);
        for &s in &symbols {
            histogram.add(s as usize);
        }
        let mut cost = population_cost(&histogram);
        if max_prefix > 0 {
            cost += 4.0;
        }
        for i in 1..=max_prefix as usize {
            cost += f64::from(histogram.counts[i]) * i as f64;
        }
        if cost < min_cost {
            min_cost = cost;
            best_prefix = max_prefix;
        }
    }
    best_prefix
}
