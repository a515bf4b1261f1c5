//! Greedy histogram clustering.
//!
//! Contexts and block types start with one histogram each; most of them are
//! near-duplicates or nearly empty. Clustering merges any pair whose
//! combined population costs less to store than the two separately, and
//! keeps forcing the cheapest merges until the cluster count fits the
//! output cap.

use crate::bit_cost::population_cost;
use crate::histogram::Histogram;

/// Histogram ids must fit in one byte and 16 ids are reserved for the
/// context-map run-length codes, leaving 240.
pub const MAX_NUMBER_OF_HISTOGRAMS: usize = 240;

/// Clusters kept per input group before the cross-group pass.
const MAX_CLUSTERS_PER_GROUP: usize = 16;

/// Greedy agglomerative clustering of `histograms` down to at most
/// `max_clusters`, merging below that whenever a merge saves bits.
///
/// Returns the surviving cluster histograms and, for each input, the index
/// of its cluster.
pub(crate) fn greedy_cluster(
    histograms: &[Histogram],
    max_clusters: usize,
) -> (Vec<Histogram>, Vec<usize>) {
    let n = histograms.len();
    debug_assert!(n > 0 && max_clusters > 0);
    let mut clusters: Vec<Histogram> = histograms.to_vec();
    let mut cost: Vec<f64> = clusters.iter().map(population_cost).collect();
    let mut alive: Vec<bool> = vec![true; n];
    let mut assignment: Vec<usize> = (0..n).collect();

    // diff[i][j]: extra bits from merging i and j, lazily refreshed for
    // pairs touching the most recent merge.
    let mut diff = vec![f64::INFINITY; n * n];
    let pair_cost = |clusters: &[Histogram], cost: &[f64], i: usize, j: usize| {
        let mut merged = clusters[i].clone();
        merged.add_histogram(&clusters[j]);
        population_cost(&merged) - cost[i] - cost[j]
    };
    for i in 0..n {
        for j in i + 1..n {
            diff[i * n + j] = pair_cost(&clusters, &cost, i, j);
        }
    }

    let mut num_alive = n;
    while num_alive > 1 {
        let mut best = (f64::INFINITY, 0, 0);
        for i in 0..n {
            if !alive[i] {
                continue;
            }
            for j in i + 1..n {
                if alive[j] && diff[i * n + j] < best.0 {
                    best = (diff[i * n + j], i, j);
                }
            }
        }
        if num_alive <= max_clusters && best.0 >= 0.0 {
            break;
        }
        let (_, i, j) = best;
        let other = clusters[j].clone();
        clusters[i].add_histogram(&other);
        cost[i] = population_cost(&clusters[i]);
        alive[j] = false;
        num_alive -= 1;
        for a in &mut assignment {
            if *a == j {
                *a = i;
            }
        }
        for k in 0..n {
            if k != i && alive[k] {
                let (lo, hi) = if k < i { (k, i) } else { (i, k) };
                diff[lo * n + hi] = pair_cost(&clusters, &cost, lo, hi);
            }
        }
    }

    // Compact to the surviving clusters.
    let mut remap = vec![usize::MAX; n];
    let mut out = Vec::new();
    for (i, h) in clusters.into_iter().enumerate() {
        if alive[i] {
            remap[i] = out.len();
            out.push(h);
        }
    }
    for a in &mut assignment {
        *a = remap[*a];
    }
    (out, assignment)
}

/// Cluster context histograms: a cheap pass inside each `group_size`-sized
/// group, then one pass across the survivors, capped at `max_histograms`.
///
/// Returns the clustered histograms and the context map, reindexed densely
/// in order of first appearance so the map's first entry is cluster 0.
pub fn cluster_histograms(
    histograms: Vec<Histogram>,
    group_size: usize,
    max_histograms: usize,
) -> (Vec<Histogram>, Vec<u32>) {
    debug_assert!(!histograms.is_empty());
    debug_assert_eq!(histograms.len() % group_size, 0);
    let max_histograms = max_histograms.min(MAX_NUMBER_OF_HISTOGRAMS);

    let mut survivors: Vec<Histogram> = Vec::new();
    let mut survivor_of_input: Vec<usize> = Vec::new();
    for group in histograms.chunks(group_size) {
        let (clusters, assignment) = greedy_cluster(group, MAX_CLUSTERS_PER_GROUP);
        let base = survivors.len();
        survivors.extend(clusters);
        survivor_of_input.extend(assignment.into_iter().map(|a| base + a));
    }

    let (clusters, assignment) = greedy_cluster(&survivors, max_histograms);
    let mut map: Vec<usize> = survivor_of_input
        .into_iter()
        .map(|s| assignment[s])
        .collect();

    // Dense reindex in first-appearance order.
    let mut order = vec![usize::MAX; clusters.len()];
    let mut reordered: Vec<Histogram> = Vec::new();
    for entry in &mut map {
        if order[*entry] == usize::MAX {
            order[*entry] = reordered.len();
            reordered.push(clusters[*entry].clone());
        }
        *entry = order[*entry];
    }
    (reordered, map.into_iter().map(|m| m as u32).collect())
}
