use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::ParameterSet;
use crate::constants::{NEIGHBORHOOD_HASH_SEED, PAIR_HASH_SEED};
use crate::graph::hashing::{combine, hash_multiset, hash_slice, to_feature_index};
use crate::graph::{Graph, encode};
use crate::sample::Sample;
use crate::types::GraphProtError;

/// Sparse hashed feature vector, sorted by index, L2-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    bitsize: u32,
    entries: Vec<(u32, f64)>,
}

impl FeatureVector {
    /// Build a unit-norm vector from raw feature counts.
    #[must_use]
    pub fn from_counts(bitsize: u32, counts: &BTreeMap<u32, u32>) -> Self {
        let normalizer = l2_norm(counts);
        let normalizer = if normalizer > 0.0 { normalizer } else { 1.0 };

        Self {
            bitsize,
            entries: counts
                .iter()
                .map(|(&index, &count)| (index, f64::from(count) / normalizer))
                .collect(),
        }
    }

    #[must_use]
    pub const fn bitsize(&self) -> u32 {
        self.bitsize
    }

    #[must_use]
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Dot product with a dense weight vector of length 2^bitsize
    #[must_use]
    pub fn dot_dense(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(index, value)| weights[index as usize] * value)
            .sum()
    }

    /// Kernel value between two samples encoded with the same parameters
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_index, a_value) = self.entries[i];
            let (b_index, b_value) = other.entries[j];
            match a_index.cmp(&b_index) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_value * b_value;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Hashed feature indices grouped by the root position that produced them.
///
/// The sum of all roots' contributions equals the dot product of the full
/// (normalized) feature vector with the weights.
#[derive(Debug, Clone)]
pub struct RootedFeatures {
    bitsize: u32,
    roots: Vec<(usize, Vec<u32>)>,
    normalizer: f64,
}

impl RootedFeatures {
    #[must_use]
    pub fn roots(&self) -> &[(usize, Vec<u32>)] {
        &self.roots
    }

    /// L2 norm of the raw count vector
    #[must_use]
    pub const fn normalizer(&self) -> f64 {
        self.normalizer
    }

    /// Contribution of the `k`-th root to `w·x`
    #[must_use]
    pub fn root_contribution(&self, k: usize, weights: &[f64]) -> f64 {
        let (_, indices) = &self.roots[k];
        indices
            .iter()
            .map(|&index| weights[index as usize])
            .sum::<f64>()
            / self.normalizer
    }

    #[must_use]
    pub fn counts(&self) -> BTreeMap<u32, u32> {
        let mut counts = BTreeMap::new();
        for (_, indices) in &self.roots {
            for &index in indices {
                *counts.entry(index).or_insert(0) += 1;
            }
        }
        counts
    }

    #[must_use]
    pub fn to_feature_vector(&self) -> FeatureVector {
        FeatureVector::from_counts(self.bitsize, &self.counts())
    }
}

/// Canonical codes of the rooted neighborhoods of one vertex, for radius 0..=R.
fn neighborhood_codes(graph: &Graph, vertex: usize, max_radius: u32) -> Vec<u64> {
    let ball = graph.bfs(vertex, max_radius);
    let mut distance = vec![None; graph.num_vertices()];
    for &(w, d) in &ball {
        distance[w] = Some(d);
    }
    let node_code = |w: usize, d: u32| combine(u64::from(d), graph.label_code(w));

    (0..=max_radius)
        .map(|radius| {
            let mut node_codes = Vec::new();
            let mut edge_codes = Vec::new();

            for &(w, d) in ball.iter().take_while(|(_, d)| *d <= radius) {
                let w_code = node_code(w, d);
                node_codes.push(w_code);
                for &(x, kind) in graph.neighbors(w) {
                    match distance[x] {
                        Some(dx) if dx <= radius && w < x => {
                            let mut ends = [w_code, node_code(x, dx)];
                            edge_codes.push(combine(hash_multiset(kind.code(), &mut ends), kind.code()));
                        }
                        _ => {}
                    }
                }
            }

            let nodes = hash_multiset(NEIGHBORHOOD_HASH_SEED, &mut node_codes);
            let edges = hash_multiset(NEIGHBORHOOD_HASH_SEED, &mut edge_codes);
            hash_slice(u64::from(radius), &[nodes, edges])
        })
        .collect()
}

/// Hash every (radius, distance) subgraph pair rooted at each eligible root.
///
/// # Errors
///
/// [`GraphProtError::InvalidParameter`] when `params` fails validation, e.g.
/// a bitsize too large for the feature index.
pub fn rooted_features(
    graph: &Graph,
    params: &ParameterSet,
) -> Result<RootedFeatures, GraphProtError> {
    params.validate()?;
    let mut neighborhoods: Vec<Option<Vec<u64>>> = vec![None; graph.num_vertices()];
    let mut roots = Vec::with_capacity(graph.roots().len());

    for &root in graph.roots() {
        let reachable = graph.bfs(root, params.distance);
        for &(vertex, _) in &reachable {
            if neighborhoods[vertex].is_none() {
                neighborhoods[vertex] = Some(neighborhood_codes(graph, vertex, params.radius));
            }
        }

        let mut indices = Vec::with_capacity(reachable.len() * (params.radius as usize + 1));
        if let Some(root_codes) = &neighborhoods[root] {
            for &(vertex, d) in &reachable {
                let Some(other_codes) = &neighborhoods[vertex] else {
                    continue;
                };
                for radius in 0..=params.radius {
                    let r = radius as usize;
                    let code = hash_slice(
                        PAIR_HASH_SEED,
                        &[u64::from(radius), u64::from(d), root_codes[r], other_codes[r]],
                    );
                    indices.push(to_feature_index(code, params.bitsize));
                }
            }
        }
        roots.push((root, indices));
    }

    let mut rooted = RootedFeatures {
        bitsize: params.bitsize,
        roots,
        normalizer: 1.0,
    };
    let norm = l2_norm(&rooted.counts());
    if norm > 0.0 {
        rooted.normalizer = norm;
    }
    Ok(rooted)
}

fn l2_norm(counts: &BTreeMap<u32, u32>) -> f64 {
    counts
        .values()
        .map(|&c| f64::from(c) * f64::from(c))
        .sum::<f64>()
        .sqrt()
}

/// Explicit feature map of a graph.
pub fn features(graph: &Graph, params: &ParameterSet) -> Result<FeatureVector, GraphProtError> {
    Ok(rooted_features(graph, params)?.to_feature_vector())
}

/// Encode and hash one sample.
pub fn sample_features(
    sample: &Sample,
    params: &ParameterSet,
) -> Result<FeatureVector, GraphProtError> {
    features(&encode(sample, params)?, params)
}

/// Encode and hash many samples in parallel, preserving input order.
pub fn encode_samples(
    samples: &[Sample],
    params: &ParameterSet,
) -> Result<Vec<FeatureVector>, GraphProtError> {
    samples
        .par_iter()
        .enumerate()
        .map(|(i, sample)| {
            sample_features(sample, params).map_err(|e| e.at_index(sample.index_or(i)))
        })
        .collect()
}
