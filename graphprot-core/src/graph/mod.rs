//! Graph encoding of samples and the hashed subgraph feature map.
//!
//! ## Overview
//!
//! Every sample becomes a small labeled graph:
//!
//! - one vertex per sequence position, labeled with its nucleotide and, when a
//!   structure is used, its loop context (or coarse class under abstraction)
//! - backbone edges between consecutive positions
//! - pairing edges between base-paired positions
//!
//! Viewpoint positions (or all positions) are the eligible roots. The
//! [`features`] module turns the graph into a sparse, hashed vector of rooted
//! subgraph-pair counts whose dot products approximate a neighborhood subgraph
//! pairwise distance kernel without ever building a Gram matrix.
//!
//! ## Examples
//!
//! ```rust
//! use graphprot_core::config::ParameterSet;
//! use graphprot_core::graph::{encode, features::features};
//! use graphprot_core::sample::Sample;
//! use graphprot_core::types::Target;
//!
//! let params = ParameterSet::default().with_radius(1).with_distance(2).with_bitsize(12);
//! let sample = Sample::parse("s", b"GGGAAACCC", Some(b"(((...)))".as_slice()), Target::Unlabeled)?;
//!
//! let graph = encode(&sample, &params)?;
//! assert_eq!(graph.num_vertices(), 9);
//! assert_eq!(graph.num_edges(), 8 + 3);
//!
//! let vector = features(&graph, &params)?;
//! assert!((vector.norm() - 1.0).abs() < 1e-12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod features;
pub mod hashing;

use std::collections::VecDeque;

use crate::config::ParameterSet;
use crate::constants::LABEL_HASH_SEED;
use crate::sample::Sample;
use crate::types::{GraphProtError, Nucleotide};
use hashing::hash_label;

/// Kind of graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Consecutive positions on the backbone
    Backbone,
    /// Base pair
    Pair,
}

impl EdgeKind {
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Backbone => 1,
            Self::Pair => 2,
        }
    }
}

/// Vertex label before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLabel {
    pub nucleotide: Nucleotide,
    /// Structure symbol (context letter or abstract class letter)
    pub structure: Option<char>,
}

impl VertexLabel {
    /// Text form used for hashing, e.g. `A` or `AS`
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(2);
        text.push(self.nucleotide.to_char());
        if let Some(symbol) = self.structure {
            text.push(symbol);
        }
        text
    }
}

/// Labeled sequence/structure graph of one sample.
#[derive(Debug, Clone)]
pub struct Graph {
    labels: Vec<VertexLabel>,
    label_codes: Vec<u64>,
    adjacency: Vec<Vec<(usize, EdgeKind)>>,
    roots: Vec<usize>,
}

impl Graph {
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    #[must_use]
    pub fn label(&self, vertex: usize) -> VertexLabel {
        self.labels[vertex]
    }

    #[must_use]
    pub fn label_code(&self, vertex: usize) -> u64 {
        self.label_codes[vertex]
    }

    #[must_use]
    pub fn neighbors(&self, vertex: usize) -> &[(usize, EdgeKind)] {
        &self.adjacency[vertex]
    }

    /// Vertices eligible as feature roots, in position order
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Breadth-first distances from `source`, truncated at `max_depth`.
    ///
    /// Returns `(vertex, distance)` in non-decreasing distance order.
    #[must_use]
    pub fn bfs(&self, source: usize, max_depth: u32) -> Vec<(usize, u32)> {
        let mut seen = vec![false; self.num_vertices()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([(source, 0)]);
        seen[source] = true;

        while let Some((vertex, depth)) = queue.pop_front() {
            order.push((vertex, depth));
            if depth == max_depth {
                continue;
            }
            for &(next, _) in &self.adjacency[vertex] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back((next, depth + 1));
                }
            }
        }

        order
    }

    fn add_edge(&mut self, a: usize, b: usize, kind: EdgeKind) {
        self.adjacency[a].push((b, kind));
        self.adjacency[b].push((a, kind));
    }
}

/// Build the graph of a sample under the given encoding parameters.
///
/// Structure labels and pairing edges are used only when the sample has a
/// structure and `sequence_only` is off.
///
/// # Errors
///
/// Returns [`GraphProtError::MalformedSample`] for an empty sequence or a
/// structure/viewpoint whose length differs from the sequence. Single-sample
/// calls report index 0; batch callers re-index with
/// [`GraphProtError::at_index`].
pub fn encode(sample: &Sample, params: &ParameterSet) -> Result<Graph, GraphProtError> {
    let malformed = |reason: String| GraphProtError::MalformedSample {
        index: 0,
        id: sample.id.clone(),
        reason,
    };

    if sample.sequence.is_empty() {
        return Err(malformed("empty sequence".to_string()));
    }
    let length = sample.len();
    if let Some(structure) = &sample.structure {
        if structure.len() != length {
            return Err(malformed(format!(
                "structure length {} differs from sequence length {length}",
                structure.len()
            )));
        }
    }
    if let Some(mask) = &sample.viewpoint_mask {
        if mask.len() != length {
            return Err(malformed(format!(
                "viewpoint mask length {} differs from sequence length {length}",
                mask.len()
            )));
        }
    }

    let structure = sample.structure.as_ref().filter(|_| !params.sequence_only);

    let labels: Vec<VertexLabel> = (0..length)
        .map(|i| VertexLabel {
            nucleotide: sample.sequence[i],
            structure: structure.map(|s| {
                let context = s.context(i);
                if params.abstraction {
                    context.abstract_class().to_char()
                } else {
                    context.to_char()
                }
            }),
        })
        .collect();
    let label_codes = labels
        .iter()
        .map(|label| hash_label(LABEL_HASH_SEED, &label.text()))
        .collect();

    let mut graph = Graph {
        labels,
        label_codes,
        adjacency: vec![Vec::new(); length],
        roots: sample.eligible_positions(),
    };

    for i in 1..length {
        graph.add_edge(i - 1, i, EdgeKind::Backbone);
    }
    if let Some(structure) = structure {
        for (i, j) in structure.base_pairs() {
            graph.add_edge(i, j, EdgeKind::Pair);
        }
    }

    Ok(graph)
}
