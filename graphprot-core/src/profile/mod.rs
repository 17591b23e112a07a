//! Per-position decomposition of a model's score.
//!
//! Every hashed feature is produced by exactly one root position, so `w·x`
//! splits into one term per eligible root. The model bias is spread evenly
//! over those roots, which makes a profile sum to [`Model::score`].
//!
//! A [`Profile`] stores the rooted feature indices only; margins are computed
//! on demand each time it is iterated.

use rayon::prelude::*;

use crate::graph::encode;
use crate::graph::features::{RootedFeatures, rooted_features};
use crate::learner::Model;
use crate::sample::Sample;
use crate::types::GraphProtError;

/// Margin contribution of one root position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileEntry {
    /// 0-based position in the full sequence
    pub position: usize,
    pub margin: f64,
}

/// Lazy, restartable per-position margins of one sample.
#[derive(Debug, Clone)]
pub struct Profile<'m> {
    model: &'m Model,
    rooted: RootedFeatures,
    bias_share: f64,
}

impl<'m> Profile<'m> {
    /// Number of profiled positions (viewpoint length, or sequence length)
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooted.roots().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooted.roots().is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> ProfileIter<'_, 'm> {
        ProfileIter {
            profile: self,
            next: 0,
        }
    }

    /// Margin of the `k`-th profiled position
    #[must_use]
    pub fn margin(&self, k: usize) -> f64 {
        self.rooted.root_contribution(k, self.model.weights()) + self.bias_share
    }

    /// Sum of all margins; equals the model's score of the sample
    #[must_use]
    pub fn total(&self) -> f64 {
        self.iter().map(|entry| entry.margin).sum()
    }
}

/// Iterator over a [`Profile`], created by [`Profile::iter`].
#[derive(Debug, Clone)]
pub struct ProfileIter<'p, 'm> {
    profile: &'p Profile<'m>,
    next: usize,
}

impl Iterator for ProfileIter<'_, '_> {
    type Item = ProfileEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let (position, _) = self.profile.rooted.roots().get(self.next)?;
        let entry = ProfileEntry {
            position: *position,
            margin: self.profile.margin(self.next),
        };
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.profile.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ProfileIter<'_, '_> {}

impl<'p, 'm> IntoIterator for &'p Profile<'m> {
    type Item = ProfileEntry;
    type IntoIter = ProfileIter<'p, 'm>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Profile one sample with the model's own encoding parameters.
pub fn profile<'m>(sample: &Sample, model: &'m Model) -> Result<Profile<'m>, GraphProtError> {
    model.check_sample(sample, 0)?;
    let params = model.encoding_params();
    let graph = encode(sample, &params)?;
    let rooted = rooted_features(&graph, &params)?;
    let roots = rooted.roots().len().max(1);
    Ok(Profile {
        model,
        bias_share: model.bias() / roots as f64,
        rooted,
    })
}

/// Profile many samples in parallel, preserving input order.
pub fn profile_all<'m>(
    samples: &[Sample],
    model: &'m Model,
) -> Result<Vec<Profile<'m>>, GraphProtError> {
    samples
        .par_iter()
        .enumerate()
        .map(|(i, sample)| profile(sample, model).map_err(|e| e.at_index(sample.index_or(i))))
        .collect()
}
