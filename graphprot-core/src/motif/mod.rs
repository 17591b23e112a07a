//! Motif extraction and high-affinity site selection from profile margins.
//!
//! Positions are ranked by their profile margin. Selected positions are
//! widened into windows of `max(R + D, 3)` on each side and aggregated into
//! position-frequency matrices over nucleotides and, when the model used
//! structure, over loop contexts and paired/unpaired state.
//!
//! ## Percentile cutoff
//!
//! The cutoff for percentile `p` is the nearest-rank `p`-th percentile of all
//! profiled margins; a position is selected when its margin is strictly above
//! the cutoff. At least `p`% of the positions therefore stay unselected.

pub mod matrix;

use std::cmp::Ordering;

use crate::constants::{DEFAULT_MOTIF_TOP_K, MIN_MOTIF_FLANK, WINDOW_PADDING};
use crate::learner::Model;
use crate::profile::{Profile, profile_all};
use crate::sample::Sample;
use crate::types::{GraphProtError, Label, Nucleotide, StructureContext, Target, Task};
pub use matrix::PositionMatrix;

/// How motif positions are chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotifSelection {
    /// Positions above the given percentile (0..=100) of all margins
    Percentile(f64),
    /// The `k` highest-margin positions
    TopK(usize),
}

impl Default for MotifSelection {
    fn default() -> Self {
        Self::TopK(DEFAULT_MOTIF_TOP_K)
    }
}

/// A selected position and its sequence window.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSite {
    pub sample_index: usize,
    pub id: String,
    pub position: usize,
    pub margin: f64,
    /// Nucleotides around the position, padded beyond the sequence ends
    pub window: String,
}

/// Ranked sites with their aggregated position-frequency matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifSummary {
    /// Sites by descending margin
    pub sites: Vec<SelectedSite>,
    /// Margin cutoff in effect, when one applies
    pub cutoff: Option<f64>,
    /// Window half-width
    pub flank: usize,
    pub sequence: PositionMatrix,
    pub structure: Option<PositionMatrix>,
    pub paired_unpaired: Option<PositionMatrix>,
}

/// Nearest-rank percentile of `values`.
///
/// Returns the value at rank `ceil(p/100 · n)` (at least 1) of the ascending
/// order. Callers select positions strictly above it, so at least `p`% of
/// the positions stay unselected.
///
/// # Errors
///
/// [`GraphProtError::InvalidParameter`] when `percentile` is outside
/// `[0, 100]`, [`GraphProtError::EmptyScoringSet`] when `values` is empty.
pub fn percentile_cutoff(values: &[f64], percentile: f64) -> Result<f64, GraphProtError> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(GraphProtError::InvalidParameter(format!(
            "percentile must be in [0, 100], got {percentile}"
        )));
    }
    if values.is_empty() {
        return Err(GraphProtError::EmptyScoringSet(
            "no profiled positions".to_string(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    Ok(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// Window half-width for a model: `max(R + D, 3)`
#[must_use]
pub fn motif_flank(model: &Model) -> usize {
    let params = model.params();
    ((params.radius + params.distance) as usize).max(MIN_MOTIF_FLANK)
}

/// Symbols at `center ± flank`, padded outside `0..len`.
fn window<F: Fn(usize) -> char>(center: usize, flank: usize, len: usize, symbol: F) -> String {
    (0..=2 * flank)
        .map(|offset| {
            (center + offset)
                .checked_sub(flank)
                .filter(|&i| i < len)
                .map_or(WINDOW_PADDING, &symbol)
        })
        .collect()
}

fn sequence_window(sample: &Sample, center: usize, flank: usize) -> String {
    window(center, flank, sample.len(), |i| sample.sequence[i].to_char())
}

fn site(sample_index: usize, sample: &Sample, position: usize, margin: f64, flank: usize) -> SelectedSite {
    SelectedSite {
        sample_index,
        id: sample.id.clone(),
        position,
        margin,
        window: sequence_window(sample, position, flank),
    }
}

/// All profiled (sample index, position, margin) triples in input order.
fn profiled_positions(profiles: &[Profile<'_>]) -> Vec<(usize, usize, f64)> {
    profiles
        .iter()
        .enumerate()
        .flat_map(|(i, profile)| profile.iter().map(move |e| (i, e.position, e.margin)))
        .collect()
}

/// Sites above the `percentile` cutoff of all profiled margins, in input order.
///
/// # Errors
///
/// [`GraphProtError::EmptyScoringSet`] for no samples, plus percentile and
/// encoding errors.
pub fn high_affinity_sites(
    samples: &[Sample],
    model: &Model,
    percentile: f64,
) -> Result<Vec<SelectedSite>, GraphProtError> {
    if samples.is_empty() {
        return Err(GraphProtError::EmptyScoringSet(
            "no samples to search for sites".to_string(),
        ));
    }
    let flank = motif_flank(model);
    let profiles = profile_all(samples, model)?;
    let positions = profiled_positions(&profiles);
    let margins: Vec<f64> = positions.iter().map(|&(_, _, m)| m).collect();
    let cutoff = percentile_cutoff(&margins, percentile)?;

    Ok(positions
        .into_iter()
        .filter(|&(_, _, margin)| margin > cutoff)
        .map(|(i, position, margin)| {
            let sample = &samples[i];
            site(sample.index_or(i), sample, position, margin, flank)
        })
        .collect())
}

/// Aggregate the top-margin positions into motif matrices.
///
/// Classification motifs are drawn from positive and unlabeled samples only;
/// regression motifs from every sample.
///
/// # Errors
///
/// [`GraphProtError::EmptyScoringSet`] when no sample qualifies, plus
/// selection and encoding errors.
pub fn extract_motifs(
    samples: &[Sample],
    model: &Model,
    selection: MotifSelection,
) -> Result<MotifSummary, GraphProtError> {
    let candidates: Vec<Sample> = samples
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            model.task() == Task::Regression
                || matches!(s.target, Target::Class(Label::Positive) | Target::Unlabeled)
        })
        .map(|(i, s)| {
            let mut candidate = s.clone();
            candidate.source_index = Some(s.index_or(i));
            candidate
        })
        .collect();
    if candidates.is_empty() {
        return Err(GraphProtError::EmptyScoringSet(
            "no positive or unlabeled samples for motif extraction".to_string(),
        ));
    }

    let flank = motif_flank(model);
    let profiles = profile_all(&candidates, model)?;
    let mut ranked = profiled_positions(&profiles);
    ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    let (selected, cutoff) = match selection {
        MotifSelection::Percentile(p) => {
            let margins: Vec<f64> = ranked.iter().map(|&(_, _, m)| m).collect();
            let cutoff = percentile_cutoff(&margins, p)?;
            let keep = ranked.iter().take_while(|&&(_, _, m)| m > cutoff).count();
            ranked.truncate(keep);
            (ranked, Some(cutoff))
        }
        MotifSelection::TopK(k) => {
            ranked.truncate(k);
            let cutoff = ranked.last().map(|&(_, _, m)| m);
            (ranked, cutoff)
        }
    };

    let width = 2 * flank + 1;
    let mut sequence = PositionMatrix::new(&Nucleotide::MOTIF_ALPHABET.map(Nucleotide::to_char), width);
    let uses_structure = model.uses_structure();
    let mut structure = uses_structure.then(|| {
        PositionMatrix::new(&StructureContext::MOTIF_ALPHABET.map(StructureContext::to_char), width)
    });
    let mut paired_unpaired = uses_structure.then(|| PositionMatrix::new(&['P', 'U'], width));

    let sites: Vec<SelectedSite> = selected
        .into_iter()
        .map(|(i, position, margin)| {
            let sample = &candidates[i];
            let selected = site(sample.index_or(i), sample, position, margin, flank);
            sequence.add_window(selected.window.chars());

            if let (Some(fold), Some(contexts), Some(pairing)) =
                (&sample.structure, structure.as_mut(), paired_unpaired.as_mut())
            {
                contexts.add_window(
                    window(position, flank, sample.len(), |j| fold.context(j).to_char()).chars(),
                );
                pairing.add_window(
                    window(position, flank, sample.len(), |j| {
                        if fold.context(j).is_paired() { 'P' } else { 'U' }
                    })
                    .chars(),
                );
            }
            selected
        })
        .collect();

    Ok(MotifSummary {
        sites,
        cutoff,
        flank,
        sequence,
        structure,
        paired_unpaired,
    })
}
