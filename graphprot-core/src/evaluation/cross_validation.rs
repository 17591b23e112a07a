use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::info;

use crate::config::{GraphProtConfig, ParameterSet};
use crate::evaluation::metrics::{
    accuracy, average_precision, mean_defined, mse, pearson, roc_auc, spearman,
};
use crate::graph::features::{FeatureVector, encode_samples};
use crate::learner::{OnlineMarginLearner, training_targets};
use crate::sample::{Sample, structure_in_use};
use crate::types::{GraphProtError, Task};

/// Metrics of one held-out fold, or their mean over folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoldMetrics {
    Classification {
        accuracy: f64,
        /// `None` when the fold holds a single class
        auc: Option<f64>,
        average_precision: Option<f64>,
    },
    Regression {
        pearson: Option<f64>,
        spearman: Option<f64>,
        mse: f64,
    },
}

impl FoldMetrics {
    fn evaluate(task: Task, targets: &[f64], scores: &[f64]) -> Self {
        match task {
            Task::Classification => Self::Classification {
                accuracy: accuracy(targets, scores),
                auc: roc_auc(targets, scores),
                average_precision: average_precision(targets, scores),
            },
            Task::Regression => Self::Regression {
                pearson: pearson(targets, scores),
                spearman: spearman(targets, scores),
                mse: mse(targets, scores),
            },
        }
    }
}

/// Outcome of one fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub fold: usize,
    pub train_size: usize,
    /// Indices (into the input samples) held out in this fold
    pub test_indices: Vec<usize>,
    pub metrics: FoldMetrics,
}

/// Per-fold breakdown and aggregate of a cross-validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CvResult {
    pub task: Task,
    pub params: ParameterSet,
    pub folds: Vec<FoldResult>,
}

impl CvResult {
    /// Mean of every metric over the folds where it is defined.
    #[must_use]
    pub fn mean(&self) -> FoldMetrics {
        let n = self.folds.len().max(1) as f64;
        match self.task {
            Task::Classification => {
                let mut acc = 0.0;
                let mut aucs = Vec::new();
                let mut aps = Vec::new();
                for fold in &self.folds {
                    if let FoldMetrics::Classification {
                        accuracy,
                        auc,
                        average_precision,
                    } = fold.metrics
                    {
                        acc += accuracy;
                        aucs.push(auc);
                        aps.push(average_precision);
                    }
                }
                FoldMetrics::Classification {
                    accuracy: acc / n,
                    auc: mean_defined(aucs),
                    average_precision: mean_defined(aps),
                }
            }
            Task::Regression => {
                let mut total_mse = 0.0;
                let mut pearsons = Vec::new();
                let mut spearmans = Vec::new();
                for fold in &self.folds {
                    if let FoldMetrics::Regression {
                        pearson,
                        spearman,
                        mse,
                    } = fold.metrics
                    {
                        total_mse += mse;
                        pearsons.push(pearson);
                        spearmans.push(spearman);
                    }
                }
                FoldMetrics::Regression {
                    pearson: mean_defined(pearsons),
                    spearman: mean_defined(spearmans),
                    mse: total_mse / n,
                }
            }
        }
    }

    /// Scalar to maximize during model selection.
    ///
    /// Classification: mean AUC, or mean accuracy when no fold defines AUC.
    /// Regression: mean Pearson correlation, 0 when undefined everywhere.
    #[must_use]
    pub fn objective(&self) -> f64 {
        match self.mean() {
            FoldMetrics::Classification { accuracy, auc, .. } => auc.unwrap_or(accuracy),
            FoldMetrics::Regression { pearson, .. } => pearson.unwrap_or(0.0),
        }
    }
}

/// Split sample indices into `folds` disjoint groups covering every sample once.
///
/// Classification folds are stratified: each class is shuffled and dealt
/// round-robin, so every fold's class counts are within one of the global
/// share. Regression samples are shuffled and dealt round-robin.
///
/// # Errors
///
/// [`GraphProtError::InvalidParameter`] for fewer than two folds,
/// [`GraphProtError::InsufficientSamples`] when folds exceed the sample count
/// or a classification set lacks one of the classes.
pub fn fold_assignment(
    targets: &[f64],
    task: Task,
    folds: usize,
    seed: u64,
) -> Result<Vec<Vec<usize>>, GraphProtError> {
    if folds < 2 {
        return Err(GraphProtError::InvalidParameter(format!(
            "cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    if folds > targets.len() {
        return Err(GraphProtError::InsufficientSamples(format!(
            "{folds} folds requested for {} samples",
            targets.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let groups: Vec<Vec<usize>> = match task {
        Task::Classification => {
            let (mut positives, mut negatives): (Vec<usize>, Vec<usize>) =
                (0..targets.len()).partition(|&i| targets[i] > 0.0);
            if positives.is_empty() || negatives.is_empty() {
                return Err(GraphProtError::InsufficientSamples(format!(
                    "stratified cross-validation needs both classes ({} positive, {} negative)",
                    positives.len(),
                    negatives.len()
                )));
            }
            positives.shuffle(&mut rng);
            negatives.shuffle(&mut rng);
            vec![positives, negatives]
        }
        Task::Regression => {
            let mut all: Vec<usize> = (0..targets.len()).collect();
            all.shuffle(&mut rng);
            vec![all]
        }
    };

    let mut assignment = vec![Vec::new(); folds];
    for (k, index) in groups.into_iter().flatten().enumerate() {
        assignment[k % folds].push(index);
    }
    for fold in &mut assignment {
        fold.sort_unstable();
    }
    Ok(assignment)
}

/// Train on all-but-one fold and score the held-out fold, for every fold.
///
/// Samples are encoded once; folds run in parallel, each with its own model.
/// Results are ordered by fold.
///
/// # Errors
///
/// Partitioning errors from [`fold_assignment`], plus encoding, structure and
/// target errors.
pub fn cross_validate(
    samples: &[Sample],
    params: &ParameterSet,
    config: &GraphProtConfig,
) -> Result<CvResult, GraphProtError> {
    params.validate()?;
    if samples.is_empty() {
        return Err(GraphProtError::EmptyTrainingSet(
            "no samples to cross-validate".to_string(),
        ));
    }
    let uses_structure = structure_in_use(samples, params)?;
    let targets = training_targets(samples, config.task)?;
    let assignment = fold_assignment(&targets, config.task, config.folds, config.seed)?;
    let vectors = encode_samples(samples, params)?;

    let results = assignment
        .par_iter()
        .enumerate()
        .map(|(fold, test_indices)| {
            let mut held_out = vec![false; samples.len()];
            for &i in test_indices {
                held_out[i] = true;
            }
            let training_indices = (0..samples.len()).filter(|&i| !held_out[i]);
            let (train_vectors, train_targets): (Vec<&FeatureVector>, Vec<f64>) = training_indices
                .map(|i| (&vectors[i], targets[i]))
                .unzip();

            let model = OnlineMarginLearner::new(
                config.task,
                *params,
                config.seed.wrapping_add(fold as u64),
            )
            .quiet(true)
            .with_structure(uses_structure)
            .fit(&train_vectors, &train_targets)?;

            let test_targets: Vec<f64> = test_indices.iter().map(|&i| targets[i]).collect();
            let scores: Vec<f64> = test_indices
                .iter()
                .map(|&i| model.score_vector(&vectors[i]))
                .collect();

            Ok(FoldResult {
                fold,
                train_size: train_targets.len(),
                test_indices: test_indices.clone(),
                metrics: FoldMetrics::evaluate(config.task, &test_targets, &scores),
            })
        })
        .collect::<Result<Vec<_>, GraphProtError>>()?;

    let result = CvResult {
        task: config.task,
        params: *params,
        folds: results,
    };

    if !config.quiet {
        for fold in &result.folds {
            info!("Fold {}: {:?}", fold.fold + 1, fold.metrics);
        }
        info!(
            "{}-fold cross-validation objective: {:.4}",
            config.folds,
            result.objective()
        );
    }

    Ok(result)
}
