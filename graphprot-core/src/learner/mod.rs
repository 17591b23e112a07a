//! Online margin learner: regularized sub-gradient descent over hashed features.
//!
//! Classification minimizes the hinge loss `max(0, 1 − y·f(x))`, regression the
//! epsilon-insensitive loss `C·max(0, |y − f(x)| − ε)`, both with an L2 penalty
//! `λ/2·‖w‖²`. The step size decays as `1 / (λ·(t + t0))` with
//! `t0 = max(1, C) / λ`. Weight decay is applied lazily through a scalar
//! multiplier so each update only touches the sample's non-zero features.
//!
//! The visiting order is reshuffled every epoch from a seeded generator, so a
//! fixed seed reproduces a bit-identical [`Model`].

pub mod linalg;
pub mod model;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::{GraphProtConfig, ParameterSet};
use crate::constants::BIAS_LEARNING_RATE;
use crate::graph::features::{FeatureVector, encode_samples};
use crate::sample::{Sample, structure_in_use};
use crate::types::{GraphProtError, Label, Target, Task};
use linalg::scale_in_place;
pub use model::Model;

/// Below this the lazy weight scale is folded back into the weights.
const MIN_WEIGHT_SCALE: f64 = 1e-9;

/// Sub-gradient learner for one task and parameter set.
#[derive(Debug, Clone)]
pub struct OnlineMarginLearner {
    task: Task,
    params: ParameterSet,
    seed: u64,
    quiet: bool,
    uses_structure: bool,
}

impl OnlineMarginLearner {
    #[must_use]
    pub const fn new(task: Task, params: ParameterSet, seed: u64) -> Self {
        Self {
            task,
            params,
            seed,
            quiet: false,
            uses_structure: false,
        }
    }

    /// Record on the fitted model that the vectors were encoded with
    /// secondary structures.
    #[must_use]
    pub const fn with_structure(mut self, uses_structure: bool) -> Self {
        self.uses_structure = uses_structure;
        self
    }

    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Fit a model to pre-encoded vectors and their numeric targets.
    ///
    /// # Errors
    ///
    /// [`GraphProtError::EmptyTrainingSet`] when `vectors` is empty,
    /// [`GraphProtError::InvalidParameter`] when the parameter set is invalid.
    pub fn fit(&self, vectors: &[&FeatureVector], targets: &[f64]) -> Result<Model, GraphProtError> {
        self.params.validate()?;
        if vectors.is_empty() {
            return Err(GraphProtError::EmptyTrainingSet(
                "no samples to train on".to_string(),
            ));
        }
        debug_assert_eq!(vectors.len(), targets.len());

        let lambda = self.params.lambda;
        let cost = self.params.cost;
        let t0 = cost.max(1.0) / lambda;

        let mut weights = vec![0.0; self.params.feature_space_size()];
        let mut weight_scale = 1.0;
        let mut bias = 0.0;
        let mut t = 0.0;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..vectors.len()).collect();

        for epoch in 1..=self.params.epochs {
            order.shuffle(&mut rng);
            let mut updates = 0usize;

            for &i in &order {
                let x = vectors[i];
                let y = targets[i];
                let eta = 1.0 / (lambda * (t + t0));

                weight_scale *= 1.0 - eta * lambda;
                if weight_scale < MIN_WEIGHT_SCALE {
                    scale_in_place(&mut weights, weight_scale);
                    weight_scale = 1.0;
                }

                let f = weight_scale * x.dot_dense(&weights) + bias;
                let gradient = match self.task {
                    Task::Classification => (y * f < 1.0).then_some(y),
                    Task::Regression => ((y - f).abs() > self.params.epsilon)
                        .then(|| cost * (y - f).signum()),
                };

                if let Some(g) = gradient {
                    let step = eta * g / weight_scale;
                    for &(index, value) in x.entries() {
                        weights[index as usize] += step * value;
                    }
                    bias += eta * g * BIAS_LEARNING_RATE;
                    updates += 1;
                }
                t += 1.0;
            }

            if !self.quiet {
                debug!("Epoch {epoch}/{}: {updates} margin updates", self.params.epochs);
            }
        }

        scale_in_place(&mut weights, weight_scale);
        let model =
            Model::new(self.task, self.params, weights, bias).with_structure(self.uses_structure);

        if model.is_degenerate() {
            warn!(
                "Training produced an all-zero weight vector (lambda={}, epochs={}); the model only predicts its bias",
                lambda, self.params.epochs
            );
        }

        Ok(model)
    }
}

/// Numeric training targets for `task`, in sample order.
///
/// # Errors
///
/// [`GraphProtError::MalformedSample`] for a sample whose target does not fit
/// the task (no class label for classification, no affinity for regression).
pub fn training_targets(samples: &[Sample], task: Task) -> Result<Vec<f64>, GraphProtError> {
    samples
        .iter()
        .enumerate()
        .map(|(position, sample)| match (task, sample.target) {
            (Task::Classification, Target::Class(label)) => Ok(label.sign()),
            (Task::Regression, Target::Affinity(affinity)) => Ok(affinity),
            _ => Err(GraphProtError::MalformedSample {
                index: sample.index_or(position),
                id: sample.id.clone(),
                reason: match task {
                    Task::Classification => "missing class label".to_string(),
                    Task::Regression => "missing affinity".to_string(),
                },
            }),
        })
        .collect()
}

/// Encode `samples` and train a model for `config.task`.
///
/// Single-class classification data is accepted with a warning. Samples
/// must either all carry structures or none.
///
/// # Errors
///
/// [`GraphProtError::EmptyTrainingSet`] for no samples, plus any encoding,
/// structure or target error.
pub fn train(
    samples: &[Sample],
    params: &ParameterSet,
    config: &GraphProtConfig,
) -> Result<Model, GraphProtError> {
    if samples.is_empty() {
        return Err(GraphProtError::EmptyTrainingSet(
            "no samples to train on".to_string(),
        ));
    }
    params.validate()?;
    let uses_structure = structure_in_use(samples, params)?;
    let targets = training_targets(samples, config.task)?;

    if config.task == Task::Classification {
        let positives = samples
            .iter()
            .filter(|s| s.target.label() == Some(Label::Positive))
            .count();
        if positives == 0 || positives == samples.len() {
            warn!(
                "Training a classifier on a single class ({} samples, {positives} positive)",
                samples.len()
            );
        }
    }

    let vectors = encode_samples(samples, params)?;
    if !config.quiet {
        info!(
            "Encoded {} samples into 2^{} hashed features (R={}, D={})",
            vectors.len(),
            params.bitsize,
            params.radius,
            params.distance
        );
    }

    let refs: Vec<&FeatureVector> = vectors.iter().collect();
    let model = OnlineMarginLearner::new(config.task, *params, config.seed)
        .quiet(config.quiet)
        .with_structure(uses_structure)
        .fit(&refs, &targets)?;

    if !config.quiet {
        info!(
            "Trained {} model: |w|={:.4}, bias={:.4}",
            config.task,
            model.weight_norm(),
            model.bias()
        );
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(id: &str, sequence: &str, label: Label) -> Sample {
        Sample::parse(id, sequence.as_bytes(), None, Target::Class(label)).unwrap()
    }

    fn toy_classification_set() -> Vec<Sample> {
        let mut samples = Vec::new();
        for i in 0..8 {
            let rot = i % 4;
            let pos = format!("{}{}", &"UUUUAUUU"[rot..], &"UUUUAUUU"[..rot]);
            let neg = format!("{}{}", &"GGGGCGGG"[rot..], &"GGGGCGGG"[..rot]);
            samples.push(labeled(&format!("p{i}"), &pos, Label::Positive));
            samples.push(labeled(&format!("n{i}"), &neg, Label::Negative));
        }
        samples
    }

    fn config(task: Task) -> GraphProtConfig {
        GraphProtConfig {
            task,
            quiet: true,
            ..Default::default()
        }
    }

    fn small_params() -> ParameterSet {
        ParameterSet::default()
            .with_radius(0)
            .with_distance(0)
            .with_epochs(2)
            .with_lambda(0.1)
            .with_bitsize(10)
    }

    #[test]
    fn test_train_separates_toy_classes() {
        let samples = toy_classification_set();
        let model = train(&samples, &small_params(), &config(Task::Classification)).unwrap();

        let correct = samples
            .iter()
            .filter(|s| Some(model.predict_class(s).unwrap()) == s.target.label())
            .count();
        assert!(correct > samples.len() / 2, "{correct}/{} correct", samples.len());
        assert!(!model.is_degenerate());
    }

    #[test]
    fn test_training_is_reproducible_for_a_seed() {
        let samples = toy_classification_set();
        let params = small_params().with_radius(1).with_distance(2);
        let a = train(&samples, &params, &config(Task::Classification)).unwrap();
        let b = train(&samples, &params, &config(Task::Classification)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_training_is_permitted() {
        let samples: Vec<Sample> = toy_classification_set()
            .into_iter()
            .filter(|s| s.target.label() == Some(Label::Positive))
            .collect();
        let model = train(&samples, &small_params(), &config(Task::Classification)).unwrap();
        assert!(model.bias() > 0.0);
    }

    #[test]
    fn test_empty_training_set() {
        assert!(matches!(
            train(&[], &small_params(), &config(Task::Classification)),
            Err(GraphProtError::EmptyTrainingSet(_))
        ));
    }

    #[test]
    fn test_targets_must_match_task() {
        let samples = toy_classification_set();
        match train(&samples, &small_params(), &config(Task::Regression)) {
            Err(GraphProtError::MalformedSample { index, reason, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(reason, "missing affinity");
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }
    }

    #[test]
    fn test_regression_tracks_affinity_order() {
        let samples: Vec<Sample> = (0..12)
            .map(|i| {
                let u_count = i % 6;
                let sequence = format!("{}{}", "U".repeat(u_count), "G".repeat(8 - u_count));
                Sample::parse(
                    format!("r{i}"),
                    sequence.as_bytes(),
                    None,
                    Target::Affinity(u_count as f64),
                )
                .unwrap()
            })
            .collect();
        let params = small_params().with_epochs(20).with_lambda(0.001).with_cost(1.0);
        let model = train(&samples, &params, &config(Task::Regression)).unwrap();

        let low = model.score(&samples[0]).unwrap();
        let high = model.score(&samples[5]).unwrap();
        assert!(high > low, "expected {high} > {low}");
    }

    #[test]
    fn test_fit_on_pre_encoded_vectors() {
        let samples = toy_classification_set();
        let vectors = encode_samples(&samples, &small_params()).unwrap();
        let refs: Vec<&FeatureVector> = vectors.iter().collect();
        let targets = training_targets(&samples, Task::Classification).unwrap();
        let model = OnlineMarginLearner::new(Task::Classification, small_params(), 1)
            .quiet(true)
            .fit(&refs, &targets)
            .unwrap();
        assert_eq!(model.weights().len(), 1 << 10);
        assert!(model.score_vector(&vectors[0]) > model.score_vector(&vectors[1]));
    }

    #[test]
    fn test_training_refuses_mixed_structure_presence() {
        let sequences = ["GGACGUACGUGGACGUACGU", "CCAGUCAGUCCCAGUCAGUC", "AUGCAUGCAUAUGCAUGCAU"];
        let mut samples = Vec::new();
        for (i, sequence) in sequences.iter().enumerate() {
            samples.push(
                Sample::parse(
                    format!("pos{i}"),
                    sequence.as_bytes(),
                    Some(b"....((((....))))....".as_slice()),
                    Target::Class(Label::Positive),
                )
                .unwrap(),
            );
            samples.push(labeled(&format!("neg{i}"), sequence, Label::Negative));
        }

        match train(&samples, &small_params(), &config(Task::Classification)) {
            Err(GraphProtError::MalformedSample { index, reason, .. }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("missing structure"));
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }

        let sequence_only = small_params().with_sequence_only(true);
        let model = train(&samples, &sequence_only, &config(Task::Classification)).unwrap();
        assert!(!model.uses_structure());
    }

    #[test]
    fn test_model_records_structure_use() {
        let folded: Vec<Sample> = toy_classification_set()
            .into_iter()
            .map(|s| {
                let sequence = s.sequence_string();
                Sample::parse(
                    s.id.clone(),
                    sequence.as_bytes(),
                    Some(b"((....))".as_slice()),
                    s.target,
                )
                .unwrap()
            })
            .collect();
        let model = train(&folded, &small_params(), &config(Task::Classification)).unwrap();
        assert!(model.uses_structure());

        let plain = train(&toy_classification_set(), &small_params(), &config(Task::Classification))
            .unwrap();
        assert!(!plain.uses_structure());
    }
}
