use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ParameterSet;
use crate::constants::VERSION;
use crate::graph::features::{FeatureVector, sample_features};
use crate::learner::linalg::squared_norm;
use crate::sample::{Sample, StructureUse};
use crate::types::{GraphProtError, Label, Task};

/// Trained linear model over hashed graph features.
///
/// Immutable once trained. Scores are computed by re-encoding samples with
/// the model's own [`ParameterSet`]. A model trained on structures only
/// scores samples that carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    task: Task,
    params: ParameterSet,
    uses_structure: bool,
    weights: Vec<f64>,
    bias: f64,
}

/// On-disk layout: only non-zero weights are stored.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    version: String,
    task: Task,
    params: ParameterSet,
    uses_structure: bool,
    bias: f64,
    weights: Vec<(u32, f64)>,
}

impl Model {
    pub(crate) fn new(task: Task, params: ParameterSet, weights: Vec<f64>, bias: f64) -> Self {
        debug_assert_eq!(weights.len(), params.feature_space_size());
        Self {
            task,
            params,
            uses_structure: false,
            weights,
            bias,
        }
    }

    /// Mark the model as trained on samples with secondary structure.
    #[must_use]
    pub(crate) const fn with_structure(mut self, uses_structure: bool) -> Self {
        self.uses_structure = uses_structure;
        self
    }

    #[must_use]
    pub const fn task(&self) -> Task {
        self.task
    }

    #[must_use]
    pub const fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// True when the training samples carried secondary structures.
    #[must_use]
    pub const fn uses_structure(&self) -> bool {
        self.uses_structure
    }

    /// Parameters samples are encoded with for this model: sequence-only
    /// unless the model was trained on structures.
    #[must_use]
    pub const fn encoding_params(&self) -> ParameterSet {
        let mut params = self.params;
        if !self.uses_structure {
            params.sequence_only = true;
        }
        params
    }

    /// How samples scored by this model must carry structures.
    #[must_use]
    pub const fn structure_use(&self) -> StructureUse {
        if self.uses_structure {
            StructureUse::Required
        } else {
            StructureUse::Ignored
        }
    }

    /// # Errors
    ///
    /// [`GraphProtError::MalformedSample`] when the model uses structures and
    /// `sample` has none.
    pub fn check_sample(&self, sample: &Sample, position: usize) -> Result<(), GraphProtError> {
        if self.uses_structure && sample.structure.is_none() {
            return Err(GraphProtError::MalformedSample {
                index: sample.index_or(position),
                id: sample.id.clone(),
                reason: "missing structure; the model was trained with structures".to_string(),
            });
        }
        Ok(())
    }

    /// Dense weight vector of length 2^bitsize
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub const fn bias(&self) -> f64 {
        self.bias
    }

    /// Euclidean norm of the weight vector
    #[must_use]
    pub fn weight_norm(&self) -> f64 {
        squared_norm(&self.weights).sqrt()
    }

    /// True when training left every weight at zero.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.weights.iter().all(|&w| w == 0.0)
    }

    /// `w·x + b` for an already-encoded vector.
    #[must_use]
    pub fn score_vector(&self, vector: &FeatureVector) -> f64 {
        vector.dot_dense(&self.weights) + self.bias
    }

    /// Encode `sample` with the model's parameters and score it.
    pub fn score(&self, sample: &Sample) -> Result<f64, GraphProtError> {
        self.check_sample(sample, 0)?;
        Ok(self.score_vector(&sample_features(sample, &self.encoding_params())?))
    }

    pub fn predict_class(&self, sample: &Sample) -> Result<Label, GraphProtError> {
        self.score(sample).map(Label::from_margin)
    }

    /// Reconcile the encoding requested by the caller with the model's own.
    ///
    /// Bitsize, sequence-only and abstraction must agree. A differing R or D
    /// is reported and ignored; scoring always uses the model's values.
    ///
    /// # Errors
    ///
    /// Returns [`GraphProtError::ParameterMismatch`] naming the first
    /// irreconcilable setting.
    pub fn check_compatible(&self, requested: &ParameterSet) -> Result<(), GraphProtError> {
        let own = &self.params;
        if requested.bitsize != own.bitsize {
            return Err(GraphProtError::ParameterMismatch(format!(
                "model was trained with bitsize {}, requested {}",
                own.bitsize, requested.bitsize
            )));
        }
        if requested.sequence_only != own.sequence_only {
            return Err(GraphProtError::ParameterMismatch(format!(
                "model was trained with onlyseq={}, requested onlyseq={}",
                own.sequence_only, requested.sequence_only
            )));
        }
        if requested.abstraction != own.abstraction {
            return Err(GraphProtError::ParameterMismatch(format!(
                "model was trained with abstraction={}, requested abstraction={}",
                own.abstraction, requested.abstraction
            )));
        }
        if requested.radius != own.radius || requested.distance != own.distance {
            warn!(
                "Requested R={} D={} differ from the model's R={} D={}; using the model's values",
                requested.radius, requested.distance, own.radius, own.distance
            );
        }
        Ok(())
    }

    /// Write the model as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphProtError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), GraphProtError> {
        let file = ModelFile {
            version: VERSION.to_string(),
            task: self.task,
            params: self.params,
            uses_structure: self.uses_structure,
            bias: self.bias,
            weights: self
                .weights
                .iter()
                .enumerate()
                .filter(|(_, w)| **w != 0.0)
                .map(|(i, &w)| (i as u32, w))
                .collect(),
        };
        serde_json::to_writer(writer, &file)?;
        Ok(())
    }

    /// Read a model written by [`Model::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphProtError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let file: ModelFile = serde_json::from_reader(reader)?;
        Self::from_file(file)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphProtError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    fn from_file(file: ModelFile) -> Result<Self, GraphProtError> {
        file.params
            .validate()
            .map_err(|e| GraphProtError::ParseError(format!("model parameters: {e}")))?;
        if file.version != VERSION {
            warn!(
                "Model was written by version {}, reading with {VERSION}",
                file.version
            );
        }

        let mut weights = vec![0.0; file.params.feature_space_size()];
        for (index, weight) in file.weights {
            let slot = weights.get_mut(index as usize).ok_or_else(|| {
                GraphProtError::ParseError(format!(
                    "weight index {index} outside 2^{} feature space",
                    file.params.bitsize
                ))
            })?;
            *slot = weight;
        }

        Ok(Self::new(file.task, file.params, weights, file.bias)
            .with_structure(file.uses_structure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Target;

    fn toy_model(params: ParameterSet) -> Model {
        let mut weights = vec![0.0; params.feature_space_size()];
        weights[3] = 0.25;
        weights[17] = -1.5;
        Model::new(Task::Classification, params, weights, 0.125)
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let model = toy_model(ParameterSet::default().with_bitsize(8));
        let mut buffer = Vec::new();
        model.write_json(&mut buffer).unwrap();
        let restored = Model::from_json(std::str::from_utf8(&buffer).unwrap()).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.model");
        let model = toy_model(ParameterSet::default().with_bitsize(6)).with_structure(true);
        model.save(&path).unwrap();
        assert_eq!(Model::load(&path).unwrap(), model);
    }

    #[test]
    fn test_load_rejects_out_of_range_weight() {
        let json = format!(
            r#"{{"version":"{VERSION}","task":"regression","params":{},"uses_structure":false,"bias":0.0,"weights":[[64,1.0]]}}"#,
            serde_json::to_string(&ParameterSet::default().with_bitsize(6)).unwrap()
        );
        assert!(matches!(
            Model::from_json(&json),
            Err(GraphProtError::ParseError(_))
        ));
    }

    #[test]
    fn test_check_compatible() {
        let params = ParameterSet::default().with_bitsize(8);
        let model = toy_model(params);
        assert!(model.check_compatible(&params).is_ok());
        assert!(model.check_compatible(&params.with_radius(3)).is_ok());
        for requested in [
            params.with_bitsize(9),
            params.with_sequence_only(true),
            params.with_abstraction(true),
        ] {
            assert!(matches!(
                model.check_compatible(&requested),
                Err(GraphProtError::ParameterMismatch(_))
            ));
        }
    }

    #[test]
    fn test_degenerate_and_scoring() {
        let params = ParameterSet::default().with_bitsize(6);
        let zero = Model::new(Task::Regression, params, vec![0.0; 64], 2.0);
        assert!(zero.is_degenerate());
        assert_eq!(zero.weight_norm(), 0.0);

        let sample = Sample::parse("s", b"ACGU", None, Target::Unlabeled).unwrap();
        assert_eq!(zero.score(&sample).unwrap(), 2.0);
        assert_eq!(zero.predict_class(&sample).unwrap(), Label::Positive);
    }

    #[test]
    fn test_structure_model_refuses_samples_without_structure() {
        let params = ParameterSet::default().with_bitsize(6);
        let model = Model::new(Task::Regression, params, vec![0.5; 64], 0.0).with_structure(true);
        let bare = Sample::parse("bare", b"ACGUACGU", None, Target::Unlabeled).unwrap();
        let folded = Sample::parse(
            "folded",
            b"ACGUACGU",
            Some(b"((....))".as_slice()),
            Target::Unlabeled,
        )
        .unwrap();

        assert_eq!(model.structure_use(), StructureUse::Required);
        assert!(model.score(&folded).is_ok());
        match model.score(&bare) {
            Err(GraphProtError::MalformedSample { reason, .. }) => {
                assert!(reason.contains("missing structure"));
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_model_ignores_given_structures() {
        let params = ParameterSet::default().with_bitsize(10);
        let mut weights = vec![0.0; params.feature_space_size()];
        for (i, w) in weights.iter_mut().enumerate() {
            *w = (i % 7) as f64 - 3.0;
        }
        let model = Model::new(Task::Regression, params, weights, 0.0);
        let bare = Sample::parse("bare", b"GGGAAACCC", None, Target::Unlabeled).unwrap();
        let folded = Sample::parse(
            "folded",
            b"GGGAAACCC",
            Some(b"(((...)))".as_slice()),
            Target::Unlabeled,
        )
        .unwrap();

        assert!(!model.uses_structure());
        assert!(model.encoding_params().sequence_only);
        assert_eq!(model.score(&bare).unwrap(), model.score(&folded).unwrap());
    }
}
