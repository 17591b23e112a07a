use rayon::prelude::*;
use tracing::info;

use crate::config::{GraphProtConfig, ParameterSet};
use crate::evaluation::{CvResult, LineSearchResult, SearchSpace, cross_validate, line_search};
use crate::learner::{Model, train};
use crate::motif::{MotifSelection, MotifSummary, SelectedSite, extract_motifs, high_affinity_sites};
use crate::profile::{Profile, profile_all};
use crate::sample::Sample;
use crate::types::GraphProtError;

/// Marker trait for the model state of a [`GraphProt`] pipeline.
pub trait TrainingState {}

/// No model yet: training and model selection are available.
#[derive(Debug, Clone)]
pub struct Untrained;

/// A model is held: scoring, profiling and motif extraction are available.
#[derive(Debug, Clone)]
pub struct Trained {
    model: Model,
}

impl TrainingState for Untrained {}
impl TrainingState for Trained {}

/// Pipeline entry point.
///
/// The state parameter carries the model once there is one, so scoring an
/// untrained pipeline does not compile.
///
/// # Examples
///
/// ```rust
/// use graphprot_core::config::{GraphProtConfig, ParameterSet};
/// use graphprot_core::engine::UntrainedGraphProt;
/// use graphprot_core::sample::Sample;
/// use graphprot_core::types::{Label, Target};
///
/// let samples = vec![
///     Sample::parse("p", b"UUUAUUUAUU", None, Target::Class(Label::Positive)).unwrap(),
///     Sample::parse("n", b"GGGCGGCGGG", None, Target::Class(Label::Negative)).unwrap(),
/// ];
/// let params = ParameterSet::default()
///     .with_radius(0)
///     .with_distance(0)
///     .with_bitsize(10)
///     .with_lambda(0.1)
///     .with_epochs(2);
///
/// let pipeline = UntrainedGraphProt::new();
/// let trained = pipeline.train(&samples, &params)?;
/// let scores = trained.predict(&samples)?;
/// assert!(scores[0] > scores[1]);
/// # Ok::<(), graphprot_core::types::GraphProtError>(())
/// ```
#[derive(Debug)]
pub struct GraphProt<S: TrainingState> {
    /// Run-level settings
    pub config: GraphProtConfig,
    state: S,
}

impl Default for UntrainedGraphProt {
    fn default() -> Self {
        Self::new()
    }
}

pub type UntrainedGraphProt = GraphProt<Untrained>;

pub type TrainedGraphProt = GraphProt<Trained>;

impl UntrainedGraphProt {
    /// Pipeline with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GraphProtConfig::default(),
            state: Untrained,
        }
    }

    /// Pipeline with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphProtError::InvalidParameter`] if the global thread pool
    /// cannot be configured.
    pub fn with_config(config: GraphProtConfig) -> Result<Self, GraphProtError> {
        if let Some(num_threads) = config.num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    GraphProtError::InvalidParameter(format!(
                        "Failed to configure thread pool: {e}"
                    ))
                })?;
        }

        Ok(Self {
            config,
            state: Untrained,
        })
    }

    /// Train a model on `samples`.
    pub fn train(
        &self,
        samples: &[Sample],
        params: &ParameterSet,
    ) -> Result<TrainedGraphProt, GraphProtError> {
        let model = train(samples, params, &self.config)?;
        Ok(TrainedGraphProt::from_model(self.config.clone(), model))
    }

    pub fn cross_validate(
        &self,
        samples: &[Sample],
        params: &ParameterSet,
    ) -> Result<CvResult, GraphProtError> {
        cross_validate(samples, params, &self.config)
    }

    /// Coordinate-wise parameter search, cross-validating every candidate.
    pub fn line_search(
        &self,
        samples: &[Sample],
        initial: &ParameterSet,
        space: &SearchSpace,
    ) -> Result<LineSearchResult, GraphProtError> {
        line_search(samples, initial, space, &self.config)
    }
}

impl TrainedGraphProt {
    /// Wrap a loaded model. The configured task follows the model's.
    #[must_use]
    pub fn from_model(mut config: GraphProtConfig, model: Model) -> Self {
        config.task = model.task();
        Self {
            config,
            state: Trained { model },
        }
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.state.model
    }

    #[must_use]
    pub fn into_model(self) -> Model {
        self.state.model
    }

    /// One score per sample, input order.
    pub fn predict(&self, samples: &[Sample]) -> Result<Vec<f64>, GraphProtError> {
        if samples.is_empty() {
            return Err(GraphProtError::EmptyScoringSet(
                "no samples to score".to_string(),
            ));
        }
        let model = self.model();
        let scores = samples
            .par_iter()
            .enumerate()
            .map(|(i, sample)| model.score(sample).map_err(|e| e.at_index(sample.index_or(i))))
            .collect::<Result<Vec<f64>, GraphProtError>>()?;

        if !self.config.quiet {
            info!("Scored {} samples", scores.len());
        }
        Ok(scores)
    }

    /// Per-position margins, one profile per sample.
    pub fn profile(&self, samples: &[Sample]) -> Result<Vec<Profile<'_>>, GraphProtError> {
        if samples.is_empty() {
            return Err(GraphProtError::EmptyScoringSet(
                "no samples to profile".to_string(),
            ));
        }
        profile_all(samples, self.model())
    }

    pub fn high_affinity_sites(
        &self,
        samples: &[Sample],
        percentile: f64,
    ) -> Result<Vec<SelectedSite>, GraphProtError> {
        let sites = high_affinity_sites(samples, self.model(), percentile)?;
        if !self.config.quiet {
            info!(
                "Selected {} high-affinity sites above the {percentile}th percentile",
                sites.len()
            );
        }
        Ok(sites)
    }

    pub fn motifs(
        &self,
        samples: &[Sample],
        selection: MotifSelection,
    ) -> Result<MotifSummary, GraphProtError> {
        let summary = extract_motifs(samples, self.model(), selection)?;
        if !self.config.quiet {
            info!(
                "Motifs aggregated from {} sites of {} samples (flank {}, structure tables: {})",
                summary.sites.len(),
                samples.len(),
                summary.flank,
                summary.structure.is_some()
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{SampleRecord, SampleSet, SetPurpose, StructureUse};
    use crate::types::{Label, Target, Task};
    use approx::assert_relative_eq;

    fn samples() -> Vec<Sample> {
        (0..8)
            .map(|i| {
                let (sequence, label) = if i < 4 {
                    ("uuUUAUUUAuu", Label::Positive)
                } else {
                    ("ggGGCGGCGgg", Label::Negative)
                };
                Sample::parse(format!("s{i}"), sequence.as_bytes(), None, Target::Class(label))
                    .unwrap()
            })
            .collect()
    }

    fn params() -> ParameterSet {
        ParameterSet::default()
            .with_radius(1)
            .with_distance(1)
            .with_bitsize(10)
            .with_lambda(0.1)
            .with_epochs(2)
    }

    fn quiet() -> GraphProtConfig {
        GraphProtConfig {
            quiet: true,
            folds: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_train_predict_profile_agree() {
        let pipeline = UntrainedGraphProt::with_config(quiet()).unwrap();
        let samples = samples();
        let trained = pipeline.train(&samples, &params()).unwrap();

        let scores = trained.predict(&samples).unwrap();
        assert_eq!(scores.len(), samples.len());
        assert!(scores[0] > scores[7]);

        let profiles = trained.profile(&samples).unwrap();
        for (profile, score) in profiles.iter().zip(&scores) {
            assert_eq!(profile.len(), 7);
            assert_relative_eq!(profile.total(), *score, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_saved_model_scores_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.model");
        let samples = samples();

        let trained = UntrainedGraphProt::with_config(quiet())
            .unwrap()
            .train(&samples, &params())
            .unwrap();
        trained.model().save(&path).unwrap();

        let reloaded = TrainedGraphProt::from_model(quiet(), Model::load(&path).unwrap());
        assert_eq!(
            trained.predict(&samples).unwrap(),
            reloaded.predict(&samples).unwrap()
        );
    }

    #[test]
    fn test_predict_positive_only_set() {
        let samples = samples();
        let trained = UntrainedGraphProt::with_config(quiet())
            .unwrap()
            .train(&samples, &params())
            .unwrap();
        let positives = &samples[..4];
        assert_eq!(trained.predict(positives).unwrap().len(), 4);
        assert!(trained.predict(&[]).is_err());
    }

    #[test]
    fn test_from_model_adopts_model_task() {
        let samples = samples();
        let model = UntrainedGraphProt::with_config(quiet())
            .unwrap()
            .train(&samples, &params())
            .unwrap()
            .into_model();
        let config = GraphProtConfig {
            task: Task::Regression,
            ..quiet()
        };
        assert_eq!(
            TrainedGraphProt::from_model(config, model).config.task,
            Task::Classification
        );
    }

    #[test]
    fn test_cross_validate_through_pipeline() {
        let pipeline = UntrainedGraphProt::with_config(quiet()).unwrap();
        let result = pipeline.cross_validate(&samples(), &params()).unwrap();
        assert_eq!(result.folds.len(), 2);
    }

    #[test]
    fn test_errors_name_the_input_record() {
        let records: Vec<SampleRecord> = ["AC#U", "UUAUUUAU", "GGCGGCGG"]
            .iter()
            .enumerate()
            .map(|(i, sequence)| SampleRecord {
                id: format!("r{i}"),
                sequence: sequence.as_bytes().to_vec(),
                structure: None,
                target: Target::Unlabeled,
                defect: None,
            })
            .collect();
        let set = SampleSet::from_records(records, SetPurpose::Scoring, StructureUse::Consistent)
            .unwrap();
        assert_eq!(set.rejected()[0].index, 0);

        let config = GraphProtConfig {
            task: Task::Regression,
            ..quiet()
        };
        match UntrainedGraphProt::with_config(config).unwrap().train(set.samples(), &params()) {
            Err(GraphProtError::MalformedSample { index, id, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "r1");
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }

        let trained = UntrainedGraphProt::with_config(quiet())
            .unwrap()
            .train(&samples(), &params())
            .unwrap();
        assert!(!trained.model().uses_structure());
        let structured = trained.into_model().with_structure(true);
        let trained = TrainedGraphProt::from_model(quiet(), structured);
        match trained.predict(&set.samples()[1..]) {
            Err(GraphProtError::MalformedSample { index, reason, .. }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("missing structure"));
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }
    }
}
