//! Coordinate-wise hyperparameter line search.
//!
//! Starting from an initial [`ParameterSet`], each dimension of the
//! [`SearchSpace`] is visited in a fixed order. All candidate values of the
//! current dimension are cross-validated in parallel while the other
//! dimensions stay fixed; the best candidate is committed before moving on.
//! A full sweep is one round. The search stops after the configured number of
//! rounds or after a round that improves nothing.
//!
//! This is a local, order-sensitive heuristic. It never returns a set whose
//! objective is below that of the initial set, because the initial set is
//! evaluated first and only improvements (or equal-objective simplifications)
//! are committed.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{GraphProtConfig, ParameterSet};
use crate::evaluation::cross_validation::cross_validate;
use crate::sample::Sample;
use crate::types::{GraphProtError, Task};

/// One searchable hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Lambda,
    Epochs,
    Radius,
    Distance,
    Bitsize,
    Epsilon,
    Cost,
}

impl Dimension {
    /// Visiting order within a round
    pub const ORDER: [Self; 7] = [
        Self::Lambda,
        Self::Epochs,
        Self::Radius,
        Self::Distance,
        Self::Bitsize,
        Self::Epsilon,
        Self::Cost,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lambda => "lambda",
            Self::Epochs => "epochs",
            Self::Radius => "R",
            Self::Distance => "D",
            Self::Bitsize => "bitsize",
            Self::Epsilon => "epsilon",
            Self::Cost => "c",
        };
        write!(f, "{name}")
    }
}

/// Candidate values per dimension. An empty list leaves that dimension fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub lambda: Vec<f64>,
    pub epochs: Vec<u32>,
    pub radius: Vec<u32>,
    pub distance: Vec<u32>,
    pub bitsize: Vec<u32>,
    pub epsilon: Vec<f64>,
    pub cost: Vec<f64>,
}

impl SearchSpace {
    /// Default grid for `task`. Epsilon and cost are only searched for regression.
    #[must_use]
    pub fn for_task(task: Task) -> Self {
        let (epsilon, cost) = match task {
            Task::Classification => (Vec::new(), Vec::new()),
            Task::Regression => (vec![0.01, 0.1, 0.5], vec![0.1, 1.0, 10.0]),
        };
        Self {
            lambda: vec![1e-6, 1e-5, 1e-4, 1e-3, 1e-2],
            epochs: vec![5, 10, 20],
            radius: vec![0, 1, 2],
            distance: vec![0, 2, 4],
            bitsize: vec![10, 12, 14],
            epsilon,
            cost,
        }
    }

    /// `current` with `dimension` replaced by each candidate value, in listed order.
    #[must_use]
    pub fn candidates(&self, dimension: Dimension, current: &ParameterSet) -> Vec<ParameterSet> {
        match dimension {
            Dimension::Lambda => self.lambda.iter().map(|&v| current.with_lambda(v)).collect(),
            Dimension::Epochs => self.epochs.iter().map(|&v| current.with_epochs(v)).collect(),
            Dimension::Radius => self.radius.iter().map(|&v| current.with_radius(v)).collect(),
            Dimension::Distance => self
                .distance
                .iter()
                .map(|&v| current.with_distance(v))
                .collect(),
            Dimension::Bitsize => self.bitsize.iter().map(|&v| current.with_bitsize(v)).collect(),
            Dimension::Epsilon => self.epsilon.iter().map(|&v| current.with_epsilon(v)).collect(),
            Dimension::Cost => self.cost.iter().map(|&v| current.with_cost(v)).collect(),
        }
    }
}

/// One cross-validated parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// 0 for the initial set
    pub round: usize,
    /// `None` for the initial set
    pub dimension: Option<Dimension>,
    pub params: ParameterSet,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchResult {
    pub best: ParameterSet,
    pub best_objective: f64,
    pub initial_objective: f64,
    /// Every distinct set evaluated, in evaluation order
    pub trace: Vec<Evaluation>,
}

/// Higher objective wins; equal objectives go to the simpler model.
fn is_better(objective: f64, params: &ParameterSet, than: f64, than_params: &ParameterSet) -> bool {
    objective > than || (objective == than && params.complexity() < than_params.complexity())
}

/// Run the coordinate-wise search.
///
/// # Errors
///
/// Any cross-validation error, including [`GraphProtError::InvalidParameter`]
/// for an invalid candidate value.
pub fn line_search(
    samples: &[Sample],
    initial: &ParameterSet,
    space: &SearchSpace,
    config: &GraphProtConfig,
) -> Result<LineSearchResult, GraphProtError> {
    let cv_config = GraphProtConfig {
        quiet: true,
        ..config.clone()
    };
    let evaluate = |params: &ParameterSet| -> Result<f64, GraphProtError> {
        Ok(cross_validate(samples, params, &cv_config)?.objective())
    };

    let initial_objective = evaluate(initial)?;
    let mut trace = vec![Evaluation {
        round: 0,
        dimension: None,
        params: *initial,
        objective: initial_objective,
    }];
    let mut best = *initial;
    let mut best_objective = initial_objective;

    if !config.quiet {
        info!("Line search start: objective {initial_objective:.4} for {initial:?}");
    }

    for round in 1..=config.line_search_rounds {
        let mut improved = false;

        for dimension in Dimension::ORDER {
            let pending: Vec<ParameterSet> = space
                .candidates(dimension, &best)
                .into_iter()
                .filter(|candidate| trace.iter().all(|e| e.params != *candidate))
                .fold(Vec::new(), |mut unique, candidate| {
                    if !unique.contains(&candidate) {
                        unique.push(candidate);
                    }
                    unique
                });
            if pending.is_empty() {
                continue;
            }

            let objectives = pending
                .par_iter()
                .map(|params| evaluate(params))
                .collect::<Result<Vec<f64>, GraphProtError>>()?;

            for (params, objective) in pending.into_iter().zip(objectives) {
                debug!("Round {round}, {dimension}: {objective:.4} for {params:?}");
                trace.push(Evaluation {
                    round,
                    dimension: Some(dimension),
                    params,
                    objective,
                });
            }

            // previously evaluated candidates of this dimension compete too
            let current = best;
            for dim_candidate in space.candidates(dimension, &current) {
                let Some(evaluation) = trace.iter().find(|e| e.params == dim_candidate) else {
                    continue;
                };
                if is_better(evaluation.objective, &evaluation.params, best_objective, &best) {
                    if evaluation.objective > best_objective {
                        improved = true;
                    }
                    best = evaluation.params;
                    best_objective = evaluation.objective;
                }
            }

            if best != current && !config.quiet {
                info!("Round {round}: {dimension} committed, objective {best_objective:.4}");
            }
        }

        if !improved {
            break;
        }
    }

    if !config.quiet {
        info!(
            "Line search done: objective {initial_objective:.4} -> {best_objective:.4} after {} evaluations",
            trace.len()
        );
    }

    Ok(LineSearchResult {
        best,
        best_objective,
        initial_objective,
        trace,
    })
}
