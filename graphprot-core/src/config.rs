//! Parameter sets and run configuration.
//!
//! Two kinds of settings drive the pipeline:
//!
//! - [`ParameterSet`]: the immutable bundle of encoding and learning
//!   hyperparameters. A [`Model`](crate::learner::Model) stores the exact
//!   set it was trained with and re-encodes samples with it.
//! - [`GraphProtConfig`]: run-level settings (task, seed, folds, threads)
//!   that never travel with a model.
//!
//! # Examples
//!
//! ```rust
//! use graphprot_core::config::{GraphProtConfig, ParameterSet};
//! use graphprot_core::types::Task;
//!
//! let params = ParameterSet::default()
//!     .with_radius(0)
//!     .with_distance(0)
//!     .with_bitsize(10)
//!     .with_lambda(0.1)
//!     .with_epochs(2);
//! params.validate()?;
//!
//! let config = GraphProtConfig {
//!     task: Task::Classification,
//!     folds: 5,
//!     ..Default::default()
//! };
//! # Ok::<(), graphprot_core::types::GraphProtError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BITSIZE, DEFAULT_COST, DEFAULT_DISTANCE, DEFAULT_EPOCHS, DEFAULT_EPSILON,
    DEFAULT_FOLDS, DEFAULT_LAMBDA, DEFAULT_LINE_SEARCH_ROUNDS, DEFAULT_RADIUS, DEFAULT_SEED,
    MAX_BITSIZE, MAX_GRAPH_BOUND, MIN_BITSIZE,
};
use crate::types::{GraphProtError, Task};

/// Encoding and learning hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Neighborhood radius R
    pub radius: u32,
    /// Maximum root-to-root distance D
    pub distance: u32,
    /// log2 of the hashed feature space size
    pub bitsize: u32,
    /// L2 regularization strength
    pub lambda: f64,
    /// Width of the insensitive zone (regression)
    pub epsilon: f64,
    /// Loss cost (regression)
    pub cost: f64,
    /// Passes over the training data
    pub epochs: u32,
    /// Coarsen structure labels to paired/loop/unpaired
    pub abstraction: bool,
    /// Ignore structure annotations entirely
    pub sequence_only: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            distance: DEFAULT_DISTANCE,
            bitsize: DEFAULT_BITSIZE,
            lambda: DEFAULT_LAMBDA,
            epsilon: DEFAULT_EPSILON,
            cost: DEFAULT_COST,
            epochs: DEFAULT_EPOCHS,
            abstraction: false,
            sequence_only: false,
        }
    }
}

impl ParameterSet {
    #[must_use]
    pub const fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub const fn with_distance(mut self, distance: u32) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub const fn with_bitsize(mut self, bitsize: u32) -> Self {
        self.bitsize = bitsize;
        self
    }

    #[must_use]
    pub const fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub const fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub const fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    #[must_use]
    pub const fn with_abstraction(mut self, abstraction: bool) -> Self {
        self.abstraction = abstraction;
        self
    }

    #[must_use]
    pub const fn with_sequence_only(mut self, sequence_only: bool) -> Self {
        self.sequence_only = sequence_only;
        self
    }

    /// Number of hashed feature slots (2^bitsize)
    #[must_use]
    pub const fn feature_space_size(&self) -> usize {
        1 << self.bitsize
    }

    /// Rough model complexity used to break line-search ties: smaller is simpler.
    #[must_use]
    pub const fn complexity(&self) -> (u32, u32, u32) {
        (self.bitsize, self.radius, self.distance)
    }

    /// Check every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`GraphProtError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GraphProtError> {
        if !(MIN_BITSIZE..=MAX_BITSIZE).contains(&self.bitsize) {
            return Err(GraphProtError::InvalidParameter(format!(
                "bitsize must be in {MIN_BITSIZE}..={MAX_BITSIZE}, got {}",
                self.bitsize
            )));
        }
        if self.radius > MAX_GRAPH_BOUND || self.distance > MAX_GRAPH_BOUND {
            return Err(GraphProtError::InvalidParameter(format!(
                "R and D must not exceed {MAX_GRAPH_BOUND}, got R={} D={}",
                self.radius, self.distance
            )));
        }
        if !(self.lambda > 0.0 && self.lambda.is_finite()) {
            return Err(GraphProtError::InvalidParameter(format!(
                "lambda must be positive, got {}",
                self.lambda
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(GraphProtError::InvalidParameter(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if !(self.cost > 0.0 && self.cost.is_finite()) {
            return Err(GraphProtError::InvalidParameter(format!(
                "c must be positive, got {}",
                self.cost
            )));
        }
        if self.epochs == 0 {
            return Err(GraphProtError::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run-level settings for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct GraphProtConfig {
    /// Task the samples are labeled for.
    ///
    /// **Default**: [`Task::Classification`]
    pub task: Task,

    /// Seed for per-epoch shuffling and fold assignment.
    ///
    /// The same seed and inputs reproduce bit-identical models and metrics.
    pub seed: u64,

    /// Number of cross-validation folds.
    ///
    /// **Default**: 10
    pub folds: usize,

    /// Maximum number of full line-search sweeps.
    ///
    /// **Default**: 2
    pub line_search_rounds: usize,

    /// Suppress progress events.
    pub quiet: bool,

    /// Size of the global Rayon pool. `None` uses all available cores.
    pub num_threads: Option<usize>,
}

impl Default for GraphProtConfig {
    fn default() -> Self {
        Self {
            task: Task::Classification,
            seed: DEFAULT_SEED,
            folds: DEFAULT_FOLDS,
            line_search_rounds: DEFAULT_LINE_SEARCH_ROUNDS,
            quiet: false,
            num_threads: None,
        }
    }
}
