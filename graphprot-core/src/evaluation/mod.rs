//! Model selection: held-out metrics, cross-validation and line search.

pub mod cross_validation;
pub mod line_search;
pub mod metrics;

pub use cross_validation::{CvResult, FoldMetrics, FoldResult, cross_validate};
pub use line_search::{LineSearchResult, SearchSpace, line_search};
