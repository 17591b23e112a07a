//! # GraphProt - graph-kernel models of RNA-binding protein preferences
//!
//! Learns the sequence and structure preferences of RNA-binding proteins from
//! bound and unbound sites (classification) or measured affinities
//! (regression).
//!
//! ## Overview
//!
//! Each sample is turned into a small labeled graph (positions, backbone
//! edges, base pairs) and then into a sparse hashed feature vector counting
//! rooted subgraph pairs of bounded radius and distance. A linear model is
//! trained on these vectors by online sub-gradient descent; the same explicit
//! feature map lets the model's score be split into per-position margins,
//! from which high-affinity sites and motifs are read off.
//!
//! ## Features
//!
//! - **Classification** with hinge loss and **regression** with epsilon-insensitive loss
//! - **Viewpoints**: lowercase flanks provide context but never root features
//! - **Model selection**: stratified cross-validation and coordinate-wise line search
//! - **Interpretation**: per-position profiles, high-affinity sites, sequence and structure motifs
//! - **Reproducibility**: one seed drives shuffling and fold assignment
//! - **Parallel processing** with Rayon, results independent of thread count
//!
//! ## Quick Start
//!
//! ```rust
//! use graphprot_core::config::{GraphProtConfig, ParameterSet};
//! use graphprot_core::engine::UntrainedGraphProt;
//! use graphprot_core::sample::Sample;
//! use graphprot_core::types::{Label, Target};
//!
//! let samples = vec![
//!     Sample::parse("bound", b"ggUUUAUUUgg", None, Target::Class(Label::Positive)).unwrap(),
//!     Sample::parse("unbound", b"aaGGCGGCGaa", None, Target::Class(Label::Negative)).unwrap(),
//! ];
//! let params = ParameterSet::default().with_bitsize(12).with_lambda(0.01);
//!
//! let trained = UntrainedGraphProt::with_config(GraphProtConfig {
//!     quiet: true,
//!     ..Default::default()
//! })?
//! .train(&samples, &params)?;
//!
//! let profiles = trained.profile(&samples)?;
//! assert_eq!(profiles[0].len(), 7);
//! # Ok::<(), graphprot_core::types::GraphProtError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: parameter sets and run configuration
//! - [`constants`]: defaults and hash seeds
//! - [`engine`]: type-state pipeline API
//! - [`types`]: labels, alphabets and errors
//! - [`sample`]: validated samples and input readers
//! - [`graph`]: graph encoding and the hashed feature map
//! - [`learner`]: online margin learner and the model
//! - [`evaluation`]: metrics, cross-validation and line search
//! - [`profile`]: per-position margin profiles
//! - [`motif`]: high-affinity sites and motif matrices
//! - [`output`]: text artifact writers
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, GraphProtError>`](types::GraphProtError).
//! Malformed samples are rejected individually; a run only fails on them when
//! nothing usable is left.

pub mod config;
pub mod constants;
pub mod engine;
pub mod evaluation;
pub mod graph;
pub mod learner;
pub mod motif;
pub mod output;
pub mod profile;
pub mod sample;
pub mod types;

pub use engine::{GraphProt, TrainedGraphProt, UntrainedGraphProt};
pub use learner::Model;
pub use types::GraphProtError;
