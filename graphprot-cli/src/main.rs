//! # GraphProt CLI - RNA-binding protein models from the command line
//!
//! Thin adapter around `graphprot-core`: reads FASTA, structure and affinity
//! files, resolves the parameter set, runs one action and writes its
//! artifacts as `<prefix>.<extension>`.
//!
//! ## Usage
//!
//! ```bash
//! # Train a classifier on bound (--fasta) and unbound (--negfasta) sites
//! graphprot --action train --fasta bound.fa --negfasta unbound.fa --prefix run
//!
//! # Score new sequences with the trained model
//! graphprot --action predict --fasta new.fa --model run.model --prefix run
//!
//! # Regression on affinities, 5-fold cross-validation
//! graphprot --mode regression --action cv --fasta seqs.fa --affinities seqs.aff --folds 5
//!
//! # Line search, then train with the selected parameters
//! graphprot --action ls --fasta bound.fa --negfasta unbound.fa --prefix run
//! graphprot --action train --fasta bound.fa --negfasta unbound.fa --params run.params
//! ```
//!
//! ## Actions
//!
//! - `train`: writes `<prefix>.model`
//! - `predict`: writes `<prefix>.predictions`
//! - `predict_profile`: writes `<prefix>.profile`
//! - `predict_has`: writes `<prefix>.has`
//! - `cv`: writes `<prefix>.cv_results`
//! - `ls`: writes `<prefix>.params`
//! - `motif`: writes `<prefix>.sequence_motif` and, with structures,
//!   `<prefix>.structure_motif` and `<prefix>.structure_motif_pairedunpaired`
//!
//! Set `RUST_LOG` to override the log level (`info` by default, `warn` with `--quiet`).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use graphprot_core::config::{GraphProtConfig, ParameterSet};
use graphprot_core::constants::{DEFAULT_FOLDS, DEFAULT_PERCENTILE, DEFAULT_SEED};
use graphprot_core::engine::{TrainedGraphProt, UntrainedGraphProt};
use graphprot_core::evaluation::SearchSpace;
use graphprot_core::learner::Model;
use graphprot_core::motif::MotifSelection;
use graphprot_core::output::{
    Artifact, read_params_format, write_cv_results_format, write_file, write_has_format,
    write_motif_format, write_params_format, write_predictions_format, write_profile_format,
};
use graphprot_core::sample::io::{
    assemble_records, class_targets, read_affinities, read_fasta_sequences,
};
use graphprot_core::sample::{SampleRecord, SampleSet, SetPurpose, StructureUse};
use graphprot_core::types::{GraphProtError, Target, Task};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const ACTIONS: [&str; 7] = [
    "train",
    "predict",
    "predict_profile",
    "predict_has",
    "cv",
    "ls",
    "motif",
];

fn cli() -> Command {
    Command::new("graphprot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Graph-kernel models of RNA-binding protein sequence and structure preferences")
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Task: classification or regression")
                .value_parser(["classification", "regression"]),
        )
        .arg(
            Arg::new("action")
                .long("action")
                .value_name("ACTION")
                .help("Action to run")
                .value_parser(ACTIONS)
                .required(true),
        )
        .arg(
            Arg::new("fasta")
                .long("fasta")
                .value_name("FILE")
                .help("Sequences (positives in classification); uppercase marks the viewpoint")
                .required(true),
        )
        .arg(
            Arg::new("negfasta")
                .long("negfasta")
                .value_name("FILE")
                .help("Negative sequences (classification)"),
        )
        .arg(
            Arg::new("structures")
                .long("structures")
                .value_name("FILE")
                .help("Dot-bracket structures for --fasta, matched by id"),
        )
        .arg(
            Arg::new("negstructures")
                .long("negstructures")
                .value_name("FILE")
                .help("Dot-bracket structures for --negfasta"),
        )
        .arg(
            Arg::new("affinities")
                .long("affinities")
                .value_name("FILE")
                .help("One affinity per sequence (regression)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("FILE")
                .help("Trained model for predict, profile, has and motif actions"),
        )
        .arg(
            Arg::new("params")
                .long("params")
                .value_name("FILE")
                .help("Parameter file written by the ls action"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .help("Prefix of all output files")
                .default_value("GraphProt"),
        )
        .arg(
            Arg::new("R")
                .short('R')
                .value_name("INT")
                .help("Kernel radius")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("D")
                .short('D')
                .value_name("INT")
                .help("Kernel distance")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("bitsize")
                .long("bitsize")
                .value_name("INT")
                .help("log2 of the feature space size")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("lambda")
                .long("lambda")
                .value_name("FLOAT")
                .help("Regularization strength")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("epochs")
                .long("epochs")
                .value_name("INT")
                .help("Passes over the training data")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("epsilon")
                .long("epsilon")
                .value_name("FLOAT")
                .help("Epsilon of the insensitive loss (regression)")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("c")
                .long("c")
                .value_name("FLOAT")
                .help("Loss cost (regression)")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("abstraction")
                .long("abstraction")
                .help("Coarsen structure labels to paired/loop/unpaired")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("onlyseq")
                .long("onlyseq")
                .help("Ignore structures")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("percentile")
                .long("percentile")
                .value_name("FLOAT")
                .help("Selection percentile for predict_has and motif")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("folds")
                .long("folds")
                .value_name("INT")
                .help("Cross-validation folds (default: 10)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("INT")
                .help("Seed for shuffling and fold assignment")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("INT")
                .help("Worker threads (default: all cores)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only report warnings and errors")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Apply explicitly given encoding and learning flags on top of `base`.
fn apply_overrides(matches: &ArgMatches, base: ParameterSet) -> ParameterSet {
    let mut params = base;
    if let Some(&radius) = matches.get_one::<u32>("R") {
        params.radius = radius;
    }
    if let Some(&distance) = matches.get_one::<u32>("D") {
        params.distance = distance;
    }
    if let Some(&bitsize) = matches.get_one::<u32>("bitsize") {
        params.bitsize = bitsize;
    }
    if let Some(&lambda) = matches.get_one::<f64>("lambda") {
        params.lambda = lambda;
    }
    if let Some(&epochs) = matches.get_one::<u32>("epochs") {
        params.epochs = epochs;
    }
    if let Some(&epsilon) = matches.get_one::<f64>("epsilon") {
        params.epsilon = epsilon;
    }
    if let Some(&cost) = matches.get_one::<f64>("c") {
        params.cost = cost;
    }
    if matches.get_flag("abstraction") {
        params.abstraction = true;
    }
    if matches.get_flag("onlyseq") {
        params.sequence_only = true;
    }
    params
}

fn requested_task(matches: &ArgMatches) -> Result<Option<Task>, GraphProtError> {
    matches
        .get_one::<String>("mode")
        .map(|mode| mode.parse())
        .transpose()
}

/// Sequences of one FASTA file with their optional structures.
fn read_records(
    fasta: &str,
    structures: Option<&String>,
    targets: impl FnOnce(usize) -> Result<Vec<Result<Target, String>>, GraphProtError>,
) -> Result<Vec<SampleRecord>, GraphProtError> {
    let sequences = read_fasta_sequences(fasta)?;
    let structures = structures.map(read_fasta_sequences).transpose()?;
    let targets = targets(sequences.len())?;
    Ok(assemble_records(sequences, structures, targets))
}

fn class_entries(positives: usize, negatives: usize) -> Vec<Result<Target, String>> {
    class_targets(positives, negatives).into_iter().map(Ok).collect()
}

fn load_samples(
    matches: &ArgMatches,
    task: Task,
    purpose: SetPurpose,
    structure_use: StructureUse,
) -> Result<SampleSet, GraphProtError> {
    let fasta = matches
        .get_one::<String>("fasta")
        .ok_or_else(|| GraphProtError::InvalidParameter("--fasta is required".to_string()))?;
    let mut structures = matches.get_one::<String>("structures");
    let mut negstructures = matches.get_one::<String>("negstructures");

    if structure_use == StructureUse::Ignored {
        if structures.is_some() || negstructures.is_some() {
            warn!("Structure files are ignored by the sequence-only encoding");
        }
        structures = None;
        negstructures = None;
    } else if task == Task::Classification
        && matches.contains_id("negfasta")
        && structures.is_some() != negstructures.is_some()
    {
        return Err(GraphProtError::InvalidParameter(
            "--structures and --negstructures must be given together (or use --onlyseq)"
                .to_string(),
        ));
    }

    let records = match task {
        Task::Classification => {
            let mut records = read_records(fasta, structures, |n| Ok(class_entries(n, 0)))?;
            if let Some(negfasta) = matches.get_one::<String>("negfasta") {
                records.extend(read_records(negfasta, negstructures, |n| {
                    Ok(class_entries(0, n))
                })?);
            }
            records
        }
        Task::Regression => {
            let affinities = matches.get_one::<String>("affinities");
            if affinities.is_none() && purpose == SetPurpose::Training {
                return Err(GraphProtError::InvalidParameter(
                    "regression training needs --affinities".to_string(),
                ));
            }
            read_records(fasta, structures, |n| match affinities {
                Some(path) => Ok(read_affinities(path)?
                    .into_iter()
                    .map(|entry| entry.map(Target::Affinity))
                    .collect()),
                None => Ok(vec![Ok(Target::Unlabeled); n]),
            })?
        }
    };

    let set = SampleSet::from_records(records, purpose, structure_use)?;
    if !set.rejected().is_empty() {
        info!("{} of {} samples rejected", set.rejected().len(), set.len() + set.rejected().len());
    }
    Ok(set)
}

/// Load `--model` and reconcile it with the flags given on the command line.
fn load_trained(
    matches: &ArgMatches,
    config: GraphProtConfig,
    action: &str,
) -> Result<TrainedGraphProt, GraphProtError> {
    let path = matches.get_one::<String>("model").ok_or_else(|| {
        GraphProtError::InvalidParameter(format!("--model is required for action {action}"))
    })?;
    let model = Model::load(path)?;

    if let Some(task) = requested_task(matches)? {
        if task != model.task() {
            return Err(GraphProtError::ParameterMismatch(format!(
                "model is a {} model, --mode {task} was requested",
                model.task()
            )));
        }
    }
    model.check_compatible(&apply_overrides(matches, *model.params()))?;
    Ok(TrainedGraphProt::from_model(config, model))
}

fn output_path(prefix: &str, artifact: Artifact) -> std::path::PathBuf {
    let path = artifact.path_for(prefix);
    info!("Writing {}", path.display());
    path
}

fn run(matches: &ArgMatches) -> Result<(), GraphProtError> {
    let action = matches
        .get_one::<String>("action")
        .map(String::as_str)
        .unwrap_or_default();
    let prefix = matches
        .get_one::<String>("prefix")
        .map(String::as_str)
        .unwrap_or("GraphProt");

    let (file_task, base) = match matches.get_one::<String>("params") {
        Some(path) => read_params_format(BufReader::new(File::open(Path::new(path))?))?,
        None => (None, ParameterSet::default()),
    };
    let task = requested_task(matches)?
        .or(file_task)
        .unwrap_or_default();

    let config = GraphProtConfig {
        task,
        seed: matches.get_one::<u64>("seed").copied().unwrap_or(DEFAULT_SEED),
        folds: matches.get_one::<usize>("folds").copied().unwrap_or(DEFAULT_FOLDS),
        quiet: matches.get_flag("quiet"),
        num_threads: matches.get_one::<usize>("threads").copied(),
        ..Default::default()
    };

    match action {
        "train" | "cv" | "ls" => {
            let params = apply_overrides(matches, base);
            params.validate()?;
            let samples = load_samples(
                matches,
                task,
                SetPurpose::Training,
                StructureUse::for_training(&params),
            )?;
            let pipeline = UntrainedGraphProt::with_config(config)?;

            match action {
                "train" => {
                    let trained = pipeline.train(samples.samples(), &params)?;
                    trained.model().save(output_path(prefix, Artifact::Model))?;
                }
                "cv" => {
                    let result = pipeline.cross_validate(samples.samples(), &params)?;
                    write_file(output_path(prefix, Artifact::CvResults), |w| {
                        write_cv_results_format(w, &result)
                    })?;
                }
                _ => {
                    let result = pipeline.line_search(
                        samples.samples(),
                        &params,
                        &SearchSpace::for_task(task),
                    )?;
                    write_file(output_path(prefix, Artifact::Params), |w| {
                        write_params_format(w, task, &result.best)
                    })?;
                }
            }
        }
        _ => {
            let trained = load_trained(matches, config, action)?;
            let samples = load_samples(
                matches,
                trained.config.task,
                SetPurpose::Scoring,
                trained.model().structure_use(),
            )?;
            let samples = samples.samples();

            match action {
                "predict" => {
                    let scores = trained.predict(samples)?;
                    write_file(output_path(prefix, Artifact::Predictions), |w| {
                        write_predictions_format(w, samples, &scores)
                    })?;
                }
                "predict_profile" => {
                    let profiles = trained.profile(samples)?;
                    write_file(output_path(prefix, Artifact::Profile), |w| {
                        write_profile_format(w, &profiles)
                    })?;
                }
                "predict_has" => {
                    let percentile = matches
                        .get_one::<f64>("percentile")
                        .copied()
                        .unwrap_or(DEFAULT_PERCENTILE);
                    let sites = trained.high_affinity_sites(samples, percentile)?;
                    write_file(output_path(prefix, Artifact::HighAffinitySites), |w| {
                        write_has_format(w, &sites)
                    })?;
                }
                _ => {
                    let selection = matches
                        .get_one::<f64>("percentile")
                        .map_or_else(MotifSelection::default, |&p| MotifSelection::Percentile(p));
                    let summary = trained.motifs(samples, selection)?;

                    write_file(output_path(prefix, Artifact::SequenceMotif), |w| {
                        write_motif_format(w, &summary.sequence, summary.flank)
                    })?;
                    if let Some(structure) = &summary.structure {
                        write_file(output_path(prefix, Artifact::StructureMotif), |w| {
                            write_motif_format(w, structure, summary.flank)
                        })?;
                    }
                    if let Some(paired) = &summary.paired_unpaired {
                        write_file(output_path(prefix, Artifact::PairedUnpairedMotif), |w| {
                            write_motif_format(w, paired, summary.flank)
                        })?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Main entry point for the GraphProt CLI application.
fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("quiet"));
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
