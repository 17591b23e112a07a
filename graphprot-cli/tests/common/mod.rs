#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use sha2::{Digest, Sha256};

/// Absolute path of a fixture under `tests/data`
pub fn data(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Output prefix inside a temporary directory
pub fn prefix_in(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

/// Runs the GraphProt CLI quietly and requires success
pub fn run_graphprot(args: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("graphprot")?;
    cmd.arg("--quiet").args(args);
    cmd.assert().success();
    Ok(())
}

/// Runs the GraphProt CLI and returns its raw output, whatever the exit status
pub fn run_graphprot_output(args: &[&str]) -> Result<Output, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("graphprot")?;
    Ok(cmd.arg("--quiet").args(args).output()?)
}

/// Classification training data with structures
pub fn classification_inputs() -> Vec<String> {
    vec![
        "--fasta".to_string(),
        data("positives.fa"),
        "--negfasta".to_string(),
        data("negatives.fa"),
        "--structures".to_string(),
        data("positives.struct"),
        "--negstructures".to_string(),
        data("negatives.struct"),
    ]
}

pub fn sha256_file<P: AsRef<Path>>(path: P) -> String {
    let bytes = fs::read(path).expect("artifact should exist");
    format!("{:x}", Sha256::digest(&bytes))
}

/// Tab-separated rows of a text artifact
pub fn read_rows<P: AsRef<Path>>(path: P) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .expect("artifact should exist")
        .lines()
        .map(|line| line.split('\t').map(String::from).collect())
        .collect()
}

/// Line-based similarity ratio (0..1)
pub fn similarity(a: &str, b: &str) -> f32 {
    similar::TextDiff::from_lines(a, b).ratio()
}

/// Panics with a unified diff when two texts differ
pub fn assert_same_text(expected: &str, actual: &str) {
    if expected != actual {
        let diff = similar::TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        panic!(
            "texts differ (similarity {:.3}):\n{diff}",
            similarity(expected, actual)
        );
    }
}
