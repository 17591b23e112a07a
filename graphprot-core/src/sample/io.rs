use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use bio::io::fasta;
use tracing::warn;

use crate::sample::SampleRecord;
use crate::types::{GraphProtError, Label, Target};

/// Identifier, description and raw sequence bytes of one FASTA entry
pub type FastaRecord = (String, Option<String>, Vec<u8>);

/// Read all records of a FASTA file using rust-bio.
pub fn read_fasta_sequences<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>, GraphProtError> {
    let file = File::open(path.as_ref())?;
    let reader = fasta::Reader::new(file);
    let mut sequences = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| GraphProtError::ParseError(e.to_string()))?;
        let id = record.id().to_string();
        let description = record.desc().map(String::from);
        let seq = record.seq().to_vec();
        sequences.push((id, description, seq));
    }

    Ok(sequences)
}

/// Read one affinity value per non-empty line.
///
/// Lines may carry an identifier in front of the value (`id<TAB>value`); the
/// last whitespace-separated field is taken as the affinity. A line that does
/// not hold a number yields an `Err` entry so that only its sample is lost;
/// failing to read the file at all is an error.
pub fn read_affinities<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<Result<f64, String>>, GraphProtError> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_number, line)| {
            let field = line.split_whitespace().last().unwrap_or_default();
            field.parse::<f64>().map_err(|_| {
                format!("affinity line {}: '{field}' is not a number", line_number + 1)
            })
        })
        .collect())
}

/// Attach supervision and optional structures to FASTA records.
///
/// Structures are matched to sequences by identifier. Targets are matched by
/// position. A sequence with no structure entry, with no target, or with a
/// target that failed to parse becomes a record carrying a `defect`, so that
/// sample validation rejects it alone.
pub fn assemble_records(
    sequences: Vec<FastaRecord>,
    structures: Option<Vec<FastaRecord>>,
    targets: Vec<Result<Target, String>>,
) -> Vec<SampleRecord> {
    if targets.len() > sequences.len() {
        warn!(
            "{} targets given for {} sequences, ignoring the surplus",
            targets.len(),
            sequences.len()
        );
    }

    let mut structure_by_id: Option<HashMap<String, Vec<u8>>> = structures.map(|entries| {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (id, _, dot_bracket) in entries {
            if by_id.contains_key(&id) {
                warn!("duplicate structure entry for '{id}', keeping the first");
            } else {
                by_id.insert(id, dot_bracket);
            }
        }
        by_id
    });

    let mut targets = targets.into_iter();
    let records: Vec<SampleRecord> = sequences
        .into_iter()
        .map(|(id, _, sequence)| {
            let mut defects = Vec::new();
            let target = match targets.next() {
                Some(Ok(target)) => target,
                Some(Err(reason)) => {
                    defects.push(reason);
                    Target::Unlabeled
                }
                None => {
                    defects.push("no target given".to_string());
                    Target::Unlabeled
                }
            };
            let structure = match structure_by_id.as_mut() {
                Some(by_id) => {
                    let found = by_id.remove(&id);
                    if found.is_none() {
                        defects.push(format!("no structure entry for '{id}'"));
                    }
                    found
                }
                None => None,
            };
            SampleRecord {
                id,
                sequence,
                structure,
                target,
                defect: (!defects.is_empty()).then(|| defects.join("; ")),
            }
        })
        .collect();

    if let Some(unused) = structure_by_id.filter(|by_id| !by_id.is_empty()) {
        warn!("{} structure entries match no sequence", unused.len());
    }

    records
}

/// Classification targets: positives first, then negatives.
#[must_use]
pub fn class_targets(positives: usize, negatives: usize) -> Vec<Target> {
    std::iter::repeat_n(Target::Class(Label::Positive), positives)
        .chain(std::iter::repeat_n(Target::Class(Label::Negative), negatives))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{SampleSet, SetPurpose, StructureUse};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ok_targets(targets: Vec<Target>) -> Vec<Result<Target, String>> {
        targets.into_iter().map(Ok).collect()
    }

    fn temp_file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_fasta_sequences_multiple() {
        let file = temp_file_with(">seq1 first\nACGU\nacgu\n>seq2\nGGGG\n");
        let sequences = read_fasta_sequences(file.path()).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].0, "seq1");
        assert_eq!(sequences[0].1, Some("first".to_string()));
        assert_eq!(sequences[0].2, b"ACGUacgu".to_vec());
        assert_eq!(sequences[1].1, None);
    }

    #[test]
    fn test_read_fasta_sequences_empty_file() {
        let file = temp_file_with("");
        assert!(read_fasta_sequences(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_read_fasta_sequences_file_not_found() {
        match read_fasta_sequences("nonexistent_file.fa") {
            Err(GraphProtError::IoError(_)) => {}
            other => panic!("Expected IoError for missing file, got {other:?}"),
        }
    }

    #[test]
    fn test_read_affinities() {
        let file = temp_file_with("0.5\n\nseq2\t-1.25\n3e-1\n");
        let affinities = read_affinities(file.path()).unwrap();
        assert_eq!(affinities, vec![Ok(0.5), Ok(-1.25), Ok(0.3)]);
    }

    #[test]
    fn test_read_affinities_keeps_lines_after_a_bad_one() {
        let file = temp_file_with("0.5\n1.5\nNaNx\n2.0\n");
        let affinities = read_affinities(file.path()).unwrap();

        assert_eq!(affinities.len(), 4);
        assert_eq!(affinities[1], Ok(1.5));
        assert!(affinities[2].as_ref().unwrap_err().contains("line 3"));
        assert_eq!(affinities[3], Ok(2.0));
    }

    #[test]
    fn test_read_affinities_file_not_found() {
        assert!(matches!(
            read_affinities("nonexistent_affinities.txt"),
            Err(GraphProtError::IoError(_))
        ));
    }

    #[test]
    fn test_bad_affinity_rejects_only_its_sample() {
        let file = temp_file_with("0.5\n1.5\nNaNx\n2.0\n");
        let sequences: Vec<FastaRecord> = ["s0", "s1", "s2", "s3"]
            .iter()
            .map(|id| (id.to_string(), None, b"ACGUACGU".to_vec()))
            .collect();
        let targets = read_affinities(file.path())
            .unwrap()
            .into_iter()
            .map(|entry| entry.map(Target::Affinity))
            .collect();

        let records = assemble_records(sequences, None, targets);
        let set = SampleSet::from_records(records, SetPurpose::Training, StructureUse::Consistent)
            .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.rejected()[0].id, "s2");
        assert_eq!(set.samples()[2].target, Target::Affinity(2.0));
        assert_eq!(set.samples()[2].source_index, Some(3));
    }

    #[test]
    fn test_assemble_records_with_structures() {
        let sequences = vec![
            ("a".to_string(), None, b"ACGU".to_vec()),
            ("b".to_string(), None, b"GGCC".to_vec()),
        ];
        let structures = vec![
            ("b".to_string(), None, b"....".to_vec()),
            ("a".to_string(), None, b"(..)".to_vec()),
        ];
        let records =
            assemble_records(sequences, Some(structures), ok_targets(class_targets(1, 1)));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].structure, Some(b"(..)".to_vec()));
        assert_eq!(records[1].structure, Some(b"....".to_vec()));
        assert_eq!(records[1].target, Target::Class(Label::Negative));
        assert!(records.iter().all(|r| r.defect.is_none()));
    }

    #[test]
    fn test_assemble_records_marks_unmatched_inputs() {
        let sequences = vec![
            ("a".to_string(), None, b"ACGU".to_vec()),
            ("b".to_string(), None, b"GGCC".to_vec()),
        ];
        let structures = vec![("a".to_string(), None, b"....".to_vec())];

        let records = assemble_records(
            sequences.clone(),
            Some(structures),
            ok_targets(class_targets(2, 0)),
        );
        assert!(records[0].defect.is_none());
        assert!(records[1].defect.as_deref().unwrap().contains("no structure entry for 'b'"));

        let records = assemble_records(sequences, None, vec![Ok(Target::Affinity(1.0))]);
        assert!(records[0].defect.is_none());
        assert_eq!(records[1].defect.as_deref(), Some("no target given"));
    }

    #[test]
    fn test_class_targets_order() {
        let targets = class_targets(2, 1);
        assert_eq!(
            targets,
            vec![
                Target::Class(Label::Positive),
                Target::Class(Label::Positive),
                Target::Class(Label::Negative),
            ]
        );
    }
}
