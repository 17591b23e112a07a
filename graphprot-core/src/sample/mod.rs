//! Sample model: validated sequences with optional structure and viewpoint.
//!
//! A [`Sample`] is the canonical in-memory form of one training or scoring
//! instance. Raw records coming from files are validated once, at
//! construction; the encoder never sees malformed input.
//!
//! ## Viewpoint
//!
//! Sequence case marks the viewpoint: uppercase positions are inside, lowercase
//! positions outside. A sequence written in a single case has no viewpoint and
//! every position is eligible as a feature root.
//!
//! ## Modules
//!
//! - [`structure`]: dot-bracket parsing and loop contexts
//! - [`io`]: FASTA, affinity and structure file readers
//!
//! ## Examples
//!
//! ```rust
//! use graphprot_core::sample::Sample;
//! use graphprot_core::types::{Label, Target};
//!
//! let sample = Sample::parse(
//!     "site1",
//!     b"acguACGUacgu",
//!     Some(b"((((....))))".as_slice()),
//!     Target::Class(Label::Positive),
//! )
//! .unwrap();
//!
//! assert_eq!(sample.len(), 12);
//! assert_eq!(sample.eligible_positions(), vec![4, 5, 6, 7]);
//! ```

pub mod io;
pub mod structure;

use tracing::warn;

use crate::config::ParameterSet;
use crate::types::{GraphProtError, Label, Nucleotide, Target};
use structure::Structure;

/// One validated training or scoring instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Identifier taken from the FASTA header
    pub id: String,
    /// Nucleotide sequence (T normalized to U)
    pub sequence: Vec<Nucleotide>,
    /// Secondary structure, same length as the sequence
    pub structure: Option<Structure>,
    /// Positions inside the viewpoint, same length as the sequence
    pub viewpoint_mask: Option<Vec<bool>>,
    /// Class label, affinity, or nothing
    pub target: Target,
    /// Position of the record in the input files, when it came from them
    pub source_index: Option<usize>,
}

impl Sample {
    /// Validate and assemble a sample from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns the violated constraint as a reason string: empty sequence or a
    /// structure / viewpoint mask whose length differs from the sequence.
    pub fn new(
        id: impl Into<String>,
        sequence: Vec<Nucleotide>,
        structure: Option<Structure>,
        viewpoint_mask: Option<Vec<bool>>,
        target: Target,
    ) -> Result<Self, String> {
        if sequence.is_empty() {
            return Err("empty sequence".to_string());
        }
        if let Some(structure) = &structure {
            if structure.len() != sequence.len() {
                return Err(format!(
                    "structure length {} differs from sequence length {}",
                    structure.len(),
                    sequence.len()
                ));
            }
        }
        if let Some(mask) = &viewpoint_mask {
            if mask.len() != sequence.len() {
                return Err(format!(
                    "viewpoint mask length {} differs from sequence length {}",
                    mask.len(),
                    sequence.len()
                ));
            }
        }
        if let Target::Affinity(affinity) = target {
            if !affinity.is_finite() {
                return Err(format!("affinity {affinity} is not a finite number"));
            }
        }

        Ok(Self {
            id: id.into(),
            sequence,
            structure,
            viewpoint_mask,
            target,
            source_index: None,
        })
    }

    /// Parse raw sequence bytes (case marks the viewpoint) and an optional
    /// dot-bracket structure.
    ///
    /// # Errors
    ///
    /// Returns the violated constraint as a reason string.
    pub fn parse(
        id: impl Into<String>,
        raw_sequence: &[u8],
        raw_structure: Option<&[u8]>,
        target: Target,
    ) -> Result<Self, String> {
        let sequence = raw_sequence
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Nucleotide::from_byte(c)
                    .ok_or_else(|| format!("invalid nucleotide '{}' at position {i}", c as char))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let structure = raw_structure
            .map(Structure::from_dot_bracket)
            .transpose()?;

        Self::new(
            id,
            sequence,
            structure,
            viewpoint_from_case(raw_sequence),
            target,
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Index to report in errors: the input record index when known,
    /// otherwise `position` in the caller's slice.
    #[must_use]
    pub fn index_or(&self, position: usize) -> usize {
        self.source_index.unwrap_or(position)
    }

    /// Positions allowed to act as feature roots.
    ///
    /// Marked viewpoint positions, or every position when no viewpoint is marked.
    #[must_use]
    pub fn eligible_positions(&self) -> Vec<usize> {
        match &self.viewpoint_mask {
            Some(mask) if mask.iter().any(|&inside| inside) => mask
                .iter()
                .enumerate()
                .filter_map(|(i, &inside)| inside.then_some(i))
                .collect(),
            _ => (0..self.len()).collect(),
        }
    }

    /// Sequence as a string, viewpoint in uppercase and the rest in lowercase
    #[must_use]
    pub fn sequence_string(&self) -> String {
        self.sequence
            .iter()
            .enumerate()
            .map(|(i, nucleotide)| {
                let c = nucleotide.to_char();
                match &self.viewpoint_mask {
                    Some(mask) if !mask[i] => c.to_ascii_lowercase(),
                    _ => c,
                }
            })
            .collect()
    }
}

/// Mixed case yields a mask; a single case yields none.
fn viewpoint_from_case(raw_sequence: &[u8]) -> Option<Vec<bool>> {
    let letters = raw_sequence.iter().filter(|c| c.is_ascii_alphabetic());
    let (mut upper, mut lower) = (false, false);
    for c in letters {
        upper |= c.is_ascii_uppercase();
        lower |= c.is_ascii_lowercase();
    }
    (upper && lower).then(|| {
        raw_sequence
            .iter()
            .map(|c| c.is_ascii_uppercase())
            .collect()
    })
}

/// Whether encoding `samples` with `params` uses secondary structure.
///
/// # Errors
///
/// [`GraphProtError::MalformedSample`] for the first sample without a
/// structure when others carry one, since the encodings would differ.
pub fn structure_in_use(
    samples: &[Sample],
    params: &ParameterSet,
) -> Result<bool, GraphProtError> {
    if params.sequence_only || samples.iter().all(|s| s.structure.is_none()) {
        return Ok(false);
    }
    match samples.iter().enumerate().find(|(_, s)| s.structure.is_none()) {
        Some((position, sample)) => Err(GraphProtError::MalformedSample {
            index: sample.index_or(position),
            id: sample.id.clone(),
            reason: "missing structure while other samples carry one".to_string(),
        }),
        None => Ok(true),
    }
}

/// Raw, unvalidated input record as produced by the file readers.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub id: String,
    pub sequence: Vec<u8>,
    pub structure: Option<Vec<u8>>,
    pub target: Target,
    /// Problem found while reading the record's companion inputs
    /// (affinity line, structure entry); the record is rejected with it.
    pub defect: Option<String>,
}

/// How a [`SampleSet`] treats secondary structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructureUse {
    /// Once any record carries a structure, every record must
    #[default]
    Consistent,
    /// Every record must carry a structure
    Required,
    /// The encoding ignores structures, so missing ones are fine
    Ignored,
}

impl StructureUse {
    /// Policy for training on samples encoded with `params`
    #[must_use]
    pub const fn for_training(params: &ParameterSet) -> Self {
        if params.sequence_only {
            Self::Ignored
        } else {
            Self::Consistent
        }
    }
}

/// What a [`SampleSet`] will be used for; decides the escalation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPurpose {
    Training,
    Scoring,
}

/// A sample rejected at construction, with its input index.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSample {
    pub index: usize,
    pub id: String,
    pub reason: String,
}

impl RejectedSample {
    #[must_use]
    pub fn to_error(&self) -> GraphProtError {
        GraphProtError::MalformedSample {
            index: self.index,
            id: self.id.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Validated samples in input order, plus the records that were rejected.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    rejected: Vec<RejectedSample>,
}

impl SampleSet {
    /// Validate records, keeping the good ones and logging the rejected ones.
    ///
    /// A record is rejected when it carries a reader defect, fails sample
    /// validation, or lacks a structure that `structures` asks for. Kept
    /// samples remember their record index for error reporting.
    ///
    /// # Errors
    ///
    /// Escalates to [`GraphProtError::EmptyTrainingSet`] or
    /// [`GraphProtError::EmptyScoringSet`] when no record survives.
    pub fn from_records<I>(
        records: I,
        purpose: SetPurpose,
        structures: StructureUse,
    ) -> Result<Self, GraphProtError>
    where
        I: IntoIterator<Item = SampleRecord>,
    {
        let records: Vec<SampleRecord> = records.into_iter().collect();
        let total = records.len();
        let structure_required = match structures {
            StructureUse::Required => true,
            StructureUse::Consistent => records.iter().any(|r| r.structure.is_some()),
            StructureUse::Ignored => false,
        };
        let mut set = Self::default();

        for (index, record) in records.into_iter().enumerate() {
            let checked = match record.defect {
                Some(defect) => Err(defect),
                None if structure_required && record.structure.is_none() => {
                    Err("missing structure (structures are used for this set)".to_string())
                }
                None => Sample::parse(
                    record.id.clone(),
                    &record.sequence,
                    record.structure.as_deref(),
                    record.target,
                ),
            };
            match checked {
                Ok(mut sample) => {
                    sample.source_index = Some(index);
                    set.samples.push(sample);
                }
                Err(reason) => {
                    let rejected = RejectedSample {
                        index,
                        id: record.id,
                        reason,
                    };
                    warn!("{}", rejected.to_error());
                    set.rejected.push(rejected);
                }
            }
        }

        if set.samples.is_empty() {
            let detail = match set.rejected.first() {
                Some(first) => format!(
                    "all {total} samples were rejected (first: {})",
                    first.to_error()
                ),
                None => "no samples given".to_string(),
            };
            return Err(match purpose {
                SetPurpose::Training => GraphProtError::EmptyTrainingSet(detail),
                SetPurpose::Scoring => GraphProtError::EmptyScoringSet(detail),
            });
        }

        Ok(set)
    }

    /// Wrap already-validated samples.
    #[must_use]
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            rejected: Vec::new(),
        }
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedSample] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Count of (positive, negative) class labels
    #[must_use]
    pub fn class_counts(&self) -> (usize, usize) {
        self.samples
            .iter()
            .fold((0, 0), |(pos, neg), sample| match sample.target.label() {
                Some(Label::Positive) => (pos + 1, neg),
                Some(Label::Negative) => (pos, neg + 1),
                None => (pos, neg),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, sequence: &str, structure: Option<&str>) -> SampleRecord {
        SampleRecord {
            id: id.to_string(),
            sequence: sequence.as_bytes().to_vec(),
            structure: structure.map(|s| s.as_bytes().to_vec()),
            target: Target::Class(Label::Positive),
            defect: None,
        }
    }

    #[test]
    fn test_parse_normalizes_dna() {
        let sample = Sample::parse("s", b"ACGT", None, Target::Unlabeled).unwrap();
        assert_eq!(
            sample.sequence,
            vec![Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::U]
        );
        assert!(sample.viewpoint_mask.is_none());
        assert_eq!(sample.sequence_string(), "ACGU");
    }

    #[test]
    fn test_viewpoint_from_mixed_case() {
        let sample = Sample::parse("s", b"acGUa", None, Target::Unlabeled).unwrap();
        assert_eq!(
            sample.viewpoint_mask,
            Some(vec![false, false, true, true, false])
        );
        assert_eq!(sample.eligible_positions(), vec![2, 3]);
        assert_eq!(sample.sequence_string(), "acGUa");
    }

    #[test]
    fn test_single_case_has_no_viewpoint() {
        let lower = Sample::parse("s", b"acgu", None, Target::Unlabeled).unwrap();
        assert!(lower.viewpoint_mask.is_none());
        assert_eq!(lower.eligible_positions(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_mask_falls_back_to_all_positions() {
        let sample = Sample::new(
            "s",
            vec![Nucleotide::A, Nucleotide::C],
            None,
            Some(vec![false, false]),
            Target::Unlabeled,
        )
        .unwrap();
        assert_eq!(sample.eligible_positions(), vec![0, 1]);
    }

    #[test]
    fn test_rejects_malformed_parts() {
        assert_eq!(
            Sample::parse("s", b"", None, Target::Unlabeled).unwrap_err(),
            "empty sequence"
        );
        assert!(
            Sample::parse("s", b"ACXU", None, Target::Unlabeled)
                .unwrap_err()
                .contains("invalid nucleotide 'X'")
        );
        assert!(
            Sample::parse("s", b"ACGU", Some(b"(..).".as_slice()), Target::Unlabeled)
                .unwrap_err()
                .contains("structure length 5")
        );
        assert!(
            Sample::new(
                "s",
                vec![Nucleotide::A],
                None,
                Some(vec![true, false]),
                Target::Unlabeled
            )
            .unwrap_err()
            .contains("viewpoint mask length")
        );
        assert!(
            Sample::parse("s", b"ACGU", None, Target::Affinity(f64::NAN))
                .unwrap_err()
                .contains("finite")
        );
    }

    #[test]
    fn test_sample_set_keeps_valid_and_records_rejected() {
        let set = SampleSet::from_records(
            vec![
                record("good", "ACGU", Some("(..)")),
                record("bad", "AC#U", None),
                record("short_structure", "ACGU", Some("..")),
            ],
            SetPurpose::Training,
            StructureUse::Ignored,
        )
        .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.samples()[0].id, "good");
        assert_eq!(set.rejected().len(), 2);
        assert_eq!(set.rejected()[0].index, 1);
        assert_eq!(set.rejected()[1].id, "short_structure");
    }

    #[test]
    fn test_sample_set_escalates_when_everything_is_rejected() {
        let training = SampleSet::from_records(
            vec![record("bad", "", None)],
            SetPurpose::Training,
            StructureUse::Consistent,
        );
        assert!(matches!(training, Err(GraphProtError::EmptyTrainingSet(_))));

        let scoring = SampleSet::from_records(
            vec![record("bad", "", None)],
            SetPurpose::Scoring,
            StructureUse::Consistent,
        );
        assert!(matches!(scoring, Err(GraphProtError::EmptyScoringSet(_))));

        let nothing =
            SampleSet::from_records(Vec::new(), SetPurpose::Scoring, StructureUse::Consistent);
        assert!(matches!(nothing, Err(GraphProtError::EmptyScoringSet(_))));
    }

    #[test]
    fn test_class_counts() {
        let mut negative = record("n", "ACGU", None);
        negative.target = Target::Class(Label::Negative);
        let set = SampleSet::from_records(
            vec![record("p1", "ACGU", None), record("p2", "GGGG", None), negative],
            SetPurpose::Training,
            StructureUse::Consistent,
        )
        .unwrap();
        assert_eq!(set.class_counts(), (2, 1));
    }

    #[test]
    fn test_kept_samples_remember_their_record_index() {
        let set = SampleSet::from_records(
            vec![
                record("broken", "AC#U", None),
                record("first_good", "ACGU", None),
                record("second_good", "GGCC", None),
            ],
            SetPurpose::Scoring,
            StructureUse::Consistent,
        )
        .unwrap();
        assert_eq!(set.samples()[0].source_index, Some(1));
        assert_eq!(set.samples()[1].index_or(0), 2);
        assert_eq!(
            Sample::parse("s", b"ACGU", None, Target::Unlabeled).unwrap().index_or(5),
            5
        );
    }

    #[test]
    fn test_reader_defects_reject_only_their_record() {
        let mut bad_affinity = record("b", "GGCC", None);
        bad_affinity.defect = Some("'NaNx' is not a valid affinity".to_string());
        let set = SampleSet::from_records(
            vec![record("a", "ACGU", None), bad_affinity, record("c", "UUUU", None)],
            SetPurpose::Training,
            StructureUse::Consistent,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.rejected()[0].index, 1);
        assert!(set.rejected()[0].reason.contains("NaNx"));
    }

    #[test]
    fn test_mixed_structure_presence_rejects_unstructured_records() {
        let records = vec![
            record("folded", "GGAACC", Some("((..))")),
            record("bare", "GGAACC", None),
        ];

        let consistent =
            SampleSet::from_records(records.clone(), SetPurpose::Training, StructureUse::Consistent)
                .unwrap();
        assert_eq!(consistent.len(), 1);
        assert_eq!(consistent.samples()[0].id, "folded");
        assert!(consistent.rejected()[0].reason.contains("missing structure"));

        let ignored =
            SampleSet::from_records(records, SetPurpose::Training, StructureUse::Ignored).unwrap();
        assert_eq!(ignored.len(), 2);

        let required = SampleSet::from_records(
            vec![record("bare", "GGAACC", None)],
            SetPurpose::Scoring,
            StructureUse::Required,
        );
        assert!(matches!(required, Err(GraphProtError::EmptyScoringSet(_))));
    }

    #[test]
    fn test_structure_in_use() {
        let folded = Sample::parse(
            "folded",
            b"GGAACC",
            Some(b"((..))".as_slice()),
            Target::Unlabeled,
        )
        .unwrap();
        let mut bare = Sample::parse("bare", b"GGAACC", None, Target::Unlabeled).unwrap();
        bare.source_index = Some(4);
        let params = ParameterSet::default();

        assert!(!structure_in_use(std::slice::from_ref(&bare), &params).unwrap());
        assert!(structure_in_use(std::slice::from_ref(&folded), &params).unwrap());
        assert!(!structure_in_use(&[folded.clone()], &params.with_sequence_only(true)).unwrap());

        match structure_in_use(&[folded, bare], &params) {
            Err(GraphProtError::MalformedSample { index, id, .. }) => {
                assert_eq!(index, 4);
                assert_eq!(id, "bare");
            }
            other => panic!("Expected MalformedSample, got {other:?}"),
        }
    }
}
