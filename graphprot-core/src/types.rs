use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supervised task a model is trained for.
///
/// # Examples
///
/// ```rust
/// use graphprot_core::types::Task;
///
/// assert_eq!("regression".parse::<Task>().unwrap(), Task::Regression);
/// assert_eq!(Task::Classification.to_string(), "classification");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Binary classification with hinge loss
    #[default]
    Classification,
    /// Scalar regression with epsilon-insensitive loss
    Regression,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => write!(f, "classification"),
            Self::Regression => write!(f, "regression"),
        }
    }
}

impl std::str::FromStr for Task {
    type Err = GraphProtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(Self::Classification),
            "regression" => Ok(Self::Regression),
            other => Err(GraphProtError::InvalidParameter(format!(
                "unknown mode '{other}' (expected classification or regression)"
            ))),
        }
    }
}

/// Class label of a classification sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Signed value used by the margin learner (+1 / -1)
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    #[must_use]
    pub fn from_margin(margin: f64) -> Self {
        if margin >= 0.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "1"),
            Self::Negative => write!(f, "-1"),
        }
    }
}

/// Supervision attached to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Target {
    /// Class membership for classification
    Class(Label),
    /// Measured binding affinity for regression
    Affinity(f64),
    /// No supervision (scoring only)
    #[default]
    Unlabeled,
}

impl Target {
    /// Numeric training target: +1/-1 for classes, the affinity for regression
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Class(label) => Some(label.sign()),
            Self::Affinity(affinity) => Some(*affinity),
            Self::Unlabeled => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> Option<Label> {
        match self {
            Self::Class(label) => Some(*label),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(label) => write!(f, "{label}"),
            Self::Affinity(affinity) => write!(f, "{affinity}"),
            Self::Unlabeled => write!(f, "NA"),
        }
    }
}

/// Nucleotide alphabet. DNA input is read as RNA (T becomes U).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleotide {
    A,
    C,
    G,
    U,
    N,
}

impl Nucleotide {
    /// Symbols counted in sequence motifs, in column order
    pub const MOTIF_ALPHABET: [Self; 4] = [Self::A, Self::C, Self::G, Self::U];

    /// Parse a case-insensitive nucleotide character
    ///
    /// ```rust
    /// use graphprot_core::types::Nucleotide;
    ///
    /// assert_eq!(Nucleotide::from_byte(b't'), Some(Nucleotide::U));
    /// assert_eq!(Nucleotide::from_byte(b'X'), None);
    /// ```
    #[must_use]
    pub const fn from_byte(c: u8) -> Option<Self> {
        match c.to_ascii_uppercase() {
            b'A' => Some(Self::A),
            b'C' => Some(Self::C),
            b'G' => Some(Self::G),
            b'T' | b'U' => Some(Self::U),
            b'N' => Some(Self::N),
            _ => None,
        }
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::U => 'U',
            Self::N => 'N',
        }
    }
}

/// Loop context of a position inside an RNA secondary structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureContext {
    /// Exterior (unpaired, not enclosed by any pair)
    External,
    /// Hairpin loop
    Hairpin,
    /// Interior loop (unpaired on both sides of the enclosing pair)
    Interior,
    /// Multiloop
    Multi,
    /// Stem (paired)
    Stem,
    /// Bulge (unpaired on one side only)
    Bulge,
}

impl StructureContext {
    /// Symbols counted in structure motifs, in column order
    pub const MOTIF_ALPHABET: [Self; 6] = [
        Self::External,
        Self::Hairpin,
        Self::Interior,
        Self::Multi,
        Self::Stem,
        Self::Bulge,
    ];

    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::External => 'E',
            Self::Hairpin => 'H',
            Self::Interior => 'I',
            Self::Multi => 'M',
            Self::Stem => 'S',
            Self::Bulge => 'B',
        }
    }

    /// Coarsened structural class used when abstraction is enabled
    #[must_use]
    pub const fn abstract_class(self) -> StructureClass {
        match self {
            Self::Stem => StructureClass::Paired,
            Self::External => StructureClass::Unpaired,
            Self::Hairpin | Self::Interior | Self::Multi | Self::Bulge => StructureClass::Loop,
        }
    }

    #[must_use]
    pub const fn is_paired(self) -> bool {
        matches!(self, Self::Stem)
    }
}

/// Coarse structural classes (abstraction alphabet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureClass {
    Paired,
    Loop,
    Unpaired,
}

impl StructureClass {
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Paired => 'P',
            Self::Loop => 'L',
            Self::Unpaired => 'U',
        }
    }
}

/// Error types raised by the modeling pipeline
#[derive(Error, Debug)]
pub enum GraphProtError {
    /// A sample violates a length, alphabet or structure constraint
    #[error("Malformed sample #{index} ({id}): {reason}")]
    MalformedSample {
        index: usize,
        id: String,
        reason: String,
    },
    /// No usable samples remain for training
    #[error("Empty training set: {0}")]
    EmptyTrainingSet(String),
    /// No usable samples remain for scoring
    #[error("Empty scoring set: {0}")]
    EmptyScoringSet(String),
    /// A loaded model cannot be used with the requested encoding
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),
    /// Too few samples (or classes) for the requested partitioning
    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),
    /// Parameter value outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Error parsing input data
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl GraphProtError {
    /// Replace the sample index of a [`GraphProtError::MalformedSample`].
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        match self {
            Self::MalformedSample { id, reason, .. } => Self::MalformedSample { index, id, reason },
            other => other,
        }
    }
}

impl From<serde_json::Error> for GraphProtError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
