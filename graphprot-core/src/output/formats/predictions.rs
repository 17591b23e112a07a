use std::io::Write;

use crate::sample::Sample;
use crate::types::GraphProtError;

/// One line per sample, input order: `id<TAB>target<TAB>score`
pub fn write_predictions_format<W: Write>(
    writer: &mut W,
    samples: &[Sample],
    scores: &[f64],
) -> Result<(), GraphProtError> {
    for (sample, score) in samples.iter().zip(scores) {
        writeln!(writer, "{}\t{}\t{:.6}", sample.id, sample.target, score)?;
    }
    Ok(())
}
