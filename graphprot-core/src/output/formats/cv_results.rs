use std::io::Write;

use crate::evaluation::{CvResult, FoldMetrics};
use crate::types::GraphProtError;

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v:.6}"))
}

fn metric_columns(metrics: &FoldMetrics) -> String {
    match *metrics {
        FoldMetrics::Classification {
            accuracy,
            auc,
            average_precision,
        } => format!(
            "{accuracy:.6}\t{}\t{}",
            optional(auc),
            optional(average_precision)
        ),
        FoldMetrics::Regression {
            pearson,
            spearman,
            mse,
        } => format!("{}\t{}\t{mse:.6}", optional(pearson), optional(spearman)),
    }
}

/// Header, one line per fold, then the mean and the selection objective.
pub fn write_cv_results_format<W: Write>(
    writer: &mut W,
    result: &CvResult,
) -> Result<(), GraphProtError> {
    let header = match result.mean() {
        FoldMetrics::Classification { .. } => "accuracy\tauc\taverage_precision",
        FoldMetrics::Regression { .. } => "pearson\tspearman\tmse",
    };
    writeln!(writer, "fold\ttest_size\t{header}")?;
    for fold in &result.folds {
        writeln!(
            writer,
            "{}\t{}\t{}",
            fold.fold + 1,
            fold.test_indices.len(),
            metric_columns(&fold.metrics)
        )?;
    }
    let total: usize = result.folds.iter().map(|f| f.test_indices.len()).sum();
    writeln!(writer, "mean\t{total}\t{}", metric_columns(&result.mean()))?;
    writeln!(writer, "# objective {:.6}", result.objective())?;
    Ok(())
}
