//! Held-out evaluation metrics.
//!
//! Class labels are passed as signed values (+1 / -1) aligned with the scores.
//! Metrics that are undefined for the input (a single class, zero variance)
//! return `None`.

use std::cmp::Ordering;

/// Fraction of samples whose score sign matches the label (score 0 counts as positive)
#[must_use]
pub fn accuracy(labels: &[f64], scores: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels
        .iter()
        .zip(scores)
        .filter(|&(&y, &s)| (s >= 0.0) == (y > 0.0))
        .count();
    correct as f64 / labels.len() as f64
}

/// Average ranks (1-based), ties share the mean of their positions.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Area under the ROC curve (Mann-Whitney U with tie correction).
#[must_use]
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|&&y| y > 0.0).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let ranks = average_ranks(scores);
    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(labels)
        .filter(|&(_, &y)| y > 0.0)
        .map(|(r, _)| r)
        .sum();
    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Mean precision at each positive, ranking by descending score.
#[must_use]
pub fn average_precision(labels: &[f64], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|&&y| y > 0.0).count();
    if positives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut hits = 0usize;
    let mut sum = 0.0;
    for (k, &i) in order.iter().enumerate() {
        if labels[i] > 0.0 {
            hits += 1;
            sum += hits as f64 / (k + 1) as f64;
        }
    }
    Some(sum / positives as f64)
}

#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Pearson correlation of the average ranks
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Mean squared error
#[must_use]
pub fn mse(targets: &[f64], predictions: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / targets.len() as f64
}

/// Mean over the defined values, `None` when nothing is defined.
#[must_use]
pub fn mean_defined<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy() {
        let labels = [1.0, 1.0, -1.0, -1.0];
        assert_eq!(accuracy(&labels, &[0.5, -0.1, -2.0, 0.0]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_inverted_and_tied() {
        let labels = [1.0, 1.0, -1.0, -1.0];
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.1, 0.2]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.9, 0.8]), Some(0.0));
        assert_eq!(roc_auc(&labels, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1.0, 1.0], &[0.1, 0.2]), None);
    }

    #[test]
    fn test_average_precision() {
        // ranking: +, -, +  -> (1/1 + 2/3) / 2
        let ap = average_precision(&[1.0, -1.0, 1.0], &[0.9, 0.5, 0.1]).unwrap();
        assert_relative_eq!(ap, (1.0 + 2.0 / 3.0) / 2.0, epsilon = 1e-12);
        assert_eq!(average_precision(&[-1.0], &[0.3]), None);
    }

    #[test]
    fn test_correlations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&x, &[4.0, 3.0, 2.0, 1.0]).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);

        // monotone but non-linear
        assert_relative_eq!(spearman(&x, &[1.0, 8.0, 27.0, 64.0]).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_average_ranks_share_ties() {
        assert_eq!(average_ranks(&[3.0, 1.0, 3.0, 2.0]), vec![3.5, 1.0, 3.5, 2.0]);
    }

    #[test]
    fn test_mse_and_mean_defined() {
        assert_relative_eq!(mse(&[1.0, 2.0], &[2.0, 4.0]), 2.5);
        assert_eq!(mean_defined([Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_defined([None, None]), None);
    }
}
