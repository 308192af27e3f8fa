//! Retrieval quality metrics.
//!
//! Per query: precision, recall, precision at N, R-precision and average precision.
//! Corpus-wide values are arithmetic means over the queries that produced a value;
//! a query with no predictions or no relevant documents produces none.

use crate::predictions::{ranked_ids, Predictions};
use crate::relevance::RelevanceJudgments;
use crate::{DocId, QueryId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalConfig {
    /// Cut-off for precision at N.
    pub precision_at: usize,
    /// Recall level R-precision must exceed.
    pub r_threshold: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { precision_at: 10, r_threshold: 0.4 }
    }
}

fn hits(relevant: &BTreeSet<DocId>, predicted: &[DocId]) -> usize {
    predicted.iter().filter(|d| relevant.contains(d)).count()
}

pub fn precision(relevant: &BTreeSet<DocId>, predicted: &[DocId]) -> Option<f64> {
    if predicted.is_empty() {
        return None;
    }
    Some(hits(relevant, predicted) as f64 / predicted.len() as f64)
}

pub fn recall(relevant: &BTreeSet<DocId>, predicted: &[DocId]) -> Option<f64> {
    if relevant.is_empty() {
        return None;
    }
    Some(hits(relevant, predicted) as f64 / relevant.len() as f64)
}

/// Relevant hits among the first `n` predictions, over `n` even when fewer were predicted.
pub fn precision_at_n(relevant: &BTreeSet<DocId>, predicted: &[DocId], n: usize) -> Option<f64> {
    if n == 0 {
        return None;
    }
    let top = &predicted[..n.min(predicted.len())];
    Some(hits(relevant, top) as f64 / n as f64)
}

/// Precision at the first rank where recall exceeds `threshold`; `None` if it never does.
pub fn r_precision(relevant: &BTreeSet<DocId>, predicted: &[DocId], threshold: f64) -> Option<f64> {
    if relevant.is_empty() {
        return None;
    }
    let mut found = 0usize;
    for (i, doc) in predicted.iter().enumerate() {
        if relevant.contains(doc) {
            found += 1;
        }
        if found as f64 / relevant.len() as f64 > threshold {
            return Some(found as f64 / (i + 1) as f64);
        }
    }
    None
}

/// Sum of precision at each relevant rank, over the number of predictions.
pub fn average_precision(relevant: &BTreeSet<DocId>, predicted: &[DocId]) -> Option<f64> {
    if predicted.is_empty() {
        return None;
    }
    let mut found = 0usize;
    let mut sum = 0.0;
    for (i, doc) in predicted.iter().enumerate() {
        if relevant.contains(doc) {
            found += 1;
            sum += found as f64 / (i + 1) as f64;
        }
    }
    Some(sum / predicted.len() as f64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub precision_at_n: Option<f64>,
    pub r_precision: Option<f64>,
    pub average_precision: Option<f64>,
}

impl QueryMetrics {
    /// All metrics, or `None` when either side is empty.
    pub fn compute(relevant: &BTreeSet<DocId>, predicted: &[DocId], config: &EvalConfig) -> Option<Self> {
        if relevant.is_empty() || predicted.is_empty() {
            return None;
        }
        Some(Self {
            precision: precision(relevant, predicted),
            recall: recall(relevant, predicted),
            precision_at_n: precision_at_n(relevant, predicted, config.precision_at),
            r_precision: r_precision(relevant, predicted, config.r_threshold),
            average_precision: average_precision(relevant, predicted),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeanMetrics {
    pub precision: f64,
    pub recall: f64,
    pub precision_at_n: f64,
    pub r_precision: f64,
    /// Mean average precision.
    pub map: f64,
}

/// Arithmetic mean of the present values; 0 when there are none.
pub fn mean<I: IntoIterator<Item = Option<f64>>>(values: I) -> f64 {
    let (sum, count) = values.into_iter().flatten().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub config: EvalConfig,
    pub per_query: BTreeMap<QueryId, QueryMetrics>,
    pub mean: MeanMetrics,
    /// Queries with judgments or predictions that could not be scored.
    pub excluded: Vec<QueryId>,
}

pub fn evaluate(judgments: &RelevanceJudgments, predictions: &Predictions, config: &EvalConfig) -> EvaluationReport {
    let empty = BTreeSet::new();
    let queries: BTreeSet<QueryId> = judgments.keys().chain(predictions.keys()).copied().collect();

    let mut per_query = BTreeMap::new();
    let mut excluded = Vec::new();
    for query in queries {
        let relevant = judgments.get(&query).unwrap_or(&empty);
        let predicted = predictions.get(&query).map(ranked_ids).unwrap_or_default();
        match QueryMetrics::compute(relevant, &predicted, config) {
            Some(metrics) => {
                per_query.insert(query, metrics);
            }
            None => excluded.push(query),
        }
    }

    let column = |f: fn(&QueryMetrics) -> Option<f64>| mean(per_query.values().map(f));
    let mean = MeanMetrics {
        precision: column(|m| m.precision),
        recall: column(|m| m.recall),
        precision_at_n: column(|m| m.precision_at_n),
        r_precision: column(|m| m.r_precision),
        map: column(|m| m.average_precision),
    };
    tracing::info!(evaluated = per_query.len(), excluded = excluded.len(), map = mean.map, "evaluation complete");
    EvaluationReport { config: *config, per_query, mean, excluded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictions::RankedList;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-12 }

    fn relevant() -> BTreeSet<DocId> { BTreeSet::from([1, 2, 3]) }

    const PREDICTED: [DocId; 5] = [2, 5, 1, 7, 3];

    #[test]
    fn set_based_metrics() {
        assert!(close(precision(&relevant(), &PREDICTED).unwrap(), 3.0 / 5.0));
        assert!(close(recall(&relevant(), &PREDICTED).unwrap(), 1.0));
    }

    #[test]
    fn average_precision_divides_by_prediction_count() {
        let expected = (1.0 / 1.0 + 2.0 / 3.0 + 3.0 / 5.0) / 5.0;
        assert!(close(average_precision(&relevant(), &PREDICTED).unwrap(), expected));
    }

    #[test]
    fn average_precision_of_relevant_at_second_rank() {
        let expected = 1.0 / 2.0 / 2.0;
        assert!(close(average_precision(&relevant(), &[9, 2]).unwrap(), expected));
    }

    #[test]
    fn precision_at_n_does_not_compensate_short_lists() {
        assert!(close(precision_at_n(&relevant(), &PREDICTED, 2).unwrap(), 0.5));
        assert!(close(precision_at_n(&relevant(), &PREDICTED, 10).unwrap(), 0.3));
        assert_eq!(precision_at_n(&relevant(), &PREDICTED, 0), None);
    }

    #[test]
    fn r_precision_stops_when_recall_exceeds_threshold() {
        // recall passes 0.5 at rank 3 (2 of 3 relevant found)
        assert!(close(r_precision(&relevant(), &PREDICTED, 0.5).unwrap(), 2.0 / 3.0));
        // recall 1/3 at rank 1 already exceeds 0.2
        assert!(close(r_precision(&relevant(), &PREDICTED, 0.2).unwrap(), 1.0));
        assert_eq!(r_precision(&relevant(), &[2, 5], 0.5), None);
        assert_eq!(r_precision(&relevant(), &PREDICTED, 1.0), None);
    }

    #[test]
    fn empty_sides_are_excluded_from_means() {
        let judgments = RelevanceJudgments::from([(1, relevant()), (2, BTreeSet::new()), (3, BTreeSet::from([4]))]);
        let predictions = Predictions::from([
            (1, PREDICTED.iter().zip(1u32..).map(|(d, r)| (r, *d)).collect::<RankedList>()),
            (2, RankedList::from([(1, 4)])),
            (4, RankedList::from([(1, 4)])),
        ]);
        let report = evaluate(&judgments, &predictions, &EvalConfig { precision_at: 5, r_threshold: 0.5 });
        assert_eq!(report.per_query.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.excluded, vec![2, 3, 4]);
        assert!(close(report.mean.precision, 0.6));
        assert!(close(report.mean.precision_at_n, 0.6));
    }

    #[test]
    fn r_precision_gaps_do_not_drag_the_mean() {
        let judgments = RelevanceJudgments::from([(1, BTreeSet::from([1])), (2, BTreeSet::from([8, 9]))]);
        let predictions = Predictions::from([(1, RankedList::from([(1, 5), (2, 1)])), (2, RankedList::from([(1, 8)]))]);
        let report = evaluate(&judgments, &predictions, &EvalConfig { precision_at: 2, r_threshold: 0.5 });
        assert_eq!(report.per_query[&2].r_precision, None);
        assert!(close(report.mean.r_precision, 0.5));
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
        assert_eq!(evaluate(&RelevanceJudgments::new(), &Predictions::new(), &EvalConfig::default()).mean, MeanMetrics::default());
    }
}
