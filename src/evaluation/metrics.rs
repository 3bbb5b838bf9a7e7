use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{EvaluationError, current_timestamp_rfc3339, require_text};

/// Score in `[0, 1]` comparing a response with its reference text.
pub trait SimilarityMetric: Send + Sync {
    /// Short label reported in evaluation metadata.
    fn name(&self) -> &'static str;

    /// Compare `response` with `ground_truth`.
    fn compute(&self, ground_truth: &str, response: &str) -> f64;
}

/// Cosine similarity of TF-IDF vectors built over the two texts.
///
/// Tokens are lower-cased runs of at least two word characters. IDF is smoothed as
/// `ln((1 + n) / (1 + df)) + 1` with `n = 2`, and vectors are L2-normalized.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineSimilarityMetric;

impl SimilarityMetric for CosineSimilarityMetric {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn compute(&self, ground_truth: &str, response: &str) -> f64 {
        let left = term_counts(ground_truth);
        let right = term_counts(response);
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let idf = |term: &str| {
            let df = usize::from(left.contains_key(term)) + usize::from(right.contains_key(term));
            (3.0 / (1.0 + df as f64)).ln() + 1.0
        };
        let left_weights = tfidf(&left, idf);
        let right_weights = tfidf(&right, idf);

        let dot: f64 = left_weights
            .iter()
            .filter_map(|(term, weight)| right_weights.get(term).map(|other| weight * other))
            .sum();
        let denominator = l2_norm(&left_weights) * l2_norm(&right_weights);
        if denominator == 0.0 {
            return 0.0;
        }
        (dot / denominator).clamp(0.0, 1.0)
    }
}

fn tfidf<'a>(
    counts: &'a HashMap<String, usize>,
    idf: impl Fn(&str) -> f64,
) -> HashMap<&'a str, f64> {
    counts
        .iter()
        .map(|(term, count)| (term.as_str(), *count as f64 * idf(term)))
        .collect()
}

fn l2_norm(weights: &HashMap<&str, f64>) -> f64 {
    weights.values().map(|weight| weight * weight).sum::<f64>().sqrt()
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
    {
        *counts.entry(token.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// Jaccard overlap of the lower-cased, whitespace-separated token sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalSimilarityMetric;

impl SimilarityMetric for LexicalSimilarityMetric {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn compute(&self, ground_truth: &str, response: &str) -> f64 {
        let ground_truth = ground_truth.to_lowercase();
        let response = response.to_lowercase();
        let left: HashSet<&str> = ground_truth.split_whitespace().collect();
        let right: HashSet<&str> = response.split_whitespace().collect();
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }
        let shared = left.intersection(&right).count();
        let total = left.union(&right).count();
        shared as f64 / total as f64
    }
}

/// Reference word count over response word count, capped at 1.
///
/// Responses no longer than the reference score 1; padded ones score proportionally less.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcisenessMetric;

impl SimilarityMetric for ConcisenessMetric {
    fn name(&self) -> &'static str {
        "conciseness"
    }

    fn compute(&self, ground_truth: &str, response: &str) -> f64 {
        let response_words = response.split_whitespace().count();
        if response_words == 0 {
            return 0.0;
        }
        let reference_words = ground_truth.split_whitespace().count();
        (reference_words as f64 / response_words as f64).min(1.0)
    }
}

/// Per-metric scores of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScores {
    /// TF-IDF cosine similarity.
    pub cosine_similarity: f64,
    /// Token-set Jaccard similarity.
    pub lexical_similarity: f64,
    /// Length ratio score.
    pub conciseness_score: f64,
}

/// When and how an evaluation was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetadata {
    /// RFC 3339 UTC timestamp.
    pub evaluated_at: String,
    /// Metric labels in score order.
    pub metrics: Vec<&'static str>,
}

/// Result of [`ResponseEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEvaluation {
    /// Metric scores.
    pub scores: SimilarityScores,
    /// Evaluation details.
    pub metadata: EvaluationMetadata,
}

/// Scores a response against a reference with the three built-in metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEvaluator {
    cosine: CosineSimilarityMetric,
    lexical: LexicalSimilarityMetric,
    conciseness: ConcisenessMetric,
}

impl ResponseEvaluator {
    /// Evaluator with the default metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `response` against `ground_truth`. Both must contain non-whitespace text.
    pub fn evaluate(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<ResponseEvaluation, EvaluationError> {
        require_text("ground_truth", ground_truth)?;
        require_text("response", response)?;

        let scores = SimilarityScores {
            cosine_similarity: self.cosine.compute(ground_truth, response),
            lexical_similarity: self.lexical.compute(ground_truth, response),
            conciseness_score: self.conciseness.compute(ground_truth, response),
        };
        tracing::info!(
            cosine = scores.cosine_similarity,
            lexical = scores.lexical_similarity,
            conciseness = scores.conciseness_score,
            "Response evaluated"
        );

        Ok(ResponseEvaluation {
            scores,
            metadata: EvaluationMetadata {
                evaluated_at: current_timestamp_rfc3339(),
                metrics: vec![
                    self.cosine.name(),
                    self.lexical.name(),
                    self.conciseness.name(),
                ],
            },
        })
    }
}
