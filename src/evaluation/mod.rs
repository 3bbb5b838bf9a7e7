//! Quality checks for generated text.
//!
//! Two tools compare a response against a trusted reference:
//!
//! - [`ResponseEvaluator`] scores overlap with deterministic metrics (TF-IDF cosine, token
//!   Jaccard, length ratio). No model call is involved.
//! - [`HallucinationChecker`] asks the LLM to list statements in the response that the
//!   reference does not support, and validates the reply against a typed schema.

mod hallucination;
mod metrics;

pub use hallucination::{
    HALLUCINATION_SYSTEM_PROMPT, HallucinationCheck, HallucinationCheckMetadata,
    HallucinationChecker, HallucinationVerdict,
};
pub use metrics::{
    ConcisenessMetric, CosineSimilarityMetric, EvaluationMetadata, LexicalSimilarityMetric,
    ResponseEvaluation, ResponseEvaluator, SimilarityMetric, SimilarityScores,
};

use crate::llm::LlmClientError;
use thiserror::Error;

/// Errors raised by the evaluation tools.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A required input was empty or whitespace.
    #[error("`{0}` must not be empty")]
    EmptyInput(&'static str),
    /// The LLM call failed.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// The model reply did not match the verdict schema.
    #[error("Invalid output data: {0}")]
    SchemaValidationFailed(String),
}

fn require_text(field: &'static str, value: &str) -> Result<(), EvaluationError> {
    if value.trim().is_empty() {
        tracing::error!(field, "Evaluation input is empty");
        return Err(EvaluationError::EmptyInput(field));
    }
    Ok(())
}

fn current_timestamp_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
