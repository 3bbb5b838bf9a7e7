//! Handlers for the `check_hallucination` and `evaluate_responses` tools.

use std::sync::Arc;

use crate::{evaluation::EvaluationError, processing::ProcessingService};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::{Deserialize, Serialize};

use super::parse_arguments;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluationToolRequest {
    ground_truth: String,
    response: String,
}

/// Handle `check_hallucination`, returning the validated verdict with its prompts.
pub(crate) async fn handle_check_hallucination(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: EvaluationToolRequest = parse_arguments(arguments)?;
    let check = processing
        .check_hallucination(&args.ground_truth, &args.response)
        .await
        .map_err(map_evaluation_error)?;
    structured(&check)
}

/// Handle `evaluate_responses`.
pub(crate) async fn handle_evaluate_responses(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: EvaluationToolRequest = parse_arguments(arguments)?;
    let evaluation = processing
        .evaluate_responses(&args.ground_truth, &args.response)
        .map_err(map_evaluation_error)?;
    structured(&evaluation)
}

fn structured<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let payload = serde_json::to_value(value)
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(payload))
}

fn map_evaluation_error(error: EvaluationError) -> McpError {
    match error {
        EvaluationError::EmptyInput(_) => McpError::invalid_params(error.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn blank_inputs_map_to_invalid_params() {
        let error = map_evaluation_error(EvaluationError::EmptyInput("response"));
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert!(error.message.contains("`response`"));
    }

    #[test]
    fn invalid_verdicts_map_to_internal_errors() {
        let error = map_evaluation_error(EvaluationError::SchemaValidationFailed("eof".into()));
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
        assert!(error.message.starts_with("Invalid output data"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let arguments = serde_json::json!({
            "ground_truth": "a",
            "response": "b",
            "model": "other",
        });
        let error = parse_arguments::<EvaluationToolRequest>(arguments.as_object().cloned())
            .expect_err("unknown field");
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
    }
}
