//! Handlers for the `summarize_text` and `summarize_pdf` tools.

use std::sync::Arc;

use crate::{
    mcp::format::pdf_summary_payload,
    processing::{PipelineError, ProcessingService, SummarizeTextError, SummaryEvent},
};
use futures_util::StreamExt;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

use super::{extract::SourceToolRequest, parse_arguments, require_non_empty};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummarizeTextRequest {
    text: String,
}

/// Handle `summarize_text`, returning the summary, prompts, and call metadata.
pub(crate) async fn handle_summarize_text(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizeTextRequest = parse_arguments(arguments)?;
    let summary = processing
        .summarize_text(&args.text)
        .await
        .map_err(map_summarize_text_error)?;

    let payload = serde_json::to_value(&summary)
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(payload))
}

/// Handle `summarize_pdf` by draining the run and returning every partial plus the final summary.
pub(crate) async fn handle_summarize_pdf(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SourceToolRequest = parse_arguments(arguments)?;
    require_non_empty("source", &args.source)?;

    let mut events = processing.summarize_pdf(args.source.trim());
    let mut chunks = Vec::new();
    while let Some(event) = events.next().await {
        match event.map_err(map_pipeline_error)? {
            SummaryEvent::Chunk(chunk) => chunks.push(chunk),
            SummaryEvent::Final(summary) => {
                return Ok(CallToolResult::structured(pdf_summary_payload(
                    chunks, summary,
                )));
            }
        }
    }

    Err(McpError::internal_error(
        "Summarization ended without a final summary",
        None,
    ))
}

fn map_summarize_text_error(error: SummarizeTextError) -> McpError {
    match error {
        SummarizeTextError::EmptyText => McpError::invalid_params(error.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn map_pipeline_error(error: PipelineError) -> McpError {
    match error {
        PipelineError::ExtractionFailed(_) => McpError::invalid_params(error.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmClientError;

    #[test]
    fn empty_text_maps_to_invalid_params() {
        let error = map_summarize_text_error(SummarizeTextError::EmptyText);
        assert_eq!(error.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn provider_failures_map_to_internal_errors() {
        let error = map_pipeline_error(PipelineError::ChunkSummarizationFailed {
            chunk_index: 3,
            source: SummarizeTextError::Llm(LlmClientError::Timeout("slow".into())),
        });
        assert_eq!(error.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(error.message.contains("chunk 3"));
    }
}
