//! Handler for the `extract_pdf_text` tool.

use std::sync::Arc;

use crate::processing::ProcessingService;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

use super::{parse_arguments, require_non_empty};

/// Request payload shared by the PDF tools.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SourceToolRequest {
    /// Local path or http(s) URL of the PDF.
    pub(crate) source: String,
}

/// Handle `extract_pdf_text`. Extraction failures are reported in the payload, not as errors.
pub(crate) async fn handle_extract(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SourceToolRequest = parse_arguments(arguments)?;
    require_non_empty("source", &args.source)?;

    let document = processing.extract_pdf(args.source.trim()).await;
    let payload = serde_json::to_value(&document)
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(payload))
}
