//! Handler for the `detect_language` tool.

use std::sync::Arc;

use crate::processing::ProcessingService;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

use super::parse_arguments;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetectLanguageRequest {
    text: String,
}

/// Handle `detect_language`; blank text reports an unknown language.
pub(crate) async fn handle_detect_language(
    processing: &Arc<ProcessingService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: DetectLanguageRequest = parse_arguments(arguments)?;
    let detection = processing.detect_language(&args.text);
    Ok(CallToolResult::structured(json!({
        "language": detection.language,
        "confidence": detection.confidence,
    })))
}
