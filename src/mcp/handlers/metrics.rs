//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::ProcessingService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current run counters.
pub(crate) async fn handle_metrics(
    processing: &Arc<ProcessingService>,
) -> Result<CallToolResult, McpError> {
    let snapshot = processing.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsSummarized": snapshot.documents_summarized,
        "chunksSummarized": snapshot.chunks_summarized,
        "textsSummarized": snapshot.texts_summarized,
        "failedRuns": snapshot.failed_runs,
    })))
}
