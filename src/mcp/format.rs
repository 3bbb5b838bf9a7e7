//! Formatting helpers shared across MCP handlers and resources.

use crate::{
    metrics::MetricsSnapshot,
    processing::{ChunkSummaryEvent, FinalSummaryEvent, LlmStatusSnapshot},
};
use rmcp::model::ResourceContents;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Build the health payload describing the LLM backend and run counters.
pub(crate) fn health_payload(llm: &LlmStatusSnapshot, metrics: &MetricsSnapshot) -> String {
    let payload = json!({
        "status": "ok",
        "llm": llm,
        "metrics": metrics,
    });
    serialize_json(&payload, "mcp://health")
}

/// Recommended tool flow for agents.
pub(crate) fn usage_payload() -> Value {
    json!({
        "title": "pdfdigest MCP Usage",
        "policy": [
            "Pass PDF locations to `summarize_pdf` instead of pasting document text into prompts.",
            "Use `extract_pdf_text` only when the raw text itself is needed.",
            "Use `summarize_text` for text that is already in context.",
            "Long documents are chunked by language; expect one partial summary per chunk.",
            "Check a generated summary against its source with `check_hallucination` and `evaluate_responses`.",
        ],
        "flows": [
            {
                "name": "Summarize a PDF",
                "steps": [
                    "summarize_pdf({ source })",
                    "read final_summary; inspect chunks[].partial_summary for detail"
                ]
            },
            {
                "name": "Inspect a PDF",
                "steps": [
                    "extract_pdf_text({ source })",
                    "detect_language({ text })"
                ]
            },
            {
                "name": "Verify a summary",
                "steps": [
                    "check_hallucination({ ground_truth, response })",
                    "evaluate_responses({ ground_truth, response })"
                ]
            }
        ]
    })
}

/// Assemble the `summarize_pdf` tool response from a finished run.
pub(crate) fn pdf_summary_payload(
    chunks: Vec<ChunkSummaryEvent>,
    summary: FinalSummaryEvent,
) -> Value {
    json!({
        "chunks": chunks,
        "final_summary": summary.final_summary,
        "metadata": summary.metadata,
    })
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}
