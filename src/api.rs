//! HTTP surface for pdfdigest.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /summarize-pdf` – Stream a PDF summarization run as Server-Sent Events. Each chunk
//!   produces a `chunk` event, a successful run ends with one `final` event, and a failed run
//!   ends with one `error` event. Closing the connection cancels the run.
//! - `POST /summarize-text` – Summarize a piece of text in one call.
//! - `POST /extract-pdf` – Return the raw text and page count of a PDF.
//! - `POST /detect-language` – Identify the language of a text.
//! - `POST /check-hallucination` – Ask the LLM which statements of a response its reference
//!   does not support.
//! - `POST /evaluate-responses` – Score a response against a reference with cosine, lexical,
//!   and conciseness metrics.
//! - `GET /metrics` – Observe run counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same processing service with the MCP server, so behavior is
//! identical across interfaces.

use crate::evaluation::{EvaluationError, HallucinationCheck, ResponseEvaluation};
use crate::extraction::ExtractedDocument;
use crate::language::LanguageDetection;
use crate::llm::LlmClientError;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ChunkSummary, PipelineError, ProcessingApi, SummarizeTextError, SummaryEvent,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/summarize-pdf", post(summarize_pdf::<S>))
        .route("/summarize-text", post(summarize_text::<S>))
        .route("/extract-pdf", post(extract_pdf::<S>))
        .route("/detect-language", post(detect_language::<S>))
        .route("/check-hallucination", post(check_hallucination::<S>))
        .route("/evaluate-responses", post(evaluate_responses::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for endpoints that take a PDF location.
#[derive(Deserialize)]
struct SourceRequest {
    /// Local path or http(s) URL of the PDF.
    source: String,
}

/// Request body for endpoints that take raw text.
#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

/// Request body for the evaluation endpoints.
#[derive(Deserialize)]
struct EvaluationRequest {
    /// Trusted reference text.
    ground_truth: String,
    /// Text under evaluation.
    response: String,
}

/// Stream a summarization run as Server-Sent Events.
async fn summarize_pdf<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SourceRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError>
where
    S: ProcessingApi,
{
    let source = request.source.trim();
    if source.is_empty() {
        return Err(AppError::BadRequest("`source` must not be empty".into()));
    }

    tracing::info!(source, "Streaming PDF summarization");
    let events = service
        .summarize_pdf(source)
        .map(|event| Ok::<_, Infallible>(sse_event(event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_event(event: Result<SummaryEvent, PipelineError>) -> Event {
    let built = match event {
        Ok(SummaryEvent::Chunk(chunk)) => Event::default().event("chunk").json_data(&chunk),
        Ok(SummaryEvent::Final(summary)) => Event::default().event("final").json_data(&summary),
        Err(error) => {
            tracing::warn!(%error, "Summarization run failed");
            Event::default()
                .event("error")
                .json_data(json!({ "error": error.to_string() }))
        }
    };
    built.unwrap_or_else(|error| {
        tracing::error!(%error, "Failed to encode SSE event");
        Event::default()
            .event("error")
            .data(r#"{"error":"failed to encode event"}"#)
    })
}

/// Summarize a standalone piece of text.
async fn summarize_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ChunkSummary>, AppError>
where
    S: ProcessingApi,
{
    let summary = service.summarize_text(&request.text).await?;
    tracing::info!(
        model = %summary.metadata.model_name,
        summary_length = summary.metadata.summary_length,
        "Text summarization completed"
    );
    Ok(Json(summary))
}

/// Extract text from a PDF. Extraction failures are reported in the body with `success: false`.
async fn extract_pdf<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SourceRequest>,
) -> Result<Json<ExtractedDocument>, AppError>
where
    S: ProcessingApi,
{
    let source = request.source.trim();
    if source.is_empty() {
        return Err(AppError::BadRequest("`source` must not be empty".into()));
    }
    Ok(Json(service.extract_pdf(source).await))
}

/// Identify the language of the supplied text.
async fn detect_language<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<TextRequest>,
) -> Json<LanguageDetection>
where
    S: ProcessingApi,
{
    Json(service.detect_language(&request.text))
}

/// Check a response against its reference for unsupported statements.
async fn check_hallucination<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<HallucinationCheck>, AppError>
where
    S: ProcessingApi,
{
    let check = service
        .check_hallucination(&request.ground_truth, &request.response)
        .await?;
    Ok(Json(check))
}

/// Score a response against its reference.
async fn evaluate_responses<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<ResponseEvaluation>, AppError>
where
    S: ProcessingApi,
{
    let evaluation = service.evaluate_responses(&request.ground_truth, &request.response)?;
    Ok(Json(evaluation))
}

/// Return a concise metrics snapshot.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize_pdf",
                method: "POST",
                path: "/summarize-pdf",
                description: "Stream a PDF summary as Server-Sent Events: one `chunk` event per chunk, then a `final` event with the combined summary, or an `error` event.",
                request_example: Some(json!({ "source": "https://example.org/report.pdf" })),
            },
            CommandDescriptor {
                name: "summarize_text",
                method: "POST",
                path: "/summarize-text",
                description: "Summarize a piece of text and return the summary, prompts, and call metadata.",
                request_example: Some(json!({ "text": "Text to summarize" })),
            },
            CommandDescriptor {
                name: "extract_pdf",
                method: "POST",
                path: "/extract-pdf",
                description: "Return the text and page count of a PDF without summarizing it.",
                request_example: Some(json!({ "source": "/path/to/file.pdf" })),
            },
            CommandDescriptor {
                name: "detect_language",
                method: "POST",
                path: "/detect-language",
                description: "Identify the ISO 639-1 language of a text with a confidence score.",
                request_example: Some(json!({ "text": "Bonjour tout le monde" })),
            },
            CommandDescriptor {
                name: "check_hallucination",
                method: "POST",
                path: "/check-hallucination",
                description: "List statements in a response that the ground truth does not support, as validated JSON from the LLM.",
                request_example: Some(json!({
                    "ground_truth": "Revenue grew 5% in 2023.",
                    "response": "Revenue tripled in 2023."
                })),
            },
            CommandDescriptor {
                name: "evaluate_responses",
                method: "POST",
                path: "/evaluate-responses",
                description: "Score a response against the ground truth with TF-IDF cosine, token Jaccard, and conciseness metrics.",
                request_example: Some(json!({
                    "ground_truth": "Revenue grew 5% in 2023.",
                    "response": "Revenue grew in 2023."
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Summarize(SummarizeTextError),
    Evaluate(EvaluationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Summarize(error) => {
                let status = match &error {
                    SummarizeTextError::EmptyText => StatusCode::BAD_REQUEST,
                    SummarizeTextError::Llm(inner) => llm_status(inner),
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, error.to_string())
            }
            Self::Evaluate(error) => {
                let status = match &error {
                    EvaluationError::EmptyInput(_) => StatusCode::BAD_REQUEST,
                    EvaluationError::Llm(inner) => llm_status(inner),
                    EvaluationError::SchemaValidationFailed(_) => StatusCode::BAD_GATEWAY,
                };
                (status, error.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn llm_status(error: &LlmClientError) -> StatusCode {
    match error {
        LlmClientError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        LlmClientError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<SummarizeTextError> for AppError {
    fn from(inner: SummarizeTextError) -> Self {
        Self::Summarize(inner)
    }
}

impl From<EvaluationError> for AppError {
    fn from(inner: EvaluationError) -> Self {
        Self::Evaluate(inner)
    }
}
