//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{health_payload, json_resource_contents, serialize_json, usage_payload},
        handlers::{
            evaluate::{handle_check_hallucination, handle_evaluate_responses},
            extract::handle_extract,
            language::handle_detect_language,
            metrics::handle_metrics,
            summarize::{handle_summarize_pdf, handle_summarize_text},
        },
        schemas,
    },
    processing::ProcessingService,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const HEALTH_URI: &str = "mcp://health";
const USAGE_URI: &str = "mcp://usage";

/// Tools the server answers, keyed by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolKind {
    SummarizePdf,
    SummarizeText,
    ExtractPdfText,
    DetectLanguage,
    CheckHallucination,
    EvaluateResponses,
    Metrics,
}

impl ToolKind {
    const ALL: [ToolKind; 7] = [
        ToolKind::SummarizePdf,
        ToolKind::SummarizeText,
        ToolKind::ExtractPdfText,
        ToolKind::DetectLanguage,
        ToolKind::CheckHallucination,
        ToolKind::EvaluateResponses,
        ToolKind::Metrics,
    ];

    fn name(self) -> &'static str {
        match self {
            ToolKind::SummarizePdf => "summarize_pdf",
            ToolKind::SummarizeText => "summarize_text",
            ToolKind::ExtractPdfText => "extract_pdf_text",
            ToolKind::DetectLanguage => "detect_language",
            ToolKind::CheckHallucination => "check_hallucination",
            ToolKind::EvaluateResponses => "evaluate_responses",
            ToolKind::Metrics => "metrics",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// MCP server exposing PDF and text summarization tools.
#[derive(Clone)]
pub struct PdfDigestMcpServer {
    processing: Arc<ProcessingService>,
}

impl PdfDigestMcpServer {
    /// Create a new MCP server backed by the supplied processing service.
    pub fn new(processing: Arc<ProcessingService>) -> Self {
        Self { processing }
    }

    async fn dispatch_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, McpError> {
        let Some(kind) = ToolKind::from_name(request.name.as_ref()) else {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ));
        };
        tracing::debug!(tool = kind.name(), "Dispatching tool call");

        let processing = &self.processing;
        let arguments = request.arguments;
        match kind {
            ToolKind::SummarizePdf => handle_summarize_pdf(processing, arguments).await,
            ToolKind::SummarizeText => handle_summarize_text(processing, arguments).await,
            ToolKind::ExtractPdfText => handle_extract(processing, arguments).await,
            ToolKind::DetectLanguage => handle_detect_language(processing, arguments).await,
            ToolKind::CheckHallucination => handle_check_hallucination(processing, arguments).await,
            ToolKind::EvaluateResponses => handle_evaluate_responses(processing, arguments).await,
            ToolKind::Metrics => handle_metrics(processing).await,
        }
    }

    fn read_json_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let text = match uri {
            HEALTH_URI => health_payload(
                self.processing.llm_status(),
                &self.processing.metrics_snapshot(),
            ),
            USAGE_URI => serialize_json(&usage_payload(), USAGE_URI),
            other => {
                return Err(McpError::invalid_params(
                    format!("Unknown resource URI: {other}"),
                    None,
                ));
            }
        };
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(uri, text)],
        })
    }

    fn describe_tools(&self) -> Vec<Tool> {
        let source_schema = Arc::new(schemas::source_input_schema());
        let evaluation_schema = Arc::new(schemas::evaluation_input_schema());
        vec![
            Tool {
                name: Cow::Borrowed(ToolKind::SummarizePdf.name()),
                title: Some("Summarize PDF".to_string()),
                description: Some(Cow::Borrowed(
                    "Summarize a PDF from a local path or URL; returns one partial summary per chunk plus the combined final summary.",
                )),
                input_schema: source_schema.clone(),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize PDF")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::SummarizeText.name()),
                title: Some("Summarize Text".to_string()),
                description: Some(Cow::Borrowed(
                    "Produce a faithful, concise summary of text already in context.",
                )),
                input_schema: Arc::new(schemas::text_input_schema("Text to summarize")),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Text")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::ExtractPdfText.name()),
                title: Some("Extract PDF Text".to_string()),
                description: Some(Cow::Borrowed(
                    "Extract the raw text and page count of a PDF without summarizing it.",
                )),
                input_schema: source_schema,
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Extract PDF Text")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::DetectLanguage.name()),
                title: Some("Detect Language".to_string()),
                description: Some(Cow::Borrowed(
                    "Identify the ISO 639-1 language of a text with a confidence score.",
                )),
                input_schema: Arc::new(schemas::text_input_schema("Text to classify")),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Detect Language")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::CheckHallucination.name()),
                title: Some("Check Hallucination".to_string()),
                description: Some(Cow::Borrowed(
                    "Ask the LLM which statements in a response are not supported by the ground truth; returns a validated verdict.",
                )),
                input_schema: evaluation_schema.clone(),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Check Hallucination")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::EvaluateResponses.name()),
                title: Some("Evaluate Responses".to_string()),
                description: Some(Cow::Borrowed(
                    "Score a response against the ground truth with cosine, lexical, and conciseness metrics.",
                )),
                input_schema: evaluation_schema,
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Evaluate Responses")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ToolKind::Metrics.name()),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check summarization volume and failures at a glance.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut health = RawResource::new(HEALTH_URI, "health");
        health.description = Some("LLM backend configuration and run counters".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description =
            Some("Recommended tool flow: pass PDF locations, not pasted document text.".into());

        vec![health.no_annotation(), usage.no_annotation()]
    }
}

impl ServerHandler for PdfDigestMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "pdfdigest".to_string();
        implementation.title = Some("pdfdigest MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to summarize PDFs and text. Pass a local path or URL to summarize_pdf for long documents; use summarize_text for text already in context. check_hallucination and evaluate_responses compare a response with its ground truth.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        std::future::ready(self.read_json_resource(request.uri.as_str()))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        self.dispatch_tool(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip_through_dispatch_keys() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("remember"), None);
    }
}
