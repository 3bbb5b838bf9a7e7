//! Processing service coordinating extraction, language detection, and summarization.

use crate::{
    config::Config,
    evaluation::{
        EvaluationError, HallucinationCheck, HallucinationChecker, ResponseEvaluation,
        ResponseEvaluator,
    },
    extraction::{ExtractedDocument, ExtractionError, PdfExtractor, PdfTextExtractor},
    language::{LanguageDetection, LanguageDetector, WhatlangDetector},
    llm::{LlmClient, LlmClientError, OutputMode, get_llm_client},
    metrics::{MetricsSnapshot, SummaryMetrics},
    processing::{
        chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, validate_chunking},
        pipeline::{SummarizePdfPipeline, SummaryEventStream},
        summarize::TextSummarizer,
        types::{ChunkSummary, ChunkingError, SummarizeTextError, SummaryEvent},
    },
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling the service from configuration.
#[derive(Debug, Error)]
pub enum ServiceInitError {
    /// LLM client could not be built.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// PDF loader could not be built.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Chunk overlap does not fit the configured chunk sizes.
    #[error(transparent)]
    InvalidConfiguration(#[from] ChunkingError),
}

/// Chunking knobs applied to every PDF run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Words shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunk size for languages without an explicit mapping.
    pub default_chunk_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PipelineSettings {
    /// Settings taken from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_overlap: config.chunk_overlap,
            default_chunk_size: config.default_chunk_size,
        }
    }

    /// Reject an overlap that some selectable chunk size could not accommodate.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        validate_chunking(self.chunk_overlap, self.default_chunk_size)
    }
}

/// LLM details surfaced by health endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmStatusSnapshot {
    /// Provider label, e.g. `ollama`.
    pub provider: String,
    /// Model requests are sent to.
    pub model: String,
    /// Whether schema-constrained output is requested.
    pub structured_output: bool,
}

/// Shares one set of collaborators between the MCP tools, HTTP routes, and CLI.
///
/// Construct once near process start and share through an `Arc`. Each PDF summarization call
/// starts an independent run; the service itself only holds read-only handles and counters.
pub struct ProcessingService {
    pipeline: SummarizePdfPipeline,
    summarizer: Arc<TextSummarizer>,
    extractor: Arc<dyn PdfExtractor>,
    detector: Arc<dyn LanguageDetector>,
    hallucination_checker: HallucinationChecker,
    evaluator: ResponseEvaluator,
    llm_status: LlmStatusSnapshot,
    metrics: Arc<SummaryMetrics>,
}

/// Abstraction over the processing service used by external surfaces (HTTP, MCP).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Start a streaming PDF summarization run.
    fn summarize_pdf(&self, source: &str) -> SummaryEventStream;

    /// Summarize a standalone piece of text.
    async fn summarize_text(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError>;

    /// Extract text from a PDF source without summarizing it.
    async fn extract_pdf(&self, source: &str) -> ExtractedDocument;

    /// Identify the language of `text`.
    fn detect_language(&self, text: &str) -> LanguageDetection;

    /// Ask the LLM which statements of `response` are unsupported by `ground_truth`.
    async fn check_hallucination(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<HallucinationCheck, EvaluationError>;

    /// Score `response` against `ground_truth` with the deterministic metrics.
    fn evaluate_responses(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<ResponseEvaluation, EvaluationError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build the service with production adapters selected by `config`.
    pub fn new(config: &Config) -> Result<Self, ServiceInitError> {
        tracing::info!("Initializing LLM client");
        let llm = get_llm_client(config)?;
        tracing::info!(model = llm.model_name(), "LLM client initialized");
        let extractor = PdfTextExtractor::with_fetch_timeout(Duration::from_secs(
            config.pdf_fetch_timeout_secs.max(1),
        ))?;

        Ok(Self::with_components(
            Arc::new(extractor),
            Arc::new(WhatlangDetector),
            llm,
            PipelineSettings::from_config(config),
        )?)
    }

    /// Assemble the service from explicit collaborators.
    ///
    /// Fails when `settings` carry an overlap that a selectable chunk size cannot hold, so
    /// no run ever starts with them.
    pub fn with_components(
        extractor: Arc<dyn PdfExtractor>,
        detector: Arc<dyn LanguageDetector>,
        llm: Arc<dyn LlmClient>,
        settings: PipelineSettings,
    ) -> Result<Self, ChunkingError> {
        settings.validate()?;
        let llm_status = LlmStatusSnapshot {
            provider: llm.provider_name().to_string(),
            model: llm.model_name().to_string(),
            structured_output: llm.output_mode() == OutputMode::Schema,
        };
        let hallucination_checker = HallucinationChecker::new(llm.clone());
        let summarizer = Arc::new(TextSummarizer::new(llm));
        let pipeline =
            SummarizePdfPipeline::new(extractor.clone(), detector.clone(), summarizer.clone())
                .with_overlap(settings.chunk_overlap)
                .with_default_chunk_size(settings.default_chunk_size);
        tracing::debug!(
            overlap = settings.chunk_overlap,
            default_chunk_size = settings.default_chunk_size,
            "Summarization pipeline ready"
        );

        Ok(Self {
            pipeline,
            summarizer,
            extractor,
            detector,
            hallucination_checker,
            evaluator: ResponseEvaluator::new(),
            llm_status,
            metrics: Arc::new(SummaryMetrics::new()),
        })
    }

    /// Start a streaming summarization run; finished and failed runs update the metrics.
    pub fn summarize_pdf(&self, source: &str) -> SummaryEventStream {
        tracing::info!(source, "Summarizing PDF");
        let metrics = self.metrics.clone();
        Box::pin(self.pipeline.summarize(source).inspect(move |event| match event {
            Ok(SummaryEvent::Final(summary)) => {
                metrics.record_document(summary.metadata.chunks as u64)
            }
            Ok(SummaryEvent::Chunk(_)) => {}
            Err(_) => metrics.record_failure(),
        }))
    }

    /// Summarize a standalone piece of text.
    pub async fn summarize_text(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError> {
        let result = self.summarizer.summarize(text).await;
        match &result {
            Ok(_) => self.metrics.record_text(),
            Err(error) => {
                tracing::warn!(%error, "Text summarization failed");
                self.metrics.record_failure();
            }
        }
        result
    }

    /// Extract text from a PDF source.
    pub async fn extract_pdf(&self, source: &str) -> ExtractedDocument {
        self.extractor.extract(source).await
    }

    /// Identify the language of `text`.
    pub fn detect_language(&self, text: &str) -> LanguageDetection {
        self.detector.detect(text)
    }

    /// Check `response` against `ground_truth` for unsupported statements.
    pub async fn check_hallucination(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<HallucinationCheck, EvaluationError> {
        let result = self.hallucination_checker.check(ground_truth, response).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Hallucination check failed");
        }
        result
    }

    /// Score `response` against `ground_truth`.
    pub fn evaluate_responses(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<ResponseEvaluation, EvaluationError> {
        self.evaluator.evaluate(ground_truth, response)
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// LLM provider details for health payloads.
    pub fn llm_status(&self) -> &LlmStatusSnapshot {
        &self.llm_status
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    fn summarize_pdf(&self, source: &str) -> SummaryEventStream {
        ProcessingService::summarize_pdf(self, source)
    }

    async fn summarize_text(&self, text: &str) -> Result<ChunkSummary, SummarizeTextError> {
        ProcessingService::summarize_text(self, text).await
    }

    async fn extract_pdf(&self, source: &str) -> ExtractedDocument {
        ProcessingService::extract_pdf(self, source).await
    }

    fn detect_language(&self, text: &str) -> LanguageDetection {
        ProcessingService::detect_language(self, text)
    }

    async fn check_hallucination(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<HallucinationCheck, EvaluationError> {
        ProcessingService::check_hallucination(self, ground_truth, response).await
    }

    fn evaluate_responses(
        &self,
        ground_truth: &str,
        response: &str,
    ) -> Result<ResponseEvaluation, EvaluationError> {
        ProcessingService::evaluate_responses(self, ground_truth, response)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Generation, GenerationRequest};

    struct EchoExtractor;

    #[async_trait]
    impl PdfExtractor for EchoExtractor {
        async fn extract(&self, source: &str) -> ExtractedDocument {
            if source == "missing.pdf" {
                return ExtractedDocument::failure("File not found: missing.pdf");
            }
            ExtractedDocument {
                text: "one two three four five six seven".into(),
                pages: 1,
                success: true,
                error: None,
            }
        }
    }

    struct PlainClient;

    #[async_trait]
    impl LlmClient for PlainClient {
        fn model_name(&self) -> &str {
            "plain-model"
        }

        fn output_mode(&self) -> OutputMode {
            OutputMode::Plain
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<Generation, LlmClientError> {
            let words = request.user_prompt.split_whitespace().count();
            Ok(Generation {
                text: format!("{words} words"),
                model: "plain-model".into(),
            })
        }
    }

    fn service() -> ProcessingService {
        ProcessingService::with_components(
            Arc::new(EchoExtractor),
            Arc::new(WhatlangDetector),
            Arc::new(PlainClient),
            PipelineSettings {
                chunk_overlap: 1,
                default_chunk_size: 4,
            },
        )
        .expect("valid settings")
    }

    #[test]
    fn oversized_overlap_is_rejected_at_construction() {
        let result = ProcessingService::with_components(
            Arc::new(EchoExtractor),
            Arc::new(WhatlangDetector),
            Arc::new(PlainClient),
            PipelineSettings {
                chunk_overlap: 300,
                default_chunk_size: 600,
            },
        );

        assert!(matches!(
            result,
            Err(ChunkingError::OverlapTooLarge {
                overlap: 300,
                chunk_size: 300,
            })
        ));
    }

    #[tokio::test]
    async fn finished_runs_update_metrics() {
        let service = service();
        let events: Vec<_> = service.summarize_pdf("doc.pdf").collect().await;

        assert!(events.last().unwrap().as_ref().unwrap().is_final());
        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_summarized, 1);
        assert_eq!(snapshot.chunks_summarized, (events.len() - 1) as u64);
        assert_eq!(snapshot.failed_runs, 0);
    }

    #[tokio::test]
    async fn failed_runs_are_counted() {
        let service = service();
        let events: Vec<_> = service.summarize_pdf("missing.pdf").collect().await;

        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
        assert_eq!(service.metrics_snapshot().failed_runs, 1);
        assert_eq!(service.metrics_snapshot().documents_summarized, 0);
    }

    #[tokio::test]
    async fn text_summaries_are_counted() {
        let service = service();

        service.summarize_text("a short note").await.expect("summary");
        service.summarize_text("  ").await.expect_err("empty");

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.texts_summarized, 1);
        assert_eq!(snapshot.failed_runs, 1);
    }

    #[tokio::test]
    async fn evaluation_tools_share_the_llm_client() {
        let service = service();

        let scores = service
            .evaluate_responses("the cat sat", "the cat sat")
            .expect("scores");
        assert_eq!(scores.scores.lexical_similarity, 1.0);

        // The plain client answers with prose, which is not a verdict.
        let error = service
            .check_hallucination("the cat sat", "the dog sat")
            .await
            .expect_err("prose reply");
        assert!(matches!(error, EvaluationError::SchemaValidationFailed(_)));
    }

    #[test]
    fn reports_llm_status() {
        let service = service();
        assert_eq!(
            service.llm_status(),
            &LlmStatusSnapshot {
                provider: "custom".into(),
                model: "plain-model".into(),
                structured_output: false,
            }
        );
    }
}
