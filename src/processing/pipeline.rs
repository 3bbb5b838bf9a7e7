//! Streaming PDF summarization: extract, detect language, chunk, summarize, aggregate.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use uuid::Uuid;

use crate::extraction::{ExtractedDocument, PdfExtractor};
use crate::language::LanguageDetector;

use super::chunking::{
    Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, decide_chunk_size, validate_chunking,
};
use super::summarize::ChunkSummarizer;
use super::types::{
    ChunkSummaryEvent, ChunkingError, FinalSummaryEvent, PipelineError, SummarizationMetadata,
    SummaryEvent,
};

/// Boxed event stream returned by [`SummarizePdfPipeline::summarize`].
pub type SummaryEventStream =
    Pin<Box<dyn Stream<Item = Result<SummaryEvent, PipelineError>> + Send>>;

/// Orchestrates one summarization run per call over injected collaborators.
///
/// Runs are independent and share no mutable state, so one pipeline may serve concurrent
/// callers. Chunks of a single run are summarized one at a time, in order.
#[derive(Clone)]
pub struct SummarizePdfPipeline {
    extractor: Arc<dyn PdfExtractor>,
    detector: Arc<dyn LanguageDetector>,
    summarizer: Arc<dyn ChunkSummarizer>,
    overlap: usize,
    default_chunk_size: usize,
}

impl SummarizePdfPipeline {
    /// Pipeline with the default overlap (50 words) and fallback chunk size (600 words).
    pub fn new(
        extractor: Arc<dyn PdfExtractor>,
        detector: Arc<dyn LanguageDetector>,
        summarizer: Arc<dyn ChunkSummarizer>,
    ) -> Self {
        Self {
            extractor,
            detector,
            summarizer,
            overlap: DEFAULT_CHUNK_OVERLAP,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the number of words shared between consecutive chunks.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Override the chunk size used for languages without an explicit mapping.
    pub fn with_default_chunk_size(mut self, chunk_size: usize) -> Self {
        self.default_chunk_size = chunk_size;
        self
    }

    /// Check that the overlap fits every chunk size a run may select.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        validate_chunking(self.overlap, self.default_chunk_size)
    }

    /// Summarize the PDF at `source`.
    ///
    /// The returned stream is lazy: nothing runs until it is polled, and dropping it cancels
    /// the run before the next chunk is summarized. On success it yields one
    /// [`SummaryEvent::Chunk`] per chunk followed by exactly one [`SummaryEvent::Final`]. A
    /// failure ends the stream with a single `Err` and no final event. Invalid chunking
    /// settings fail before the source is touched.
    pub fn summarize(&self, source: &str) -> SummaryEventStream {
        Box::pin(run(self.clone(), source.to_string()))
    }
}

fn run(
    pipeline: SummarizePdfPipeline,
    source: String,
) -> impl Stream<Item = Result<SummaryEvent, PipelineError>> + Send {
    try_stream! {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, source = %source, "Starting PDF summarization");
        pipeline.validate()?;

        let document = accept_extraction(pipeline.extractor.extract(&source).await)
            .inspect_err(|error| tracing::error!(%run_id, %error, "PDF extraction failed"))?;

        let pages = document.pages;
        let text = document.text;
        if text.trim().is_empty() {
            tracing::warn!(%run_id, pages, "PDF contains no extractable text");
            yield SummaryEvent::Final(FinalSummaryEvent {
                final_summary: String::new(),
                metadata: SummarizationMetadata::empty(pages),
            });
            return;
        }

        let detection = pipeline.detector.detect(&text);
        let language = detection.language;
        let chunk_size = decide_chunk_size(language.as_deref(), pipeline.default_chunk_size);
        tracing::info!(
            %run_id,
            pages,
            language = language.as_deref().unwrap_or("unknown"),
            confidence = detection.confidence,
            chunk_size,
            overlap = pipeline.overlap,
            "Chunking document"
        );

        let chunker = Chunker::new(chunk_size)?;
        let chunks = chunker.chunk_text_with_overlap(&text, pipeline.overlap)?;

        let mut metadata = SummarizationMetadata::empty(pages);
        metadata.language = language;
        let mut partial_summaries = Vec::with_capacity(chunks.len());

        for (position, chunk) in chunks.enumerate() {
            let chunk_index = position + 1;
            tracing::debug!(
                %run_id,
                chunk_index,
                words = chunk.split_whitespace().count(),
                "Summarizing chunk"
            );

            let result = pipeline
                .summarizer
                .summarize_chunk(&chunk)
                .await
                .map_err(|source| {
                    tracing::error!(
                        %run_id,
                        chunk_index,
                        error = %source,
                        "Chunk summarization failed"
                    );
                    PipelineError::ChunkSummarizationFailed { chunk_index, source }
                })?;

            let partial_summary = result.summary.trim().to_string();
            metadata.accumulate(&result.metadata);
            partial_summaries.push(partial_summary.clone());

            yield SummaryEvent::Chunk(ChunkSummaryEvent {
                chunk_index,
                partial_summary,
            });
        }

        tracing::info!(
            %run_id,
            chunks = metadata.chunks,
            summary_length = metadata.summary_length,
            processing_time = metadata.processing_time,
            "PDF summarization finished"
        );
        yield SummaryEvent::Final(FinalSummaryEvent {
            final_summary: partial_summaries.join("\n"),
            metadata,
        });
    }
}

fn accept_extraction(document: ExtractedDocument) -> Result<ExtractedDocument, PipelineError> {
    if document.success {
        Ok(document)
    } else {
        Err(PipelineError::ExtractionFailed(
            document.error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}
