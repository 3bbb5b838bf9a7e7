//! Core data types and error definitions for the summarization pipeline.

use crate::llm::LlmClientError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a chunker is configured with impossible bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    /// Chunk size of zero words.
    #[error("invalid chunking configuration: chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would keep the sliding window from advancing.
    #[error(
        "invalid chunking configuration: overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
    )]
    OverlapTooLarge {
        /// Requested overlap in words.
        overlap: usize,
        /// Configured chunk size in words.
        chunk_size: usize,
    },
}

/// Errors raised while summarizing a single piece of text.
#[derive(Debug, Error)]
pub enum SummarizeTextError {
    /// Input was empty or whitespace.
    #[error("Text is empty.")]
    EmptyText,
    /// Provider call failed.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// Provider output did not match the declared response shape.
    #[error("Invalid output data: {0}")]
    SchemaValidationFailed(String),
}

/// Errors that terminate a PDF summarization run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chunk size or overlap were rejected before any chunk was summarized.
    #[error(transparent)]
    InvalidConfiguration(#[from] ChunkingError),
    /// Source could not be loaded or parsed.
    #[error("PDF extraction failed: {0}")]
    ExtractionFailed(String),
    /// A chunk could not be summarized; the run stops at that chunk.
    #[error("Failed to summarize chunk {chunk_index}: {source}")]
    ChunkSummarizationFailed {
        /// 1-based index of the failing chunk.
        chunk_index: usize,
        /// Underlying summarizer failure.
        #[source]
        source: SummarizeTextError,
    },
}

/// System and user prompts sent for one summarization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Instructions placed in the system slot.
    pub system_prompt: String,
    /// User turn containing the text to summarize.
    pub user_prompt: String,
}

/// Measurements reported alongside a chunk summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummaryMetadata {
    /// Model that produced the summary.
    pub model_name: String,
    /// Language reported by the model, when available.
    pub document_language: Option<String>,
    /// Input length in characters.
    pub document_length: usize,
    /// Summary length in characters.
    pub summary_length: usize,
    /// Wall-clock seconds spent on the call.
    pub processing_time: f64,
}

/// Output of the single-text summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// Summary text.
    pub summary: String,
    /// Prompts used to obtain it.
    pub prompt: PromptRecord,
    /// Call measurements.
    pub metadata: ChunkSummaryMetadata,
}

/// Streaming event emitted after each chunk is summarized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummaryEvent {
    /// 1-based chunk position.
    #[serde(rename = "chunk")]
    pub chunk_index: usize,
    /// Trimmed summary of the chunk.
    pub partial_summary: String,
}

/// Totals aggregated over all chunks of one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummarizationMetadata {
    /// Page count reported by extraction.
    pub pages: usize,
    /// Number of summarized chunks.
    pub chunks: usize,
    /// Detected document language.
    pub language: Option<String>,
    /// Sum of per-chunk document lengths.
    pub document_length: usize,
    /// Sum of per-chunk summary lengths.
    pub summary_length: usize,
    /// Sum of per-chunk processing times, in seconds.
    pub processing_time: f64,
}

impl SummarizationMetadata {
    /// Metadata for a run that stopped before chunking.
    pub fn empty(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub(crate) fn accumulate(&mut self, metadata: &ChunkSummaryMetadata) {
        self.chunks += 1;
        self.document_length += metadata.document_length;
        self.summary_length += metadata.summary_length;
        self.processing_time += metadata.processing_time;
    }
}

/// Terminal event of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSummaryEvent {
    /// Chunk summaries joined by newlines.
    pub final_summary: String,
    /// Aggregated run metadata.
    pub metadata: SummarizationMetadata,
}

/// Event yielded by [`crate::processing::SummarizePdfPipeline::summarize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryEvent {
    /// One chunk finished.
    Chunk(ChunkSummaryEvent),
    /// All chunks finished.
    Final(FinalSummaryEvent),
}

impl SummaryEvent {
    /// Whether this is the terminal event.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}
