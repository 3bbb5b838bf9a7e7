//! Summarization pipeline: chunking, single-text summarization, and streaming orchestration.

pub mod chunking;
mod pipeline;
mod service;
pub mod summarize;
pub mod types;

pub use pipeline::{SummarizePdfPipeline, SummaryEventStream};
pub use service::{
    LlmStatusSnapshot, PipelineSettings, ProcessingApi, ProcessingService, ServiceInitError,
};
pub use summarize::{ChunkSummarizer, SYSTEM_SUMMARIZATION_PROMPT, TextSummarizer};
pub use types::{
    ChunkSummary, ChunkSummaryEvent, ChunkSummaryMetadata, ChunkingError, FinalSummaryEvent,
    PipelineError, PromptRecord, SummarizationMetadata, SummarizeTextError, SummaryEvent,
};
