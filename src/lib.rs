#![deny(missing_docs)]

//! Core library for pdfdigest: streaming PDF summarization over MCP, HTTP, and the command line.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Response evaluation and hallucination checks.
pub mod evaluation;
/// PDF loading and text extraction.
pub mod extraction;
/// Language identification.
pub mod language;
/// LLM provider abstraction and adapters.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Summarization counters.
pub mod metrics;
/// Chunking, summarization, and the streaming PDF pipeline.
pub mod processing;
