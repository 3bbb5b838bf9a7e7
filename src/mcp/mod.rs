//! Model Context Protocol (MCP) integration for pdfdigest.
//!
//! This module exposes the summarization service to editors and agent hosts over stdio:
//!
//! - Tools: `summarize_pdf`, `summarize_text`, `extract_pdf_text`, `detect_language`,
//!   `check_hallucination`, `evaluate_responses`, and `metrics`.
//! - Resources: `mcp://health` and `mcp://usage`.
//!
//! Handlers, schemas, and formatting helpers live in focused submodules.

mod format;
pub mod handlers;
mod schemas;
mod server;

pub use server::PdfDigestMcpServer;
