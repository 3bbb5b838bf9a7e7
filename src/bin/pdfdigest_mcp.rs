//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes pdfdigest's summarization tools over stdio for editor and
//! agent integrations. Shares all runtime configuration with the HTTP binary.
use anyhow::{Context, Result};
use pdfdigest::{config, logging, mcp::PdfDigestMcpServer, processing};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing();

    let processing = Arc::new(
        processing::ProcessingService::new(config::get_config())
            .context("failed to initialize processing service")?,
    );
    let server = PdfDigestMcpServer::new(processing);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
