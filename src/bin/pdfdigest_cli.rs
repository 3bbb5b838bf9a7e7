//! Command-line PDF summarizer.
//!
//! Prints each partial summary as soon as its chunk finishes, then the combined summary.
use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Parser;
use futures_util::StreamExt;
use pdfdigest::{
    config, logging,
    processing::{PipelineSettings, ProcessingService, SummaryEvent},
};

#[derive(Parser)]
#[command(
    name = "pdfdigest-cli",
    about = "Summarize a PDF from a local path or URL"
)]
struct Cli {
    /// Local file path or http(s) URL of the PDF.
    source: String,
    /// Emit one JSON object per event instead of text.
    #[arg(long)]
    json: bool,
    /// Override the number of words shared between consecutive chunks.
    #[arg(long)]
    overlap: Option<usize>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();

    let mut config = config::get_config().clone();
    if let Some(overlap) = cli.overlap {
        config.chunk_overlap = overlap;
    }
    let settings = PipelineSettings::from_config(&config);
    settings
        .validate()
        .with_context(|| format!("chunk overlap {} is not usable", settings.chunk_overlap))?;
    tracing::debug!(?settings, "CLI settings");
    let service =
        ProcessingService::new(&config).context("failed to initialize processing service")?;

    let mut events = service.summarize_pdf(&cli.source);
    let stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        let event = event.with_context(|| format!("failed to summarize {}", cli.source))?;
        let mut out = stdout.lock();
        if cli.json {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
            continue;
        }
        match event {
            SummaryEvent::Chunk(chunk) => {
                writeln!(out, "[chunk {}] {}", chunk.chunk_index, chunk.partial_summary)?;
            }
            SummaryEvent::Final(summary) => {
                let metadata = &summary.metadata;
                writeln!(out)?;
                writeln!(out, "{}", summary.final_summary)?;
                writeln!(
                    out,
                    "\npages: {}  chunks: {}  language: {}  time: {:.1}s",
                    metadata.pages,
                    metadata.chunks,
                    metadata.language.as_deref().unwrap_or("unknown"),
                    metadata.processing_time
                )?;
                return Ok(());
            }
        }
    }

    bail!("summarization ended without a final summary")
}
