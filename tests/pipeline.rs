//! End-to-end runs through the real extractor, detector, and Ollama client against local fakes.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdfdigest::{
    extraction::PdfTextExtractor,
    language::WhatlangDetector,
    llm::{OllamaClient, OutputMode},
    processing::{PipelineError, PipelineSettings, ProcessingService, SummaryEvent},
};
use serde_json::json;

fn single_page_pdf(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    let kids: Vec<Object> = vec![page_id.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

fn service_against(server: &MockServer) -> ProcessingService {
    let llm = OllamaClient::new(
        server.base_url(),
        "llama3".into(),
        OutputMode::Schema,
        Duration::from_secs(5),
    )
    .expect("ollama client");
    ProcessingService::with_components(
        Arc::new(
            PdfTextExtractor::with_fetch_timeout(Duration::from_secs(5)).expect("extractor"),
        ),
        Arc::new(WhatlangDetector),
        Arc::new(llm),
        PipelineSettings::default(),
    )
    .expect("valid settings")
}

#[tokio::test]
async fn local_pdf_runs_to_final_summary() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({
                "response": "{\"summary\":\"Revenue grew.\",\"document_language\":\"en\"}",
                "done": true
            }));
        })
        .await;

    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .expect("temp file");
    file.write_all(&single_page_pdf("Revenue grew strongly during the third quarter."))
        .expect("write pdf");
    let source = file.path().to_string_lossy().to_string();

    let service = service_against(&server);
    let events: Vec<_> = service.summarize_pdf(&source).collect().await;

    assert_eq!(events.len(), 2, "one chunk event then the final event: {events:?}");
    assert!(matches!(
        &events[0],
        Ok(SummaryEvent::Chunk(chunk))
            if chunk.chunk_index == 1 && chunk.partial_summary == "Revenue grew."
    ));
    let Ok(SummaryEvent::Final(summary)) = &events[1] else {
        panic!("expected final event, got {:?}", events[1]);
    };
    assert_eq!(summary.final_summary, "Revenue grew.");
    assert_eq!(summary.metadata.pages, 1);
    assert_eq!(summary.metadata.chunks, 1);
    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_summarized, 1);
    assert_eq!(snapshot.chunks_summarized, 1);
}

#[tokio::test]
async fn remote_download_failure_ends_run_with_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone.pdf");
            then.status(404);
        })
        .await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500);
        })
        .await;

    let service = service_against(&server);
    let events: Vec<_> = service
        .summarize_pdf(&server.url("/gone.pdf"))
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Err(PipelineError::ExtractionFailed(message)) if message.contains("HTTP 404")
    ));
    generate.assert_hits_async(0).await;
    assert_eq!(service.metrics_snapshot().failed_runs, 1);
}

#[tokio::test]
async fn provider_failure_stops_at_first_chunk() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/report.pdf");
            then.status(200)
                .header("content-type", "application/pdf")
                .body(single_page_pdf("Quarterly report with several findings."));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(429).body("slow down");
        })
        .await;

    let service = service_against(&server);
    let events: Vec<_> = service
        .summarize_pdf(&server.url("/report.pdf"))
        .collect()
        .await;

    assert_eq!(events.len(), 1, "no chunk event before the failure: {events:?}");
    assert!(matches!(
        &events[0],
        Err(PipelineError::ChunkSummarizationFailed { chunk_index: 1, .. })
    ));
    assert_eq!(service.metrics_snapshot().failed_runs, 1);
}
