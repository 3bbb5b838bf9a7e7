use lopdf::Document;

use super::ExtractionError;

/// Text and page count parsed from one PDF.
#[derive(Debug)]
pub(crate) struct ParsedPdf {
    pub text: String,
    pub pages: usize,
}

/// Parse PDF bytes: pages are counted with `lopdf`, text is pulled with `pdf-extract`.
///
/// CPU-bound; call from a blocking task.
pub(crate) fn parse_pdf(bytes: &[u8]) -> Result<ParsedPdf, ExtractionError> {
    let document =
        Document::load_mem(bytes).map_err(|error| ExtractionError::Parse(error.to_string()))?;
    let pages = document.get_pages().len();
    if pages == 0 {
        return Err(ExtractionError::NoPages);
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|error| ExtractionError::Parse(error.to_string()))?;
    tracing::debug!(pages, chars = text.len(), "Parsed PDF");

    Ok(ParsedPdf {
        text: text.trim().to_string(),
        pages,
    })
}
