//! PDF ingestion helpers: text extraction and per-chunk metadata.

use chrono::Utc;
use lopdf::Document;
use ragcore::{CollaboratorError, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Text pulled out of an uploaded PDF
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub total_pages: usize,
}

impl ExtractedText {
    pub fn total_characters(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the text of every page of the PDF in `bytes`, in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<ExtractedText, CollaboratorError> {
    let document =
        Document::load_mem(bytes).map_err(|e| CollaboratorError::Document(e.to_string()))?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let text = if pages.is_empty() {
        String::new()
    } else {
        document
            .extract_text(&pages)
            .map_err(|e| CollaboratorError::Document(e.to_string()))?
    };
    debug!(pages = pages.len(), characters = text.len(), "Extracted PDF text");

    Ok(ExtractedText {
        text,
        total_pages: pages.len(),
    })
}

/// Metadata stored alongside each chunk of `filename`.
pub fn chunk_metadata(filename: &str, chunks: &[String]) -> Vec<BTreeMap<String, Value>> {
    let processed_date = Utc::now().to_rfc3339();
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            BTreeMap::from([
                ("source".to_string(), Value::from(filename)),
                ("filename".to_string(), Value::from(filename)),
                ("chunk_index".to_string(), Value::from(i)),
                ("chunk_size".to_string(), Value::from(chunk.chars().count())),
                ("processed_date".to_string(), Value::from(processed_date.as_str())),
            ])
        })
        .collect()
}
