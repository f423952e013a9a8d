//! Text extraction from uploaded document buffers.
//!
//! The extractor is a pure transformation: bytes in, sanitized text out.
//! It never touches storage. Unsupported formats and documents that yield
//! too little text to be useful are rejected up front so callers can route
//! them to external fallbacks (format conversion, OCR).

use tracing::debug;

use crate::document::ContentType;
use crate::error::{CoreError, Result};
use crate::sanitize::sanitize_text;

/// Minimum viable length of extracted text, in characters.
///
/// Anything shorter signals a document that is likely scanned images,
/// encrypted, or in an encoding the parser cannot read.
pub const MIN_EXTRACTED_CHARS: usize = 50;

/// Extract all textual content from a document buffer.
///
/// PDF pages are extracted in page order and joined with a blank line.
/// Plain text is decoded as UTF-8 (lossily). The returned text is sanitized
/// ([`sanitize_text`]) and trimmed, so chunk offsets computed against it are
/// stable.
///
/// # Errors
///
/// - [`CoreError::PdfParse`] if the PDF parser rejects the buffer.
/// - [`CoreError::InsufficientContent`] if the document is encrypted or the
///   extracted text is shorter than [`MIN_EXTRACTED_CHARS`].
pub fn extract_text(data: &[u8], content_type: ContentType) -> Result<String> {
    let raw = match content_type {
        ContentType::Pdf => extract_pdf(data)?,
        ContentType::PlainText => String::from_utf8_lossy(data).into_owned(),
    };

    let sanitized = sanitize_text(&raw);
    let text = sanitized.trim();
    let chars = text.chars().count();
    if chars < MIN_EXTRACTED_CHARS {
        return Err(CoreError::InsufficientContent { chars });
    }

    debug!(content_type = ?content_type, bytes = data.len(), chars, "extracted document text");
    Ok(text.to_string())
}

fn extract_pdf(data: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| CoreError::PdfParse(e.to_string()))?;

    if doc.is_encrypted() {
        debug!("rejecting encrypted PDF");
        return Err(CoreError::InsufficientContent { chars: 0 });
    }

    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        let page_text =
            doc.extract_text(&[*page_number]).map_err(|e| CoreError::PdfParse(e.to_string()))?;
        let page_text = page_text.trim();
        if !page_text.is_empty() {
            page_texts.push(page_text.to_string());
        }
    }

    debug!(page_count = pages.len(), "extracted PDF pages");
    Ok(page_texts.join("\n\n"))
}
