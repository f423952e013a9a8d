//! Error types for the `prepkit-core` crate.

use thiserror::Error;

/// Errors that can occur during text extraction and chunking.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The declared content type is not one the extractor understands.
    ///
    /// Not retryable — the caller must supply a supported format.
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// Extraction produced less text than the minimum viable length.
    ///
    /// Signals a document that is likely scanned images, encrypted, or in an
    /// unsupported encoding. Not retryable without an OCR fallback.
    #[error(
        "Insufficient text content ({chars} chars): document may be scanned images, \
         encrypted, or in an unsupported encoding"
    )]
    InsufficientContent {
        /// How many characters extraction actually yielded.
        chars: usize,
    },

    /// The PDF parser rejected the document.
    #[error("PDF parsing failed: {0}")]
    PdfParse(String),

    /// Chunking produced zero chunks, so the document cannot proceed to
    /// embedding.
    #[error("Chunking failed: {0}")]
    ChunkingFailed(String),

    /// A chunk-size/overlap policy failed validation.
    #[error("Invalid chunking policy: {0}")]
    InvalidPolicy(String),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
