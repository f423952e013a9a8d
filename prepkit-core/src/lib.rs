//! Document foundation for the PrepKit retrieval core.
//!
//! This crate provides:
//! - The document/chunk data model shared across the pipeline
//! - Text extraction from PDF and plain-text uploads
//! - Sanitization of extracted text for safe persistence
//! - Cascading-separator chunking with exact character offsets
//!
//! Everything here is synchronous and side-effect free; the async retrieval
//! layer lives in `prepkit-rag`.

mod chunking;
mod document;
mod error;
mod extract;
mod sanitize;

pub use chunking::{ChunkPolicy, chunk_text};
pub use document::{Chunk, ContentType, Document, DocumentStatus};
pub use error::{CoreError, Result};
pub use extract::{MIN_EXTRACTED_CHARS, extract_text};
pub use sanitize::sanitize_text;
