//! Data types for uploaded documents and their text chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Content types the text extractor understands.
///
/// Anything else (DOCX, images, audio, …) is handled by external
/// collaborators before it reaches this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// PDF documents (`application/pdf`).
    Pdf,
    /// Plain text, including markdown (`text/plain`, `text/markdown`).
    PlainText,
}

impl ContentType {
    /// Parse a declared content type.
    ///
    /// Accepts MIME strings (with or without parameters, e.g.
    /// `text/plain; charset=utf-8`) and bare file extensions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedType`] for any type outside the
    /// supported set.
    pub fn parse(declared: &str) -> Result<Self> {
        let essence = declared.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" | "pdf" => Ok(Self::Pdf),
            "text/plain" | "text/markdown" | "text/x-markdown" | "txt" | "md" | "markdown" => {
                Ok(Self::PlainText)
            }
            _ => Err(CoreError::UnsupportedType(declared.trim().to_string())),
        }
    }
}

/// Processing state of an uploaded document.
///
/// A document is created `Pending`, moves to `Processing` when the pipeline
/// picks it up, and ends in `Completed` or `Failed`. Terminal states are
/// never left except by deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Uploaded, not yet picked up by the pipeline.
    Pending,
    /// Extraction/chunking/embedding in progress.
    Processing,
    /// Text extracted and chunks indexed.
    Completed,
    /// Processing aborted; see the recorded failure reason.
    Failed,
}

impl DocumentStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// An uploaded study material owned by exactly one user.
///
/// `text` holds the sanitized extracted text and stays `None` until
/// extraction succeeds. Persistence belongs to the calling application;
/// this type is the shared shape that crosses that boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: Uuid,
    /// The user who uploaded the document.
    pub user_id: Uuid,
    /// Sanitized extracted text; `None` until extraction succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Current processing state.
    pub status: DocumentStatus,
    /// Topic label used when presenting retrieval results.
    pub topic: String,
    /// When the document was uploaded.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a freshly uploaded document in the `Pending` state.
    pub fn new(id: Uuid, user_id: Uuid, topic: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            text: None,
            status: DocumentStatus::Pending,
            topic: topic.into(),
            created_at: Utc::now(),
        }
    }

    /// Mark the document as picked up by the pipeline.
    pub fn mark_processing(&mut self) {
        self.status = DocumentStatus::Processing;
    }

    /// Record successful extraction: store the sanitized text and complete.
    pub fn complete(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.status = DocumentStatus::Completed;
    }

    /// Record failed processing. The text stays `None`.
    pub fn fail(&mut self) {
        self.status = DocumentStatus::Failed;
    }
}

/// A contiguous slice of a document's sanitized text.
///
/// Offsets are measured in Unicode scalar values (characters, not bytes)
/// into the sanitized text the chunk was cut from. Adjacent chunks overlap
/// by the policy's overlap length, so `start_char` of chunk *i+1* lies
/// `overlap` characters before `end_char` of chunk *i*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position within the document. Insertion order is
    /// significant: it reconstructs document position and overlap
    /// bookkeeping.
    pub index: usize,
    /// The chunk text, cut from the sanitized document text.
    pub text: String,
    /// Character offset of the first character (inclusive).
    pub start_char: usize,
    /// Character offset one past the last character (exclusive).
    pub end_char: usize,
    /// Number of characters; always `end_char - start_char`.
    pub char_count: usize,
    /// Number of whitespace-separated words.
    pub word_count: usize,
}
