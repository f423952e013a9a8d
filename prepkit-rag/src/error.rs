//! Error types for the `prepkit-rag` crate.

use thiserror::Error;

/// Errors that can occur in embedding, indexing, and search operations.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The upstream embedding provider failed (quota, auth, network).
    ///
    /// Retryable with backoff. Callers must never substitute a zero vector.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's dimensionality does not match the index.
    ///
    /// Fatal: indicates embedding model/version skew. Vectors are never
    /// silently truncated or padded to fit.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the index was created with.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The vector index backend failed.
    #[error("Vector index error ({backend}): {message}")]
    Index {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An extraction or chunking error propagated from `prepkit-core`.
    #[error(transparent)]
    Core(#[from] prepkit_core::CoreError),
}

impl RetrievalError {
    /// Whether retrying with backoff is appropriate.
    ///
    /// True for upstream-service failures (embedding provider, index
    /// backend); false for input and invariant errors, which retrying
    /// cannot fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EmbeddingUnavailable { .. } | Self::Index { .. })
    }

    /// A short human-readable reason suitable for end users.
    ///
    /// Distinguishes the three ingestion failure categories callers present
    /// directly: unsupported file, file needing OCR, and temporary service
    /// trouble.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Core(prepkit_core::CoreError::UnsupportedType(_)) => {
                "This file type is not supported. Please upload a PDF or text file."
            }
            Self::Core(prepkit_core::CoreError::InsufficientContent { .. }) => {
                "We couldn't read enough text from this file. If it is scanned or \
                 encrypted, try an OCR'd or decrypted copy."
            }
            Self::EmbeddingUnavailable { .. } | Self::Index { .. } => {
                "A temporary service issue interrupted processing. Please try again \
                 in a moment."
            }
            _ => "Processing failed for this document.",
        }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_the_taxonomy() {
        let transient = RetrievalError::EmbeddingUnavailable {
            provider: "OpenAI".into(),
            message: "429 rate limited".into(),
        };
        assert!(transient.is_retryable());

        let backend =
            RetrievalError::Index { backend: "qdrant".into(), message: "timeout".into() };
        assert!(backend.is_retryable());

        let fatal = RetrievalError::DimensionMismatch { expected: 384, actual: 768 };
        assert!(!fatal.is_retryable());

        let input: RetrievalError =
            prepkit_core::CoreError::UnsupportedType("image/png".into()).into();
        assert!(!input.is_retryable());
    }

    #[test]
    fn user_messages_distinguish_failure_categories() {
        let unsupported: RetrievalError =
            prepkit_core::CoreError::UnsupportedType("image/png".into()).into();
        assert!(unsupported.user_message().contains("not supported"));

        let thin: RetrievalError = prepkit_core::CoreError::InsufficientContent { chars: 12 }.into();
        assert!(thin.user_message().contains("OCR"));

        let transient = RetrievalError::EmbeddingUnavailable {
            provider: "OpenAI".into(),
            message: "503".into(),
        };
        assert!(transient.user_message().contains("try again"));
    }
}
