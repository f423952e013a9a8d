//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns text (a chunk or a query) into a fixed-length
/// vector.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface and must be deterministic for a fixed model version: the same
/// input yields the same vector. On upstream failure (quota, auth, network)
/// they return [`RetrievalError::EmbeddingUnavailable`] — never a zero
/// vector — so callers can retry with backoff. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends with native
/// batching should override it.
///
/// [`RetrievalError::EmbeddingUnavailable`]: crate::RetrievalError::EmbeddingUnavailable
///
/// # Example
///
/// ```rust,ignore
/// use prepkit_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("cell membrane transport").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input and fails on the first error. Ingest-time
    /// embedding does not use this path — it isolates per-chunk failures —
    /// but query expansion and offline tooling do.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
