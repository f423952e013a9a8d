//! Vector index trait for storing and searching embedded chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::record::{ChunkRecord, SearchHit};

/// A similarity search request against a user's chunks.
///
/// Every query is scoped to one user: cross-user chunk leakage is a
/// security invariant, so there is no way to build an unscoped query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The embedded query text.
    pub vector: Vec<f32>,
    /// Minimum cosine similarity for a hit. `0.0` means "best effort":
    /// return the top results whatever their score.
    pub threshold: f32,
    /// Maximum number of hits to return.
    pub max_results: usize,
    /// The user whose chunks may be searched. Mandatory.
    pub user_id: Uuid,
    /// Restrict the search to these documents, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<Uuid>>,
}

impl SearchQuery {
    /// Create a user-scoped query over all of the user's documents.
    pub fn new(vector: Vec<f32>, threshold: f32, max_results: usize, user_id: Uuid) -> Self {
        Self { vector, threshold, max_results, user_id, document_ids: None }
    }

    /// Restrict the query to a set of documents.
    pub fn with_documents(mut self, document_ids: Vec<Uuid>) -> Self {
        self.document_ids = Some(document_ids);
        self
    }
}

/// A storage backend for embedded chunks with similarity search.
///
/// Implementations persist [`ChunkRecord`]s partitioned by owning user and
/// answer [`SearchQuery`]s with cosine similarity. All vectors in an index
/// share one fixed dimensionality; operations reject mismatched vectors
/// with [`RetrievalError::DimensionMismatch`] rather than truncating or
/// padding.
///
/// [`RetrievalError::DimensionMismatch`]: crate::RetrievalError::DimensionMismatch
///
/// # Example
///
/// ```rust,ignore
/// use prepkit_rag::{InMemoryVectorIndex, SearchQuery, VectorIndex};
///
/// let index = InMemoryVectorIndex::new(384);
/// index.index(&records).await?;
/// let hits = index.search(&SearchQuery::new(query_vec, 0.3, 10, user_id)).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persist chunk records with their vectors, scoped to the owning user
    /// and parent document. Upsert semantics: an existing record id is
    /// replaced.
    async fn index(&self, records: &[ChunkRecord]) -> Result<()>;

    /// Return the user's chunks with similarity ≥ the query threshold,
    /// ordered by descending similarity, truncated to `max_results`.
    ///
    /// Never returns a chunk owned by a different user, regardless of
    /// threshold.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;

    /// Remove every chunk of one document. No-op if none are indexed.
    async fn remove_document(&self, user_id: Uuid, document_id: Uuid) -> Result<()>;

    /// The fixed dimensionality this index accepts.
    fn dimensions(&self) -> usize;
}
