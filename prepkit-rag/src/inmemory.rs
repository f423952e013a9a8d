//! In-memory vector index using exact cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], a zero-dependency index
//! backed by per-user `HashMap` partitions behind a `tokio::sync::RwLock`.
//! It is the reference implementation of the [`VectorIndex`] ordering and
//! threshold contracts, sized for per-user corpora in the
//! hundreds-to-low-thousands of chunks.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, RetrievalError};
use crate::index::{SearchQuery, VectorIndex};
use crate::record::{ChunkRecord, SearchHit};

/// An in-memory vector index using exact linear-scan cosine search.
///
/// Records are stored as nested `HashMap`s: user id → record id → record,
/// so user isolation falls out of the partitioning rather than a filter
/// that could be forgotten. All operations are async-safe via
/// `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use prepkit_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new(384);
/// index.index(&records).await?;
/// ```
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    users: RwLock<HashMap<Uuid, HashMap<String, ChunkRecord>>>,
    dimensions: usize,
}

impl InMemoryVectorIndex {
    /// Create an empty index accepting vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { users: RwLock::new(HashMap::new()), dimensions }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Compute cosine similarity between two vectors of equal length.
///
/// Dot product over the product of L2 norms. Returns 0.0 if either vector
/// has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn index(&self, records: &[ChunkRecord]) -> Result<()> {
        // Validate the whole batch before touching the store so a
        // mismatched record cannot leave a partial write behind.
        for record in records {
            self.check_dimensions(&record.embedding)?;
        }

        let mut users = self.users.write().await;
        for record in records {
            users
                .entry(record.user_id)
                .or_default()
                .insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.check_dimensions(&query.vector)?;

        let users = self.users.read().await;
        let Some(partition) = users.get(&query.user_id) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = partition
            .values()
            .filter(|record| match &query.document_ids {
                Some(ids) => ids.contains(&record.document_id),
                None => true,
            })
            .filter_map(|record| {
                let similarity = cosine_similarity(&record.embedding, &query.vector);
                (similarity >= query.threshold)
                    .then(|| SearchHit { record: record.clone(), similarity })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.max_results);
        Ok(hits)
    }

    async fn remove_document(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(partition) = users.get_mut(&user_id) {
            partition.retain(|_, record| record.document_id != document_id);
        }
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
