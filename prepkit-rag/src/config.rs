//! Configuration for the retrieval pipeline.

use prepkit_core::ChunkPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Configuration parameters for the retrieval pipeline.
///
/// Per-request knobs (threshold, result caps) act as defaults that search
/// requests may override; the chunking policy and embedding concurrency cap
/// apply to every ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Fixed chunking policy. `None` selects a policy adaptively from each
    /// document's length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_policy: Option<ChunkPolicy>,
    /// Minimum cosine similarity for search results (results below this are
    /// filtered out).
    pub similarity_threshold: f32,
    /// Maximum number of chunk hits returned from vector search.
    pub max_results: usize,
    /// Matched chunks retained per document after aggregation.
    pub chunks_per_document: usize,
    /// Cap on in-flight embedding requests during ingest.
    pub max_concurrent_embeddings: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_policy: None,
            similarity_threshold: 0.3,
            max_results: 10,
            chunks_per_document: 3,
            max_concurrent_embeddings: 4,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set a fixed chunking policy instead of adaptive selection.
    pub fn chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.config.chunk_policy = Some(policy);
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of chunk hits returned from vector search.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    /// Set how many matched chunks each document keeps after aggregation.
    pub fn chunks_per_document(mut self, count: usize) -> Self {
        self.config.chunks_per_document = count;
        self
    }

    /// Set the cap on in-flight embedding requests during ingest.
    pub fn max_concurrent_embeddings(mut self, cap: usize) -> Self {
        self.config.max_concurrent_embeddings = cap;
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Config`] if:
    /// - `similarity_threshold` is outside [-1, 1] (cosine range) or NaN
    /// - `max_results`, `chunks_per_document`, or
    ///   `max_concurrent_embeddings` is zero
    /// - an explicit `chunk_policy` fails its own validation
    pub fn build(self) -> Result<RetrievalConfig> {
        let config = self.config;
        if !(-1.0..=1.0).contains(&config.similarity_threshold) {
            return Err(RetrievalError::Config(format!(
                "similarity_threshold ({}) must be within [-1, 1]",
                config.similarity_threshold
            )));
        }
        if config.max_results == 0 {
            return Err(RetrievalError::Config("max_results must be greater than zero".into()));
        }
        if config.chunks_per_document == 0 {
            return Err(RetrievalError::Config(
                "chunks_per_document must be greater than zero".into(),
            ));
        }
        if config.max_concurrent_embeddings == 0 {
            return Err(RetrievalError::Config(
                "max_concurrent_embeddings must be greater than zero".into(),
            ));
        }
        if let Some(policy) = &config.chunk_policy {
            policy.validate().map_err(|e| RetrievalError::Config(e.to_string()))?;
        }
        Ok(config)
    }
}
