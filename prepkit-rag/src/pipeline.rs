//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] coordinates the full ingest-and-search
//! workflow by composing an [`EmbeddingProvider`] and a [`VectorIndex`]
//! behind explicit, injected handles. It owns the two operations outside
//! callers consume: [`ingest_document`](RetrievalPipeline::ingest_document)
//! (extract → chunk → embed → index) and
//! [`search`](RetrievalPipeline::search) (embed → search → aggregate).
//!
//! # Example
//!
//! ```rust,ignore
//! use prepkit_rag::{InMemoryVectorIndex, RetrievalConfig, RetrievalPipeline};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_index(Arc::new(InMemoryVectorIndex::new(384)))
//!     .build()?;
//!
//! let outcome = pipeline.ingest_document(request).await?;
//! let results = pipeline.search(SearchRequest::new(user_id, "cell respiration")).await?;
//! ```

use std::sync::Arc;

use prepkit_core::{ChunkPolicy, ContentType, chunk_text, extract_text};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::aggregate::{AggregateOptions, ContextOptions, DocumentRelevance, aggregate, render_context};
use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, RetrievalError};
use crate::index::{SearchQuery, VectorIndex};
use crate::record::ChunkRecord;

/// A document to run through the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Identifier the caller assigned to the document.
    pub document_id: Uuid,
    /// The uploading user; every produced record is scoped to them.
    pub user_id: Uuid,
    /// The raw uploaded bytes.
    pub data: Vec<u8>,
    /// Declared content type (MIME string or bare extension).
    pub content_type: String,
    /// Topic label carried onto every chunk record.
    pub topic: String,
}

/// How far an ingest got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Every chunk was embedded and indexed.
    Completed,
    /// Some chunk embeddings failed; the rest were indexed.
    PartiallyCompleted,
}

/// The result of a successful (possibly partial) ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// The records that were embedded and indexed, in chunk order.
    pub chunks: Vec<ChunkRecord>,
    /// Indices of chunks whose embedding failed, ascending. Empty on a
    /// fully completed ingest.
    pub failed_chunk_indices: Vec<usize>,
    /// Whether the ingest completed fully or partially.
    pub status: IngestStatus,
}

/// A user's search over their indexed documents.
///
/// Optional knobs fall back to the pipeline's configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The searching user. Results never cross this boundary.
    pub user_id: Uuid,
    /// The query text to embed and search with.
    pub query: String,
    /// Minimum cosine similarity; defaults to the configured threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    /// Cap on chunk hits from the index; defaults to the configured cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Restrict the search to these documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<Uuid>>,
    /// Matched chunks kept per document; defaults to the configured count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_document: Option<usize>,
}

impl SearchRequest {
    /// Create a request with every knob at its configured default.
    pub fn new(user_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            user_id,
            query: query.into(),
            threshold: None,
            max_results: None,
            document_ids: None,
            chunks_per_document: None,
        }
    }

    /// Override the similarity threshold. Pass a low value (even `0.0`)
    /// for best-effort retrieval when nothing clears the default.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Override the chunk hit cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Restrict the search to a set of documents.
    pub fn with_documents(mut self, document_ids: Vec<Uuid>) -> Self {
        self.document_ids = Some(document_ids);
        self
    }

    /// Override how many matched chunks each document keeps.
    pub fn with_chunks_per_document(mut self, count: usize) -> Self {
        self.chunks_per_document = Some(count);
        self
    }
}

/// The retrieval pipeline orchestrator.
///
/// Coordinates document ingestion (extract → chunk → embed → index) and
/// search (embed → search → aggregate). Components are injected trait
/// objects, so tests swap in doubles and nothing hides in process-wide
/// state. Construct one via [`RetrievalPipeline::builder()`].
pub struct RetrievalPipeline {
    config: RetrievalConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector index.
    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.vector_index
    }

    /// Ingest one document: extract text, chunk it, embed the chunks, and
    /// index the results for the owning user.
    ///
    /// Chunk embeddings run concurrently, capped at the configured
    /// in-flight limit. A failed embedding marks that chunk failed and the
    /// batch continues; the outcome reports the failed indices and a
    /// `PartiallyCompleted` status. Extraction and chunking failures abort
    /// the whole document.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::Core`] for unsupported types, insufficient
    ///   extracted text, or chunking failures.
    /// - [`RetrievalError::EmbeddingUnavailable`] if every chunk embedding
    ///   failed (nothing was indexed).
    /// - [`RetrievalError::Index`] or
    ///   [`RetrievalError::DimensionMismatch`] if indexing fails.
    pub async fn ingest_document(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let document_id = request.document_id;

        // 1. Resolve the declared content type and extract text
        let content_type = ContentType::parse(&request.content_type)?;
        let text = extract_text(&request.data, content_type).inspect_err(
            |e| error!(document_id = %document_id, error = %e, "extraction failed"),
        )?;

        // 2. Chunk with the configured or adaptively selected policy
        let policy = self
            .config
            .chunk_policy
            .unwrap_or_else(|| ChunkPolicy::for_text_length(text.chars().count()));
        debug!(
            document_id = %document_id,
            chunk_size = policy.chunk_size,
            overlap = policy.overlap,
            "selected chunking policy"
        );
        let chunks = chunk_text(&text, policy).inspect_err(
            |e| error!(document_id = %document_id, error = %e, "chunking failed"),
        )?;
        let chunk_count = chunks.len();

        // 3. Embed chunks concurrently, isolating per-chunk failures
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_embeddings));
        let mut tasks = JoinSet::new();
        for chunk in &chunks {
            let index = chunk.index;
            let text = chunk.text.clone();
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&self.embedding_provider);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => provider.embed(&text).await,
                    Err(_) => Err(RetrievalError::EmbeddingUnavailable {
                        provider: "pipeline".into(),
                        message: "embedding concurrency limiter closed".into(),
                    }),
                };
                (index, result)
            });
        }

        let mut embeddings: Vec<Option<Vec<f32>>> = vec![None; chunk_count];
        let mut first_error: Option<RetrievalError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(embedding))) => embeddings[index] = Some(embedding),
                Ok((index, Err(e))) => {
                    warn!(
                        document_id = %document_id,
                        chunk_index = index,
                        error = %e,
                        "chunk embedding failed, continuing with siblings"
                    );
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!(document_id = %document_id, error = %e, "embedding task aborted");
                }
            }
        }

        // 4. Attach embeddings; collect the indices that failed
        let mut records = Vec::with_capacity(chunk_count);
        let mut failed_chunk_indices = Vec::new();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            match embedding {
                Some(embedding) => records.push(ChunkRecord::from_chunk(
                    chunk,
                    document_id,
                    request.user_id,
                    &request.topic,
                    embedding,
                )),
                None => failed_chunk_indices.push(chunk.index),
            }
        }

        // A document with zero indexed chunks must not report success.
        if records.is_empty() {
            error!(document_id = %document_id, chunk_count, "every chunk embedding failed");
            return Err(first_error.unwrap_or_else(|| RetrievalError::EmbeddingUnavailable {
                provider: "pipeline".into(),
                message: format!("all {chunk_count} chunk embeddings failed"),
            }));
        }

        // 5. Index the embedded records
        self.vector_index.index(&records).await.inspect_err(
            |e| error!(document_id = %document_id, error = %e, "indexing failed"),
        )?;

        let status = if failed_chunk_indices.is_empty() {
            IngestStatus::Completed
        } else {
            IngestStatus::PartiallyCompleted
        };
        info!(
            document_id = %document_id,
            chunk_count,
            failed_count = failed_chunk_indices.len(),
            "ingested document"
        );
        Ok(IngestOutcome { chunks: records, failed_chunk_indices, status })
    }

    /// Search the user's indexed content and return ranked documents.
    ///
    /// Embeds the query, searches the index scoped to the requesting user,
    /// and aggregates chunk hits into document-level results. An embedding
    /// failure aborts the whole search; no cached or partial fallback is
    /// substituted.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::Config`] if a request override is out of range.
    /// - [`RetrievalError::EmbeddingUnavailable`] if the query embedding
    ///   fails.
    /// - [`RetrievalError::Index`] or
    ///   [`RetrievalError::DimensionMismatch`] if the index rejects the
    ///   query.
    pub async fn search(&self, request: SearchRequest) -> Result<Vec<DocumentRelevance>> {
        let threshold = request.threshold.unwrap_or(self.config.similarity_threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(RetrievalError::Config(format!(
                "similarity threshold ({threshold}) must be within [-1, 1]"
            )));
        }
        let max_results = request.max_results.unwrap_or(self.config.max_results);
        let chunks_per_document =
            request.chunks_per_document.unwrap_or(self.config.chunks_per_document);

        // 1. Embed the query; failure aborts the search
        let vector = self.embedding_provider.embed(&request.query).await.inspect_err(
            |e| error!(user_id = %request.user_id, error = %e, "query embedding failed"),
        )?;

        // 2. Search the index, scoped to the requesting user
        let mut query = SearchQuery::new(vector, threshold, max_results, request.user_id);
        if let Some(document_ids) = request.document_ids {
            query = query.with_documents(document_ids);
        }
        let hits = self.vector_index.search(&query).await.inspect_err(
            |e| error!(user_id = %request.user_id, error = %e, "vector search failed"),
        )?;

        // 3. Aggregate chunk hits into ranked documents
        let options = AggregateOptions { chunks_per_document, max_documents: None };
        let results = aggregate(hits, &options);

        info!(
            user_id = %request.user_id,
            document_count = results.len(),
            "search completed"
        );
        Ok(results)
    }

    /// Search and assemble LLM prompt context in one call.
    ///
    /// Returns the ranked documents together with the rendered context
    /// blob ([`render_context`]) the question-generation collaborator
    /// consumes.
    pub async fn search_context(
        &self,
        request: SearchRequest,
        options: &ContextOptions,
    ) -> Result<(Vec<DocumentRelevance>, String)> {
        let results = self.search(request).await?;
        let context = render_context(&results, options);
        Ok((results, context))
    }

    /// Remove a document's chunks from the index.
    pub async fn remove_document(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        self.vector_index.remove_document(user_id, document_id).await?;
        info!(document_id = %document_id, "removed document from index");
        Ok(())
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// All fields are required. Call
/// [`build()`](RetrievalPipelineBuilder::build) to validate and produce
/// the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RetrievalPipeline::builder()
///     .config(RetrievalConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_index(Arc::new(index))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RetrievalConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Build the [`RetrievalPipeline`], validating that all required
    /// fields are set and that the provider and index agree on
    /// dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Config`] if a required field is missing,
    /// or [`RetrievalError::DimensionMismatch`] if the embedding provider
    /// and vector index disagree on vector dimensionality.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config =
            self.config.ok_or_else(|| RetrievalError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RetrievalError::Config("embedding_provider is required".to_string()))?;
        let vector_index = self
            .vector_index
            .ok_or_else(|| RetrievalError::Config("vector_index is required".to_string()))?;

        if embedding_provider.dimensions() != vector_index.dimensions() {
            return Err(RetrievalError::DimensionMismatch {
                expected: vector_index.dimensions(),
                actual: embedding_provider.dimensions(),
            });
        }

        Ok(RetrievalPipeline { config, embedding_provider, vector_index })
    }
}
