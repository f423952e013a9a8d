//! # prepkit-rag
//!
//! Async retrieval layer for the PrepKit retrieval core: embedding
//! providers, vector indexing with user-scoped similarity search,
//! document-level aggregation, and the [`RetrievalPipeline`] tying them
//! together.
//!
//! The pipeline exposes the two operations outside callers consume:
//! ingesting a document (extract → chunk → embed → index) and searching a
//! user's indexed content (embed → search → aggregate). Both components it
//! composes — [`EmbeddingProvider`] and [`VectorIndex`] — are injected
//! trait objects, so backends and test doubles swap in freely.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prepkit_rag::{
//!     InMemoryVectorIndex, RetrievalConfig, RetrievalPipeline, SearchRequest,
//! };
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
//!
//! ## Feature flags
//!
//! - `openai` — [`OpenAiEmbeddingProvider`], an OpenAI-compatible HTTP
//!   embedding backend via `reqwest`.
//! - `qdrant` — [`QdrantVectorIndex`], a remote index backed by Qdrant.
//! - `full` — both of the above.

mod aggregate;
mod config;
mod embedding;
mod error;
mod index;
mod inmemory;
mod pipeline;
mod record;

#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "qdrant")]
mod qdrant;

pub use aggregate::{
    AggregateOptions, CONTEXT_SECTION_SEPARATOR, ContextOptions, DocumentRelevance, aggregate,
    render_context,
};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use embedding::EmbeddingProvider;
pub use error::{Result, RetrievalError};
pub use index::{SearchQuery, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
pub use pipeline::{
    IngestOutcome, IngestRequest, IngestStatus, RetrievalPipeline, RetrievalPipelineBuilder,
    SearchRequest,
};
pub use record::{ChunkRecord, SearchHit, record_id};

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddingProvider;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorIndex;

// Re-export the core types callers need alongside the pipeline.
pub use prepkit_core::{Chunk, ChunkPolicy, ContentType, CoreError, Document, DocumentStatus};
