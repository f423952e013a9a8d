//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorIndex`], a [`VectorIndex`] over the
//! [qdrant-client](https://docs.rs/qdrant-client) gRPC API. Only available
//! when the `qdrant` feature is enabled.
//!
//! Chunk metadata travels as point payload, and user/document scoping is
//! enforced server-side with payload filters, so an unscoped query can never
//! reach the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use prepkit_rag::QdrantVectorIndex;
//!
//! let index = QdrantVectorIndex::new("http://localhost:6334", "prepkit_chunks", 384)?;
//! index.ensure_collection().await?;
//! index.index(&records).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, RetrievalError};
use crate::index::{SearchQuery, VectorIndex};
use crate::record::{ChunkRecord, SearchHit};

/// A [`VectorIndex`] backed by [Qdrant](https://qdrant.tech/).
///
/// One collection holds all users' chunks; every point carries `user_id`
/// and `document_id` payload fields, and every search and delete goes
/// through a server-side filter on them. The collection uses cosine
/// distance, so Qdrant's score threshold maps directly onto the query
/// threshold.
///
/// Point ids are derived deterministically from `(document_id,
/// chunk_index)`, so re-ingesting a document replaces its points instead of
/// duplicating them.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl QdrantVectorIndex {
    /// Create a new index connecting to the given URL.
    pub fn new(url: &str, collection: impl Into<String>, dimensions: usize) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client, collection: collection.into(), dimensions })
    }

    /// Create a new index from an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>, dimensions: usize) -> Self {
        Self { client, collection: collection.into(), dimensions }
    }

    /// Create the backing collection (cosine distance, this index's
    /// dimensionality) if it does not already exist.
    pub async fn ensure_collection(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        if collections.collections.iter().any(|c| c.name == self.collection) {
            debug!(collection = %self.collection, "qdrant collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(
            collection = %self.collection,
            dimensions = self.dimensions,
            "created qdrant collection"
        );
        Ok(())
    }

    fn map_err(e: qdrant_client::QdrantError) -> RetrievalError {
        RetrievalError::Index { backend: "qdrant".to_string(), message: e.to_string() }
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

    /// Derive the deterministic point id for a record.
    fn point_id(record: &ChunkRecord) -> String {
        Uuid::new_v5(&record.document_id, &record.chunk_index.to_le_bytes()).to_string()
    }

    fn payload_json(record: &ChunkRecord) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("record_id".into(), serde_json::Value::String(record.id.clone()));
        map.insert(
            "document_id".into(),
            serde_json::Value::String(record.document_id.to_string()),
        );
        map.insert("user_id".into(), serde_json::Value::String(record.user_id.to_string()));
        map.insert("chunk_index".into(), serde_json::Value::from(record.chunk_index as u64));
        map.insert("text".into(), serde_json::Value::String(record.text.clone()));
        map.insert("start_char".into(), serde_json::Value::from(record.start_char as u64));
        map.insert("end_char".into(), serde_json::Value::from(record.end_char as u64));
        map.insert("char_count".into(), serde_json::Value::from(record.char_count as u64));
        map.insert("word_count".into(), serde_json::Value::from(record.word_count as u64));
        map.insert("topic".into(), serde_json::Value::String(record.topic.clone()));
        map.insert(
            "created_at".into(),
            serde_json::Value::String(record.created_at.to_rfc3339()),
        );
        map
    }

    fn payload_for(record: &ChunkRecord) -> Payload {
        Payload::try_from(serde_json::Value::Object(Self::payload_json(record)))
            .unwrap_or_default()
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_usize(value: &QdrantValue) -> Option<usize> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    fn record_from_payload(
        payload: &std::collections::HashMap<String, QdrantValue>,
    ) -> Option<ChunkRecord> {
        let get_str = |key: &str| payload.get(key).and_then(Self::extract_string);
        let get_num = |key: &str| payload.get(key).and_then(Self::extract_usize);

        let created_at = get_str("created_at")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Some(ChunkRecord {
            id: get_str("record_id")?,
            document_id: get_str("document_id").and_then(|s| Uuid::parse_str(&s).ok())?,
            user_id: get_str("user_id").and_then(|s| Uuid::parse_str(&s).ok())?,
            chunk_index: get_num("chunk_index")?,
            text: get_str("text")?,
            // The stored vector stays server-side; hits carry payload only.
            embedding: Vec::new(),
            start_char: get_num("start_char")?,
            end_char: get_num("end_char")?,
            char_count: get_num("char_count")?,
            word_count: get_num("word_count")?,
            topic: get_str("topic").unwrap_or_default(),
            created_at,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn index(&self, records: &[ChunkRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        for record in records {
            self.check_dimensions(&record.embedding)?;
        }

        let points: Vec<PointStruct> = records
            .iter()
            .map(|record| {
                PointStruct::new(
                    Self::point_id(record),
                    record.embedding.clone(),
                    Self::payload_for(record),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(
            collection = %self.collection,
            count = records.len(),
            "upserted chunk records to qdrant"
        );
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.check_dimensions(&query.vector)?;

        let mut conditions =
            vec![Condition::matches("user_id", query.user_id.to_string())];
        if let Some(document_ids) = &query.document_ids {
            let any_of: Vec<Condition> = document_ids
                .iter()
                .map(|id| Condition::matches("document_id", id.to_string()))
                .collect();
            conditions.push(Condition::from(Filter::should(any_of)));
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection,
                    query.vector.clone(),
                    query.max_results as u64,
                )
                .filter(Filter::must(conditions))
                .score_threshold(query.threshold)
                .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let hits = response
            .result
            .into_iter()
            .filter_map(|scored| {
                Self::record_from_payload(&scored.payload)
                    .map(|record| SearchHit { record, similarity: scored.score })
            })
            .collect();
        Ok(hits)
    }

    async fn remove_document(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Filter::must([
                        Condition::matches("user_id", user_id.to_string()),
                        Condition::matches("document_id", document_id.to_string()),
                    ]))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(
            collection = %self.collection,
            document_id = %document_id,
            "deleted document points from qdrant"
        );
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
