//! Persisted chunk records and the search hits that reference them.

use chrono::{DateTime, Utc};
use prepkit_core::Chunk;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derive the stable record id for a chunk: `{document_id}_{chunk_index}`.
///
/// Deterministic, so re-ingesting a document overwrites its previous
/// records instead of duplicating them.
pub fn record_id(document_id: Uuid, chunk_index: usize) -> String {
    format!("{document_id}_{chunk_index}")
}

/// A chunk with its embedding and ownership, as stored in the vector index.
///
/// `user_id` is denormalized from the parent document so the index can
/// filter by owner without a join. The embedding is produced once at ingest
/// time and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable identifier, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The document this chunk was cut from.
    pub document_id: Uuid,
    /// The user who owns the parent document.
    pub user_id: Uuid,
    /// Zero-based position within the document.
    pub chunk_index: usize,
    /// The chunk text.
    pub text: String,
    /// The embedding vector for this chunk's text.
    pub embedding: Vec<f32>,
    /// Character offset of the first character (inclusive).
    pub start_char: usize,
    /// Character offset one past the last character (exclusive).
    pub end_char: usize,
    /// Number of characters; always `end_char - start_char`.
    pub char_count: usize,
    /// Number of whitespace-separated words.
    pub word_count: usize,
    /// Topic label of the parent document, carried for presentation.
    pub topic: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Attach ownership and an embedding to a chunk produced by the
    /// chunker.
    pub fn from_chunk(
        chunk: Chunk,
        document_id: Uuid,
        user_id: Uuid,
        topic: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: record_id(document_id, chunk.index),
            document_id,
            user_id,
            chunk_index: chunk.index,
            text: chunk.text,
            embedding,
            start_char: chunk.start_char,
            end_char: chunk.end_char,
            char_count: chunk.char_count,
            word_count: chunk.word_count,
            topic: topic.into(),
            created_at: Utc::now(),
        }
    }
}

/// A retrieved [`ChunkRecord`] paired with its cosine similarity to the
/// query. Ephemeral: produced by a search, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The retrieved chunk record.
    pub record: ChunkRecord,
    /// Cosine similarity to the query vector, in [-1, 1].
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_chunk_preserves_offsets_and_derives_id() {
        let document_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let chunk = Chunk {
            index: 2,
            text: "The Krebs cycle runs in the mitochondrial matrix.".into(),
            start_char: 1600,
            end_char: 1649,
            char_count: 49,
            word_count: 8,
        };

        let record =
            ChunkRecord::from_chunk(chunk, document_id, user_id, "biology", vec![0.1, 0.2]);
        assert_eq!(record.id, format!("{document_id}_2"));
        assert_eq!(record.chunk_index, 2);
        assert_eq!(record.start_char, 1600);
        assert_eq!(record.end_char, 1649);
        assert_eq!(record.char_count, 49);
        assert_eq!(record.topic, "biology");
        assert_eq!(record.user_id, user_id);
    }
}
