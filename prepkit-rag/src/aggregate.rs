//! Document-level aggregation of chunk hits, and LLM context assembly.
//!
//! Vector search returns a flat list of chunk hits. Callers present
//! results per *document*, so this module groups hits by parent document,
//! ranks documents by their single best chunk, and keeps the top chunks of
//! each for display. [`render_context`] flattens aggregated results back
//! into one labeled text blob for the question-generation collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::SearchHit;

/// Separator between rendered context sections.
pub const CONTEXT_SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Knobs for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Matched chunks retained per document for presentation.
    pub chunks_per_document: usize,
    /// Cap on returned documents; `None` keeps them all.
    pub max_documents: Option<usize>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { chunks_per_document: 3, max_documents: None }
    }
}

/// A document ranked by its best-matching chunk.
///
/// Ephemeral aggregate: derived from a query's hits, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRelevance {
    /// The parent document the grouped hits belong to.
    pub document_id: Uuid,
    /// Topic label of the document, for presentation.
    pub topic: String,
    /// The maximum similarity among the document's hits.
    pub max_similarity: f32,
    /// The document's best hits, descending by similarity, truncated to
    /// the configured per-document limit.
    pub matched_chunks: Vec<SearchHit>,
    /// How many hits the document had in total, before truncation.
    pub total_matches: usize,
}

/// Group chunk hits by parent document and rank the documents.
///
/// Documents are ranked by the *maximum* similarity among their hits, not
/// the average: one excellent chunk match surfaces the whole document even
/// when its other chunks are weak. Within a document, hits are sorted by
/// descending similarity and truncated to `chunks_per_document`, with the
/// pre-truncation count preserved in `total_matches`.
///
/// An empty hit list yields an empty result list. That is a valid outcome
/// ("no sufficiently similar content"), not an error; callers fall back to
/// generic content.
pub fn aggregate(hits: Vec<SearchHit>, options: &AggregateOptions) -> Vec<DocumentRelevance> {
    // Group while remembering first-seen order so equal-scoring documents
    // keep the input's (already descending) order deterministically.
    let mut order: Vec<Uuid> = Vec::new();
    let mut groups: HashMap<Uuid, Vec<SearchHit>> = HashMap::new();
    for hit in hits {
        let document_id = hit.record.document_id;
        if !groups.contains_key(&document_id) {
            order.push(document_id);
        }
        groups.entry(document_id).or_default().push(hit);
    }

    let mut results: Vec<DocumentRelevance> = order
        .into_iter()
        .map(|document_id| {
            let mut chunk_hits = groups.remove(&document_id).unwrap_or_default();
            chunk_hits.sort_by(|a, b| {
                b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
            });
            let total_matches = chunk_hits.len();
            let max_similarity = chunk_hits.first().map(|hit| hit.similarity).unwrap_or(0.0);
            let topic = chunk_hits.first().map(|hit| hit.record.topic.clone()).unwrap_or_default();
            chunk_hits.truncate(options.chunks_per_document);
            DocumentRelevance {
                document_id,
                topic,
                max_similarity,
                matched_chunks: chunk_hits,
                total_matches,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.max_similarity.partial_cmp(&a.max_similarity).unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(cap) = options.max_documents {
        results.truncate(cap);
    }
    results
}

/// Knobs for [`render_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Maximum length of the assembled context in characters. Sections are
    /// dropped whole once the budget is reached; the first section is
    /// always included.
    pub max_chars: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self { max_chars: 6_000 }
    }
}

/// Flatten aggregated results into a single labeled text blob for LLM
/// context.
///
/// Each matched chunk becomes a section labeled with its source topic and
/// similarity percentage, and sections are joined with
/// [`CONTEXT_SECTION_SEPARATOR`] in descending-similarity order across
/// documents, so the most relevant material appears first in the prompt.
pub fn render_context(results: &[DocumentRelevance], options: &ContextOptions) -> String {
    let mut sections: Vec<&SearchHit> =
        results.iter().flat_map(|result| result.matched_chunks.iter()).collect();
    sections.sort_by(|a, b| {
        b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
    });

    let separator_chars = CONTEXT_SECTION_SEPARATOR.chars().count();
    let mut out = String::new();
    let mut used = 0usize;
    for hit in sections {
        let section = format!(
            "[Source: {} ({:.0}% match)]\n{}",
            hit.record.topic,
            hit.similarity * 100.0,
            hit.record.text
        );
        let section_chars = section.chars().count();
        if !out.is_empty() {
            if used + separator_chars + section_chars > options.max_chars {
                break;
            }
            out.push_str(CONTEXT_SECTION_SEPARATOR);
            used += separator_chars;
        }
        out.push_str(&section);
        used += section_chars;
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::record::{ChunkRecord, record_id};

    fn hit(document_id: Uuid, topic: &str, chunk_index: usize, similarity: f32) -> SearchHit {
        let text = format!("{topic} chunk {chunk_index}");
        let char_count = text.chars().count();
        SearchHit {
            record: ChunkRecord {
                id: record_id(document_id, chunk_index),
                document_id,
                user_id: Uuid::new_v4(),
                chunk_index,
                text,
                embedding: vec![0.0; 4],
                start_char: 0,
                end_char: char_count,
                char_count,
                word_count: 3,
                topic: topic.into(),
                created_at: Utc::now(),
            },
            similarity,
        }
    }

    #[test]
    fn ranks_documents_by_best_chunk() {
        let doc_x = Uuid::new_v4();
        let doc_y = Uuid::new_v4();
        let hits = vec![
            hit(doc_x, "physics", 0, 0.9),
            hit(doc_x, "physics", 1, 0.5),
            hit(doc_y, "chemistry", 0, 0.8),
        ];

        let results = aggregate(hits, &AggregateOptions::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document_id, doc_x);
        assert_eq!(results[0].max_similarity, 0.9);
        assert_eq!(results[1].document_id, doc_y);
        assert_eq!(results[1].max_similarity, 0.8);

        let doc_x_scores: Vec<f32> =
            results[0].matched_chunks.iter().map(|h| h.similarity).collect();
        assert_eq!(doc_x_scores, vec![0.9, 0.5]);
    }

    #[test]
    fn keeps_top_chunks_but_counts_all_matches() {
        let doc = Uuid::new_v4();
        let hits =
            (0..5).map(|i| hit(doc, "history", i, 0.9 - 0.1 * i as f32)).collect::<Vec<_>>();

        let results = aggregate(hits, &AggregateOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_chunks.len(), 3);
        assert_eq!(results[0].total_matches, 5);
        assert_eq!(results[0].matched_chunks[0].similarity, 0.9);
    }

    #[test]
    fn empty_hits_yield_empty_results() {
        assert!(aggregate(Vec::new(), &AggregateOptions::default()).is_empty());
    }

    #[test]
    fn caps_document_count() {
        let hits = vec![
            hit(Uuid::new_v4(), "a", 0, 0.9),
            hit(Uuid::new_v4(), "b", 0, 0.8),
            hit(Uuid::new_v4(), "c", 0, 0.7),
        ];
        let options = AggregateOptions { max_documents: Some(2), ..Default::default() };

        let results = aggregate(hits, &options);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].topic, "b");
    }

    #[test]
    fn context_renders_sections_in_descending_order() {
        let doc_x = Uuid::new_v4();
        let doc_y = Uuid::new_v4();
        let results = aggregate(
            vec![
                hit(doc_y, "chemistry", 0, 0.72),
                hit(doc_x, "physics", 0, 0.91),
                hit(doc_x, "physics", 1, 0.64),
            ],
            &AggregateOptions::default(),
        );

        let context = render_context(&results, &ContextOptions::default());
        let physics = context.find("[Source: physics (91% match)]").unwrap();
        let chemistry = context.find("[Source: chemistry (72% match)]").unwrap();
        let weaker = context.find("[Source: physics (64% match)]").unwrap();
        assert!(physics < chemistry);
        assert!(chemistry < weaker);
        assert_eq!(context.matches(CONTEXT_SECTION_SEPARATOR).count(), 2);
    }

    #[test]
    fn context_drops_whole_sections_past_the_budget() {
        let doc = Uuid::new_v4();
        let results = aggregate(
            vec![hit(doc, "geometry", 0, 0.9), hit(doc, "geometry", 1, 0.8)],
            &AggregateOptions::default(),
        );

        let tight = ContextOptions { max_chars: 40 };
        let context = render_context(&results, &tight);
        assert!(context.contains("(90% match)"));
        assert!(!context.contains("(80% match)"));
    }

    #[test]
    fn first_section_survives_even_a_tiny_budget() {
        let doc = Uuid::new_v4();
        let results =
            aggregate(vec![hit(doc, "trigonometry", 0, 0.95)], &AggregateOptions::default());

        // The best section alone exceeds the cap; it is kept anyway so a
        // search with hits never yields empty context.
        let context = render_context(&results, &ContextOptions { max_chars: 5 });
        assert!(context.contains("[Source: trigonometry (95% match)]"));
        assert!(context.chars().count() > 5);
    }

    #[test]
    fn empty_results_render_empty_context() {
        assert_eq!(render_context(&[], &ContextOptions::default()), "");
    }
}
