//! # Quickstart
//!
//! Demonstrates the full retrieval pipeline: ingest two study documents,
//! search them, and print the assembled LLM context.
//!
//! Uses `InMemoryVectorIndex` and a deterministic `MockEmbeddingProvider`
//! so it runs with **zero API keys**.
//!
//! Run: `cargo run --example quickstart`

use std::sync::Arc;

use prepkit_rag::{
    ContextOptions, EmbeddingProvider, InMemoryVectorIndex, IngestRequest, RetrievalConfig,
    RetrievalPipeline, SearchRequest,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider — deterministic hash-based embeddings for demos
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> prepkit_rag::Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        // L2-normalise so cosine similarity is just the dot product.
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Configure the pipeline ----------------------------------------
    // threshold=-1.0 keeps every hit (hash embeddings are arbitrary
    // directions, so real thresholds don't apply to this demo).
    let config = RetrievalConfig::builder()
        .similarity_threshold(-1.0)
        .max_results(10)
        .chunks_per_document(3)
        .build()?;

    // -- 2. Build the pipeline with in-memory components ------------------
    // MockEmbeddingProvider produces 64-dimensional vectors from text
    // hashes. InMemoryVectorIndex keeps everything in a HashMap — no
    // external DB.
    let pipeline = Arc::new(
        RetrievalPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)))
            .vector_index(Arc::new(InMemoryVectorIndex::new(64)))
            .build()?,
    );

    // -- 3. Ingest two study documents ------------------------------------
    let user_id = Uuid::new_v4();
    let documents = vec![
        (
            "cell biology",
            "The cell is the basic structural and functional unit of life. \
             Eukaryotic cells contain membrane-bound organelles, including the \
             nucleus, which stores genetic material, and mitochondria, which \
             produce ATP through cellular respiration.\n\n\
             Photosynthesis takes place in the chloroplasts of plant cells. \
             The light reactions split water in the thylakoid membranes, while \
             the Calvin cycle fixes carbon dioxide in the stroma.",
        ),
        (
            "algebra",
            "A quadratic equation has the standard form ax^2 + bx + c = 0, \
             where a is nonzero. Its solutions are given by the quadratic \
             formula, and the discriminant b^2 - 4ac determines how many real \
             roots exist.\n\n\
             Factoring, completing the square, and the quadratic formula are \
             the three standard solution techniques covered in the exam.",
        ),
    ];

    println!("Ingesting {} documents...", documents.len());
    for (topic, text) in &documents {
        let outcome = pipeline
            .ingest_document(IngestRequest {
                document_id: Uuid::new_v4(),
                user_id,
                data: text.as_bytes().to_vec(),
                content_type: "text/plain".to_string(),
                topic: topic.to_string(),
            })
            .await?;
        println!("  {topic}: {} chunks indexed ({:?})", outcome.chunks.len(), outcome.status);
    }

    // -- 4. Search and assemble LLM context --------------------------------
    let query = "How do plant cells capture light energy?";
    println!("\nQuery: {query}");

    let (results, context) = pipeline
        .search_context(SearchRequest::new(user_id, query), &ContextOptions::default())
        .await?;

    for result in &results {
        println!(
            "  {} — best {:.2}, {} matching chunk(s)",
            result.topic, result.max_similarity, result.total_matches
        );
    }

    println!("\n--- Context for the question generator ---\n{context}");
    Ok(())
}
