//! Cascading-separator text chunking with exact character offsets.
//!
//! The chunker cuts sanitized text into overlapping windows of at most
//! `chunk_size` characters. Each window's end is pulled back to the most
//! semantically meaningful break available — paragraph break, then line
//! break, then sentence end, then plain whitespace — falling back to a hard
//! cut only when the window contains none. The next chunk starts exactly
//! `overlap` characters before the previous chunk's end, so offsets are
//! exact and the non-overlapping spans reconstruct the input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Chunk;
use crate::error::{CoreError, Result};
use crate::sanitize::sanitize_text;

/// A chunk-size/overlap pair, in characters.
///
/// Construct through [`ChunkPolicy::new`] (validated) or pick one of the
/// presets. [`ChunkPolicy::for_text_length`] selects a preset adaptively:
/// short documents get large chunks (more context per chunk), bulk
/// documents get small chunks (higher retrieval granularity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPolicy {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters repeated from the end of one chunk at the start of the
    /// next.
    pub overlap: usize,
}

impl ChunkPolicy {
    /// 2000-character chunks with 400 overlap, for documents under 5,000
    /// characters.
    pub const LARGE: Self = Self { chunk_size: 2000, overlap: 400 };
    /// 1000-character chunks with 200 overlap, for documents under 50,000
    /// characters.
    pub const MEDIUM: Self = Self { chunk_size: 1000, overlap: 200 };
    /// 500-character chunks with 100 overlap, for bulk documents.
    pub const SMALL: Self = Self { chunk_size: 500, overlap: 100 };

    /// Create a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPolicy`] if `chunk_size` is zero or
    /// `overlap` is not less than half of `chunk_size` (the bound that
    /// guarantees every chunk advances past the previous overlap).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let policy = Self { chunk_size, overlap };
        policy.validate()?;
        Ok(policy)
    }

    /// Select a preset based on document length in characters.
    pub fn for_text_length(char_count: usize) -> Self {
        if char_count < 5_000 {
            Self::LARGE
        } else if char_count < 50_000 {
            Self::MEDIUM
        } else {
            Self::SMALL
        }
    }

    /// Check the policy invariants without consuming it.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CoreError::InvalidPolicy("chunk_size must be greater than zero".into()));
        }
        if self.overlap * 2 >= self.chunk_size {
            return Err(CoreError::InvalidPolicy(format!(
                "overlap ({}) must be less than half the chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split text into an ordered sequence of overlapping [`Chunk`]s.
///
/// The input is sanitized first ([`sanitize_text`], idempotent), and all
/// reported offsets refer to the sanitized text. The produced chunks cover
/// it completely: chunk 0 starts at 0, each later chunk starts exactly
/// `overlap` characters before its predecessor's end, and the final chunk
/// ends at the text's character length.
///
/// # Errors
///
/// - [`CoreError::InvalidPolicy`] if the policy fails validation.
/// - [`CoreError::ChunkingFailed`] if the input is empty after trimming —
///   the pipeline cannot proceed to embedding with zero chunks.
pub fn chunk_text(text: &str, policy: ChunkPolicy) -> Result<Vec<Chunk>> {
    policy.validate()?;

    let text = sanitize_text(text);
    if text.trim().is_empty() {
        return Err(CoreError::ChunkingFailed("input text is empty after trimming".into()));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    // A boundary below this leaves no room to advance past the overlap.
    let min_len = (policy.chunk_size / 2).max(policy.overlap + 1);

    let mut chunks = Vec::new();
    let mut pos = 0usize;
    loop {
        let hard_end = (pos + policy.chunk_size).min(total);
        let end = if hard_end == total {
            total
        } else {
            find_boundary(&chars, pos, pos + min_len, hard_end)
        };

        let chunk_text: String = chars[pos..end].iter().collect();
        let word_count = chunk_text.split_whitespace().count();
        chunks.push(Chunk {
            index: chunks.len(),
            text: chunk_text,
            start_char: pos,
            end_char: end,
            char_count: end - pos,
            word_count,
        });

        if end == total {
            break;
        }
        pos = end - policy.overlap;
    }

    debug!(
        chunk_count = chunks.len(),
        chars = total,
        chunk_size = policy.chunk_size,
        overlap = policy.overlap,
        "chunked text"
    );
    Ok(chunks)
}

/// Pick the chunk end within `(min_end..=hard_end]`, preferring the
/// highest-priority separator closest to `hard_end`. Separators stay with
/// the chunk to their left. Returns `hard_end` when the window holds no
/// usable separator.
fn find_boundary(chars: &[char], pos: usize, min_end: usize, hard_end: usize) -> usize {
    // 1. Paragraph break: cut after a blank line.
    for end in (min_end..=hard_end).rev() {
        if end >= pos + 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n' {
            return end;
        }
    }
    // 2. Line break.
    for end in (min_end..=hard_end).rev() {
        if chars[end - 1] == '\n' {
            return end;
        }
    }
    // 3. Sentence-ending punctuation followed by a space.
    for end in (min_end..=hard_end).rev() {
        if end >= pos + 2
            && chars[end - 1] == ' '
            && matches!(chars[end - 2], '.' | '!' | '?')
        {
            return end;
        }
    }
    // 4. Any whitespace.
    for end in (min_end..=hard_end).rev() {
        if chars[end - 1].is_whitespace() {
            return end;
        }
    }
    // 5. Hard cut mid-word as a last resort.
    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_chunk_size() {
        let err = ChunkPolicy::new(0, 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPolicy(_)));
    }

    #[test]
    fn rejects_overlap_of_half_the_chunk_size() {
        let err = ChunkPolicy::new(100, 50).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPolicy(_)));
        assert!(ChunkPolicy::new(100, 49).is_ok());
    }

    #[test]
    fn adaptive_policy_thresholds() {
        assert_eq!(ChunkPolicy::for_text_length(0), ChunkPolicy::LARGE);
        assert_eq!(ChunkPolicy::for_text_length(4_999), ChunkPolicy::LARGE);
        assert_eq!(ChunkPolicy::for_text_length(5_000), ChunkPolicy::MEDIUM);
        assert_eq!(ChunkPolicy::for_text_length(49_999), ChunkPolicy::MEDIUM);
        assert_eq!(ChunkPolicy::for_text_length(50_000), ChunkPolicy::SMALL);
    }

    #[test]
    fn empty_input_is_a_chunking_failure() {
        let err = chunk_text("", ChunkPolicy::MEDIUM).unwrap_err();
        assert!(matches!(err, CoreError::ChunkingFailed(_)));

        let err = chunk_text("   \n\t  ", ChunkPolicy::MEDIUM).unwrap_err();
        assert!(matches!(err, CoreError::ChunkingFailed(_)));
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let text = "The cell is the basic unit of life.";
        let chunks = chunk_text(text, ChunkPolicy::MEDIUM).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, text.chars().count());
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].word_count, 8);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let policy = ChunkPolicy::new(100, 10).unwrap();
        let first = "The mitochondrion is the powerhouse of the cell today.";
        let second = "The nucleus stores the cell's genetic material inside a double membrane.";
        let text = format!("{first}\n\n{second}");

        let chunks = chunk_text(&text, policy).unwrap();
        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(chunks[0].end_char, first.chars().count() + 2);
        assert_eq!(chunks[1].start_char, chunks[0].end_char - policy.overlap);
    }

    #[test]
    fn falls_back_to_sentence_boundaries() {
        let policy = ChunkPolicy::new(100, 10).unwrap();
        let text = "Enzymes lower the activation energy of reactions. \
                    Substrates bind at the active site of each enzyme. \
                    Temperature and pH both affect enzymatic reaction rates."
            .to_string();

        let chunks = chunk_text(&text, policy).unwrap();
        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.ends_with(". "));
    }

    #[test]
    fn hard_cut_advances_by_size_minus_overlap() {
        let policy = ChunkPolicy::new(100, 10).unwrap();
        let text: String = std::iter::repeat('x').take(250).collect();

        let chunks = chunk_text(&text, policy).unwrap();
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, 100);
        assert_eq!(chunks[1].start_char, 90);
        assert_eq!(chunks[1].end_char, 190);
        assert_eq!(chunks[2].start_char, 180);
        assert_eq!(chunks[2].end_char, 250);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let policy = ChunkPolicy::new(100, 10).unwrap();
        // 120 two-byte characters; byte-based bookkeeping would misalign.
        let text: String = std::iter::repeat('é').take(120).collect();

        let chunks = chunk_text(&text, policy).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_count, 100);
        assert_eq!(chunks[0].text.chars().count(), 100);
        assert_eq!(chunks[1].start_char, 90);
        assert_eq!(chunks[1].end_char, 120);
    }

    #[test]
    fn overlap_repeats_previous_tail() {
        let policy = ChunkPolicy::new(100, 10).unwrap();
        let text: String = ('a'..='z').cycle().take(300).collect();

        let chunks = chunk_text(&text, policy).unwrap();
        for pair in chunks.windows(2) {
            let tail: String =
                pair[0].text.chars().skip(pair[0].char_count - policy.overlap).collect();
            let head: String = pair[1].text.chars().take(policy.overlap).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn chunk_text_sanitizes_before_splitting() {
        let chunks = chunk_text(
            "Osmosis moves water across membranes.\r\nDiffusion\0 spreads solutes evenly.",
            ChunkPolicy::MEDIUM,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("membranes.\nDiffusion spreads"));
        assert_eq!(chunks[0].end_char, chunks[0].text.chars().count());
    }
}
