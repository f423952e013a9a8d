//! Property tests for chunking coverage, overlap, and offset bookkeeping.

use prepkit_core::{ChunkPolicy, chunk_text, sanitize_text};
use proptest::prelude::*;

/// Generate document-like text: words joined by a mix of spaces, sentence
/// ends, line breaks, and paragraph breaks. Includes multi-byte characters
/// so byte/char confusions surface.
fn arb_document_text() -> impl Strategy<Value = String> {
    let word = "[a-zA-Zéπ]{1,10}";
    let sep = prop_oneof![
        Just(" ".to_string()),
        Just(". ".to_string()),
        Just("! ".to_string()),
        Just("? ".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
    ];
    proptest::collection::vec((word, sep), 1..200).prop_map(|pairs| {
        let mut text = String::new();
        for (word, sep) in pairs {
            text.push_str(&word);
            text.push_str(&sep);
        }
        text
    })
}

/// Generate a valid chunking policy (overlap below half the chunk size).
fn arb_policy() -> impl Strategy<Value = ChunkPolicy> {
    (16usize..300).prop_flat_map(|size| {
        (Just(size), 0usize..size / 2)
            .prop_map(|(size, overlap)| ChunkPolicy::new(size, overlap).unwrap())
    })
}

/// **Feature: prepkit-core, Property 1: Chunking coverage**
/// *For any* input text, concatenating chunk 0 with every later chunk minus
/// its overlap prefix SHALL reconstruct the sanitized input exactly — no
/// gaps, no dropped characters.
mod prop_chunking_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn unique_spans_reconstruct_the_input(
            text in arb_document_text(),
            policy in arb_policy(),
        ) {
            let sanitized = sanitize_text(&text);
            let chunks = chunk_text(&text, policy).unwrap();

            let mut rebuilt = String::new();
            let mut prev_end = 0usize;
            for chunk in &chunks {
                let repeated = prev_end.saturating_sub(chunk.start_char);
                rebuilt.extend(chunk.text.chars().skip(repeated));
                prev_end = chunk.end_char;
            }
            prop_assert_eq!(rebuilt, sanitized);
        }
    }
}

/// **Feature: prepkit-core, Property 2: Overlap invariant**
/// *For any* adjacent chunk pair from the same document, the tail of the
/// earlier chunk SHALL equal the head of the later chunk, `overlap`
/// characters each.
mod prop_chunk_overlap {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn adjacent_chunks_share_the_overlap(
            text in arb_document_text(),
            policy in arb_policy(),
        ) {
            let chunks = chunk_text(&text, policy).unwrap();
            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[1].start_char, pair[0].end_char - policy.overlap);
                let tail: String =
                    pair[0].text.chars().skip(pair[0].char_count - policy.overlap).collect();
                let head: String = pair[1].text.chars().take(policy.overlap).collect();
                prop_assert_eq!(tail, head);
            }
        }
    }
}

/// **Feature: prepkit-core, Property 3: Chunking determinism**
/// *For any* input text and policy, chunking twice SHALL yield identical
/// chunk boundaries and text.
mod prop_chunking_determinism {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn repeated_runs_are_identical(
            text in arb_document_text(),
            policy in arb_policy(),
        ) {
            let first = chunk_text(&text, policy).unwrap();
            let second = chunk_text(&text, policy).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}

/// **Feature: prepkit-core, Property 4: Offset bookkeeping**
/// *For any* produced chunk, `end_char - start_char` SHALL equal
/// `char_count` and the chunk's own text length; indices SHALL be
/// sequential; `start_char` SHALL be non-decreasing; chunks SHALL respect
/// the size cap; and the final chunk SHALL end at the sanitized text's
/// character length.
mod prop_offset_bookkeeping {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn offsets_are_exact(
            text in arb_document_text(),
            policy in arb_policy(),
        ) {
            let sanitized = sanitize_text(&text);
            let total = sanitized.chars().count();
            let chunks = chunk_text(&text, policy).unwrap();

            prop_assert!(!chunks.is_empty());
            let mut prev_start = 0usize;
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert_eq!(chunk.end_char - chunk.start_char, chunk.char_count);
                prop_assert_eq!(chunk.text.chars().count(), chunk.char_count);
                prop_assert!(chunk.char_count <= policy.chunk_size);
                prop_assert!(chunk.start_char >= prev_start);
                prev_start = chunk.start_char;
            }
            prop_assert_eq!(chunks.last().unwrap().end_char, total);
        }
    }
}

// ---------------------------------------------------------------------------
// Pinned scenarios
// ---------------------------------------------------------------------------

/// 12,000 separator-free characters at 1000/200: fixed-size windows advance
/// by exactly 800, and the final chunk closes at the end of the text.
#[test]
fn twelve_thousand_chars_at_medium_policy() {
    let text: String = "abcdefghij".chars().cycle().take(12_000).collect();
    let chunks = chunk_text(&text, ChunkPolicy::MEDIUM).unwrap();

    assert_eq!(chunks[0].start_char, 0);
    assert_eq!(chunks[0].end_char, 1_000);
    assert_eq!(chunks[1].start_char, 800);
    assert_eq!(chunks.last().unwrap().end_char, 12_000);
    assert_eq!(chunks.len(), 15);
}

/// The adaptive policy keeps granularity high on bulk text and context high
/// on short text.
#[test]
fn adaptive_policy_tracks_document_length() {
    let short = "b".repeat(4_000);
    let bulk = "b".repeat(60_000);

    let policy = ChunkPolicy::for_text_length(short.chars().count());
    assert_eq!(policy, ChunkPolicy::LARGE);
    let chunks = chunk_text(&short, policy).unwrap();
    assert_eq!(chunks[0].char_count, 2_000);

    let policy = ChunkPolicy::for_text_length(bulk.chars().count());
    assert_eq!(policy, ChunkPolicy::SMALL);
    let chunks = chunk_text(&bulk, policy).unwrap();
    assert_eq!(chunks[0].char_count, 500);
    assert_eq!(chunks[1].start_char, 400);
}
