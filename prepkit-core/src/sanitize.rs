//! Text sanitization applied before chunk text is considered final.

/// Sanitize raw extracted text for chunking and persistence.
///
/// - Normalizes all line-ending variants (`\r\n`, `\r`) to `\n`.
/// - Strips byte-order marks and the Unicode line/paragraph separators
///   (U+2028, U+2029).
/// - Strips null bytes and all other control characters except tab and
///   newline.
///
/// The pass is idempotent: sanitizing already-sanitized text returns it
/// unchanged. Chunk offsets throughout this crate refer to the sanitized
/// text, so extraction applies this once and the chunker can re-apply it
/// without shifting positions.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                // \r\n collapses to one newline; a bare \r becomes one too.
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\u{feff}' | '\u{2028}' | '\u{2029}' => {}
            '\t' | '\n' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
