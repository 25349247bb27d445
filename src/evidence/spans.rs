//! Span utilities for evidence records
//!
//! Matching works in character offsets; evidence records also carry UTF-8
//! byte offsets so a stored span can be re-checked against raw passage bytes
//! without re-running the matcher.
//!
//! # Conventions
//!
//! - **Half-open ranges**: `[start, end)` in both offset spaces
//! - **Hash verification**: each span carries `slice_sha256` for drift detection
//! - **Deterministic IDs**: same chapter, quote and span always give the same id

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice, returning hex string with prefix
///
/// # Returns
/// * String in format "sha256:abc123..."
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Compute slice hash for a byte span, `None` if out of bounds
pub fn compute_slice_hash(text: &[u8], start: usize, end: usize) -> Option<String> {
    text.get(start..end).map(compute_hash)
}

/// Convert a char span to a byte span in one pass
pub fn char_span_to_bytes(text: &str, start: usize, end: usize) -> (usize, usize) {
    let mut byte_start = text.len();
    let mut byte_end = text.len();
    for (i, (byte, _)) in text.char_indices().enumerate() {
        if i == start {
            byte_start = byte;
        }
        if i == end {
            byte_end = byte;
            break;
        }
    }
    (byte_start.min(byte_end), byte_end)
}

/// Extract anchor text around a byte span
///
/// Returns about `window` bytes of context centred on the span, widened to
/// UTF-8 boundaries, with ellipses where the passage was cut.
pub fn extract_anchor_text(text: &str, start: usize, end: usize, window: usize) -> String {
    let len = text.len();
    let start = start.min(len);
    let end = end.clamp(start, len);

    let span_len = end - start;
    let remaining = window.saturating_sub(span_len);
    let each_side = remaining / 2;

    let mut anchor_start = start.saturating_sub(each_side);
    while anchor_start > 0 && !text.is_char_boundary(anchor_start) {
        anchor_start -= 1;
    }

    let mut anchor_end = (end + each_side).min(len);
    while anchor_end < len && !text.is_char_boundary(anchor_end) {
        anchor_end += 1;
    }

    let anchor = text[anchor_start..anchor_end].replace('\n', " ");

    let prefix = if anchor_start > 0 { "..." } else { "" };
    let suffix = if anchor_end < len { "..." } else { "" };

    format!("{}{}{}", prefix, anchor, suffix)
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert byte offset to line/column position
///
/// Column counts characters, not bytes.
pub fn offset_to_line_col(text: &str, offset: usize) -> LineCol {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &text[..offset];

    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = text[line_start..offset].chars().count() + 1;

    LineCol { line, col }
}

/// Compute deterministic evidence ID
///
/// Two-tier strategy:
/// - Unresolved: sha256(chapter + quote_id + quote_sha256)[0:16]
/// - Resolved: sha256(chapter + quote_id + quote_sha256 + start + end)[0:16]
pub fn compute_evidence_id(
    chapter: &str,
    quote_id: &str,
    quote_sha256: &str,
    span: Option<(usize, usize)>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chapter.as_bytes());
    hasher.update(quote_id.as_bytes());
    hasher.update(quote_sha256.as_bytes());

    if let Some((start, end)) = span {
        hasher.update(start.to_string().as_bytes());
        hasher.update(end.to_string().as_bytes());
    }

    let result = hasher.finalize();
    hex::encode(&result[..8]) // 16 hex chars = 8 bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"hello");
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), 7 + 64); // "sha256:" + 64 hex chars
    }

    #[test]
    fn test_slice_hash_bounds() {
        let text = b"hello world";
        assert_eq!(compute_slice_hash(text, 0, 5), Some(compute_hash(b"hello")));
        assert!(compute_slice_hash(text, 6, 40).is_none());
    }

    #[test]
    fn test_char_span_to_bytes() {
        let text = "naïve café";
        let (start, end) = char_span_to_bytes(text, 6, 10);
        assert_eq!(&text[start..end], "café");
        let (start, end) = char_span_to_bytes(text, 0, 5);
        assert_eq!(&text[start..end], "naïve");
    }

    #[test]
    fn test_offset_to_line_col() {
        let text = "line1\nline2\nline3";

        assert_eq!(offset_to_line_col(text, 0), LineCol { line: 1, col: 1 });
        assert_eq!(offset_to_line_col(text, 6), LineCol { line: 2, col: 1 });
        assert_eq!(offset_to_line_col(text, 8), LineCol { line: 2, col: 3 });
    }

    #[test]
    fn test_evidence_id_deterministic() {
        let id1 = compute_evidence_id("ch01", "item1a2b3c4d", "sha256:xyz", Some((10, 20)));
        let id2 = compute_evidence_id("ch01", "item1a2b3c4d", "sha256:xyz", Some((10, 20)));
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 16);
    }

    #[test]
    fn test_evidence_id_different_for_different_spans() {
        let id1 = compute_evidence_id("ch01", "q1", "sha256:xyz", Some((10, 20)));
        let id2 = compute_evidence_id("ch01", "q1", "sha256:xyz", Some((30, 40)));
        let id3 = compute_evidence_id("ch01", "q1", "sha256:xyz", None);
        assert_ne!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_extract_anchor_text() {
        let text = "This is a long passage with many\nwords and content for testing.";
        let anchor = extract_anchor_text(text, 23, 32, 30);
        assert!(anchor.len() <= 36); // 30 + ellipses
        assert!(anchor.contains("with many words"));
        assert!(anchor.starts_with("..."));
        assert!(!anchor.contains('\n'));
    }
}
