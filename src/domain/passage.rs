//! The matching corpus: concatenated block text plus per-block char ranges.
//!
//! All offsets here are character (Unicode scalar) offsets, not bytes.

use serde::{Deserialize, Serialize};

use super::block::{Block, InputError};
use super::span::MatchSpan;

/// Character appended after every block's text
pub const BLOCK_SEPARATOR: char = ' ';

/// How far a block's range reaches back before its first character.
///
/// A range starts on the separator preceding its block, so a match that
/// begins on that separator still recruits the block (±1 boundary tolerance).
pub const RANGE_LOOKBACK: usize = 1;

/// Character range of one block inside a passage (`start..end`, half-open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// Position of the block in the slice the passage was built from
    pub block: usize,
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    /// Over-inclusive overlap test against a match span.
    ///
    /// True when the block starts inside the span, ends inside the span, or
    /// fully contains it.
    pub fn overlaps(&self, span: &MatchSpan) -> bool {
        let starts_inside = self.start >= span.start && self.start < span.end;
        let ends_inside = self.end > span.start && self.end <= span.end;
        let contains = self.start <= span.start && self.end >= span.end;
        starts_inside || ends_inside || contains
    }
}

/// Immutable concatenation of a page's text blocks
#[derive(Debug, Clone)]
pub struct Passage {
    text: String,
    char_len: usize,
    ranges: Vec<BlockRange>,
}

impl Passage {
    /// Build a passage from layout blocks, skipping image blocks.
    ///
    /// Each text block contributes its text followed by [`BLOCK_SEPARATOR`];
    /// its range is recorded in the same pass.
    pub fn from_blocks(blocks: &[Block]) -> Result<Self, InputError> {
        let mut text = String::new();
        let mut char_len = 0usize;
        let mut ranges = Vec::with_capacity(blocks.len());

        for (i, block) in blocks.iter().enumerate() {
            if block.is_image() {
                continue;
            }
            if !block.bbox.is_valid() {
                return Err(InputError::MalformedBlock {
                    index: i,
                    reason: format!("invalid bbox {:?}", block.bbox),
                });
            }

            let text_start = char_len;
            let block_chars = block.text.chars().count();
            ranges.push(BlockRange {
                block: i,
                start: text_start.saturating_sub(RANGE_LOOKBACK),
                end: text_start + block_chars,
            });

            text.push_str(&block.text);
            text.push(BLOCK_SEPARATOR);
            char_len += block_chars + 1;
        }

        if text.trim().is_empty() {
            return Err(InputError::EmptyPassage);
        }

        Ok(Self {
            text,
            char_len,
            ranges,
        })
    }

    /// Wrap raw text that has no layout behind it
    pub fn from_text(text: impl Into<String>) -> Result<Self, InputError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InputError::EmptyPassage);
        }
        let char_len = text.chars().count();
        Ok(Self {
            text,
            char_len,
            ranges: Vec::new(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn ranges(&self) -> &[BlockRange] {
        &self.ranges
    }

    /// Characters `start..end`, clamped to the passage
    pub fn slice(&self, span: &MatchSpan) -> String {
        self.text
            .chars()
            .skip(span.start)
            .take(span.end.saturating_sub(span.start))
            .collect()
    }
}
