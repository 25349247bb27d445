//! Match results.

use serde::{Deserialize, Serialize};

use super::block::Block;

/// A located match, in the coordinate space of the text it was found in
///
/// Callers track which space (window, cleaned passage, raw passage) a span
/// belongs to; the type does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    /// Edit count of the alignment; `None` for unscored fallback matches
    pub edit_distance: Option<usize>,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            edit_distance: None,
        }
    }

    pub fn with_edits(start: usize, end: usize, edits: usize) -> Self {
        Self {
            start,
            end,
            edit_distance: Some(edits),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move into an enclosing text that starts `offset` characters earlier
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            edit_distance: self.edit_distance,
        }
    }
}

/// The layout blocks one quote's match overlaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedBlockGroup {
    pub quote_id: String,
    /// Position of the quote within its identifier's quote list
    pub quote_index: usize,
    pub quote: String,
    /// Span in raw passage coordinates
    pub span: MatchSpan,
    pub blocks: Vec<Block>,
}
