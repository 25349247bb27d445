//! Layout blocks and pages as delivered by a layout provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Rect;

/// Content kind of a layout block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Text,
    /// Excluded from passage text, kept for layout reasoning
    Image,
}

/// A rectangle of extracted page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub bbox: Rect,
    #[serde(default)]
    pub text: String,
    /// Position in the page's block list (reassigned for composites)
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub kind: BlockKind,
}

impl Block {
    pub fn text(index: usize, bbox: Rect, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
            index,
            kind: BlockKind::Text,
        }
    }

    pub fn image(index: usize, bbox: Rect) -> Self {
        Self {
            bbox,
            text: String::new(),
            index,
            kind: BlockKind::Image,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == BlockKind::Image
    }
}

/// One page (or composite of stacked pages) with its blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number of the first page in the source document
    #[serde(default)]
    pub number: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Check that the page and its blocks are structurally usable
    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(InputError::MalformedPage {
                number: self.number,
                reason: format!("invalid size {}x{}", self.width, self.height),
            });
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if !block.bbox.is_valid() {
                return Err(InputError::MalformedBlock {
                    index: i,
                    reason: format!("invalid bbox {:?}", block.bbox),
                });
            }
        }
        Ok(())
    }

    /// Stack pages vertically into one composite page.
    ///
    /// Width is the widest page, height the sum of all heights; each block is
    /// shifted down by the heights of the pages above it and re-indexed in
    /// composite order.
    pub fn composite(pages: &[Page]) -> Result<Page, InputError> {
        let first = pages.first().ok_or(InputError::NoPages)?;

        let mut width: f64 = 0.0;
        let mut y_offset = 0.0;
        let mut blocks = Vec::new();

        for page in pages {
            page.validate()?;
            width = width.max(page.width);
            for block in &page.blocks {
                blocks.push(Block {
                    bbox: block.bbox.offset_y(y_offset),
                    text: block.text.clone(),
                    index: blocks.len(),
                    kind: block.kind,
                });
            }
            y_offset += page.height;
        }

        Ok(Page {
            number: first.number,
            width,
            height: y_offset,
            blocks,
        })
    }
}

/// Structurally invalid input; fatal for the enclosing document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Passage is empty: no text blocks with content")]
    EmptyPassage,

    #[error("Malformed block {index}: {reason}")]
    MalformedBlock { index: usize, reason: String },

    #[error("Malformed page {number}: {reason}")]
    MalformedPage { number: u32, reason: String },

    #[error("Layout contains no pages")]
    NoPages,

    #[error("Quote set is empty")]
    EmptyQuoteSet,

    #[error("Block ranges do not match the block list ({ranges} ranges for {blocks} blocks)")]
    RangeMismatch { ranges: usize, blocks: usize },
}
