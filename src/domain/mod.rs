//! Domain types for quote localization.
//!
//! This module contains the plain data the matching core works on:
//! - Geometry: page-space rectangles
//! - Block / Page: layout provider output
//! - Passage: concatenated block text with per-block ranges
//! - Quote: search strings grouped by question identifier
//! - Span: match results

pub mod block;
pub mod geometry;
pub mod passage;
pub mod quote;
pub mod span;

// Re-export commonly used types
pub use block::{Block, BlockKind, InputError, Page};
pub use geometry::Rect;
pub use passage::{BlockRange, Passage, BLOCK_SEPARATOR, RANGE_LOOKBACK};
pub use quote::{Quote, QuoteSet};
pub use span::{MatchSpan, MatchedBlockGroup};
