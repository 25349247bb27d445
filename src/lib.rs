//! quizcite - locate quiz quotes in extracted document text
//!
//! Given the text blocks of a chapter (as produced by a PDF layout
//! extractor) and the quotes a question generator claims came from it,
//! quizcite finds where each quote actually sits, maps it onto the layout
//! blocks it covers, and plans an evidence image per question.
//!
//! # Architecture
//!
//! Matching works on one concatenated passage per chapter:
//! - Passage text is normalized reversibly (hyphenation, line breaks, joined words)
//! - A TF-IDF ranked chunk narrows each quote to a candidate window
//! - A bounded edit-distance alignment pins the quote inside the window
//! - The aligned span is mapped back to raw passage offsets and onto blocks
//!
//! # Modules
//!
//! - `domain`: Data structures (Block, Page, Passage, QuoteSet, MatchSpan)
//! - `matching`: Normalizer, retriever, aligner and offset resolver
//! - `evidence`: Block location, render plans and append-only evidence records
//! - `adapters`: Layout provider and rasterizer seams
//! - `core`: Limits and the chapter pipeline (`resolve_quotes`)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Resolve one chapter
//! quizcite resolve --layout ch01.json --quotes ch01.yaml --out out/
//!
//! # Resolve every chapter of a book
//! quizcite batch --layouts 'layouts/*.json' --quotes-dir quotes/ --out out/
//!
//! # Re-check stored evidence after re-extraction
//! quizcite evidence validate --layout ch01.json --evidence out/evidence.jsonl
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod evidence;
pub mod matching;

// Re-export main types at crate root for convenience
pub use crate::core::{process_chapter, resolve_quotes, PipelineSettings, QuoteMatches};
pub use domain::{
    Block, BlockKind, InputError, MatchSpan, MatchedBlockGroup, Page, Passage, QuoteSet, Rect,
};
pub use evidence::{Evidence, EvidencePlan, Status as EvidenceStatus};
pub use matching::{MatchFailure, MatchSettings, Normalizer, OffsetResolver};
