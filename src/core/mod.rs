//! Core orchestration logic.
//!
//! This module contains:
//! - Limits: resource limits and fallback budgets
//! - Pipeline: quote resolution per chapter and batch execution

pub mod limits;
pub mod pipeline;

// Re-export commonly used types
pub use limits::{FallbackKind, FallbackTracker, LimitViolation, ResolveLimits};
pub use pipeline::{
    process_chapter, resolve_quotes, resolve_quotes_with, run_batch, run_chapter, ChapterJob,
    ChapterReport, ChapterSummary, PipelineSettings, QuoteMatches, QuoteOutcome, ResolveReport,
};
