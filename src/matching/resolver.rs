//! Raw-passage spans for quotes.
//!
//! The passage is normalized once; each quote is then normalized the same
//! way, narrowed to a candidate window, aligned inside it, and the aligned
//! substring is mapped back through the normalization steps into raw
//! passage coordinates.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::normalizer::{Normalized, Normalizer};
use super::{LowSimilarityPolicy, MatchSettings};
use crate::core::limits::{FallbackKind, FallbackTracker};
use crate::domain::MatchSpan;

/// Why a quote could not be resolved (recoverable, per quote)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchFailure {
    #[error("Could not map the match back through the {step} step")]
    NormalizationInversion { step: String },

    #[error("No candidate region (best similarity {similarity:.1})")]
    NoCandidateRegion { similarity: f64 },

    #[error("No alignment within {max_edits} edits")]
    AlignmentExhausted { max_edits: usize },

    #[error("Match overlaps no text block")]
    GeometryMismatch,

    #[error("Quote is empty after normalization")]
    EmptyQuery,
}

impl MatchFailure {
    /// Short machine-readable label
    pub fn code(&self) -> &'static str {
        match self {
            MatchFailure::NormalizationInversion { .. } => "normalization_inversion",
            MatchFailure::NoCandidateRegion { .. } => "no_candidate_region",
            MatchFailure::AlignmentExhausted { .. } => "alignment_exhausted",
            MatchFailure::GeometryMismatch => "geometry_mismatch",
            MatchFailure::EmptyQuery => "empty_query",
        }
    }
}

/// How a span was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Aligned within the edit budget
    Fuzzy,
    /// Alignment failed; the padded candidate window is used unscored
    WindowFallback,
}

/// A resolved quote
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Raw passage coordinates
    pub span: MatchSpan,
    /// Same match in cleaned-text coordinates
    pub clean_span: MatchSpan,
    pub method: ResolutionMethod,
    /// Candidate similarity; `None` when the whole passage was scanned
    pub similarity: Option<f64>,
}

/// Resolves quotes against one passage
#[derive(Debug, Clone)]
pub struct OffsetResolver {
    normalized: Normalized,
    normalizer: Normalizer,
    settings: MatchSettings,
}

impl OffsetResolver {
    pub fn new(raw: &str, settings: &MatchSettings, normalizer: &Normalizer) -> Self {
        Self {
            normalized: normalizer.normalize(raw),
            normalizer: normalizer.clone(),
            settings: settings.clone(),
        }
    }

    pub fn normalized(&self) -> &Normalized {
        &self.normalized
    }

    /// Raw-passage span of `query`, without fallback budget accounting
    pub fn resolve(&self, query: &str) -> Result<MatchSpan, MatchFailure> {
        self.locate(query, &mut FallbackTracker::unlimited())
            .map(|r| r.span)
    }

    /// Resolve `query`, charging any fallback against `fallbacks`
    pub fn locate(&self, query: &str, fallbacks: &mut FallbackTracker) -> Result<Resolution, MatchFailure> {
        let query: Vec<char> = self.normalizer.clean(query).chars().collect();
        if query.is_empty() {
            return Err(MatchFailure::EmptyQuery);
        }
        let query_text: String = query.iter().collect();

        let clean = self.normalized.chars();
        let aligner = self.settings.aligner();
        let candidate = self.settings.retriever().retrieve(clean, &query_text);

        let (window_start, window_end, similarity) = match candidate {
            Some(c) if c.is_reasonable(self.settings.min_similarity) => {
                let start = c.chunk.start.saturating_sub(self.settings.padding_chars);
                let end = (c.chunk.end + self.settings.padding_chars).min(clean.len());
                (start, end, Some(c.similarity))
            }
            other => {
                let similarity = other.map(|c| c.similarity).unwrap_or(0.0);
                let scan = self.settings.low_similarity == LowSimilarityPolicy::ScanFullPassage
                    && fallbacks.try_consume(FallbackKind::FullScan);
                if !scan {
                    return Err(MatchFailure::NoCandidateRegion { similarity });
                }
                debug!(similarity, "No reasonable candidate, scanning full passage");
                (0, clean.len(), None)
            }
        };

        debug!(
            window_start,
            window_end,
            budget = aligner.budget(query.len()),
            "Aligning in window"
        );

        let (clean_span, method) = match aligner.align(&clean[window_start..window_end], &query) {
            Some(span) => (span.shifted(window_start), ResolutionMethod::Fuzzy),
            None => {
                let window_len = window_end - window_start;
                let fallback = similarity.is_some()
                    && self
                        .settings
                        .window_fallback_max_chars
                        .is_some_and(|max| window_len <= max)
                    && fallbacks.try_consume(FallbackKind::Window);
                if !fallback {
                    return Err(MatchFailure::AlignmentExhausted {
                        max_edits: aligner.budget(query.len()),
                    });
                }
                debug!(window_len, "Using candidate window as unscored match");
                (
                    MatchSpan::new(window_start, window_end),
                    ResolutionMethod::WindowFallback,
                )
            }
        };

        let inverted = self
            .normalized
            .invert_span(clean_span.start, clean_span.end)
            .map_err(|step| MatchFailure::NormalizationInversion {
                step: step.map(|s| s.as_str()).unwrap_or("raw text").to_string(),
            })?;

        let span = MatchSpan {
            start: inverted.start,
            end: inverted.start + inverted.chars.len(),
            edit_distance: clean_span.edit_distance,
        };

        Ok(Resolution {
            span,
            clean_span,
            method,
            similarity,
        })
    }
}
