//! Quote localization core.
//!
//! This module contains:
//! - Normalizer: reversible cleanup of PDF extraction artifacts
//! - WordSegmenter: joined-word splitting used by the normalizer
//! - TextSplitter / CandidateRetriever: TF-IDF ranked candidate windows
//! - FuzzyAligner: bounded edit-distance search inside a window
//! - OffsetResolver: ties the above together into raw-passage spans

pub mod aligner;
pub mod normalizer;
pub mod resolver;
pub mod retriever;
pub mod splitter;
pub mod wordsplit;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use aligner::FuzzyAligner;
pub use normalizer::{NormalizationStep, Normalized, Normalizer, StepEdit, StepKind};
pub use resolver::{MatchFailure, OffsetResolver, Resolution, ResolutionMethod};
pub use retriever::{Candidate, CandidateRetriever, TfidfIndex};
pub use splitter::{Chunk, TextSplitter};
pub use wordsplit::WordSegmenter;

/// What to do when no chunk is similar enough to the query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowSimilarityPolicy {
    /// Give up on the quote
    #[default]
    Skip,
    /// Align against the whole cleaned passage (charged as a fallback)
    ScanFullPassage,
}

/// Tunables for retrieval and alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Similarity a chunk must exceed, 0..=100 (default: 10)
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Chars added on each side of the retrieved chunk (default: 100)
    #[serde(default = "default_padding_chars")]
    pub padding_chars: usize,

    /// Smallest chunk size in chars (default: 200)
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Chunk size as a multiple of the query length (default: 1.5)
    #[serde(default = "default_chunk_factor")]
    pub chunk_factor: f64,

    /// Absolute edit budget cap (default: 10)
    #[serde(default = "default_max_edits")]
    pub max_edits: usize,

    /// Edit budget cap relative to query length (default: 0.1)
    #[serde(default = "default_edit_fraction")]
    pub edit_fraction: f64,

    #[serde(default)]
    pub low_similarity: LowSimilarityPolicy,

    /// Accept the padded window unscored when alignment fails and the
    /// window is at most this many chars. Disabled when absent.
    #[serde(default)]
    pub window_fallback_max_chars: Option<usize>,
}

fn default_min_similarity() -> f64 {
    10.0
}
fn default_padding_chars() -> usize {
    100
}
fn default_min_chunk_chars() -> usize {
    200
}
fn default_chunk_factor() -> f64 {
    1.5
}
fn default_max_edits() -> usize {
    10
}
fn default_edit_fraction() -> f64 {
    0.1
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            padding_chars: default_padding_chars(),
            min_chunk_chars: default_min_chunk_chars(),
            chunk_factor: default_chunk_factor(),
            max_edits: default_max_edits(),
            edit_fraction: default_edit_fraction(),
            low_similarity: LowSimilarityPolicy::default(),
            window_fallback_max_chars: None,
        }
    }
}

impl MatchSettings {
    pub fn retriever(&self) -> CandidateRetriever {
        CandidateRetriever::new(self.chunk_factor, self.min_chunk_chars)
    }

    pub fn aligner(&self) -> FuzzyAligner {
        FuzzyAligner::new(self.max_edits, self.edit_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_yaml() {
        let settings: MatchSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, MatchSettings::default());
        assert_eq!(settings.low_similarity, LowSimilarityPolicy::Skip);
        assert!(settings.window_fallback_max_chars.is_none());
    }

    #[test]
    fn test_policy_parsing() {
        let settings: MatchSettings =
            serde_yaml::from_str("low_similarity: scan_full_passage\nmax_edits: 4").unwrap();
        assert_eq!(settings.low_similarity, LowSimilarityPolicy::ScanFullPassage);
        assert_eq!(settings.max_edits, 4);
        assert_eq!(settings.padding_chars, 100);
    }
}
