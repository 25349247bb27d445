//! Evidence record types
//!
//! These types represent the evidence.jsonl and events.jsonl schemas.

use serde::{Deserialize, Serialize};

use crate::domain::Rect;
use crate::matching::{self, MatchFailure};

/// Resolution status for a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Span found and mapped to blocks
    Resolved,
    /// No span, no image
    Unresolved,
}

/// Method used to resolve the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Bounded edit-distance alignment
    Fuzzy,
    /// Unscored candidate window
    WindowFallback,
    /// Not resolved
    None,
}

impl From<matching::ResolutionMethod> for ResolutionMethod {
    fn from(method: matching::ResolutionMethod) -> Self {
        match method {
            matching::ResolutionMethod::Fuzzy => ResolutionMethod::Fuzzy,
            matching::ResolutionMethod::WindowFallback => ResolutionMethod::WindowFallback,
        }
    }
}

/// Reason for unresolved status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NoCandidateRegion,
    AlignmentExhausted,
    NormalizationInversion,
    GeometryMismatch,
    EmptyQuery,
}

impl From<&MatchFailure> for UnresolvedReason {
    fn from(failure: &MatchFailure) -> Self {
        match failure {
            MatchFailure::NoCandidateRegion { .. } => UnresolvedReason::NoCandidateRegion,
            MatchFailure::AlignmentExhausted { .. } => UnresolvedReason::AlignmentExhausted,
            MatchFailure::NormalizationInversion { .. } => UnresolvedReason::NormalizationInversion,
            MatchFailure::GeometryMismatch => UnresolvedReason::GeometryMismatch,
            MatchFailure::EmptyQuery => UnresolvedReason::EmptyQuery,
        }
    }
}

/// Resolution details for a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Method used to resolve
    pub method: ResolutionMethod,
    /// Edits used by the alignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_distance: Option<usize>,
    /// Candidate window similarity (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Reason if unresolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnresolvedReason>,
    /// Human-readable failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A span in the chapter passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Character offset range [start, end)
    pub char_offset: [usize; 2],
    /// UTF-8 byte offset range [start, end)
    pub utf8_byte_offset: [usize; 2],
    /// SHA256 hash of the slice bytes
    pub slice_sha256: String,
    /// Context around the span (~80 chars)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
}

/// An evidence line in evidence.jsonl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Deterministic evidence ID
    pub id: String,
    /// Chapter this evidence belongs to
    pub chapter: String,
    /// Question identifier owning the quote
    pub quote_id: String,
    /// Position of the quote within its identifier
    pub quote_index: usize,
    /// Quote as supplied
    pub quote: String,
    /// SHA256 hash of the quote
    pub quote_sha256: String,
    /// Resolution status
    pub status: Status,
    /// Resolution details
    pub resolution: Resolution,
    /// Span in the passage (present if resolved)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Indices of the matched layout blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<usize>,
    /// Highlight rectangles in page space
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Rect>,
    /// Evidence image name (`{chapter}/img{NN}.png`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Timestamp when evidence was created
    pub ts: String,
}

/// Evidence-related events for events.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EvidenceEvent {
    /// A chapter was resolved and its evidence appended
    ChapterResolved {
        chapter: String,
        resolved_count: usize,
        unresolved_count: usize,
        fallbacks_used: u32,
        fallbacks_refused: u32,
    },
    /// Evidence was validated against a layout
    EvidenceValidated {
        chapter: String,
        valid_count: usize,
        stale_count: usize,
        unresolved_count: usize,
    },
}

impl Evidence {
    /// Create a new resolved evidence entry
    pub fn new_resolved(
        id: String,
        chapter: String,
        quote_id: String,
        quote_index: usize,
        quote: String,
        quote_sha256: String,
        resolution: Resolution,
        span: Span,
        blocks: Vec<usize>,
        ts: String,
    ) -> Self {
        Self {
            id,
            chapter,
            quote_id,
            quote_index,
            quote,
            quote_sha256,
            status: Status::Resolved,
            resolution,
            span: Some(span),
            blocks,
            regions: Vec::new(),
            image: None,
            ts,
        }
    }

    /// Create a new unresolved evidence entry
    pub fn new_unresolved(
        id: String,
        chapter: String,
        quote_id: String,
        quote_index: usize,
        quote: String,
        quote_sha256: String,
        failure: &MatchFailure,
        ts: String,
    ) -> Self {
        Self {
            id,
            chapter,
            quote_id,
            quote_index,
            quote,
            quote_sha256,
            status: Status::Unresolved,
            resolution: Resolution {
                method: ResolutionMethod::None,
                edit_distance: None,
                similarity: match failure {
                    MatchFailure::NoCandidateRegion { similarity } => Some(*similarity),
                    _ => None,
                },
                reason: Some(UnresolvedReason::from(failure)),
                detail: Some(failure.to_string()),
            },
            span: None,
            blocks: Vec::new(),
            regions: Vec::new(),
            image: None,
            ts,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == Status::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_serialization() {
        let evidence = Evidence::new_unresolved(
            "abc".into(),
            "ch01".into(),
            "q1".into(),
            0,
            "missing quote".into(),
            "sha256:00".into(),
            &MatchFailure::NoCandidateRegion { similarity: 2.5 },
            "2026-01-01T00:00:00Z".into(),
        );

        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json["status"], "unresolved");
        assert_eq!(json["resolution"]["method"], "none");
        assert_eq!(json["resolution"]["reason"], "no_candidate_region");
        assert_eq!(json["resolution"]["similarity"], 2.5);
        assert!(json.get("span").is_none());
        assert!(json.get("blocks").is_none());
    }

    #[test]
    fn test_resolved_roundtrip_keeps_regions() {
        let mut evidence = Evidence::new_resolved(
            "abc".into(),
            "ch01".into(),
            "q1".into(),
            1,
            "quote".into(),
            "sha256:00".into(),
            Resolution {
                method: ResolutionMethod::Fuzzy,
                edit_distance: Some(1),
                similarity: Some(42.0),
                reason: None,
                detail: None,
            },
            Span {
                char_offset: [3, 8],
                utf8_byte_offset: [3, 8],
                slice_sha256: "sha256:11".into(),
                anchor_text: None,
            },
            vec![0, 1],
            "2026-01-01T00:00:00Z".into(),
        );
        evidence.regions = vec![Rect::new(0.0, 0.0, 10.0, 5.0)];
        evidence.image = Some("ch01/img1.png".into());

        let line = serde_json::to_string(&evidence).unwrap();
        assert!(line.contains("\"regions\":[[0.0,0.0,10.0,5.0]]"));
        let back: Evidence = serde_json::from_str(&line).unwrap();
        assert_eq!(back, evidence);
    }
}
