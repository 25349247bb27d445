//! Evidence for located quotes
//!
//! Turns resolved spans into something a human can check: the layout blocks
//! a quote covers, a render plan for the evidence image, and an append-only
//! record with a verifiable span.
//!
//! # Design Principles
//!
//! - **Honest unresolved**: a quote without a span is recorded as unresolved, never guessed.
//! - **Append-only**: Evidence is stored in JSONL format, never modified.
//! - **Hash verification**: Each span includes slice_sha256 for drift detection.
//! - **Deterministic IDs**: Same input always produces same evidence ID.

pub mod composer;
pub mod locator;
pub mod records;
pub mod spans;
pub mod store;

pub use composer::{image_name, EvidenceComposer, EvidencePlan, RenderSettings};
pub use locator::{group_intersecting, locate};
pub use records::{
    Evidence, EvidenceEvent, Resolution, ResolutionMethod, Span, Status, UnresolvedReason,
};
pub use spans::{
    char_span_to_bytes, compute_evidence_id, compute_hash,
    compute_slice_hash, extract_anchor_text, offset_to_line_col, LineCol,
};
pub use store::{load_evidence, EvidenceStore};
