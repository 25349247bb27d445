//! Evidence CLI subcommands for inspecting and validating evidence.
//!
//! Provides commands to:
//! - `show`: Display evidence details with source snippet
//! - `validate`: Verify evidence spans against a rebuilt passage

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::adapters::{JsonLayoutFile, LayoutProvider};
use crate::domain::Passage;
use crate::evidence::{
    compute_slice_hash, load_evidence, offset_to_line_col, Evidence, EvidenceEvent,
    EvidenceStore,
};

/// Evidence-related subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Show details of an evidence entry
    Show {
        /// Evidence ID (or unique prefix) to display
        evidence_id: String,

        /// Output directory holding evidence.jsonl (defaults to QUIZCITE_HOME)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Layout file to show the source snippet from
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },

    /// Validate stored evidence against a layout file
    Validate {
        /// Layout file of the chapter
        #[arg(short, long)]
        layout: PathBuf,

        /// Evidence file (evidence.jsonl)
        #[arg(short, long)]
        evidence: PathBuf,
    },
}

/// Outcome of re-checking evidence spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub valid: usize,
    pub stale: Vec<String>,
    pub unresolved: usize,
}

/// Recompute slice hashes of `evidence` against `passage`.
///
/// A span whose bytes no longer exist or no longer hash the same is stale.
pub fn validate_spans<'a, I>(passage: &Passage, evidence: I) -> ValidationSummary
where
    I: IntoIterator<Item = &'a Evidence>,
{
    let bytes = passage.text().as_bytes();
    let mut summary = ValidationSummary::default();

    for e in evidence {
        match &e.span {
            Some(span) => {
                let [start, end] = span.utf8_byte_offset;
                match compute_slice_hash(bytes, start, end) {
                    Some(hash) if hash == span.slice_sha256 => summary.valid += 1,
                    _ => summary.stale.push(e.id.clone()),
                }
            }
            None => summary.unresolved += 1,
        }
    }

    summary
}

fn load_passage(layout_path: &Path) -> Result<(String, Passage)> {
    let layout = JsonLayoutFile::new(layout_path).layout()?;
    let page = layout
        .composite()
        .with_context(|| format!("Invalid layout: {}", layout_path.display()))?;
    let passage = Passage::from_blocks(&page.blocks)
        .with_context(|| format!("No usable text in layout: {}", layout_path.display()))?;
    Ok((layout.chapter, passage))
}

/// Execute the `evidence show` command
pub async fn execute_show(
    evidence_id: &str,
    out: Option<PathBuf>,
    layout: Option<PathBuf>,
) -> Result<()> {
    let out = match out {
        Some(dir) => dir,
        None => crate::config::quizcite_home()?,
    };
    let store = EvidenceStore::new(out);

    let evidence = store
        .find(evidence_id)?
        .with_context(|| format!("Evidence not found: {}", evidence_id))?;
    display_evidence(&evidence, layout.as_deref())
}

/// Display evidence details
fn display_evidence(evidence: &Evidence, layout: Option<&Path>) -> Result<()> {
    println!("Evidence ID: {}", evidence.id);
    println!("Chapter:     {}", evidence.chapter);
    println!("Quote ID:    {} (#{})", evidence.quote_id, evidence.quote_index);
    println!("Status:      {:?}", evidence.status);
    println!("Method:      {:?}", evidence.resolution.method);
    if let Some(edits) = evidence.resolution.edit_distance {
        println!("Edits:       {}", edits);
    }
    if let Some(similarity) = evidence.resolution.similarity {
        println!("Similarity:  {:.1}", similarity);
    }
    println!("Timestamp:   {}", evidence.ts);
    println!();
    println!("Quote:");
    println!("  \"{}\"", evidence.quote);
    println!("  (SHA256: {})", evidence.quote_sha256);

    let Some(span) = &evidence.span else {
        println!();
        println!("(No span - evidence is unresolved)");
        if let Some(reason) = &evidence.resolution.reason {
            println!("Reason: {:?}", reason);
        }
        if let Some(detail) = &evidence.resolution.detail {
            println!("Detail: {}", detail);
        }
        return Ok(());
    };

    println!();
    println!("Source Location:");
    println!("  Chars: {} - {}", span.char_offset[0], span.char_offset[1]);
    println!(
        "  Bytes: {} - {}",
        span.utf8_byte_offset[0], span.utf8_byte_offset[1]
    );
    println!("  Blocks: {:?}", evidence.blocks);
    if let Some(image) = &evidence.image {
        println!("  Image: {}", image);
    }

    if let Some(layout) = layout {
        let (_, passage) = load_passage(layout)?;
        let text = passage.text();
        let [start, end] = span.utf8_byte_offset;

        match text.get(start..end) {
            Some(snippet) => {
                let line_col = offset_to_line_col(text, start);
                println!("  Position: line {}, col {}", line_col.line, line_col.col);
                println!();
                println!("Snippet:");
                println!("  ---");
                println!("  {}", snippet);
                println!("  ---");
            }
            None => println!("  (span no longer fits the layout text)"),
        }
    }

    if let Some(anchor) = &span.anchor_text {
        println!();
        println!("Anchor text: {}", anchor);
    }

    Ok(())
}

/// Execute the `evidence validate` command
pub async fn execute_validate(layout: &Path, evidence_path: &Path) -> Result<()> {
    let (chapter, passage) = load_passage(layout)?;

    let evidence_list = load_evidence(evidence_path)?;
    let chapter_evidence: Vec<&Evidence> = evidence_list
        .iter()
        .filter(|e| e.chapter == chapter)
        .collect();

    println!("Validating evidence for chapter: {}", chapter);
    println!();

    let summary = validate_spans(&passage, chapter_evidence.iter().copied());
    for id in &summary.stale {
        println!("    STALE: {}", id);
    }

    let store = EvidenceStore::new(
        evidence_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    );
    store.append_event(&EvidenceEvent::EvidenceValidated {
        chapter: chapter.clone(),
        valid_count: summary.valid,
        stale_count: summary.stale.len(),
        unresolved_count: summary.unresolved,
    })?;

    println!();
    println!("Summary:");
    println!("  Total evidence: {}", chapter_evidence.len());
    println!("  Valid:          {}", summary.valid);
    println!("  Stale:          {}", summary.stale.len());
    println!("  Unresolved:     {}", summary.unresolved);

    if !summary.stale.is_empty() {
        println!();
        println!("Some evidence needs re-resolution due to layout changes.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{
        char_span_to_bytes, compute_hash, Resolution, ResolutionMethod, Span,
    };
    use crate::matching::MatchFailure;

    fn resolved(id: &str, text: &str, start: usize, end: usize) -> Evidence {
        let (bs, be) = char_span_to_bytes(text, start, end);
        Evidence::new_resolved(
            id.into(),
            "ch01".into(),
            "q1".into(),
            0,
            "quote".into(),
            compute_hash(b"quote"),
            Resolution {
                method: ResolutionMethod::Fuzzy,
                edit_distance: Some(0),
                similarity: Some(50.0),
                reason: None,
                detail: None,
            },
            Span {
                char_offset: [start, end],
                utf8_byte_offset: [bs, be],
                slice_sha256: compute_hash(&text.as_bytes()[bs..be]),
                anchor_text: None,
            },
            vec![0],
            "2026-01-01T00:00:00Z".into(),
        )
    }

    #[test]
    fn test_validate_spans_counts() {
        let original = "Café owners serve espresso daily ";
        let passage = Passage::from_text(original).unwrap();
        let changed = Passage::from_text("Cafe owners serve espresso daily ").unwrap();

        let evidence = vec![
            resolved("aaaa", original, 0, 4),
            resolved("bbbb", original, 12, 17),
            Evidence::new_unresolved(
                "cccc".into(),
                "ch01".into(),
                "q2".into(),
                0,
                "missing".into(),
                compute_hash(b"missing"),
                &MatchFailure::EmptyQuery,
                "2026-01-01T00:00:00Z".into(),
            ),
        ];

        let summary = validate_spans(&passage, &evidence);
        assert_eq!(summary.valid, 2);
        assert!(summary.stale.is_empty());
        assert_eq!(summary.unresolved, 1);

        // "é" became "e": the first span's bytes differ, the second shifted by one byte
        let summary = validate_spans(&changed, &evidence);
        assert_eq!(summary.valid, 0);
        assert_eq!(summary.stale, vec!["aaaa".to_string(), "bbbb".to_string()]);
    }

    #[test]
    fn test_out_of_bounds_span_is_stale() {
        let long = "a much longer passage of text than the replacement";
        let evidence = vec![resolved("dddd", long, 30, 45)];
        let short = Passage::from_text("short").unwrap();

        let summary = validate_spans(&short, &evidence);
        assert_eq!(summary.stale, vec!["dddd".to_string()]);
    }
}
