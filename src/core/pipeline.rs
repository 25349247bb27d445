//! Quote resolution pipeline.
//!
//! `resolve_quotes` is the core entry point: quotes in, matched blocks out.
//! `process_chapter` wraps it with limits, evidence plans, rendering and
//! evidence records for one chapter; `run_batch` fans chapters out to
//! blocking workers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::limits::{FallbackTracker, ResolveLimits};
use crate::adapters::{ChapterLayout, JsonLayoutFile, LayoutProvider, PageRasterizer, RenderManifest};
use crate::domain::{Block, InputError, MatchedBlockGroup, Page, Passage, QuoteSet};
use crate::evidence::{
    char_span_to_bytes, compute_evidence_id, compute_hash, extract_anchor_text, locate,
    Evidence, EvidenceComposer, EvidenceEvent, EvidencePlan, EvidenceStore, RenderSettings,
    Resolution as EvidenceResolution, Span,
};
use crate::matching::{MatchFailure, MatchSettings, Normalizer, OffsetResolver, Resolution};

/// Quote identifier -> matched block groups (one per resolved quote)
pub type QuoteMatches = HashMap<String, Vec<MatchedBlockGroup>>;

/// Context characters kept around a span in evidence records
const ANCHOR_WINDOW: usize = 80;

/// All tunables of one chapter run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub matching: MatchSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub limits: ResolveLimits,
}

/// Result for one quote
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub quote_id: String,
    pub quote_index: usize,
    pub quote: String,
    pub result: Result<(Resolution, Vec<Block>), MatchFailure>,
}

/// Everything `resolve_quotes` learned, including failures
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    pub matches: QuoteMatches,
    pub outcomes: Vec<QuoteOutcome>,
}

impl ResolveReport {
    pub fn resolved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.outcomes.len() - self.resolved_count()
    }
}

/// Locate every quote in the passage and collect the blocks each one covers.
///
/// Every identifier of `quotes` appears in the result, with an empty list
/// when none of its quotes resolved. Unresolved quotes are logged, never
/// raised; only structurally invalid input is an error.
pub fn resolve_quotes(
    passage: &Passage,
    blocks: &[Block],
    quotes: &QuoteSet,
    settings: &MatchSettings,
) -> Result<QuoteMatches, InputError> {
    resolve_quotes_with(
        passage,
        blocks,
        quotes,
        settings,
        &Normalizer::default(),
        &mut FallbackTracker::unlimited(),
    )
    .map(|report| report.matches)
}

/// `resolve_quotes` with an explicit normalizer and fallback budget,
/// returning per-quote outcomes as well
pub fn resolve_quotes_with(
    passage: &Passage,
    blocks: &[Block],
    quotes: &QuoteSet,
    settings: &MatchSettings,
    normalizer: &Normalizer,
    fallbacks: &mut FallbackTracker,
) -> Result<ResolveReport, InputError> {
    if quotes.is_empty() {
        return Err(InputError::EmptyQuoteSet);
    }
    if passage.ranges().iter().any(|r| r.block >= blocks.len()) {
        return Err(InputError::RangeMismatch {
            ranges: passage.ranges().len(),
            blocks: blocks.len(),
        });
    }

    let resolver = OffsetResolver::new(passage.text(), settings, normalizer);
    let mut report = ResolveReport::default();

    for (id, texts) in quotes.iter() {
        let groups = report.matches.entry(id.to_string()).or_default();

        for (index, text) in texts.iter().enumerate() {
            let result = resolver.locate(text, fallbacks).and_then(|resolution| {
                let found = locate(blocks, passage.ranges(), &resolution.span);
                if found.is_empty() {
                    Err(MatchFailure::GeometryMismatch)
                } else {
                    Ok((resolution, found))
                }
            });

            match &result {
                Ok((resolution, found)) => {
                    debug!(
                        quote_id = %id,
                        start = resolution.span.start,
                        end = resolution.span.end,
                        edits = ?resolution.span.edit_distance,
                        blocks = found.len(),
                        "Resolved quote"
                    );
                    groups.push(MatchedBlockGroup {
                        quote_id: id.to_string(),
                        quote_index: index,
                        quote: text.clone(),
                        span: resolution.span,
                        blocks: found.clone(),
                    });
                }
                Err(reason) => {
                    warn!(quote_id = %id, quote = %text, reason = %reason, "Unresolved quote");
                }
            }

            report.outcomes.push(QuoteOutcome {
                quote_id: id.to_string(),
                quote_index: index,
                quote: text.clone(),
                result,
            });
        }
    }

    Ok(report)
}

/// Outcome of one chapter
#[derive(Debug, Clone)]
pub struct ChapterReport {
    pub chapter: String,
    pub page: Page,
    pub plans: Vec<EvidencePlan>,
    pub evidence: Vec<Evidence>,
    pub fallbacks_used: u32,
    pub fallbacks_refused: u32,
}

impl ChapterReport {
    pub fn resolved_count(&self) -> usize {
        self.evidence.iter().filter(|e| e.is_resolved()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.evidence.len() - self.resolved_count()
    }

    pub fn event(&self) -> EvidenceEvent {
        EvidenceEvent::ChapterResolved {
            chapter: self.chapter.clone(),
            resolved_count: self.resolved_count(),
            unresolved_count: self.unresolved_count(),
            fallbacks_used: self.fallbacks_used,
            fallbacks_refused: self.fallbacks_refused,
        }
    }
}

/// Resolve one chapter: composite page, limits, matching, plans, rendering
/// and evidence records
pub fn process_chapter(
    layout: &ChapterLayout,
    quotes: &QuoteSet,
    settings: &PipelineSettings,
    normalizer: &Normalizer,
    rasterizer: &mut dyn PageRasterizer,
) -> Result<ChapterReport> {
    let chapter = layout.chapter.as_str();
    let page = layout
        .composite()
        .with_context(|| format!("Invalid layout for chapter {}", chapter))?;
    let passage = Passage::from_blocks(&page.blocks)
        .with_context(|| format!("No usable text in chapter {}", chapter))?;

    settings.limits.validate_passage(&passage)?;
    settings.limits.validate_quotes(quotes)?;

    let mut fallbacks = settings.limits.tracker();
    let report = resolve_quotes_with(
        &passage,
        &page.blocks,
        quotes,
        &settings.matching,
        normalizer,
        &mut fallbacks,
    )?;

    let composer = EvidenceComposer::new(settings.render.clone());
    let plans = composer.compose(chapter, &page, quotes, &report.matches);
    for plan in &plans {
        rasterizer
            .render(&page, plan)
            .with_context(|| format!("Failed to render {}", plan.image))?;
    }

    let plans_by_id: HashMap<&str, &EvidencePlan> =
        plans.iter().map(|p| (p.quote_id.as_str(), p)).collect();
    let ts = Utc::now().to_rfc3339();
    let evidence = report
        .outcomes
        .iter()
        .map(|outcome| {
            let plan = plans_by_id.get(outcome.quote_id.as_str()).copied();
            build_evidence(chapter, &passage, outcome, plan, &ts)
        })
        .collect::<Vec<_>>();

    info!(
        chapter = %chapter,
        resolved = report.resolved_count(),
        unresolved = report.unresolved_count(),
        images = plans.len(),
        fallbacks = fallbacks.used(),
        "Chapter resolved"
    );

    Ok(ChapterReport {
        chapter: chapter.to_string(),
        page,
        plans,
        evidence,
        fallbacks_used: fallbacks.used(),
        fallbacks_refused: fallbacks.refused(),
    })
}

fn build_evidence(
    chapter: &str,
    passage: &Passage,
    outcome: &QuoteOutcome,
    plan: Option<&EvidencePlan>,
    ts: &str,
) -> Evidence {
    let quote_sha256 = compute_hash(outcome.quote.as_bytes());

    match &outcome.result {
        Ok((resolution, blocks)) => {
            let text = passage.text();
            let (start, end) = (resolution.span.start, resolution.span.end);
            let (byte_start, byte_end) = char_span_to_bytes(text, start, end);

            let mut evidence = Evidence::new_resolved(
                compute_evidence_id(chapter, &outcome.quote_id, &quote_sha256, Some((start, end))),
                chapter.to_string(),
                outcome.quote_id.clone(),
                outcome.quote_index,
                outcome.quote.clone(),
                quote_sha256,
                EvidenceResolution {
                    method: resolution.method.into(),
                    edit_distance: resolution.span.edit_distance,
                    similarity: resolution.similarity,
                    reason: None,
                    detail: None,
                },
                Span {
                    char_offset: [start, end],
                    utf8_byte_offset: [byte_start, byte_end],
                    slice_sha256: compute_hash(&text.as_bytes()[byte_start..byte_end]),
                    anchor_text: Some(extract_anchor_text(text, byte_start, byte_end, ANCHOR_WINDOW)),
                },
                blocks.iter().map(|b| b.index).collect(),
                ts.to_string(),
            );
            if let Some(plan) = plan {
                evidence.image = Some(plan.image.clone());
                evidence.regions = plan.highlights.clone();
            }
            evidence
        }
        Err(failure) => Evidence::new_unresolved(
            compute_evidence_id(chapter, &outcome.quote_id, &quote_sha256, None),
            chapter.to_string(),
            outcome.quote_id.clone(),
            outcome.quote_index,
            outcome.quote.clone(),
            quote_sha256,
            failure,
            ts.to_string(),
        ),
    }
}

/// One chapter to process: a layout file and its quotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterJob {
    pub layout: PathBuf,
    pub quotes: PathBuf,
}

/// Summary of a finished chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterSummary {
    pub chapter: String,
    pub resolved: usize,
    pub unresolved: usize,
    pub images: usize,
}

/// Load, process and store one chapter.
///
/// Evidence goes to `out_dir/evidence.jsonl` (shared, locked) and the render
/// manifest to `out_dir/{chapter}/renders.json`.
pub fn run_chapter(
    job: &ChapterJob,
    settings: &PipelineSettings,
    normalizer: &Normalizer,
    out_dir: &Path,
) -> Result<ChapterSummary> {
    let layout = JsonLayoutFile::new(&job.layout).layout()?;
    let quotes = QuoteSet::from_file(&job.quotes, &layout.chapter)?;

    let mut manifest = RenderManifest::new(&out_dir.join(&layout.chapter));
    let report = process_chapter(&layout, &quotes, settings, normalizer, &mut manifest)?;
    manifest.finish()?;

    let store = EvidenceStore::new(out_dir);
    store.append(&report.evidence)?;
    store.append_event(&report.event())?;

    Ok(ChapterSummary {
        chapter: report.chapter.clone(),
        resolved: report.resolved_count(),
        unresolved: report.unresolved_count(),
        images: report.plans.len(),
    })
}

/// Run chapters concurrently, one blocking worker each.
///
/// Results come back in job order; a failed chapter does not stop the others.
pub async fn run_batch(
    jobs: Vec<ChapterJob>,
    settings: PipelineSettings,
    normalizer: Normalizer,
    out_dir: PathBuf,
) -> Vec<(ChapterJob, Result<ChapterSummary>)> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let settings = settings.clone();
            let normalizer = normalizer.clone();
            let out_dir = out_dir.clone();
            let worker_job = job.clone();
            let handle = tokio::task::spawn_blocking(move || {
                run_chapter(&worker_job, &settings, &normalizer, &out_dir)
            });
            (job, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Chapter worker failed: {}", e)),
        };
        if let Err(e) = &result {
            warn!(layout = %job.layout.display(), error = %e, "Chapter failed");
        }
        results.push((job, result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::LimitViolation;
    use crate::domain::Rect;

    struct Recorder(Vec<String>);

    impl PageRasterizer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn render(&mut self, _page: &Page, plan: &EvidencePlan) -> Result<(), crate::adapters::AdapterError> {
            self.0.push(plan.image.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), crate::adapters::AdapterError> {
            Ok(())
        }
    }

    fn layout() -> ChapterLayout {
        ChapterLayout {
            chapter: "ch01".into(),
            pages: vec![Page {
                number: 1,
                width: 600.0,
                height: 800.0,
                blocks: vec![
                    Block::text(0, Rect::new(50.0, 50.0, 550.0, 90.0), "The mi-\ntochondria is the"),
                    Block::text(1, Rect::new(50.0, 95.0, 550.0, 130.0), "powerhouse of the cell."),
                    Block::image(2, Rect::new(50.0, 140.0, 550.0, 400.0)),
                    Block::text(3, Rect::new(50.0, 420.0, 550.0, 460.0), "Ribosomes build proteins from amino acids."),
                ],
            }],
        }
    }

    #[test]
    fn test_resolve_quotes_maps_blocks() {
        let layout = layout();
        let page = layout.composite().unwrap();
        let passage = Passage::from_blocks(&page.blocks).unwrap();

        let mut quotes = QuoteSet::new();
        quotes.push("q1", vec!["mitochondria is the powerhouse"]);
        quotes.push("q2", vec!["build proteins from amino acids"]);
        quotes.push("q3", vec!["zebra migration across savannah grasslands"]);

        let matches = resolve_quotes(&passage, &page.blocks, &quotes, &MatchSettings::default()).unwrap();
        let q1: Vec<usize> = matches["q1"][0].blocks.iter().map(|b| b.index).collect();
        assert_eq!(q1, vec![0, 1]);
        let q2: Vec<usize> = matches["q2"][0].blocks.iter().map(|b| b.index).collect();
        assert_eq!(q2, vec![3]);
        assert!(matches["q3"].is_empty());
    }

    #[test]
    fn test_empty_quote_set_is_fatal() {
        let passage = Passage::from_text("some text").unwrap();
        let err = resolve_quotes(&passage, &[], &QuoteSet::new(), &MatchSettings::default()).unwrap_err();
        assert_eq!(err, InputError::EmptyQuoteSet);
    }

    #[test]
    fn test_range_mismatch_is_fatal() {
        let blocks = vec![Block::text(0, Rect::new(0.0, 0.0, 10.0, 10.0), "alpha beta")];
        let passage = Passage::from_blocks(&blocks).unwrap();
        let mut quotes = QuoteSet::new();
        quotes.push("q", vec!["alpha"]);

        let err = resolve_quotes(&passage, &[], &quotes, &MatchSettings::default()).unwrap_err();
        assert!(matches!(err, InputError::RangeMismatch { ranges: 1, blocks: 0 }));
    }

    #[test]
    fn test_process_chapter_builds_evidence() {
        let mut quotes = QuoteSet::new();
        quotes.push("q1", vec!["mitochondria is the powerhouse", "zebra migration across savannah grasslands"]);

        let mut recorder = Recorder(Vec::new());
        let report = process_chapter(
            &layout(),
            &quotes,
            &PipelineSettings::default(),
            &Normalizer::default(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(recorder.0, vec!["ch01/img1.png"]);
        assert_eq!(report.resolved_count(), 1);
        assert_eq!(report.unresolved_count(), 1);

        let resolved = &report.evidence[0];
        assert_eq!(resolved.image.as_deref(), Some("ch01/img1.png"));
        assert_eq!(resolved.blocks, vec![0, 1]);
        let span = resolved.span.as_ref().unwrap();
        assert_eq!(span.char_offset, [4, 36]);
        assert_eq!(resolved.id.len(), 16);

        let unresolved = &report.evidence[1];
        assert!(unresolved.span.is_none());
        assert!(unresolved.resolution.reason.is_some());
    }

    #[test]
    fn test_process_chapter_enforces_limits() {
        let settings = PipelineSettings {
            limits: ResolveLimits {
                max_passage_chars: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut quotes = QuoteSet::new();
        quotes.push("q1", vec!["cell"]);

        let err = process_chapter(&layout(), &quotes, &settings, &Normalizer::default(), &mut Recorder(Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LimitViolation>(),
            Some(LimitViolation::PassageTooLarge { .. })
        ));
    }
}
