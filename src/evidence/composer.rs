//! Render plans for evidence images.
//!
//! Each question with matched blocks gets one image: the matched blocks are
//! grouped by intersection, every group is outlined with a slightly enlarged
//! rectangle, and the crop is the union of all blocks grown by `clip_scale`
//! and clamped to the page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::locator::group_intersecting;
use crate::domain::{Block, MatchedBlockGroup, Page, QuoteSet, Rect};

/// Rendering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Growth of each highlight around its center (default: 1.1)
    #[serde(default = "default_highlight_scale")]
    pub highlight_scale: f64,

    /// Growth of the crop around the matched blocks (default: 2.0)
    #[serde(default = "default_clip_scale")]
    pub clip_scale: f64,

    /// Rasterization zoom factor (default: 10)
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_highlight_scale() -> f64 {
    1.1
}
fn default_clip_scale() -> f64 {
    2.0
}
fn default_zoom() -> f64 {
    10.0
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            highlight_scale: default_highlight_scale(),
            clip_scale: default_clip_scale(),
            zoom: default_zoom(),
        }
    }
}

/// Everything a rasterizer needs to produce one evidence image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePlan {
    pub chapter: String,
    pub quote_id: String,
    /// `{chapter}/img{NN}.png`
    pub image: String,
    pub page_number: u32,
    /// Indices of the matched blocks, ascending
    pub blocks: Vec<usize>,
    /// One outline per intersection group
    pub highlights: Vec<Rect>,
    pub clip: Rect,
    pub zoom: f64,
}

/// Image name for the `counter`-th (1-based) of `total` images
pub fn image_name(chapter: &str, counter: usize, total: usize) -> String {
    // ceil(log10(total + 1)) == number of decimal digits of total
    let width = total.to_string().len();
    format!("{}/img{:0width$}.png", chapter, counter, width = width)
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceComposer {
    settings: RenderSettings,
}

impl EvidenceComposer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    /// Outline rectangles for a set of blocks
    pub fn highlights(&self, blocks: &[Block]) -> Vec<Rect> {
        let rects: Vec<Rect> = blocks.iter().map(|b| b.bbox).collect();
        group_intersecting(&rects)
            .into_iter()
            .filter_map(|group| Rect::enclosing(group.iter().map(|&i| &rects[i])))
            .map(|r| r.scale(self.settings.highlight_scale))
            .collect()
    }

    /// Crop rectangle for a set of blocks, clamped to the page
    pub fn clip(&self, page: &Page, blocks: &[Block]) -> Option<Rect> {
        Rect::enclosing(blocks.iter().map(|b| &b.bbox))
            .map(|r| r.scale(self.settings.clip_scale).clamp_to(&page.bounds()))
    }

    /// One plan per identifier with matched blocks, numbered in quote-set order
    pub fn compose(
        &self,
        chapter: &str,
        page: &Page,
        quotes: &QuoteSet,
        matches: &HashMap<String, Vec<MatchedBlockGroup>>,
    ) -> Vec<EvidencePlan> {
        let mut selected: Vec<(&str, Vec<Block>)> = Vec::new();
        for (id, _) in quotes.iter() {
            let Some(groups) = matches.get(id) else {
                continue;
            };
            let mut blocks: Vec<Block> = groups.iter().flat_map(|g| g.blocks.iter().cloned()).collect();
            blocks.sort_by_key(|b| b.index);
            blocks.dedup_by_key(|b| b.index);
            if !blocks.is_empty() {
                selected.push((id, blocks));
            }
        }

        let total = selected.len();
        selected
            .into_iter()
            .enumerate()
            .filter_map(|(i, (id, blocks))| {
                let clip = self.clip(page, &blocks)?;
                Some(EvidencePlan {
                    chapter: chapter.to_string(),
                    quote_id: id.to_string(),
                    image: image_name(chapter, i + 1, total),
                    page_number: page.number,
                    blocks: blocks.iter().map(|b| b.index).collect(),
                    highlights: self.highlights(&blocks),
                    clip,
                    zoom: self.settings.zoom,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchSpan;

    fn page() -> Page {
        Page {
            number: 1,
            width: 200.0,
            height: 300.0,
            blocks: vec![
                Block::text(0, Rect::new(10.0, 10.0, 110.0, 30.0), "first"),
                Block::text(1, Rect::new(10.0, 25.0, 110.0, 45.0), "second"),
                Block::text(2, Rect::new(10.0, 200.0, 110.0, 220.0), "third"),
            ],
        }
    }

    fn group(id: &str, blocks: Vec<Block>) -> MatchedBlockGroup {
        MatchedBlockGroup {
            quote_id: id.to_string(),
            quote_index: 0,
            quote: "q".to_string(),
            span: MatchSpan::with_edits(0, 1, 0),
            blocks,
        }
    }

    #[test]
    fn test_image_name_padding() {
        assert_eq!(image_name("ch01", 3, 9), "ch01/img3.png");
        assert_eq!(image_name("ch01", 3, 10), "ch01/img03.png");
        assert_eq!(image_name("ch01", 12, 120), "ch01/img012.png");
    }

    #[test]
    fn test_highlights_group_overlapping_blocks() {
        let composer = EvidenceComposer::default();
        let page = page();
        let highlights = composer.highlights(&page.blocks);
        assert_eq!(highlights.len(), 2);

        // first two blocks merge into 10..110 x 10..45, scaled 1.1 about center
        let merged = highlights[0];
        assert!((merged.x0 - 5.0).abs() < 1e-9);
        assert!((merged.x1 - 115.0).abs() < 1e-9);
        assert!((merged.y0 - 8.25).abs() < 1e-9);
        assert!((merged.y1 - 46.75).abs() < 1e-9);
    }

    #[test]
    fn test_clip_clamped_to_page() {
        let composer = EvidenceComposer::default();
        let page = page();
        let clip = composer.clip(&page, &page.blocks[..1]).unwrap();
        // 100x20 block doubled around (60, 20) -> x -40..160 clamped at 0
        assert_eq!(clip, Rect::new(0.0, 0.0, 160.0, 40.0));
    }

    #[test]
    fn test_compose_numbers_in_quote_order() {
        let composer = EvidenceComposer::default();
        let page = page();

        let mut quotes = QuoteSet::new();
        quotes.push("q2", vec!["b"]);
        quotes.push("q1", vec!["a"]);
        quotes.push("q3", vec!["c"]);

        let mut matches = HashMap::new();
        matches.insert("q1".to_string(), vec![group("q1", vec![page.blocks[2].clone()])]);
        matches.insert(
            "q2".to_string(),
            vec![
                group("q2", vec![page.blocks[1].clone(), page.blocks[0].clone()]),
                group("q2", vec![page.blocks[1].clone()]),
            ],
        );
        matches.insert("q3".to_string(), vec![]);

        let plans = composer.compose("ch01", &page, &quotes, &matches);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].quote_id, "q2");
        assert_eq!(plans[0].image, "ch01/img1.png");
        assert_eq!(plans[0].blocks, vec![0, 1]);
        assert_eq!(plans[0].highlights.len(), 1);
        assert_eq!(plans[1].quote_id, "q1");
        assert_eq!(plans[1].image, "ch01/img2.png");
        assert_eq!(plans[1].zoom, 10.0);
    }
}
