//! Block Locator Integration Tests
//!
//! Mapping spans onto layout blocks and grouping block geometry.

use quizcite::domain::{Block, MatchSpan, Passage, Rect};
use quizcite::evidence::{group_intersecting, locate};
use quizcite::matching::{MatchSettings, Normalizer, OffsetResolver};

fn two_blocks() -> Vec<Block> {
    vec![
        // 20 chars
        Block::text(0, Rect::new(50.0, 50.0, 500.0, 70.0), "The cell membrane is"),
        // 24 chars
        Block::text(1, Rect::new(50.0, 75.0, 500.0, 95.0), "selectively permeable to"),
    ]
}

fn indices(blocks: &[Block]) -> Vec<usize> {
    blocks.iter().map(|b| b.index).collect()
}

#[test]
fn test_ranges_of_two_adjacent_blocks() {
    let passage = Passage::from_blocks(&two_blocks()).unwrap();
    let ranges: Vec<(usize, usize)> = passage.ranges().iter().map(|r| (r.start, r.end)).collect();
    assert_eq!(ranges, vec![(0, 20), (20, 45)]);
}

#[test]
fn test_span_across_boundary_returns_both_blocks() {
    let blocks = two_blocks();
    let passage = Passage::from_blocks(&blocks).unwrap();

    let found = locate(&blocks, passage.ranges(), &MatchSpan::new(15, 30));
    assert_eq!(indices(&found), vec![0, 1]);
}

#[test]
fn test_span_inside_one_block_returns_only_it() {
    let blocks = two_blocks();
    let passage = Passage::from_blocks(&blocks).unwrap();

    assert_eq!(indices(&locate(&blocks, passage.ranges(), &MatchSpan::new(25, 40))), vec![1]);
    assert_eq!(indices(&locate(&blocks, passage.ranges(), &MatchSpan::new(4, 17))), vec![0]);
}

#[test]
fn test_resolved_quote_maps_to_blocks() {
    let blocks = two_blocks();
    let passage = Passage::from_blocks(&blocks).unwrap();
    let resolver = OffsetResolver::new(passage.text(), &MatchSettings::default(), &Normalizer::default());

    let span = resolver.resolve("membrane is selectively").unwrap();
    assert_eq!((span.start, span.end), (9, 32));
    assert_eq!(indices(&locate(&blocks, passage.ranges(), &span)), vec![0, 1]);
}

#[test]
fn test_transitive_grouping_regardless_of_order() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(8.0, 8.0, 20.0, 20.0);
    let c = Rect::new(18.0, 18.0, 30.0, 30.0);
    assert!(!a.intersects(&c));

    // B last, so A and C are compared before either meets B
    let groups = group_intersecting(&[a, c, b]);
    assert_eq!(groups, vec![vec![0, 1, 2]]);
}

#[test]
fn test_disjoint_rectangles_stay_apart() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let touching = Rect::new(10.0, 0.0, 20.0, 10.0);
    let far = Rect::new(100.0, 100.0, 110.0, 110.0);

    let groups = group_intersecting(&[a, far, touching]);
    assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);
}
