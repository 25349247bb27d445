//! Mapping passage spans to layout blocks, and blocks to visual groups.

use crate::domain::{Block, BlockRange, MatchSpan, Rect};

/// Blocks whose passage range overlaps `span`, in block order.
///
/// A block is recruited when its range starts inside the span, ends inside
/// it, or contains it, so a match straddling a block boundary pulls in every
/// partially covered block. Ranges pointing outside `blocks` are ignored.
pub fn locate(blocks: &[Block], ranges: &[BlockRange], span: &MatchSpan) -> Vec<Block> {
    if span.is_empty() {
        return Vec::new();
    }
    ranges
        .iter()
        .filter(|r| r.overlaps(span))
        .filter_map(|r| blocks.get(r.block).cloned())
        .collect()
}

/// Partition rectangles into groups connected by intersection.
///
/// Connectivity is transitive: A and C share a group when A meets B and B
/// meets C, even if A and C are disjoint. Groups are returned ordered by
/// their first member; members keep input order.
pub fn group_intersecting(rects: &[Rect]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..rects.len()).collect();

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..rects.len() {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = i;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Passage;

    fn block(i: usize, text: &str) -> Block {
        Block::text(i, Rect::new(0.0, i as f64 * 20.0, 100.0, i as f64 * 20.0 + 10.0), text)
    }

    #[test]
    fn test_span_inside_one_block() {
        let blocks = vec![block(0, "aaaa"), block(1, "bbbb"), block(2, "cccc")];
        let passage = Passage::from_blocks(&blocks).unwrap();

        let found = locate(&blocks, passage.ranges(), &MatchSpan::new(6, 8));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "bbbb");
    }

    #[test]
    fn test_span_across_boundary() {
        let blocks = vec![block(0, "aaaa"), block(1, "bbbb"), block(2, "cccc")];
        let passage = Passage::from_blocks(&blocks).unwrap();

        let found = locate(&blocks, passage.ranges(), &MatchSpan::new(2, 7));
        let texts: Vec<&str> = found.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa", "bbbb"]);
    }

    #[test]
    fn test_empty_span_locates_nothing() {
        let blocks = vec![block(0, "aaaa")];
        let passage = Passage::from_blocks(&blocks).unwrap();
        assert!(locate(&blocks, passage.ranges(), &MatchSpan::new(2, 2)).is_empty());
    }

    #[test]
    fn test_transitive_grouping() {
        // a meets b, b meets c, a and c disjoint; d far away
        let rects = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(50.0, 50.0, 60.0, 60.0),
            Rect::new(20.0, 0.0, 30.0, 10.0),
            Rect::new(8.0, 0.0, 22.0, 10.0),
        ];
        assert!(!rects[0].intersects(&rects[2]));

        let groups = group_intersecting(&rects);
        assert_eq!(groups, vec![vec![0, 2, 3], vec![1]]);
    }

    #[test]
    fn test_touching_edges_stay_apart() {
        let rects = vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.0, 0.0, 20.0, 10.0)];
        assert_eq!(group_intersecting(&rects), vec![vec![0], vec![1]]);
    }
}
