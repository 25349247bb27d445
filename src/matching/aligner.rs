//! Bounded approximate substring search.
//!
//! Finds where a query occurs in a window allowing insertions, deletions and
//! substitutions (case-insensitive). The edit budget escalates from zero to a
//! cap derived from the query length, and the first budget that admits a
//! match wins. A single Sellers pass computes the cheapest match ending at
//! every window position, so the lowest satisfying budget is read off
//! directly instead of rescanning once per budget.

use tracing::debug;

use crate::domain::MatchSpan;

#[derive(Debug, Clone, Copy)]
pub struct FuzzyAligner {
    max_edits: usize,
    edit_fraction: f64,
}

impl FuzzyAligner {
    pub fn new(max_edits: usize, edit_fraction: f64) -> Self {
        Self {
            max_edits,
            edit_fraction,
        }
    }

    /// Largest budget tried for a query: `floor(min(max_edits, fraction * len))`
    pub fn budget(&self, query_chars: usize) -> usize {
        let fractional = (query_chars as f64 * self.edit_fraction).floor();
        if fractional.is_finite() && fractional >= 0.0 {
            self.max_edits.min(fractional as usize)
        } else {
            0
        }
    }

    /// Locate `query` in `window`.
    ///
    /// The returned span is in window coordinates and carries the edit count.
    /// Among matches at the lowest budget the leftmost start wins, then the
    /// length closest to the query's, then the earlier end.
    pub fn align(&self, window: &[char], query: &[char]) -> Option<MatchSpan> {
        let m = query.len();
        if m == 0 || window.is_empty() {
            return None;
        }
        let budget = self.budget(m);
        let text: Vec<char> = window.iter().map(|c| fold(*c)).collect();
        let query: Vec<char> = query.iter().map(|c| fold(*c)).collect();

        // Column j holds, for each query prefix i, the cheapest cost of
        // matching it against a substring ending at window position j, and
        // where that substring starts.
        let mut prev_cost: Vec<usize> = (0..=m).collect();
        let mut prev_start: Vec<usize> = vec![0; m + 1];
        let mut cur_cost = vec![0usize; m + 1];
        let mut cur_start = vec![0usize; m + 1];

        let mut ends: Vec<(usize, usize, usize)> = Vec::new();
        let mut best_cost = usize::MAX;

        for j in 1..=text.len() {
            cur_cost[0] = 0;
            cur_start[0] = j;
            for i in 1..=m {
                let substitution = prev_cost[i - 1] + usize::from(query[i - 1] != text[j - 1]);
                let deletion = cur_cost[i - 1] + 1;
                let insertion = prev_cost[i] + 1;

                if substitution <= deletion && substitution <= insertion {
                    cur_cost[i] = substitution;
                    cur_start[i] = prev_start[i - 1];
                } else if deletion <= insertion {
                    cur_cost[i] = deletion;
                    cur_start[i] = cur_start[i - 1];
                } else {
                    cur_cost[i] = insertion;
                    cur_start[i] = prev_start[i];
                }
            }

            let cost = cur_cost[m];
            if cost <= budget {
                if cost < best_cost {
                    best_cost = cost;
                    ends.clear();
                }
                if cost == best_cost {
                    ends.push((cur_start[m], j, cost));
                }
            }

            std::mem::swap(&mut prev_cost, &mut cur_cost);
            std::mem::swap(&mut prev_start, &mut cur_start);
        }

        let chosen = ends
            .into_iter()
            .filter(|(start, end, _)| end > start)
            .min_by_key(|(start, end, _)| (*start, (end - start).abs_diff(m), *end));

        match chosen {
            Some((start, end, edits)) => {
                debug!(budget, edits, start, end, "Aligned query");
                Some(MatchSpan::with_edits(start, end, edits))
            }
            None => {
                debug!(budget, window_chars = window.len(), "No alignment within budget");
                None
            }
        }
    }
}

impl Default for FuzzyAligner {
    fn default() -> Self {
        Self::new(10, 0.1)
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
