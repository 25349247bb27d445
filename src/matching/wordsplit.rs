//! Word-boundary inference for concatenated words.
//!
//! PDF extraction often drops the space between words ("spaceflightlaunch").
//! The segmenter finds the cheapest way to cut such a run into dictionary
//! words, scoring each word by its rank in a frequency-ordered list
//! (Zipf's law: cost = ln((rank + 1) * ln(N))). A cut is kept only when it
//! is cheaper than reading the whole run as one unseen word.
//!
//! The built-in list ranks about 37k words by their relative frequency
//! across eight English documentation corpora. Short words are kept only
//! when most corpora share them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};

/// Frequency-ordered English word list, most common first
const ENGLISH_WORDS: &str = include_str!("wordlist.txt");

/// Runs shorter than this are never split
pub const MIN_SPLIT_CHARS: usize = 5;

/// Per-character cost of a word missing from the list
const UNSEEN_CHAR_COST: f64 = 2.0 * std::f64::consts::LN_2;

static ENGLISH: OnceLock<Arc<WordSegmenter>> = OnceLock::new();

/// Dictionary-driven splitter for alphabetic runs
#[derive(Debug, Clone)]
pub struct WordSegmenter {
    costs: HashMap<String, f64>,
    max_word_len: usize,
    log_n: f64,
}

impl WordSegmenter {
    /// Build from words ordered most frequent first.
    ///
    /// Duplicates keep their first (cheapest) rank; blank lines are ignored.
    pub fn from_ranked_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let log_n = (words.len().max(2) as f64).ln();
        let mut costs = HashMap::with_capacity(words.len());
        let mut max_word_len = 0;

        for (rank, word) in words.into_iter().enumerate() {
            max_word_len = max_word_len.max(word.chars().count());
            costs
                .entry(word)
                .or_insert_with(|| ((rank + 1) as f64 * log_n).ln());
        }

        Self {
            costs,
            max_word_len,
            log_n,
        }
    }

    /// Load a word list file (one word per line, most frequent first)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list: {}", path.display()))?;
        let segmenter = Self::from_ranked_words(content.lines());
        if segmenter.is_empty() {
            anyhow::bail!("Word list is empty: {}", path.display());
        }
        Ok(segmenter)
    }

    /// The built-in English model (shared)
    pub fn english() -> Arc<WordSegmenter> {
        ENGLISH
            .get_or_init(|| Arc::new(Self::from_ranked_words(ENGLISH_WORDS.lines())))
            .clone()
    }

    /// Cost of reading `chars` characters as a single word not in the list
    fn unseen_cost(&self, chars: usize) -> f64 {
        self.log_n + chars as f64 * UNSEEN_CHAR_COST
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.costs.contains_key(&word.to_lowercase())
    }

    /// Split an alphabetic run into words.
    ///
    /// Returns the run unchanged (as a single element) unless it is long
    /// enough, is not itself a known word, and can be cut entirely into
    /// known words more cheaply than `unseen_cost` of the whole run.
    /// Original casing is preserved in the pieces.
    pub fn split(&self, word: &str) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        let lower: Vec<char> = chars
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect();

        if n < MIN_SPLIT_CHARS || self.costs.contains_key(&lower.iter().collect::<String>()) {
            return vec![word.to_string()];
        }

        // cost[i]: cheapest segmentation of lower[..i]; back[i]: length of its last word
        let mut cost = vec![f64::INFINITY; n + 1];
        let mut back = vec![0usize; n + 1];
        cost[0] = 0.0;

        for i in 1..=n {
            for k in 1..=i.min(self.max_word_len) {
                if !cost[i - k].is_finite() {
                    continue;
                }
                let piece: String = lower[i - k..i].iter().collect();
                if let Some(c) = self.costs.get(&piece) {
                    let candidate = cost[i - k] + c;
                    if candidate < cost[i] {
                        cost[i] = candidate;
                        back[i] = k;
                    }
                }
            }
        }

        if !cost[n].is_finite() || cost[n] >= self.unseen_cost(n) {
            return vec![word.to_string()];
        }

        let mut pieces = Vec::new();
        let mut i = n;
        while i > 0 {
            let k = back[i];
            pieces.push(chars[i - k..i].iter().collect::<String>());
            i -= k;
        }
        pieces.reverse();

        if pieces.len() < 2 {
            return vec![word.to_string()];
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_is_frequency_ranked() {
        let seg = WordSegmenter::english();
        assert!(seg.len() > 30_000);

        let the = seg.costs["the"];
        assert!(the < seg.costs["signals"]);
        assert!(seg.costs["signals"] < seg.costs["discoveries"]);
    }

    #[test]
    fn test_splits_joined_words() {
        let seg = WordSegmenter::english();
        assert_eq!(seg.split("spaceflightlaunch"), vec!["space", "flight", "launch"]);
        assert_eq!(seg.split("electronicsignals"), vec!["electronic", "signals"]);
        assert_eq!(seg.split("historicalrecords"), vec!["historical", "records"]);
        assert_eq!(
            seg.split("importantdiscoveries"),
            vec!["important", "discoveries"]
        );
    }

    #[test]
    fn test_preserves_case() {
        let seg = WordSegmenter::english();
        assert_eq!(seg.split("TheRepublic"), vec!["The", "Republic"]);
    }

    #[test]
    fn test_known_and_short_words_untouched() {
        let seg = WordSegmenter::english();
        assert_eq!(seg.split("information"), vec!["information"]);
        assert_eq!(seg.split("isa"), vec!["isa"]);
    }

    #[test]
    fn test_unknown_words_untouched() {
        let seg = WordSegmenter::english();
        assert_eq!(seg.split("mitochondria"), vec!["mitochondria"]);
        assert_eq!(seg.split("xqzvwkjh"), vec!["xqzvwkjh"]);
    }

    #[test]
    fn test_fragmented_cut_rejected() {
        // "miss i ss ip pi" covers the run but costs more than one unseen word
        let seg = WordSegmenter::english();
        assert_eq!(seg.split("Mississippi"), vec!["Mississippi"]);
    }

    #[test]
    fn test_custom_list_prefers_frequent_words() {
        let seg = WordSegmenter::from_ranked_words(["in", "to", "into", "now", "here", "nowhere"]);
        assert_eq!(seg.split("intonowhere"), vec!["into", "nowhere"]);
    }
}
