//! Candidate window retrieval by TF-IDF similarity.
//!
//! The passage is split into overlapping chunks sized to the query and every
//! chunk is scored by cosine similarity of TF-IDF vectors. Only the single
//! best chunk is kept; the aligner searches that window instead of the whole
//! passage.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::splitter::{Chunk, TextSplitter};

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercased word tokens of two or more characters
pub fn tokenize(text: &str) -> Vec<String> {
    token_re()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Sparse L2-normalized TF-IDF vectors over a fixed document set
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    idf: HashMap<String, f64>,
    vectors: Vec<HashMap<String, f64>>,
}

impl TfidfIndex {
    /// Smoothed idf: `ln((1 + n) / (1 + df)) + 1`
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let n = documents.len() as f64;
        let counts: Vec<HashMap<String, f64>> = documents
            .iter()
            .map(|d| term_counts(d.as_ref()))
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = counts
            .into_iter()
            .map(|tf| weigh(tf, &idf))
            .collect();

        Self { idf, vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine similarity of `query` to every document, scaled to 0..=100.
    /// Terms unknown to the index are ignored.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query = weigh(term_counts(query), &self.idf);
        self.vectors
            .iter()
            .map(|doc| {
                let dot: f64 = query
                    .iter()
                    .filter_map(|(term, w)| doc.get(term).map(|d| d * w))
                    .sum();
                dot * 100.0
            })
            .collect()
    }
}

fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

fn weigh(tf: HashMap<String, f64>, idf: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut vector: HashMap<String, f64> = tf
        .into_iter()
        .filter_map(|(term, count)| idf.get(&term).map(|w| (term, count * w)))
        .collect();
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in vector.values_mut() {
            *w /= norm;
        }
    }
    vector
}

/// The best-scoring chunk for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub chunk: Chunk,
    /// 0..=100
    pub similarity: f64,
}

impl Candidate {
    /// Strictly above the threshold counts as a reasonable candidate
    pub fn is_reasonable(&self, min_similarity: f64) -> bool {
        self.similarity > min_similarity
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateRetriever {
    chunk_factor: f64,
    min_chunk_chars: usize,
}

impl CandidateRetriever {
    pub fn new(chunk_factor: f64, min_chunk_chars: usize) -> Self {
        Self {
            chunk_factor,
            min_chunk_chars,
        }
    }

    /// Best chunk of `text` for `query`; ties go to the earliest chunk.
    /// `None` only when the text has no non-blank chunk.
    pub fn retrieve(&self, text: &[char], query: &str) -> Option<Candidate> {
        let splitter = TextSplitter::for_query(
            query.chars().count(),
            self.chunk_factor,
            self.min_chunk_chars,
        );
        let chunks = splitter.split(text);
        if chunks.is_empty() {
            return None;
        }

        let documents: Vec<String> = chunks.iter().map(|c| c.text(text)).collect();
        let index = TfidfIndex::build(&documents);
        let scores = index.scores(query);

        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        let candidate = Candidate {
            chunk: chunks[best],
            similarity: scores[best],
        };
        debug!(
            chunks = chunks.len(),
            chunk_size = splitter.chunk_size(),
            best_start = candidate.chunk.start,
            best_end = candidate.chunk.end,
            similarity = candidate.similarity,
            "Retrieved candidate window"
        );
        Some(candidate)
    }
}

impl Default for CandidateRetriever {
    fn default() -> Self {
        Self::new(1.5, 200)
    }
}
