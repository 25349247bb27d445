//! Recursive character splitting into overlapping chunks.
//!
//! Text is cut on the coarsest separator that occurs (paragraph, line, word,
//! then single characters) and the pieces are greedily merged back into
//! chunks of at most `chunk_size` chars, each sharing up to `overlap` chars
//! with its predecessor. Separators stay attached to the start of the piece
//! that follows them, so chunks are exact slices of the input.

use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk of the input as a char range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text(&self, source: &[char]) -> String {
        source[self.start..self.end].iter().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Chunk size scaled to the query: `max(factor * query_len, min_chars)`,
    /// overlapping by half
    pub fn for_query(query_chars: usize, factor: f64, min_chars: usize) -> Self {
        let scaled = (query_chars as f64 * factor) as usize;
        let chunk_size = scaled.max(min_chars);
        Self::new(chunk_size, chunk_size / 2)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into whitespace-trimmed, non-empty chunks in text order
    pub fn split(&self, text: &[char]) -> Vec<Chunk> {
        self.split_range(text, 0, text.len(), &SEPARATORS)
    }

    fn split_range(&self, text: &[char], start: usize, end: usize, separators: &[&str]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        // First separator present in the range; "" always matches
        let mut sep_index = separators.len().saturating_sub(1);
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || contains(&text[start..end], sep) {
                sep_index = i;
                break;
            }
        }
        let separator = separators.get(sep_index).copied().unwrap_or("");
        let remaining = separators.get(sep_index + 1..).unwrap_or(&[]);

        let pieces = split_keeping_separator(text, start, end, separator);

        let mut pending: Vec<Chunk> = Vec::new();
        for piece in pieces {
            if piece.len() < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(text, &pending));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.extend(trim(text, piece));
            } else {
                chunks.extend(self.split_range(text, piece.start, piece.end, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(text, &pending));
        }

        chunks
    }

    /// Greedy merge of contiguous pieces with a sliding overlap
    fn merge(&self, text: &[char], pieces: &[Chunk]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<Chunk> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = piece.len();
            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join(text, &current) {
                    chunks.push(chunk);
                }
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= front.len(),
                        None => break,
                    }
                }
            }
            current.push_back(*piece);
            total += len;
        }
        if let Some(chunk) = join(text, &current) {
            chunks.push(chunk);
        }

        chunks
    }
}

fn contains(haystack: &[char], sep: &str) -> bool {
    let sep: Vec<char> = sep.chars().collect();
    haystack.windows(sep.len()).any(|w| w == sep.as_slice())
}

/// Cut `text[start..end]` before each occurrence of `separator`
fn split_keeping_separator(text: &[char], start: usize, end: usize, separator: &str) -> Vec<Chunk> {
    if separator.is_empty() {
        return (start..end).map(|i| Chunk { start: i, end: i + 1 }).collect();
    }

    let sep: Vec<char> = separator.chars().collect();
    let mut pieces = Vec::new();
    let mut piece_start = start;
    let mut i = start;
    while i + sep.len() <= end {
        if text[i..i + sep.len()] == sep[..] {
            if i > piece_start {
                pieces.push(Chunk {
                    start: piece_start,
                    end: i,
                });
            }
            piece_start = i;
            i += sep.len();
        } else {
            i += 1;
        }
    }
    if end > piece_start {
        pieces.push(Chunk {
            start: piece_start,
            end,
        });
    }
    pieces
}

fn join(text: &[char], pieces: &VecDeque<Chunk>) -> Option<Chunk> {
    let first = pieces.front()?;
    let last = pieces.back()?;
    trim(
        text,
        Chunk {
            start: first.start,
            end: last.end,
        },
    )
}

fn trim(text: &[char], chunk: Chunk) -> Option<Chunk> {
    let mut start = chunk.start;
    let mut end = chunk.end;
    while start < end && text[start].is_whitespace() {
        start += 1;
    }
    while end > start && text[end - 1].is_whitespace() {
        end -= 1;
    }
    (start < end).then_some(Chunk { start, end })
}
