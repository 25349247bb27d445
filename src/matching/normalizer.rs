//! Reversible cleanup of extracted passage text.
//!
//! The pipeline removes PDF wrapping artifacts and splits joined words, in a
//! fixed order:
//!
//! 1. delete `" -\n"` (hyphenated wrap with a stray leading space)
//! 2. delete `"-\n"` (hyphenated wrap)
//! 3. replace remaining `"\n"` with a space
//! 4. split concatenated alphabetic runs into dictionary words
//!
//! Every step records its edits in the coordinates of its own output, which
//! is enough to map any substring of that output back to the step's input.
//!
//! # Precision
//!
//! Inversion is exact for substrings that do not start or end inside an
//! artifact. A deletion sitting exactly on a substring boundary is not
//! restored, so a match that begins right after a removed `"-\n"` maps to raw
//! text without the hyphen. Boundaries that cut through a split word are
//! mapped onto the corresponding part of the original word.

use std::sync::Arc;

use serde::Serialize;

use super::wordsplit::WordSegmenter;

/// Kind of a reversible transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Dehyphenate,
    JoinLines,
    WordSplit,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Dehyphenate => "dehyphenate",
            StepKind::JoinLines => "joinlines",
            StepKind::WordSplit => "wordsplit",
        }
    }
}

/// One recorded edit, positioned in the step's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEdit {
    /// Char offset in the output where `replacement` begins
    pub offset: usize,
    /// Fragment of the input that was removed or rewritten
    pub original: String,
    /// What the output contains instead (empty for deletions)
    pub replacement: String,
}

/// A substring mapped back through one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedText {
    /// Char offset in the step's input
    pub start: usize,
    pub chars: Vec<char>,
}

impl InvertedText {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

/// A forward transform plus what is needed to undo it
#[derive(Debug, Clone)]
pub struct NormalizationStep {
    pub kind: StepKind,
    output: Vec<char>,
    edits: Vec<StepEdit>,
}

impl NormalizationStep {
    /// Delete or replace every occurrence of a literal pattern
    fn replace_literal(kind: StepKind, input: &[char], pattern: &str, replacement: &str) -> Self {
        let pattern: Vec<char> = pattern.chars().collect();
        let replacement_chars: Vec<char> = replacement.chars().collect();
        let mut output = Vec::with_capacity(input.len());
        let mut edits = Vec::new();

        let mut i = 0;
        while i < input.len() {
            if input[i..].starts_with(&pattern) {
                edits.push(StepEdit {
                    offset: output.len(),
                    original: pattern.iter().collect(),
                    replacement: replacement.to_string(),
                });
                output.extend_from_slice(&replacement_chars);
                i += pattern.len();
            } else {
                output.push(input[i]);
                i += 1;
            }
        }

        Self {
            kind,
            output,
            edits,
        }
    }

    /// Split alphabetic runs with the segmenter, joining pieces with spaces
    fn split_words(input: &[char], segmenter: &WordSegmenter) -> Self {
        let mut output = Vec::with_capacity(input.len() + input.len() / 8);
        let mut edits = Vec::new();

        let mut i = 0;
        while i < input.len() {
            if !input[i].is_alphabetic() {
                output.push(input[i]);
                i += 1;
                continue;
            }

            let start = i;
            while i < input.len() && input[i].is_alphabetic() {
                i += 1;
            }
            let word: String = input[start..i].iter().collect();
            let pieces = segmenter.split(&word);

            if pieces.len() > 1 {
                let joined = pieces.join(" ");
                edits.push(StepEdit {
                    offset: output.len(),
                    original: word,
                    replacement: joined.clone(),
                });
                output.extend(joined.chars());
            } else {
                output.extend_from_slice(&input[start..i]);
            }
        }

        Self {
            kind: StepKind::WordSplit,
            output,
            edits,
        }
    }

    /// The step's output
    pub fn output(&self) -> &[char] {
        &self.output
    }

    pub fn output_text(&self) -> String {
        self.output.iter().collect()
    }

    pub fn edits(&self) -> &[StepEdit] {
        &self.edits
    }

    /// Map a substring of this step's output back to its input.
    ///
    /// The substring is located verbatim in the output, at `hint` when the
    /// text matches there, otherwise at its leftmost occurrence. Returns
    /// `None` when it does not occur at all.
    pub fn invert(&self, target: &[char], hint: Option<usize>) -> Option<InvertedText> {
        let start = match hint {
            Some(h) if self.output.get(h..h + target.len()) == Some(target) => h,
            _ => find_chars(&self.output, target)?,
        };
        let end = start + target.len();

        let mut chars = Vec::with_capacity(target.len());
        // input offset minus output offset, accumulated over edits before `start`
        let mut delta: isize = 0;
        let mut input_start: Option<usize> = None;
        let mut cursor = start;

        for edit in &self.edits {
            let p = edit.offset;
            let repl: Vec<char> = edit.replacement.chars().collect();
            let orig: Vec<char> = edit.original.chars().collect();
            let edit_end = p + repl.len();

            if repl.is_empty() {
                if p <= start {
                    delta += orig.len() as isize;
                    continue;
                }
                if p >= end {
                    break;
                }
                chars.extend_from_slice(&self.output[cursor..p]);
                chars.extend_from_slice(&orig);
                cursor = p;
            } else {
                if edit_end <= start {
                    delta += orig.len() as isize - repl.len() as isize;
                    continue;
                }
                if p >= end {
                    break;
                }
                let a = start.max(p) - p;
                let b = end.min(edit_end) - p;
                let (oa, ob) = map_partial(&repl, orig.len(), a, b);
                if p < start {
                    input_start = Some((p as isize + delta) as usize + oa);
                }
                chars.extend_from_slice(&self.output[cursor..start.max(p)]);
                chars.extend_from_slice(&orig[oa..ob]);
                cursor = end.min(edit_end);
            }
        }
        chars.extend_from_slice(&self.output[cursor..end]);

        Some(InvertedText {
            start: input_start.unwrap_or((start as isize + delta) as usize),
            chars,
        })
    }
}

/// Map `a..b` of a replacement onto its original.
///
/// Replacements that are the original with spaces inserted (word splits)
/// map exactly by discounting the inserted spaces; anything else is
/// all-or-nothing.
fn map_partial(repl: &[char], orig_len: usize, a: usize, b: usize) -> (usize, usize) {
    if a == 0 && b == repl.len() {
        return (0, orig_len);
    }
    let spaces_before = |i: usize| repl[..i].iter().filter(|c| **c == ' ').count();
    let oa = (a - spaces_before(a)).min(orig_len);
    let ob = (b - spaces_before(b)).min(orig_len).max(oa);
    (oa, ob)
}

/// Leftmost occurrence of `needle` in `haystack`
pub fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Output of the pipeline: cleaned text plus the step stack
#[derive(Debug, Clone)]
pub struct Normalized {
    raw: Vec<char>,
    steps: Vec<NormalizationStep>,
}

impl Normalized {
    /// The cleaned text as chars
    pub fn chars(&self) -> &[char] {
        self.steps
            .last()
            .map(|s| s.output.as_slice())
            .unwrap_or(self.raw.as_slice())
    }

    pub fn text(&self) -> String {
        self.chars().iter().collect()
    }

    pub fn raw(&self) -> &[char] {
        &self.raw
    }

    pub fn steps(&self) -> &[NormalizationStep] {
        &self.steps
    }

    /// Map a span of the cleaned text back to raw-text coordinates.
    ///
    /// Steps are inverted last-applied first; each step's result seeds the
    /// next one's location hint. The final substring is verified verbatim
    /// against the raw text. `Err` carries the step that could not be
    /// inverted (`None` when the raw-text lookup itself failed).
    pub fn invert_span(&self, start: usize, end: usize) -> Result<InvertedText, Option<StepKind>> {
        let clean = self.chars();
        let end = end.min(clean.len());
        let start = start.min(end);

        let mut current = InvertedText {
            start,
            chars: clean[start..end].to_vec(),
        };

        for step in self.steps.iter().rev() {
            current = step
                .invert(&current.chars, Some(current.start))
                .ok_or(Some(step.kind))?;
        }

        let at_hint = self
            .raw
            .get(current.start..current.start + current.chars.len())
            .map(|s| s == current.chars.as_slice())
            .unwrap_or(false);
        if !at_hint {
            current.start = find_chars(&self.raw, &current.chars).ok_or(None)?;
        }
        Ok(current)
    }
}

/// Runs the fixed normalization pipeline
#[derive(Debug, Clone)]
pub struct Normalizer {
    segmenter: Arc<WordSegmenter>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(WordSegmenter::english())
    }
}

impl Normalizer {
    pub fn new(segmenter: Arc<WordSegmenter>) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &WordSegmenter {
        &self.segmenter
    }

    /// Apply all steps in order
    pub fn normalize(&self, text: &str) -> Normalized {
        let raw: Vec<char> = text.chars().collect();

        let s1 = NormalizationStep::replace_literal(StepKind::Dehyphenate, &raw, " -\n", "");
        let s2 = NormalizationStep::replace_literal(StepKind::Dehyphenate, &s1.output, "-\n", "");
        let s3 = NormalizationStep::replace_literal(StepKind::JoinLines, &s2.output, "\n", " ");
        let s4 = NormalizationStep::split_words(&s3.output, &self.segmenter);

        Normalized {
            raw,
            steps: vec![s1, s2, s3, s4],
        }
    }

    /// Normalize a query; its steps are discarded
    pub fn clean(&self, text: &str) -> String {
        self.normalize(text).text().trim().to_string()
    }
}
