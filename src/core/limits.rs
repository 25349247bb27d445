//! Resource limits for quote resolution.
//!
//! Bounds the cost of one chapter through configurable limits on:
//! - Passage size
//! - Number and length of quotes
//! - Fallback attempts (window fallbacks and full-passage scans)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Passage, QuoteSet};

/// Limits applied before and during resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveLimits {
    /// Maximum passage length in chars (default: 2M)
    #[serde(default = "default_max_passage_chars")]
    pub max_passage_chars: usize,

    /// Maximum number of quotes per chapter (default: 10k)
    #[serde(default = "default_max_quotes")]
    pub max_quotes: usize,

    /// Maximum length of one quote in chars (default: 5000)
    #[serde(default = "default_max_quote_chars")]
    pub max_quote_chars: usize,

    /// Fallback attempts allowed per chapter (default: 100)
    #[serde(default = "default_max_fallbacks")]
    pub max_fallbacks: u32,
}

fn default_max_passage_chars() -> usize {
    2_000_000
}
fn default_max_quotes() -> usize {
    10_000
}
fn default_max_quote_chars() -> usize {
    5_000
}
fn default_max_fallbacks() -> u32 {
    100
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_passage_chars: default_max_passage_chars(),
            max_quotes: default_max_quotes(),
            max_quote_chars: default_max_quote_chars(),
            max_fallbacks: default_max_fallbacks(),
        }
    }
}

impl ResolveLimits {
    /// Validate passage size
    pub fn validate_passage(&self, passage: &Passage) -> Result<(), LimitViolation> {
        if passage.char_len() > self.max_passage_chars {
            return Err(LimitViolation::PassageTooLarge {
                actual: passage.char_len(),
                limit: self.max_passage_chars,
            });
        }
        Ok(())
    }

    /// Validate quote count and per-quote length
    pub fn validate_quotes(&self, quotes: &QuoteSet) -> Result<(), LimitViolation> {
        let count = quotes.quote_count();
        if count > self.max_quotes {
            return Err(LimitViolation::TooManyQuotes {
                actual: count,
                limit: self.max_quotes,
            });
        }

        for quote in quotes.quotes() {
            let chars = quote.text.chars().count();
            if chars > self.max_quote_chars {
                return Err(LimitViolation::QuoteTooLong {
                    id: quote.id.clone(),
                    actual: chars,
                    limit: self.max_quote_chars,
                });
            }
        }

        Ok(())
    }

    pub fn tracker(&self) -> FallbackTracker {
        FallbackTracker::new(self.max_fallbacks)
    }
}

/// Kind of last-resort search being charged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Alignment failed and the padded window is accepted unscored
    Window,
    /// No reasonable candidate; the whole passage is searched
    FullScan,
}

/// Counts fallback attempts within one chapter
#[derive(Debug, Clone)]
pub struct FallbackTracker {
    limit: u32,
    window_fallbacks: u32,
    full_scans: u32,
    refused: u32,
}

impl FallbackTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            window_fallbacks: 0,
            full_scans: 0,
            refused: 0,
        }
    }

    /// No budget limit
    pub fn unlimited() -> Self {
        Self::new(u32::MAX)
    }

    /// Charge one fallback; `false` (and nothing charged) once the budget is spent
    pub fn try_consume(&mut self, kind: FallbackKind) -> bool {
        if self.used() >= self.limit {
            self.refused += 1;
            return false;
        }
        match kind {
            FallbackKind::Window => self.window_fallbacks += 1,
            FallbackKind::FullScan => self.full_scans += 1,
        }
        true
    }

    pub fn used(&self) -> u32 {
        self.window_fallbacks + self.full_scans
    }

    pub fn window_fallbacks(&self) -> u32 {
        self.window_fallbacks
    }

    pub fn full_scans(&self) -> u32 {
        self.full_scans
    }

    /// Fallbacks denied because the budget was spent
    pub fn refused(&self) -> u32 {
        self.refused
    }
}

/// Limit violations (fatal for the chapter)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Passage too large: {actual} chars > {limit}")]
    PassageTooLarge { actual: usize, limit: usize },

    #[error("Too many quotes: {actual} > {limit}")]
    TooManyQuotes { actual: usize, limit: usize },

    #[error("Quote for {id} too long: {actual} chars > {limit}")]
    QuoteTooLong {
        id: String,
        actual: usize,
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ResolveLimits::default();
        assert_eq!(limits.max_passage_chars, 2_000_000);
        assert_eq!(limits.max_quotes, 10_000);
        assert_eq!(limits.max_fallbacks, 100);
    }

    #[test]
    fn test_passage_validation() {
        let limits = ResolveLimits {
            max_passage_chars: 10,
            ..Default::default()
        };

        let short = Passage::from_text("short").unwrap();
        assert!(limits.validate_passage(&short).is_ok());

        let long = Passage::from_text("x".repeat(20)).unwrap();
        let result = limits.validate_passage(&long);
        assert!(matches!(result, Err(LimitViolation::PassageTooLarge { actual: 20, .. })));
    }

    #[test]
    fn test_quote_validation() {
        let limits = ResolveLimits {
            max_quotes: 2,
            max_quote_chars: 5,
            ..Default::default()
        };

        let mut quotes = QuoteSet::new();
        quotes.push("q1", vec!["abc".to_string()]);
        assert!(limits.validate_quotes(&quotes).is_ok());

        quotes.push("q2", vec!["too long".to_string()]);
        assert!(matches!(
            limits.validate_quotes(&quotes),
            Err(LimitViolation::QuoteTooLong { .. })
        ));

        let mut many = QuoteSet::new();
        many.push("q", vec!["a", "b", "c"]);
        assert!(matches!(
            limits.validate_quotes(&many),
            Err(LimitViolation::TooManyQuotes { actual: 3, limit: 2 })
        ));
    }

    #[test]
    fn test_tracker_budget() {
        let mut tracker = FallbackTracker::new(2);
        assert!(tracker.try_consume(FallbackKind::Window));
        assert!(tracker.try_consume(FallbackKind::FullScan));
        assert!(!tracker.try_consume(FallbackKind::Window));

        assert_eq!(tracker.used(), 2);
        assert_eq!(tracker.window_fallbacks(), 1);
        assert_eq!(tracker.full_scans(), 1);
        assert_eq!(tracker.refused(), 1);
    }
}
