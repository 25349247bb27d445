//! Quotes to be located, grouped by question identifier.
//!
//! Two input shapes are accepted: a plain `id -> [quote, ...]` map, or the
//! quiz document produced by the question generator, whose items each carry
//! a `quotes` list.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

/// One search string owned by an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: String,
    pub text: String,
}

/// Ordered identifier -> quotes map (insertion order is kept)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteSet {
    entries: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Deserialize)]
struct QuizDocument {
    questions: Questions,
}

#[derive(Debug, Deserialize)]
struct Questions {
    #[serde(default)]
    ident: Option<String>,
    items: Vec<QuizItem>,
}

#[derive(Debug, Deserialize)]
struct QuizItem {
    #[serde(rename = "type")]
    item_type: String,
    title: String,
    #[serde(default)]
    quotes: Vec<String>,
}

impl QuoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add quotes for an identifier, appending if it already exists.
    /// Blank quotes are dropped.
    pub fn push<I, S>(&mut self, id: impl Into<String>, quotes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let quotes: Vec<String> = quotes
            .into_iter()
            .map(Into::into)
            .filter(|q: &String| {
                if q.trim().is_empty() {
                    warn!(quote_id = %id, "Skipping empty quote");
                    false
                } else {
                    true
                }
            })
            .collect();

        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, list)) => list.extend(quotes),
            None => self.entries.push((id, quotes)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(id, quotes)| (id.as_str(), quotes.as_slice()))
    }

    /// All quotes flattened, in order
    pub fn quotes(&self) -> impl Iterator<Item = Quote> + '_ {
        self.entries.iter().flat_map(|(id, quotes)| {
            quotes.iter().map(move |text| Quote {
                id: id.clone(),
                text: text.clone(),
            })
        })
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of quotes across identifiers
    pub fn quote_count(&self) -> usize {
        self.entries.iter().map(|(_, q)| q.len()).sum()
    }

    /// Load from a YAML or JSON file
    pub fn from_file(path: &Path, chapter: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read quotes file: {}", path.display()))?;
        Self::from_yaml(&content, chapter)
            .with_context(|| format!("Failed to parse quotes file: {}", path.display()))
    }

    /// Parse either a quiz document or a plain identifier map.
    ///
    /// `chapter` seeds the identifiers generated for quiz items.
    pub fn from_yaml(content: &str, chapter: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).context("Invalid YAML/JSON")?;

        if value.get("questions").is_some() {
            let quiz: QuizDocument =
                serde_yaml::from_value(value).context("Invalid quiz document")?;
            return Ok(Self::from_quiz(quiz, chapter));
        }

        let mapping = value
            .as_mapping()
            .context("Expected a mapping of identifier -> quotes")?;

        let mut set = QuoteSet::new();
        for (key, quotes) in mapping {
            let id = match key {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => anyhow::bail!("Unsupported quote identifier: {:?}", other),
            };
            let quotes: Vec<String> = match quotes {
                serde_yaml::Value::String(s) => vec![s.clone()],
                other => serde_yaml::from_value(other.clone())
                    .with_context(|| format!("Quotes for '{}' must be a list of strings", id))?,
            };
            set.push(id, quotes);
        }
        Ok(set)
    }

    fn from_quiz(quiz: QuizDocument, chapter: &str) -> Self {
        let mut set = QuoteSet::new();
        let prefix = quiz.questions.ident.clone().unwrap_or_default();
        for (position, item) in quiz.questions.items.iter().enumerate() {
            if item.quotes.is_empty() {
                continue;
            }
            let id = item_ident(chapter, &prefix, position, &item.title);
            tracing::debug!(%id, item_type = %item.item_type, title = %item.title, "Quiz item");
            set.push(id, item.quotes.clone());
        }
        set
    }
}

/// Deterministic `item{8 hex}` identifier for a quiz item
fn item_ident(chapter: &str, quiz_ident: &str, position: usize, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chapter.as_bytes());
    hasher.update(quiz_ident.as_bytes());
    hasher.update(position.to_string().as_bytes());
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    format!("item{}", hex::encode(&digest[..4]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes_of<'a>(set: &'a QuoteSet, id: &str) -> &'a [String] {
        set.iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, quotes)| quotes)
            .unwrap()
    }

    #[test]
    fn test_plain_map_keeps_order() {
        let yaml = r#"
q2:
  - second question quote
q1:
  - first quote
  - another quote
"#;
        let set = QuoteSet::from_yaml(yaml, "ch1").unwrap();
        let ids: Vec<&str> = set.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["q2", "q1"]);
        assert_eq!(set.quote_count(), 3);
        assert_eq!(quotes_of(&set, "q1")[1], "another quote");
    }

    #[test]
    fn test_quiz_document() {
        let yaml = r#"
questions:
  title: Cells
  items:
    - type: true_false
      title: Powerhouse
      prompt: The mitochondria is the powerhouse of the cell.
      points: 1
      answer: true
      explanation: It is.
      quotes:
        - mitochondria is the powerhouse
    - type: short_answer
      title: No quotes
      prompt: Name it
      points: 1
      answers: [cell]
      explanation: none
      quotes: []
"#;
        let set = QuoteSet::from_yaml(yaml, "ch1").unwrap();
        assert_eq!(set.len(), 1);
        let (id, quotes) = set.iter().next().unwrap();
        assert!(id.starts_with("item"));
        assert_eq!(id.len(), 12);
        assert_eq!(quotes, &["mitochondria is the powerhouse".to_string()]);

        // Deterministic across parses
        let again = QuoteSet::from_yaml(yaml, "ch1").unwrap();
        assert_eq!(set, again);
    }

    #[test]
    fn test_blank_quotes_dropped() {
        let mut set = QuoteSet::new();
        set.push("q", vec!["  ", "real"]);
        assert_eq!(quotes_of(&set, "q"), &["real".to_string()]);
    }

    #[test]
    fn test_json_input() {
        let set = QuoteSet::from_yaml(r#"{"a": ["x y z"], "b": "single"}"#, "ch").unwrap();
        assert_eq!(set.quote_count(), 2);
        assert_eq!(quotes_of(&set, "b"), &["single".to_string()]);
    }
}
