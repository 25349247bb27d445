//! JSON layout files.
//!
//! A layout file holds the text blocks of one chapter as extracted from the
//! source document:
//!
//! ```json
//! {"chapter": "ch01",
//!  "pages": [{"number": 3, "width": 612, "height": 792,
//!             "blocks": [{"bbox": [72, 90, 540, 130], "text": "...", "kind": "text"}]}]}
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AdapterError, LayoutProvider};
use crate::domain::{InputError, Page};

/// Pages of one chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterLayout {
    pub chapter: String,
    pub pages: Vec<Page>,
}

impl ChapterLayout {
    /// All pages stacked into one, with block indices in composite order
    pub fn composite(&self) -> Result<Page, InputError> {
        Page::composite(&self.pages)
    }
}

/// Layout read from a JSON file
#[derive(Debug, Clone)]
pub struct JsonLayoutFile {
    path: PathBuf,
}

impl JsonLayoutFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chapter name used when the file does not carry one
    fn fallback_chapter(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "chapter".to_string())
    }
}

#[derive(Deserialize)]
struct LayoutFileSchema {
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    pages: Vec<Page>,
}

impl LayoutProvider for JsonLayoutFile {
    fn name(&self) -> &str {
        "json"
    }

    fn layout(&self) -> Result<ChapterLayout, AdapterError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| AdapterError::Read {
            path: self.path.clone(),
            source,
        })?;
        let raw: LayoutFileSchema =
            serde_json::from_str(&content).map_err(|source| AdapterError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if raw.pages.is_empty() {
            return Err(InputError::NoPages.into());
        }
        for page in &raw.pages {
            page.validate()?;
        }

        let chapter = raw
            .chapter
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.fallback_chapter());
        debug!(
            chapter = %chapter,
            pages = raw.pages.len(),
            path = %self.path.display(),
            "Loaded layout"
        );

        Ok(ChapterLayout {
            chapter,
            pages: raw.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BlockKind;
    use tempfile::TempDir;

    const LAYOUT: &str = r#"{
        "chapter": "ch01",
        "pages": [
            {"number": 3, "width": 600, "height": 800, "blocks": [
                {"bbox": [10, 10, 300, 40], "text": "First block"},
                {"bbox": [10, 50, 300, 200], "kind": "image"}
            ]},
            {"number": 4, "width": 600, "height": 800, "blocks": [
                {"bbox": [10, 10, 300, 40], "text": "Second page"}
            ]}
        ]
    }"#;

    #[test]
    fn test_load_layout_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ch01.json");
        std::fs::write(&path, LAYOUT).unwrap();

        let layout = JsonLayoutFile::new(&path).layout().unwrap();
        assert_eq!(layout.chapter, "ch01");
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].blocks[1].kind, BlockKind::Image);

        let page = layout.composite().unwrap();
        assert_eq!(page.height, 1600.0);
        assert_eq!(page.blocks.len(), 3);
        assert_eq!(page.blocks[2].index, 2);
        assert_eq!(page.blocks[2].bbox.y0, 810.0);
    }

    #[test]
    fn test_chapter_defaults_to_file_stem() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chapter07.json");
        std::fs::write(
            &path,
            r#"{"pages": [{"width": 100, "height": 100, "blocks": []}]}"#,
        )
        .unwrap();

        let layout = JsonLayoutFile::new(&path).layout().unwrap();
        assert_eq!(layout.chapter, "chapter07");
    }

    #[test]
    fn test_malformed_block_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"pages": [{"width": 100, "height": 100,
                "blocks": [{"bbox": [50, 10, 10, 40], "text": "inverted"}]}]}"#,
        )
        .unwrap();

        let err = JsonLayoutFile::new(&path).layout().unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Input(InputError::MalformedBlock { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_pages_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.json");
        std::fs::write(&path, r#"{"chapter": "x", "pages": []}"#).unwrap();

        let err = JsonLayoutFile::new(&path).layout().unwrap_err();
        assert!(matches!(err, AdapterError::Input(InputError::NoPages)));
    }
}
