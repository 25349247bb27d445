//! Adapter interfaces for external collaborators.
//!
//! The matching core never reads PDFs or writes images itself. A layout
//! provider supplies pages and blocks; a rasterizer turns evidence plans
//! into images.

pub mod layout;
pub mod rasterizer;

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{InputError, Page};
use crate::evidence::EvidencePlan;

// Re-export the shipped implementations
pub use layout::{ChapterLayout, JsonLayoutFile};
pub use rasterizer::{RenderManifest, RENDER_MANIFEST_FILE};

/// Errors raised by adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse layout {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize render manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Supplies the pages and blocks of one chapter
pub trait LayoutProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Pages of the chapter, in reading order
    fn layout(&self) -> Result<ChapterLayout, AdapterError>;
}

/// Turns evidence plans into images
pub trait PageRasterizer {
    /// Human-readable rasterizer name
    fn name(&self) -> &str;

    /// Render one plan against its (composite) page
    fn render(&mut self, page: &Page, plan: &EvidencePlan) -> Result<(), AdapterError>;

    /// Flush anything buffered; called once after the last plan
    fn finish(&mut self) -> Result<(), AdapterError>;
}
