//! Render manifest for an external rasterizer.
//!
//! Rasterizing PDF pages is left to a dedicated renderer. This adapter
//! collects the evidence plans of a chapter and writes them, together with
//! the page geometry, to `renders.json` where that renderer picks them up.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::{AdapterError, PageRasterizer};
use crate::domain::Page;
use crate::evidence::EvidencePlan;

pub const RENDER_MANIFEST_FILE: &str = "renders.json";

#[derive(Debug, Clone, Serialize)]
struct ManifestEntry {
    page_width: f64,
    page_height: f64,
    #[serde(flatten)]
    plan: EvidencePlan,
}

/// Collects plans and writes them as one JSON document
#[derive(Debug)]
pub struct RenderManifest {
    path: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl RenderManifest {
    /// Manifest written to `dir/renders.json`
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(RENDER_MANIFEST_FILE),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PageRasterizer for RenderManifest {
    fn name(&self) -> &str {
        "manifest"
    }

    fn render(&mut self, page: &Page, plan: &EvidencePlan) -> Result<(), AdapterError> {
        self.entries.push(ManifestEntry {
            page_width: page.width,
            page_height: page.height,
            plan: plan.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AdapterError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AdapterError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).map_err(|source| AdapterError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            images = self.entries.len(),
            "Wrote render manifest"
        );
        Ok(())
    }
}
