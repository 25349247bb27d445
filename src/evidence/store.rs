//! Append-only JSONL storage for evidence and events.
//!
//! Writers take an exclusive `fs2` lock for the duration of an append so
//! concurrent chapter workers never interleave lines.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;

use super::records::{Evidence, EvidenceEvent};

pub const EVIDENCE_FILE: &str = "evidence.jsonl";
pub const EVENTS_FILE: &str = "events.jsonl";

/// Evidence and event logs under one output directory
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn evidence_path(&self) -> PathBuf {
        self.dir.join(EVIDENCE_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Append evidence lines under one lock
    pub fn append(&self, evidence: &[Evidence]) -> Result<()> {
        if evidence.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;

        let mut lines = String::new();
        for e in evidence {
            let json = serde_json::to_string(e).context("Failed to serialize evidence")?;
            lines.push_str(&json);
            lines.push('\n');
        }
        append_locked(&self.evidence_path(), &lines)
    }

    /// Append an event with a timestamp
    pub fn append_event(&self, event: &EvidenceEvent) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;

        #[derive(Serialize)]
        struct EventWrapper<'a> {
            ts: String,
            #[serde(flatten)]
            event: &'a EvidenceEvent,
        }

        let wrapper = EventWrapper {
            ts: Utc::now().to_rfc3339(),
            event,
        };
        let json = serde_json::to_string(&wrapper).context("Failed to serialize event")?;
        append_locked(&self.events_path(), &format!("{}\n", json))
    }

    /// All evidence lines, in file order
    pub fn load(&self) -> Result<Vec<Evidence>> {
        load_evidence(&self.evidence_path())
    }

    /// First evidence whose id matches `evidence_id` by prefix
    pub fn find(&self, evidence_id: &str) -> Result<Option<Evidence>> {
        Ok(self.load()?.into_iter().find(|e| {
            e.id.starts_with(evidence_id) || evidence_id.starts_with(&e.id)
        }))
    }
}

/// Load all evidence from a JSONL file (missing file = empty)
pub fn load_evidence(path: &Path) -> Result<Vec<Evidence>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open evidence file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut evidence = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Evidence = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse evidence line: {}", line))?;
        evidence.push(record);
    }

    Ok(evidence)
}

fn append_locked(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire file lock on {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    // Lock is released when file is dropped
    Ok(())
}
