//! Command-line interface for quizcite.
//!
//! Provides commands for resolving quotes of one chapter or a batch of
//! chapters, inspecting the normalizer, and checking stored evidence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::core::{run_batch, run_chapter, ChapterJob, ChapterSummary};

pub mod evidence;

/// Quote file extensions tried for each layout in a batch
const QUOTE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// quizcite - locate quiz quotes in extracted document text
#[derive(Parser, Debug)]
#[command(name = "quizcite")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the quotes of one chapter
    Resolve {
        /// Layout file (JSON pages and blocks)
        #[arg(short, long)]
        layout: PathBuf,

        /// Quotes file (identifier map or quiz document, YAML or JSON)
        #[arg(short, long)]
        quotes: PathBuf,

        /// Output directory (defaults to QUIZCITE_HOME)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Resolve many chapters concurrently
    Batch {
        /// Glob matching layout files
        #[arg(short, long)]
        layouts: String,

        /// Directory holding `<layout stem>.yaml` quote files
        #[arg(short, long)]
        quotes_dir: PathBuf,

        /// Output directory (defaults to QUIZCITE_HOME)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the normalized form of a text file
    Normalize {
        /// Input text file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Manage evidence
    Evidence {
        #[command(subcommand)]
        command: evidence::EvidenceCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Resolve {
                layout,
                quotes,
                out,
            } => resolve_chapter(layout, quotes, out).await,
            Commands::Batch {
                layouts,
                quotes_dir,
                out,
            } => resolve_batch(&layouts, &quotes_dir, out).await,
            Commands::Normalize { input } => normalize_file(&input),
            Commands::Evidence { command } => execute_evidence(command).await,
            Commands::Config => show_config(),
        }
    }
}

/// Execute evidence subcommands
async fn execute_evidence(command: evidence::EvidenceCommands) -> Result<()> {
    match command {
        evidence::EvidenceCommands::Show {
            evidence_id,
            out,
            layout,
        } => evidence::execute_show(&evidence_id, out, layout).await,
        evidence::EvidenceCommands::Validate { layout, evidence } => {
            evidence::execute_validate(&layout, &evidence).await
        }
    }
}

fn output_dir(out: Option<PathBuf>) -> Result<PathBuf> {
    match out {
        Some(dir) => Ok(dir),
        None => config::quizcite_home(),
    }
}

fn print_summary(summary: &ChapterSummary) {
    println!(
        "{}: {} resolved, {} unresolved, {} image(s)",
        summary.chapter, summary.resolved, summary.unresolved, summary.images
    );
}

/// Resolve one chapter
async fn resolve_chapter(layout: PathBuf, quotes: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let normalizer = cfg.normalizer()?;
    let settings = cfg.settings.clone();
    let out = output_dir(out)?;

    let job = ChapterJob { layout, quotes };
    let out_for_worker = out.clone();
    let summary = tokio::task::spawn_blocking(move || {
        run_chapter(&job, &settings, &normalizer, &out_for_worker)
    })
    .await
    .context("Chapter worker failed")??;

    print_summary(&summary);
    eprintln!("\n[Evidence written to {}]", out.display());
    Ok(())
}

/// Pair every layout matched by `pattern` with its quotes file
fn collect_jobs(pattern: &str, quotes_dir: &Path) -> Result<Vec<ChapterJob>> {
    let mut jobs = Vec::new();

    for entry in glob::glob(pattern).with_context(|| format!("Invalid glob: {}", pattern))? {
        let layout = entry.context("Failed to read glob entry")?;
        let Some(stem) = layout.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        let quotes = QUOTE_EXTENSIONS
            .iter()
            .map(|ext| quotes_dir.join(format!("{}.{}", stem, ext)))
            .find(|p| p.exists());

        match quotes {
            Some(quotes) => jobs.push(ChapterJob { layout, quotes }),
            None => tracing::warn!(
                layout = %layout.display(),
                quotes_dir = %quotes_dir.display(),
                "No quotes file for layout, skipping"
            ),
        }
    }

    Ok(jobs)
}

/// Resolve many chapters, one blocking worker per chapter
async fn resolve_batch(pattern: &str, quotes_dir: &Path, out: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let normalizer = cfg.normalizer()?;
    let out = output_dir(out)?;

    let jobs = collect_jobs(pattern, quotes_dir)?;
    if jobs.is_empty() {
        anyhow::bail!("No layouts with quotes matched: {}", pattern);
    }

    let results = run_batch(jobs, cfg.settings.clone(), normalizer, out.clone()).await;

    let mut failed = 0;
    for (job, result) in &results {
        match result {
            Ok(summary) => print_summary(summary),
            Err(e) => {
                failed += 1;
                eprintln!("{}: FAILED: {:#}", job.layout.display(), e);
            }
        }
    }

    eprintln!(
        "\n[{} chapter(s) processed, {} failed; evidence in {}]",
        results.len(),
        failed,
        out.display()
    );
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Print cleaned text and the edits of each normalization step
fn normalize_file(input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let normalizer = config::config()?.normalizer()?;
    let normalized = normalizer.normalize(&text);

    println!("{}", normalized.text().trim());
    eprintln!();
    for step in normalized.steps() {
        eprintln!("[{}: {} edit(s)]", step.kind.as_str(), step.edits().len());
    }
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("quizcite configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Home (output): {}", cfg.home.display());
    println!(
        "Word list:     {}",
        cfg.wordlist
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in English)".to_string())
    );
    println!();
    let yaml = serde_yaml::to_string(&cfg.settings).context("Failed to serialize settings")?;
    println!("{}", yaml);

    Ok(())
}
