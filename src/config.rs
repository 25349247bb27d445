//! Configuration for quizcite.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (QUIZCITE_HOME, QUIZCITE_WORDLIST)
//! 2. Config file (.quizcite/config.yaml)
//! 3. Defaults (~/.quizcite)
//!
//! Config file discovery:
//! - Searches current directory and parents for .quizcite/config.yaml
//! - Paths in config file are relative to the .quizcite/ directory

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{PipelineSettings, ResolveLimits};
use crate::evidence::RenderSettings;
use crate::matching::{MatchSettings, Normalizer, WordSegmenter};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".quizcite";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub limits: ResolveLimits,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Output root (relative to .quizcite/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingConfig {
    #[serde(flatten)]
    pub settings: MatchSettings,
    /// Custom segmentation word list, most frequent word first
    #[serde(default)]
    pub wordlist: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Output root for evidence and render manifests
    pub home: PathBuf,
    /// Word list replacing the built-in English one
    pub wordlist: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub settings: PipelineSettings,
}

impl ResolvedConfig {
    /// Normalizer using the configured word list, or the built-in one
    pub fn normalizer(&self) -> Result<Normalizer> {
        match &self.wordlist {
            Some(path) => {
                let segmenter = WordSegmenter::from_file(path)?;
                Ok(Normalizer::new(Arc::new(segmenter)))
            }
            None => Ok(Normalizer::default()),
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file is a valid, all-defaults config
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
pub fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration, discovering the config file from `start`
fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = find_config_file(start);
    let (config, config_dir) = match &config_file {
        Some(path) => (
            load_config_file(path)?,
            path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        ),
        None => (ConfigFile::default(), PathBuf::from(".")),
    };

    let home = if let Ok(env_home) = std::env::var("QUIZCITE_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(&config_dir, home_path)
    } else {
        default_home
    };

    let wordlist = if let Ok(env_words) = std::env::var("QUIZCITE_WORDLIST") {
        Some(PathBuf::from(env_words))
    } else {
        config
            .matching
            .wordlist
            .as_deref()
            .map(|p| resolve_path(&config_dir, p))
    };

    Ok(ResolvedConfig {
        home,
        wordlist,
        config_file,
        settings: PipelineSettings {
            matching: config.matching.settings,
            render: config.render,
            limits: config.limits,
        },
    })
}

fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the output root directory
pub fn quizcite_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the pipeline settings
pub fn settings() -> Result<PipelineSettings> {
    Ok(config()?.settings.clone())
}
