use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 100 * 1024 * 1024;

/// How the persister commits the temp file to its final name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommitStrategy {
    /// Atomically rename the temp file over the target.
    #[default]
    Rename,
    /// Write the bytes a second time to the target, for storage without rename.
    Rewrite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory outside of which nothing is read or written.
    pub root: PathBuf,
    /// Sandbox-relative folder used when no output directory is given.
    pub default_output_dir: String,
    pub max_source_bytes: u64,
    pub commit: CommitStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from("."),
            default_output_dir: String::new(),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            commit: CommitStrategy::default(),
        }
    }
}

impl Config {
    /// Read a JSON config file, or fall back to defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Absolute, canonical sandbox root. Created if missing.
    pub fn sandbox_root(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory: {}", self.root.display()))?;
        self.root
            .canonicalize()
            .with_context(|| format!("Failed to resolve sandbox root: {}", self.root.display()))
    }
}
