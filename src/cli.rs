use crate::config::{CommitStrategy, Config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(about = "Extract page ranges from PDFs into a sandboxed folder, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sandbox root; every source and output path is relative to it
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output folder inside the sandbox, used when a command names none
    #[arg(short = 'd', long, global = true)]
    pub output_dir: Option<String>,

    /// Largest source PDF to accept, in bytes
    #[arg(long, global = true)]
    pub max_size: Option<u64>,

    /// How finished files replace their temp copy
    #[arg(long, global = true, value_enum)]
    pub commit: Option<CommitStrategy>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.default_output_dir = output_dir.clone();
        }
        if let Some(max_size) = self.max_size {
            config.max_source_bytes = max_size;
        }
        if let Some(commit) = self.commit {
            config.commit = commit;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display page count and metadata of a PDF in the sandbox
    Info {
        /// Sandbox-relative PDF path
        path: String,
    },

    /// Extract a page range to a new PDF in the sandbox
    #[command(alias = "extract")]
    Split {
        /// Sandbox-relative PDF path
        path: String,

        /// Page range (e.g., "3-5", "7", "4-end")
        pages: String,

        /// Output file name (defaults to "<name>_<start>-<end>.pdf")
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing output file without asking
        #[arg(long, conflicts_with = "no_clobber")]
        overwrite: bool,

        /// Never replace an existing output file
        #[arg(long)]
        no_clobber: bool,
    },

    /// Report whether a sandbox path is already taken
    Conflict {
        /// Sandbox-relative output path
        path: String,
    },
}
