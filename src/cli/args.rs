//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct. Every option has a default,
//! so running `reqpin` with no arguments updates `./requirements.txt`.

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_REQUIREMENTS_FILE;
use crate::lookup::{DEFAULT_INDEX_URL, DEFAULT_PYTHON};

/// Pin unversioned requirements to installed or latest published versions.
#[derive(Debug, Parser)]
#[command(name = "reqpin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Requirements file to update in place
    #[arg(env = "REQPIN_FILE", default_value = DEFAULT_REQUIREMENTS_FILE)]
    pub file: PathBuf,

    /// Base URL of the PyPI-compatible package index
    #[arg(long, env = "REQPIN_INDEX_URL", default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// Python interpreter used to look up installed versions
    #[arg(long, env = "REQPIN_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Timeout in seconds for package index requests (default: none)
    #[arg(long, env = "REQPIN_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Print the updated file to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
