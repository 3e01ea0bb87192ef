//! Command-line interface for reqpin.
//!
//! - [`args`] - Argument definitions using clap's derive macros
//! - [`run`] - Executes one run from a [`Config`]

pub mod args;

pub use args::Cli;

use crate::config::Config;
use crate::error::Result;
use crate::lookup::{PypiIndex, PythonRegistry};
use crate::pin::{Pinner, Summary};

/// Execute one run: rewrite the configured file, or print it on dry runs.
pub fn run(config: &Config) -> Result<Summary> {
    tracing::debug!("Running with {:?}", config);

    let registry = PythonRegistry::new(config.python.clone());
    let index = PypiIndex::with_timeout(config.index_url.clone(), config.timeout)?;
    let pinner = Pinner::new(&registry, &index);

    let summary = if config.dry_run {
        let rewrite = pinner.preview_file(&config.requirements)?;
        print!("{}", rewrite.content);
        rewrite.summary
    } else {
        pinner.rewrite_file(&config.requirements)?
    };

    tracing::info!(
        "{} {}: {} pinned, {} unchanged ({} unresolved)",
        if config.dry_run { "Checked" } else { "Updated" },
        config.requirements.display(),
        summary.pinned,
        summary.kept,
        summary.unresolved
    );
    Ok(summary)
}
