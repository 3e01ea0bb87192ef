//! Run configuration.
//!
//! Settings come from, in increasing priority: built-in defaults,
//! `REQPIN_*` environment variables, and command-line flags. clap resolves
//! the environment and flag layers; [`Config`] is the validated result the
//! rest of the crate consumes.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::lookup::{DEFAULT_INDEX_URL, DEFAULT_PYTHON};

/// Requirements file processed when none is given.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File read and rewritten in place.
    pub requirements: PathBuf,
    /// Base URL of the PyPI-compatible index.
    pub index_url: String,
    /// Interpreter whose environment is queried for installed versions.
    pub python: String,
    /// Request timeout for the index; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Print the result instead of writing it.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requirements: PathBuf::from(DEFAULT_REQUIREMENTS_FILE),
            index_url: DEFAULT_INDEX_URL.to_string(),
            python: DEFAULT_PYTHON.to_string(),
            timeout: None,
            dry_run: false,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            requirements: cli.file.clone(),
            index_url: cli.index_url.clone(),
            python: cli.python.clone(),
            timeout: cli.timeout.map(Duration::from_secs),
            dry_run: cli.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn default_matches_no_arguments() {
        let cli = Cli::parse_from(["reqpin"]);
        let config = Config::from(&cli);
        // Environment overrides would make this comparison meaningless.
        if std::env::vars().any(|(k, _)| k.starts_with("REQPIN_")) {
            return;
        }
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "reqpin",
            "deps/dev.txt",
            "--index-url",
            "http://mirror.local",
            "--python",
            "/opt/venv/bin/python",
            "--timeout",
            "15",
            "--dry-run",
        ]);
        let config = Config::from(&cli);

        assert_eq!(config.requirements, PathBuf::from("deps/dev.txt"));
        assert_eq!(config.index_url, "http://mirror.local");
        assert_eq!(config.python, "/opt/venv/bin/python");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert!(config.dry_run);
    }
}
