//! Installed-version lookup through a Python interpreter.

use std::process::Command;

use tracing::debug;

use crate::error::{ReqpinError, Result};

/// Interpreter used when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Exit status the query program uses for `PackageNotFoundError`.
const NOT_FOUND_EXIT_CODE: i32 = 3;

/// Program run as `python -c PROGRAM <name>`.
const VERSION_PROGRAM: &str = "\
import sys
from importlib import metadata
try:
    print(metadata.version(sys.argv[1]))
except metadata.PackageNotFoundError:
    sys.exit(3)
";

/// Source of installed package versions.
pub trait LocalRegistry {
    /// Version of `name` installed locally.
    ///
    /// Returns `Ok(None)` when the package is not installed.
    fn installed_version(&self, name: &str) -> Result<Option<String>>;
}

/// Queries `importlib.metadata` in the environment of a Python interpreter.
///
/// # Example
///
/// ```no_run
/// use reqpin::lookup::{LocalRegistry, PythonRegistry};
///
/// let registry = PythonRegistry::new("python3");
/// if let Some(version) = registry.installed_version("pip").unwrap() {
///     println!("pip {version}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PythonRegistry {
    python: String,
}

impl PythonRegistry {
    /// Create a registry backed by the given interpreter command.
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// The interpreter command.
    pub fn python(&self) -> &str {
        &self.python
    }

    fn failure(&self, message: String) -> ReqpinError {
        ReqpinError::Interpreter {
            python: self.python.clone(),
            message,
        }
    }
}

impl Default for PythonRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl LocalRegistry for PythonRegistry {
    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(VERSION_PROGRAM)
            .arg(name)
            .output()
            .map_err(|e| self.failure(format!("could not start interpreter: {}", e)))?;

        match output.status.code() {
            Some(0) => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if version.is_empty() {
                    return Err(self.failure(format!("empty version reported for '{}'", name)));
                }
                Ok(Some(version))
            }
            Some(NOT_FOUND_EXIT_CODE) => {
                debug!("Package '{}' is not installed.", name);
                Ok(None)
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(self.failure(format!(
                    "exited with code {:?}: {}",
                    code,
                    stderr.trim()
                )))
            }
        }
    }
}
