//! Version resolution and the requirements-file driver.
//!
//! [`Pinner`] walks a requirements file line by line. Every line is
//! classified; only entries without a version specifier and without a
//! direct URL are resolved, preferring the locally installed version and
//! falling back to the latest version on the package index. All other
//! lines are emitted byte-for-byte.
//!
//! # Example
//!
//! ```no_run
//! use reqpin::lookup::{PypiIndex, PythonRegistry, DEFAULT_INDEX_URL};
//! use reqpin::pin::Pinner;
//! use std::path::Path;
//!
//! let registry = PythonRegistry::default();
//! let index = PypiIndex::new(DEFAULT_INDEX_URL).unwrap();
//! let summary = Pinner::new(&registry, &index)
//!     .rewrite_file(Path::new("requirements.txt"))
//!     .unwrap();
//! println!("pinned {} entries", summary.pinned);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{ReqpinError, Result};
use crate::line::{classify, pinned_line, LineClass};
use crate::lookup::{LocalRegistry, PackageIndex};

/// Why a line was emitted unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    Blank,
    Comment,
    Unparseable,
    DirectUrl,
    AlreadyConstrained,
    /// Neither lookup produced a version.
    Unresolved,
}

/// What happened to one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    PassThrough(PassReason),
    Pinned(String),
}

/// A processed line and how it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    pub text: String,
    pub resolution: Resolution,
}

impl LineOutcome {
    fn kept(line: &str, reason: PassReason) -> Self {
        Self {
            text: line.to_string(),
            resolution: Resolution::PassThrough(reason),
        }
    }
}

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines rewritten with `==version`.
    pub pinned: usize,
    /// Lines emitted unchanged, including unresolved ones.
    pub kept: usize,
    /// Unversioned entries no version was found for.
    pub unresolved: usize,
}

impl Summary {
    fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Pinned(_) => self.pinned += 1,
            Resolution::PassThrough(reason) => {
                self.kept += 1;
                if *reason == PassReason::Unresolved {
                    self.unresolved += 1;
                }
            }
        }
    }

    /// Total number of lines processed.
    pub fn lines(&self) -> usize {
        self.pinned + self.kept
    }
}

/// Rewritten file content with its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub summary: Summary,
}

/// Pins unversioned requirements using a local registry and a package index.
pub struct Pinner<'a> {
    registry: &'a dyn LocalRegistry,
    index: &'a dyn PackageIndex,
}

impl<'a> Pinner<'a> {
    /// Create a pinner over the two lookup sources.
    pub fn new(registry: &'a dyn LocalRegistry, index: &'a dyn PackageIndex) -> Self {
        Self { registry, index }
    }

    /// Installed version, with query failures logged and treated as absent.
    fn installed_version(&self, name: &str) -> Option<String> {
        match self.registry.installed_version(name) {
            Ok(version) => version,
            Err(e) => {
                error!("Error getting installed version for '{}': {}", name, e);
                None
            }
        }
    }

    /// Latest published version, with query failures logged and treated as absent.
    fn latest_version(&self, name: &str) -> Option<String> {
        match self.index.latest_version(name) {
            Ok(version) => version,
            Err(e) => {
                error!(
                    "Error fetching latest version from the package index for '{}': {:#}",
                    name, e
                );
                None
            }
        }
    }

    /// Resolve a concrete version for an unconstrained package.
    ///
    /// The installed version wins; the index is only asked when the
    /// package is not installed.
    pub fn resolve_version(&self, name: &str) -> Option<String> {
        if let Some(version) = self.installed_version(name) {
            debug!("Using installed version {} of '{}'", version, name);
            return Some(version);
        }
        let version = self.latest_version(name)?;
        debug!("Using latest published version {} of '{}'", version, name);
        Some(version)
    }

    /// Process one line (without its newline).
    pub fn process_line(&self, line: &str) -> LineOutcome {
        let requirement = match classify(line) {
            LineClass::Blank => return LineOutcome::kept(line, PassReason::Blank),
            LineClass::Comment => return LineOutcome::kept(line, PassReason::Comment),
            LineClass::Unparseable(_) => return LineOutcome::kept(line, PassReason::Unparseable),
            LineClass::DirectUrl(_) => return LineOutcome::kept(line, PassReason::DirectUrl),
            LineClass::Constrained(_) => {
                return LineOutcome::kept(line, PassReason::AlreadyConstrained)
            }
            LineClass::Unpinned(requirement) => requirement,
        };

        match self.resolve_version(&requirement.name) {
            Some(version) => {
                let text = pinned_line(&requirement, &version);
                info!("Pinned '{}' to {}", requirement.name, version);
                LineOutcome {
                    text,
                    resolution: Resolution::Pinned(version),
                }
            }
            None => {
                warn!("Could not find '{}' on the package index.", requirement.name);
                LineOutcome::kept(line, PassReason::Unresolved)
            }
        }
    }

    /// Rewrite the full content of a requirements file.
    ///
    /// Output lines correspond 1:1 to input lines and are joined with `\n`
    /// plus one trailing newline.
    pub fn rewrite(&self, content: &str) -> Rewrite {
        let mut summary = Summary::default();
        let mut lines = Vec::new();

        for line in split_lines(content) {
            let outcome = self.process_line(line);
            summary.record(&outcome.resolution);
            lines.push(outcome.text);
        }

        let mut content = lines.join("\n");
        content.push('\n');
        Rewrite { content, summary }
    }

    /// Read and rewrite a file without persisting the result.
    pub fn preview_file(&self, path: &Path) -> Result<Rewrite> {
        let content =
            fs::read_to_string(path).map_err(|source| ReqpinError::ReadRequirements {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(self.rewrite(&content))
    }

    /// Read, rewrite and replace a requirements file.
    ///
    /// Nothing is written when reading fails. The new content replaces the
    /// file through a rename, so a failed write leaves the original intact.
    pub fn rewrite_file(&self, path: &Path) -> Result<Summary> {
        let rewrite = self.preview_file(path)?;
        write_atomically(path, &rewrite.content)?;
        Ok(rewrite.summary)
    }
}

/// Split on `\n`, `\r\n` and lone `\r`, like Python's universal newlines.
///
/// A trailing terminator does not produce an extra empty line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(i) => {
                lines.push(&rest[..i]);
                let terminator = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Hidden sibling used as the rename source, e.g. `.requirements.txt.reqpin.tmp`.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "requirements".to_string());
    path.with_file_name(format!(".{}.reqpin.tmp", name))
}

/// Write `content` to a sibling temp file and rename it over `path`.
///
/// Symlinks are resolved first so the link target is replaced, and the
/// original permissions are carried over.
pub fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let temp = temp_sibling(&target);

    let result = fs::write(&temp, content).and_then(|()| {
        if let Ok(metadata) = fs::metadata(&target) {
            fs::set_permissions(&temp, metadata.permissions())?;
        }
        fs::rename(&temp, &target)
    });

    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(ReqpinError::WriteRequirements {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
