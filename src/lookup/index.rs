//! Latest-version lookup against a PyPI-compatible JSON API.
//!
//! Sends `GET {base}/pypi/{name}/json` and reads `info.version` from the
//! response body.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

/// Public PyPI.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

/// Source of published package versions.
pub trait PackageIndex {
    /// Latest published version of `name`.
    ///
    /// Returns `Ok(None)` when the index answered without a version
    /// (e.g. 404 for an unknown project).
    fn latest_version(&self, name: &str) -> Result<Option<String>>;
}

/// The subset of the project JSON document that is read.
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    version: String,
}

/// Blocking client for the PyPI JSON API.
pub struct PypiIndex {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl PypiIndex {
    /// Create a client for `base_url` with no request timeout.
    pub fn new(base_url: impl Into<String>) -> crate::Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("reqpin/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// JSON endpoint for a project.
    pub fn project_url(&self, name: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url.trim_end_matches('/'), name)
    }
}

impl PackageIndex for PypiIndex {
    fn latest_version(&self, name: &str) -> Result<Option<String>> {
        let url = self.project_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                "Failed to get latest version for '{}' from the package index. Status code: {}",
                name,
                status.as_u16()
            );
            return Ok(None);
        }

        let project: ProjectResponse = response
            .json()
            .context("Failed to parse package index response")?;

        if project.info.version.is_empty() {
            warn!("Package index reported an empty version for '{}'", name);
            return Ok(None);
        }

        Ok(Some(project.info.version))
    }
}
