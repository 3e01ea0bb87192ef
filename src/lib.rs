//! reqpin - pin unversioned entries in a requirements file.
//!
//! reqpin reads a `requirements.txt`, gives every entry that has neither a
//! version specifier nor a direct URL an exact `==` pin, and writes the file
//! back. The installed version is preferred; packages that are not installed
//! are pinned to the latest version published on the package index.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Run configuration
//! - [`error`] - Error types and result aliases
//! - [`line`] - Line classification and pinned-line rendering
//! - [`lookup`] - Installed and published version lookups
//! - [`pin`] - Version resolution and the file driver
//! - [`requirement`] - Requirement specifier parsing
//!
//! # Example
//!
//! ```
//! use reqpin::line::pinned_line;
//! use reqpin::requirement::Requirement;
//!
//! let req = Requirement::parse("requests[socks]; python_version >= '3.8'").unwrap();
//! assert_eq!(
//!     pinned_line(&req, "2.32.3"),
//!     r#"requests[socks]==2.32.3; python_version >= "3.8""#
//! );
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod line;
pub mod lookup;
pub mod pin;
pub mod requirement;

pub use error::{ReqpinError, Result};
