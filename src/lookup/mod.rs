//! Version lookups.
//!
//! Two collaborators answer "which version of this package?":
//!
//! - [`LocalRegistry`] reports the version installed in a Python environment
//! - [`PackageIndex`] reports the latest version published on a package index
//!
//! Both return `Ok(None)` for "not found" and reserve `Err` for failures of
//! the query itself, so callers can log the two cases differently.

pub mod index;
pub mod local;

pub use index::{PackageIndex, PypiIndex, DEFAULT_INDEX_URL};
pub use local::{LocalRegistry, PythonRegistry, DEFAULT_PYTHON};
