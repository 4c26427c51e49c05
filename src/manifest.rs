//! Manifest reading
//!
//! Loads a `package.json`-style manifest and exposes its `version` field.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The parts of a project manifest this tool cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Package name, kept for diagnostics only
    #[serde(default)]
    pub name: Option<String>,
    pub version: String,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse the manifest at `path`.
///
/// A manifest without a string `version` field is reported as a parse error.
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(strip_bom(&content)).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Drop a leading UTF-8 byte order mark, as Node does when loading JSON.
pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}
