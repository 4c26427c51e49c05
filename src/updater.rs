//! Version substitution engine
//!
//! Takes a fully resolved [`UpdateRequest`], validates it, and replaces every
//! match of the search pattern in the target file with the replacement
//! template, where the placeholder has been swapped for the manifest version.
//!
//! Validation problems and manifest read failures are returned before anything
//! is written. A failure while writing the target is logged and returned as
//! [`UpdateError::Write`], so callers can tell "nothing happened" apart from
//! "the write was attempted".

use crate::manifest::{self, ManifestError};
use crate::pattern::{self, PatternError};
use crate::preview;
use colored::*;
use regex::bytes::{NoExpand, Regex};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info};

/// Placeholder replaced by the manifest version when none is configured.
pub const DEFAULT_PLACEHOLDER: &str = "{{version}}";

/// Everything needed for one update.
///
/// Paths are expected to be absolute; the CLI resolves them against the
/// current directory before building the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// File whose version string gets replaced
    pub update_file: Option<PathBuf>,
    /// Manifest the version is read from
    pub package_file: Option<PathBuf>,
    /// Regular expression locating the version string
    pub search_for: Option<String>,
    /// Replacement text, must contain `placeholder`
    pub replace_with: Option<String>,
    pub placeholder: String,
    #[serde(rename = "dry")]
    pub dry_run: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl Default for UpdateRequest {
    fn default() -> Self {
        Self {
            update_file: None,
            package_file: None,
            search_for: None,
            replace_with: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            dry_run: false,
            quiet: false,
            verbose: false,
        }
    }
}

/// What an update did, or would have done in a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated { replacements: usize },
    NoMatch,
    DryRunWouldUpdate { replacements: usize },
    DryRunNoMatch,
}

impl Outcome {
    /// True when the target was, or would have been, changed.
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Updated { .. } | Outcome::DryRunWouldUpdate { .. })
    }

    pub fn replacements(&self) -> usize {
        match self {
            Outcome::Updated { replacements } | Outcome::DryRunWouldUpdate { replacements } => {
                *replacements
            }
            Outcome::NoMatch | Outcome::DryRunNoMatch => 0,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Outcome::DryRunWouldUpdate { .. } | Outcome::DryRunNoMatch)
    }
}

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("The file to update must be specified (updateFile)")]
    MissingTargetFile,

    #[error("File not found: {}", .0.display())]
    TargetFileNotFound(PathBuf),

    #[error("The package.json file must be specified (packageFile)")]
    MissingManifestFile,

    #[error("File not found: {}", .0.display())]
    ManifestFileNotFound(PathBuf),

    #[error("The regex expression to search for must be specified (searchFor)")]
    MissingSearchPattern,

    #[error("The value to replace the found value with not specified (replaceWith)")]
    MissingReplacementTemplate,

    #[error("Invalid regex: {}", .0.summary())]
    InvalidSearchPattern(#[source] PatternError),

    #[error("Version number placeholder '{placeholder}' not specified in 'replaceWith'")]
    PlaceholderMissing { placeholder: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UpdateError {
    /// True for errors raised while checking the request, before any read.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            UpdateError::Manifest(_) | UpdateError::Read { .. } | UpdateError::Write { .. }
        )
    }
}

/// A request that passed validation, with its search pattern compiled.
struct ValidatedRequest<'a> {
    update_file: &'a Path,
    package_file: &'a Path,
    regex: Regex,
    replace_with: &'a str,
}

fn validate(request: &UpdateRequest) -> Result<ValidatedRequest<'_>, UpdateError> {
    let update_file = request
        .update_file
        .as_deref()
        .ok_or(UpdateError::MissingTargetFile)?;
    if !update_file.is_file() {
        return Err(UpdateError::TargetFileNotFound(update_file.to_path_buf()));
    }

    let package_file = request
        .package_file
        .as_deref()
        .ok_or(UpdateError::MissingManifestFile)?;
    if !package_file.is_file() {
        return Err(UpdateError::ManifestFileNotFound(package_file.to_path_buf()));
    }

    let search_for = request
        .search_for
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(UpdateError::MissingSearchPattern)?;

    let replace_with = request
        .replace_with
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(UpdateError::MissingReplacementTemplate)?;

    let regex = pattern::compile_pattern(search_for).map_err(UpdateError::InvalidSearchPattern)?;

    if !replace_with.contains(&request.placeholder) {
        return Err(UpdateError::PlaceholderMissing {
            placeholder: request.placeholder.clone(),
        });
    }

    Ok(ValidatedRequest {
        update_file,
        package_file,
        regex,
        replace_with,
    })
}

/// Replace the first occurrence of `placeholder` in `template` with `version`.
pub fn render_replacement(template: &str, placeholder: &str, version: &str) -> String {
    template.replacen(placeholder, version, 1)
}

/// Run one update.
///
/// Unless `quiet` is set, prints whether the version number was updated.
pub fn update_version(request: &UpdateRequest) -> Result<Outcome, UpdateError> {
    let validated = validate(request)?;

    if request.verbose {
        // Only fails for non UTF-8 paths, the dump is skipped then.
        if let Ok(dump) = serde_json::to_string_pretty(request) {
            println!("options {}", dump);
        }
    }

    let manifest = manifest::read_manifest(validated.package_file)?;
    let replacement = render_replacement(
        validated.replace_with,
        &request.placeholder,
        &manifest.version,
    );
    debug!(
        version = %manifest.version,
        replacement = %replacement,
        file = %validated.update_file.display(),
        "resolved replacement"
    );

    // Raw bytes, so files that are not valid UTF-8 can still be updated.
    let content = fs::read(validated.update_file).map_err(|source| UpdateError::Read {
        path: validated.update_file.to_path_buf(),
        source,
    })?;

    let replacements = validated.regex.find_iter(&content).count();
    let updated = if replacements > 0 {
        Some(
            validated
                .regex
                .replace_all(&content, NoExpand(replacement.as_bytes()))
                .into_owned(),
        )
    } else {
        None
    };

    if request.verbose {
        println!(
            "replace {} match(es) of /{}/ with \"{}\" in {}",
            replacements,
            validated.regex.as_str(),
            replacement,
            validated.update_file.display()
        );
    }

    let outcome = match (request.dry_run, updated) {
        (true, Some(new_content)) => {
            if !request.quiet {
                let old = String::from_utf8_lossy(&content);
                let new = String::from_utf8_lossy(&new_content);
                print!("{}", preview::render_diff(validated.update_file, &old, &new));
            }
            Outcome::DryRunWouldUpdate { replacements }
        }
        (true, None) => Outcome::DryRunNoMatch,
        (false, Some(new_content)) => {
            if let Err(source) = write_atomic(validated.update_file, &new_content) {
                error!(
                    file = %validated.update_file.display(),
                    error = %source,
                    "failed to write updated file"
                );
                eprintln!(
                    "{}",
                    format!(
                        "Error occurred: could not write {}: {}",
                        validated.update_file.display(),
                        source
                    )
                    .red()
                );
                return Err(UpdateError::Write {
                    path: validated.update_file.to_path_buf(),
                    source,
                });
            }
            info!(
                file = %validated.update_file.display(),
                replacements,
                "version number written"
            );
            Outcome::Updated { replacements }
        }
        (false, None) => Outcome::NoMatch,
    };

    if !request.quiet {
        report(&outcome);
    }

    Ok(outcome)
}

fn report(outcome: &Outcome) {
    let prefix = if outcome.is_dry_run() { "(dry run) " } else { "" };
    if outcome.changed() {
        println!("{}{}", prefix, "Version number updated".green());
    } else {
        println!("{}{}", prefix, "Version number not updated".red());
    }
}

/// Replace the contents of `path` through a temp file in the same directory.
///
/// Symlinks are followed, so the file they point to is rewritten and the link
/// stays. A read-only target is refused even when its directory is writable.
fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let path = fs::canonicalize(path)?;
    let permissions = fs::metadata(&path)?.permissions();
    if permissions.readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "file is read-only",
        ));
    }

    let parent_dir = path.parent().unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;
    fs::set_permissions(temp_file.path(), permissions)?;

    temp_file.persist(&path).map_err(|e| e.error)?;
    Ok(())
}
