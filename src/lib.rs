//! use-pkg-version: keep a version string in any file in sync with package.json
//!
//! The library exposes the update engine and the configuration layer so they
//! can be tested directly. The command-line binary is at src/main.rs.

pub mod cli;
pub mod config;
pub mod info;
pub mod logger;
pub mod manifest;
pub mod pattern;
pub mod preview;
pub mod updater;

// Re-export commonly used types for convenience
pub use config::{OptionLayer, UpdateOptions, merge_options};
pub use manifest::{Manifest, ManifestError, read_manifest};
pub use pattern::{PatternError, compile_pattern};
pub use updater::{DEFAULT_PLACEHOLDER, Outcome, UpdateError, UpdateRequest, update_version};
