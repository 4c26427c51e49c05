//! Configuration discovery and option merging for use-pkg-version
//!
//! Options for `update` can come from three places, in increasing precedence:
//! built-in defaults, a configuration file, and command-line arguments.
//!
//! The configuration file is searched for starting in the current directory
//! and walking up to the user's home directory (or the filesystem root when
//! the start directory is outside home). In every directory these places are
//! checked, in order:
//!
//! 1. a `"use-pkg-version"` property in `package.json`
//! 2. `.use-pkg-versionrc` (JSON or YAML)
//! 3. `.use-pkg-versionrc.json`
//! 4. `.use-pkg-versionrc.yaml`, `.use-pkg-versionrc.yml`, `.use-pkg-versionrc.toml`
//! 5. `use-pkg-version.config.json`, `.yaml`, `.toml`
//!
//! The first place holding a non-empty configuration wins.

use crate::manifest::strip_bom;
use crate::updater::{DEFAULT_PLACEHOLDER, UpdateRequest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name used for the `package.json` property and the config file names
pub const TOOL_NAME: &str = "use-pkg-version";

/// Manifest file used when none is given
pub const DEFAULT_PACKAGE_FILE: &str = "package.json";

/// A partial set of update options, as found in a config file or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionLayer {
    /// Manifest path, relative to the current directory
    pub package_file: Option<String>,

    /// Regular expression to search for
    pub search_for: Option<String>,

    /// Replacement text containing the placeholder
    pub replace_with: Option<String>,

    /// Token in `replace_with` that stands for the version
    pub placeholder: Option<String>,

    pub dry: Option<bool>,
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub debug: Option<bool>,
}

impl OptionLayer {
    pub fn is_empty(&self) -> bool {
        *self == OptionLayer::default()
    }
}

/// Fully merged options for the `update` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    pub package_file: String,
    pub search_for: Option<String>,
    pub replace_with: Option<String>,
    pub placeholder: String,
    pub dry: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub debug: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            package_file: DEFAULT_PACKAGE_FILE.to_string(),
            search_for: None,
            replace_with: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            dry: false,
            verbose: false,
            quiet: false,
            debug: false,
        }
    }
}

impl UpdateOptions {
    /// Absolute path of the manifest, relative paths are taken from `cwd`.
    pub fn package_path(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.package_file)
    }

    /// Build the engine request for `target`, resolving paths against `cwd`.
    pub fn to_request(&self, cwd: &Path, target: &str) -> UpdateRequest {
        UpdateRequest {
            update_file: Some(cwd.join(target)),
            package_file: Some(self.package_path(cwd)),
            search_for: self.search_for.clone(),
            replace_with: self.replace_with.clone(),
            placeholder: self.placeholder.clone(),
            dry_run: self.dry,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

/// Merge the three option layers: `args` over `file` over `defaults`.
///
/// Each field is taken from the highest layer that sets it.
pub fn merge_options(
    defaults: &UpdateOptions,
    file: &OptionLayer,
    args: &OptionLayer,
) -> UpdateOptions {
    fn pick<T: Clone>(arg: &Option<T>, file: &Option<T>, default: T) -> T {
        arg.clone().or_else(|| file.clone()).unwrap_or(default)
    }

    UpdateOptions {
        package_file: pick(&args.package_file, &file.package_file, defaults.package_file.clone()),
        search_for: args
            .search_for
            .clone()
            .or_else(|| file.search_for.clone())
            .or_else(|| defaults.search_for.clone()),
        replace_with: args
            .replace_with
            .clone()
            .or_else(|| file.replace_with.clone())
            .or_else(|| defaults.replace_with.clone()),
        placeholder: pick(&args.placeholder, &file.placeholder, defaults.placeholder.clone()),
        dry: pick(&args.dry, &file.dry, defaults.dry),
        verbose: pick(&args.verbose, &file.verbose, defaults.verbose),
        quiet: pick(&args.quiet, &file.quiet, defaults.quiet),
        debug: pick(&args.debug, &file.debug, defaults.debug),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in config file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML in config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unsupported config file format: {} (use .json, .yaml, .yml or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// A configuration and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: OptionLayer,
}

/// File names checked in each directory, in order.
pub fn search_places(name: &str) -> Vec<String> {
    vec![
        DEFAULT_PACKAGE_FILE.to_string(),
        format!(".{name}rc"),
        format!(".{name}rc.json"),
        format!(".{name}rc.yaml"),
        format!(".{name}rc.yml"),
        format!(".{name}rc.toml"),
        format!("{name}.config.json"),
        format!("{name}.config.yaml"),
        format!("{name}.config.toml"),
    ]
}

/// Search upward from `start_dir` for the configuration of `name`.
///
/// The walk stops after the user's home directory when `start_dir` lies
/// inside it.
pub fn find_config(start_dir: &Path, name: &str) -> Result<Option<LoadedConfig>, ConfigError> {
    let home = dirs::home_dir();
    let stop_dir = home.as_deref().filter(|h| start_dir.starts_with(h));
    find_config_until(start_dir, name, stop_dir)
}

/// Same as [`find_config`], with an explicit directory to stop after.
pub fn find_config_until(
    start_dir: &Path,
    name: &str,
    stop_dir: Option<&Path>,
) -> Result<Option<LoadedConfig>, ConfigError> {
    let places = search_places(name);

    for dir in start_dir.ancestors() {
        for place in &places {
            let path = dir.join(place);
            if !path.is_file() {
                continue;
            }

            let config = if place == DEFAULT_PACKAGE_FILE {
                load_package_property(&path, name)?
            } else {
                load_config_file(&path)?
            };

            match config {
                Some(config) if !config.is_empty() => {
                    debug!(path = %path.display(), "found configuration");
                    return Ok(Some(LoadedConfig { path, config }));
                }
                _ => debug!(path = %path.display(), "skipping empty configuration"),
            }
        }

        if stop_dir == Some(dir) {
            break;
        }
    }

    Ok(None)
}

/// Load an explicit config file; the format follows the extension.
///
/// Returns `None` for an empty file. Files without an extension are read as
/// JSON, falling back to YAML.
pub fn load_config_file(path: &Path) -> Result<Option<OptionLayer>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = strip_bom(&content);
    if content.trim().is_empty() {
        return Ok(None);
    }

    let extension = path.extension().and_then(|e| e.to_str());
    let config: OptionLayer = match extension {
        Some("json") => parse_json(path, content)?,
        Some("yaml") | Some("yml") => parse_yaml(path, content)?,
        Some("toml") => toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        None => match serde_json::from_str(content) {
            Ok(config) => config,
            Err(_) => parse_yaml(path, content)?,
        },
        Some(_) => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    Ok(Some(config))
}

fn parse_json(path: &Path, content: &str) -> Result<OptionLayer, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_yaml(path: &Path, content: &str) -> Result<OptionLayer, ConfigError> {
    serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the `name` property of a `package.json`, if present.
fn load_package_property(path: &Path, name: &str) -> Result<Option<OptionLayer>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut manifest: serde_json::Value = parse_value(path, strip_bom(&content))?;

    match manifest.get_mut(name).map(serde_json::Value::take) {
        Some(value) if !value.is_null() => {
            let config = serde_json::from_value(value).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Some(config))
        }
        _ => Ok(None),
    }
}

fn parse_value(path: &Path, content: &str) -> Result<serde_json::Value, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer() -> OptionLayer {
        OptionLayer::default()
    }

    #[test]
    fn test_default_options() {
        let options = UpdateOptions::default();
        assert_eq!(options.package_file, "package.json");
        assert_eq!(options.placeholder, "{{version}}");
        assert!(!options.dry);
        assert!(options.search_for.is_none());
    }

    #[test]
    fn test_merge_args_override_file() {
        let file = OptionLayer {
            search_for: Some("from-file".to_string()),
            replace_with: Some("file {{version}}".to_string()),
            ..layer()
        };
        let args = OptionLayer {
            search_for: Some("from-args".to_string()),
            ..layer()
        };

        let merged = merge_options(&UpdateOptions::default(), &file, &args);
        assert_eq!(merged.search_for.as_deref(), Some("from-args"));
        assert_eq!(merged.replace_with.as_deref(), Some("file {{version}}"));
        assert_eq!(merged.package_file, "package.json");
    }

    #[test]
    fn test_merge_file_overrides_defaults() {
        let file = OptionLayer {
            package_file: Some("sub/package.json".to_string()),
            placeholder: Some("%VERSION%".to_string()),
            dry: Some(true),
            ..layer()
        };

        let merged = merge_options(&UpdateOptions::default(), &file, &layer());
        assert_eq!(merged.package_file, "sub/package.json");
        assert_eq!(merged.placeholder, "%VERSION%");
        assert!(merged.dry);
    }

    #[test]
    fn test_merge_unset_flag_does_not_clear_file_value() {
        let file = OptionLayer {
            quiet: Some(true),
            ..layer()
        };
        let args = OptionLayer {
            verbose: Some(true),
            ..layer()
        };

        let merged = merge_options(&UpdateOptions::default(), &file, &args);
        assert!(merged.quiet);
        assert!(merged.verbose);
    }

    #[test]
    fn test_to_request_resolves_paths() {
        let options = UpdateOptions {
            search_for: Some("a".to_string()),
            dry: true,
            ..Default::default()
        };
        let request = options.to_request(Path::new("/work"), "docs/README.md");

        assert_eq!(request.update_file, Some(PathBuf::from("/work/docs/README.md")));
        assert_eq!(request.package_file, Some(PathBuf::from("/work/package.json")));
        assert!(request.dry_run);
        assert_eq!(request.placeholder, "{{version}}");
    }

    #[test]
    fn test_find_package_property() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.0.0", "use-pkg-version": { "searchFor": "v[0-9.]+", "replaceWith": "v{{version}}" } }"#,
        )
        .unwrap();

        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, dir.path().join("package.json"));
        assert_eq!(found.config.search_for.as_deref(), Some("v[0-9.]+"));
    }

    #[test]
    fn test_package_property_with_bom() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "\u{feff}{ \"use-pkg-version\": { \"searchFor\": \"v[0-9.]+\" } }",
        )
        .unwrap();

        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.config.search_for.as_deref(), Some("v[0-9.]+"));
    }

    #[test]
    fn test_package_without_property_falls_through_to_rc() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "version": "1.0.0" }"#).unwrap();
        fs::write(
            dir.path().join(".use-pkg-versionrc"),
            "searchFor: 'Version [0-9.]+'\nreplaceWith: 'Version {{version}}'\n",
        )
        .unwrap();

        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, dir.path().join(".use-pkg-versionrc"));
        assert_eq!(found.config.replace_with.as_deref(), Some("Version {{version}}"));
    }

    #[test]
    fn test_rc_file_json_body() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".use-pkg-versionrc"),
            r#"{ "searchFor": "x", "quiet": true }"#,
        )
        .unwrap();

        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.config.quiet, Some(true));
    }

    #[test]
    fn test_search_walks_up_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join("use-pkg-version.config.toml"),
            "searchFor = \"x\"\nplaceholder = \"@@\"\n",
        )
        .unwrap();

        let found = find_config_until(&nested, TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, dir.path().join("use-pkg-version.config.toml"));
        assert_eq!(found.config.placeholder.as_deref(), Some("@@"));
    }

    #[test]
    fn test_nearest_directory_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("child");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".use-pkg-versionrc.json"), r#"{ "searchFor": "outer" }"#).unwrap();
        fs::write(nested.join(".use-pkg-versionrc.yml"), "searchFor: inner\n").unwrap();

        let found = find_config_until(&nested, TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.config.search_for.as_deref(), Some("inner"));
    }

    #[test]
    fn test_empty_rc_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".use-pkg-versionrc"), "").unwrap();
        fs::write(dir.path().join(".use-pkg-versionrc.json"), r#"{ "dry": true }"#).unwrap();

        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, dir.path().join(".use-pkg-versionrc.json"));
    }

    #[test]
    fn test_nothing_found() {
        let dir = TempDir::new().unwrap();
        let found = find_config_until(dir.path(), TOOL_NAME, Some(dir.path())).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".use-pkg-versionrc.json");
        fs::write(&path, "{ searchFor: ").unwrap();

        let err = find_config_until(dir.path(), TOOL_NAME, Some(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn test_load_config_file_rejects_js() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("use-pkg-version.config.js");
        fs::write(&path, "module.exports = {}").unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_search_places_order() {
        let places = search_places("tool");
        assert_eq!(places[0], "package.json");
        assert_eq!(places[1], ".toolrc");
        assert_eq!(places[2], ".toolrc.json");
        assert_eq!(places.last().unwrap(), "tool.config.toml");
    }
}
