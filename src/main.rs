use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use use_pkg_version::cli::{self, Args};
use use_pkg_version::config::{self, LoadedConfig, OptionLayer, TOOL_NAME, UpdateOptions};
use use_pkg_version::updater::{self, UpdateError};
use use_pkg_version::{info, logger};

/// Exit code when the package.json file does not exist
const EXIT_MISSING_PACKAGE_FILE: u8 = 1;
/// Exit code when the file to update does not exist
const EXIT_MISSING_FILE: u8 = 2;

fn main() -> ExitCode {
    let args = cli::parse_args();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    match args {
        Args::Update {
            file,
            config,
            options,
        } => update(&file, config.as_deref(), &options),
        Args::Info => {
            init_logging(false);
            info::print_info();
            Ok(ExitCode::SUCCESS)
        }
        Args::Unknown { command } => {
            print!("{}", cli::help_text());
            println!("  {}", format!("Unknown command {}.", command).red());
            println!();
            Ok(ExitCode::SUCCESS)
        }
        Args::Help => {
            print!("{}", cli::help_text());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(debug_enabled: bool) {
    if let Err(e) = logger::init_logging(debug_enabled) {
        eprintln!("Warning: {}", e);
    }
}

fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<Option<LoadedConfig>> {
    match explicit {
        Some(path) => {
            let path: PathBuf = cwd.join(path);
            let config = config::load_config_file(&path)?.unwrap_or_default();
            Ok(Some(LoadedConfig { path, config }))
        }
        None => Ok(config::find_config(cwd, TOOL_NAME)?),
    }
}

fn update(file: &str, config_path: Option<&Path>, args: &OptionLayer) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;

    let loaded = load_config(&cwd, config_path)?;
    let file_layer = loaded
        .as_ref()
        .map(|l| l.config.clone())
        .unwrap_or_default();
    let options = config::merge_options(&UpdateOptions::default(), &file_layer, args);

    init_logging(options.debug);
    match &loaded {
        Some(loaded) => debug!(
            path = %loaded.path.display(),
            config = ?loaded.config,
            "loaded configuration"
        ),
        None => debug!(cwd = %cwd.display(), "no configuration file found"),
    }
    debug!(args = ?args, merged = ?options, "merged options");

    // Existence checks happen here so the exit code tells which file is missing.
    let package_path = options.package_path(&cwd);
    if !package_path.is_file() {
        eprintln!(
            "{}",
            format!("package.json not found: {}", package_path.display()).red()
        );
        return Ok(ExitCode::from(EXIT_MISSING_PACKAGE_FILE));
    }

    let request = options.to_request(&cwd, file);
    if let Some(target) = request.update_file.as_deref() {
        if !target.is_file() {
            eprintln!("{}", format!("File does not exist: {}", target.display()).red());
            return Ok(ExitCode::from(EXIT_MISSING_FILE));
        }
    }

    match updater::update_version(&request) {
        Ok(outcome) => {
            debug!(?outcome, "update finished");
            Ok(ExitCode::SUCCESS)
        }
        Err(UpdateError::InvalidSearchPattern(e)) => {
            eprint!("{}", e.explain().red());
            Ok(ExitCode::FAILURE)
        }
        // Already reported by the updater
        Err(UpdateError::Write { .. }) => Ok(ExitCode::FAILURE),
        Err(e) => Err(e.into()),
    }
}
