use crate::config::{DEFAULT_PACKAGE_FILE, OptionLayer, TOOL_NAME};
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = TOOL_NAME)]
#[command(about = "Keep a version number in any file in sync with package.json")]
#[command(long_about = "use-pkg-version copies the version from your package.json into another file.

It searches the file for a regular expression and replaces every match with a
template in which the {{version}} placeholder is swapped for the package version.

Options can also be stored in a configuration file: a \"use-pkg-version\" property
in package.json, or a .use-pkg-versionrc[.json|.yaml|.yml|.toml] or
use-pkg-version.config.[json|yaml|toml] file in the current directory or any
parent directory. Command-line options override the configuration file.

EXAMPLES:
  use-pkg-version update README.md -s '<strong>.*?</strong>' -r '<strong>{{version}}</strong>'
  use-pkg-version update src/version.ts -s \"VERSION = '.*?'\" -r \"VERSION = '{{version}}'\" --dry
  use-pkg-version info")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(override_usage = "use-pkg-version <command> [options]")]
#[command(after_help = "Run 'use-pkg-version <command> --help' for detailed usage of given command.")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the version number in a file with the version number from package.json
    #[command(long_about = "Update the version number in the specified file with the version number
from the package.json file. Paths are relative to the current directory.

The search pattern is a regular expression; every match is replaced. The
replacement must contain the placeholder ({{version}} unless changed with
--placeholder), which is replaced by the version from package.json.

EXAMPLES:
  use-pkg-version update README.md -s 'v[0-9]+\\.[0-9]+\\.[0-9]+' -r 'v{{version}}'
  use-pkg-version update index.html -s '<strong>.*?</strong>' -r '<strong>{{version}}</strong>' --dry")]
    Update {
        /// File to update, relative to the current directory
        #[arg(value_name = "FILE")]
        file: String,

        /// Path to the package.json file relative to the current directory
        #[arg(short = 'p', long, value_name = "FILE")]
        #[arg(help = format!("Path to the package.json file relative to the current directory [default: {}]", DEFAULT_PACKAGE_FILE))]
        package_file: Option<String>,

        /// Dry run, only shows what would be updated
        #[arg(short = 'd', long, alias = "dry-run")]
        dry: bool,

        /// Configuration file with the search and replace settings
        #[arg(short = 'c', long, value_name = "FILE")]
        #[arg(help = "Configuration file with the search and replace settings\nSkips the automatic configuration file search")]
        config: Option<PathBuf>,

        /// Regular expression to search for
        #[arg(short = 's', long, value_name = "REGEX")]
        search_for: Option<String>,

        /// Value to replace the matches with, must contain the version placeholder
        #[arg(short = 'r', long, value_name = "STRING")]
        replace_with: Option<String>,

        /// Placeholder in the replacement that stands for the version
        #[arg(long, value_name = "TOKEN")]
        #[arg(help = "Placeholder in the replacement that stands for the version [default: {{version}}]")]
        placeholder: Option<String>,

        /// Show processing information
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Report errors only
        #[arg(short = 'q', long)]
        quiet: bool,

        /// Show debugging information
        #[arg(short = 'D', long)]
        debug: bool,
    },

    /// Print debugging information about your environment
    Info,

    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

#[derive(Debug, PartialEq)]
pub enum Args {
    Update {
        file: String,
        config: Option<PathBuf>,
        options: OptionLayer,
    },
    Info,
    Unknown {
        command: String,
    },
    /// No command given
    Help,
}

pub fn parse_args() -> Args {
    into_args(Cli::parse())
}

/// Parse from an explicit argument list (first item is the program name).
pub fn parse_args_from<I, T>(args: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map(into_args)
}

fn into_args(cli: Cli) -> Args {
    match cli.command {
        None => Args::Help,
        Some(Commands::Info) => Args::Info,
        Some(Commands::Unknown(words)) => Args::Unknown {
            command: words
                .first()
                .map(|w| w.to_string_lossy().into_owned())
                .unwrap_or_default(),
        },
        Some(Commands::Update {
            file,
            package_file,
            dry,
            config,
            search_for,
            replace_with,
            placeholder,
            verbose,
            quiet,
            debug,
        }) => {
            // Flags only ever switch a setting on, so an absent flag must not
            // override a `true` from the configuration file.
            let options = OptionLayer {
                package_file,
                search_for,
                replace_with,
                placeholder,
                dry: dry.then_some(true),
                verbose: verbose.then_some(true),
                quiet: quiet.then_some(true),
                debug: debug.then_some(true),
            };

            Args::Update {
                file,
                config,
                options,
            }
        }
    }
}

/// Render the top-level help text.
pub fn help_text() -> String {
    Cli::command().render_help().to_string()
}
