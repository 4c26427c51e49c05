//! Debug logging support for use-pkg-version
//!
//! Diagnostics are emitted as `tracing` events on stderr. `--debug` lowers the
//! filter to `debug`; an explicit `RUST_LOG` always wins.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(debug_enabled: bool) -> &'static str {
    if debug_enabled {
        "use_pkg_version=debug"
    } else {
        "use_pkg_version=warn"
    }
}

/// Initialize the logging system
///
/// Installs a global subscriber writing to stderr. Calling it twice is an error.
pub fn init_logging(debug_enabled: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug_enabled)));

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(debug_enabled)
                .with_line_number(debug_enabled),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}
