//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout stays clean for command output. The level
//! comes from `-v`/`-q`, and `OCITOOLS_LOG` overrides it with a full
//! `EnvFilter` directive string.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable holding filter directives, e.g. `ocitools=trace`.
pub const LOG_ENV: &str = "OCITOOLS_LOG";

/// Base level for a verbosity count. `quiet` wins over any `-v`.
pub fn default_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `OCITOOLS_LOG` if set and valid, else the verbosity level.
pub fn build_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity, quiet)))
}

/// Install the global subscriber. Calling twice is harmless.
#[cfg(not(tarpaulin_include))]
pub fn init(verbosity: u8, quiet: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(build_filter(verbosity, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    // Already set when called from tests; keep the first one.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
