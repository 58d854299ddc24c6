//! Logging setup with `tracing` and `tracing-subscriber`
//!
//! Logs go to stderr so stdout stays clean for piping.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the CLI flags
///
/// `RUST_LOG`, when set, takes precedence over this.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Initialize logging for the `qf` binary
///
/// # Environment
/// - RUST_LOG: filter override, e.g. `RUST_LOG=qf::core::catalog=debug`
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    // try_init: a second call (tests) is a no-op
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}

/// Initialize logging for tests, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
