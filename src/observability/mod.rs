//! Observability.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`
/// (`debug` when `verbose` is set). Safe to call once per process; later
/// calls are ignored.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "statuswatch=debug"
    } else {
        "statuswatch=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
