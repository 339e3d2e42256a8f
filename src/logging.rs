use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `LOC_FOOTPRINT_LOG=debug`.
pub const LOG_ENV: &str = "LOC_FOOTPRINT_LOG";

/// Initialize the tracing subscriber, writing to stderr so reports piped
/// from stdout stay clean. Defaults to `warn`, or `debug` when `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
