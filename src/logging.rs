use tracing_subscriber::EnvFilter;

/// Env var consulted before `RUST_LOG`
pub const LOG_ENV: &str = "TREEBOARD_LOG";

/// Pick the filter directive: `TREEBOARD_LOG`, then `RUST_LOG`, then the
/// configured level.
pub fn filter_directive(configured: &str) -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Install the global stderr subscriber. Call once from the binary;
/// later calls are no-ops.
pub fn init(configured: &str) {
    let directive = filter_directive(configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}
