//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a process hosting the pipeline.
///
/// Emits JSON lines, filtered by `RUST_LOG` with an `info` default. Safe to
/// call multiple times; subsequent calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Initialize tracing for tests.
///
/// Human-readable output routed through the test writer so it interleaves
/// with `cargo test` capture. Safe to call from every test; only the first
/// call installs a subscriber.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
