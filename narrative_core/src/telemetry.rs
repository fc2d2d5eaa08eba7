//! Tracing setup for tests.
//!
//! The library only emits events; installing a subscriber is left to the binary.

use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness output. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("narrative_core=debug")),
        )
        .with_test_writer()
        .try_init();
}
