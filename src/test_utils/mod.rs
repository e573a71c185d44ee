//! Test utilities for stack-resolver
//!
//! Helpers shared by unit tests and the integration suite: one-time logging setup
//! and [`StackFixture`], a temporary repository with stack manifests.
//!
//! # Example
//!
//! ```rust,no_run
//! use stack_resolver::test_utils::StackFixture;
//!
//! let fixture = StackFixture::new().unwrap();
//! fixture.write_manifest("orgs/dev.yaml", "vars: {stage: dev}\n").unwrap();
//! let config = fixture.config();
//! ```

pub mod fixtures;

pub use fixtures::StackFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with neither,
/// nothing is logged.
///
/// ```bash
/// RUST_LOG=stack_resolver=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
