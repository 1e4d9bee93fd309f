//! Shared helpers for `promptdag` integration tests.

pub mod builders;
pub mod fake_generator;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// How long a single pipeline run may take under test before it is treated
/// as hung. Scripted generators answer immediately.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures (or with
/// `-- --nocapture`). `RUST_LOG` overrides the default of debug-level
/// events from this crate and info elsewhere.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,promptdag=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it does not finish within [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("pipeline run did not finish within {:?}", RUN_TIMEOUT),
    }
}
