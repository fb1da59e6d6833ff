use crate::test::utils::mock_time::MockTimeFormatter;
use crate::time::TimeProvider;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over `level`.
/// With a time provider, log lines are stamped from that clock instead of the
/// wall clock. A second call leaves the first subscriber in place.
pub fn start_log(level: &str, time_provider: Option<Arc<dyn TimeProvider>>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let res = match time_provider {
        Some(time_provider) => builder.with_timer(MockTimeFormatter { time_provider }).try_init(),
        None => builder.try_init(),
    };
    if let Err(e) = res {
        debug!(error = %e, "Log subscriber already installed.");
    }
}
