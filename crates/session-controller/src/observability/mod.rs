//! Logging and metrics.
//!
//! - [`metrics`] - Metric definitions (`session_` prefix)
//! - [`init_tracing`] - Subscriber setup for hosts and tests

pub mod metrics;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `tracing` subscriber with an `EnvFilter` and fmt layer.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` if a global
/// subscriber was already installed, which is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
