//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_directive`. Returns `false` when a global
/// subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).with_target(true).finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
