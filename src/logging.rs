/// Logging bootstrap for embedders that want the engine's defaults
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an env-filter, defaulting to debug output
/// for this crate.
///
/// Opt-in: embedders with their own subscriber should skip this.
/// Calling it twice panics, as installing two global subscribers would.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelvault=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
