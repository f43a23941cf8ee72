//! Tracing initialization shared by the API and worker binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. Filter defaults come from `RUST_LOG`; production
/// environments emit JSON lines, everything else human-readable output.
pub fn init_telemetry(environment: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "arca=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    let env = environment.to_lowercase();
    if env == "production" || env == "prod" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
