//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies. JSON output
//! is opt-in for log shippers.

use crate::config::settings::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Call once, as early as possible.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", settings.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if settings.json {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}
