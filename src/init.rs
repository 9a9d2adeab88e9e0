//! Initialization helpers for the application startup.

use crate::config::Config;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(default_filter(&config.logging.level))
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Configured level with the hickory crates silenced unless explicitly named.
fn default_filter(level: &str) -> String {
    let mut filter = level.to_string();

    // Suppress hickory logs unless explicitly enabled/overridden
    if !filter.contains("hickory_proto") {
        filter.push_str(",hickory_proto=off");
    }
    if !filter.contains("hickory_resolver") {
        filter.push_str(",hickory_resolver=off");
    }
    filter
}
