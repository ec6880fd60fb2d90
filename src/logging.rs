use crate::config::CartConfig;
use std::env;
use tracing_subscriber::fmt;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Safe to call more than once;
/// later calls are no-ops (useful in tests).
pub fn init_tracing(config: &CartConfig) {
    let default_directive = format!("storefront_cart={}", config.log_level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if config.log_json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}
