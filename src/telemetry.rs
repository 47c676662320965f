use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level;
/// release mode logs JSON lines, everything else the human-readable format.
pub fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},tower_http={level},sqlx=warn",
            level = config.log_level()
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.mode().is_release() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
