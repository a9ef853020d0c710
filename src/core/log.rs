// Logging initialization
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// HTTP stack crates that are chatty at debug level.
const HTTP_TARGETS: [&str; 5] = ["axum", "tower_http", "hyper", "hyper_util", "reqwest"];

/// Per-target levels: the app at INFO (DEBUG when verbose), the HTTP stack
/// only at WARN (INFO when verbose).
pub fn log_targets(verbose: bool) -> Targets {
    let (app_level, http_level) = if verbose {
        (LevelFilter::DEBUG, LevelFilter::INFO)
    } else {
        (LevelFilter::INFO, LevelFilter::WARN)
    };

    HTTP_TARGETS
        .into_iter()
        .fold(Targets::new().with_target("fxdash", app_level), |targets, name| {
            targets.with_target(name, http_level)
        })
}

pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(log_targets(verbose))
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_targets() {
        let targets = log_targets(false);
        assert!(targets.would_enable("fxdash::server", &Level::INFO));
        assert!(!targets.would_enable("fxdash::server", &Level::DEBUG));
        assert!(targets.would_enable("axum::serve", &Level::WARN));
        assert!(!targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(!targets.would_enable("tokio", &Level::ERROR));
    }

    #[test]
    fn test_verbose_targets() {
        let targets = log_targets(true);
        assert!(targets.would_enable("fxdash::providers", &Level::DEBUG));
        assert!(targets.would_enable("reqwest::connect", &Level::INFO));
        assert!(!targets.would_enable("tower_http::trace", &Level::DEBUG));
    }
}
