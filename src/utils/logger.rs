//! Tracing setup. Log lines always go to stderr so the report can be piped
//! from stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate events at `level`; dependencies only surface warnings.
pub fn default_directives(level: &str) -> String {
    format!("guild_ratings={},warn", level)
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Installs the global subscriber: compact human-readable lines, or one JSON
/// object per event when `json` is set. `RUST_LOG` overrides `level`.
pub fn init_logger(level: &str, json: bool) {
    let (compact, json) = if json {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
        (None, Some(layer.json().with_current_span(false)))
    } else {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
        (Some(layer.compact()), None)
    };

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(compact)
        .with(json)
        .init();
}
