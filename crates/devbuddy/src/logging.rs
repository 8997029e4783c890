//! Diagnostic logging to stderr
//!
//! User-facing output goes through cliclack; this is for `-v` and `RUST_LOG`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn default_filter(verbosity: u8) -> EnvFilter {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::new(format!("devbuddy={level},devbuddy_core={level}"))
}

/// `RUST_LOG` wins over `-v`
pub fn init(verbosity: u8) {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
