use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    EnvFilter,
};

/// Install a global `tracing` subscriber for applications embedding the core.
///
/// When `RUST_LOG` is set it is the only filter. Otherwise `verbose` picks
/// debug or info for this crate, with everything else at warn. Returns
/// `false` if a subscriber was already installed (e.g. by the host
/// application or a test harness).
pub fn init_logging(verbose: bool) -> bool {
    let fmt_layer = fmt::layer().compact().with_target(true);

    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .try_init()
            .is_ok(),
        Err(_) => tracing_subscriber::registry()
            .with(fmt_layer)
            .with(default_targets(verbose))
            .try_init()
            .is_ok(),
    }
}

fn default_targets(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    Targets::new()
        .with_target("coinfolio_core", level)
        .with_default(LevelFilter::WARN)
}
