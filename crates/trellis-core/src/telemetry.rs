//! Tracing setup for hosts that don't install their own subscriber

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter: engine internals at debug, everything else at info
fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info,trellis_core=debug")
}

/// Install a stderr fmt subscriber honouring `RUST_LOG`
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter());

    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(filter)
        .try_init();

    if let Err(e) = result {
        // Already initialized by the host or an earlier call
        tracing::debug!("[telemetry] Subscriber already set: {}", e);
    }
    Ok(())
}
