use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a stderr subscriber so stdout stays reserved for reports.
///
/// `RUST_LOG` overrides `level` when set.
pub fn init(level: &str) {
    let default_filter = format!("nestegg={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .try_init();

    if initialized.is_ok() {
        tracing::debug!(level, "logging initialized");
    }
}
