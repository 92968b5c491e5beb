use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber.
///
/// `STUDYDESK_LOG` takes precedence over the configured level.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_env("STUDYDESK_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
