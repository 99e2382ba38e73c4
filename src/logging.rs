use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when RUST_LOG is not set
const DEFAULT_DIRECTIVE: &str = "sales_analytics=info";

/// Initializes console logging. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // Logs go to stderr so they don't interleave with the step-by-step output
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
