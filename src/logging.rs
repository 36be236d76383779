use std::io;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to stderr so the chat on
/// stdout stays readable; `RUST_LOG` overrides the `warn` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
