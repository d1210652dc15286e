// ── Logging ───────────────────────────────────────────────────────────────────

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// With debug logging off the level is pinned to `info`, whatever `RUST_LOG`
/// says.  With it on, `RUST_LOG` wins and `debug` is the fallback.  Calling
/// this more than once keeps the first subscriber.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
