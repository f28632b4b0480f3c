#[cfg(feature = "trace")]
use std::path::Path;
#[cfg(feature = "trace")]
use std::sync::Once;

#[cfg(feature = "trace")]
static INIT: Once = Once::new();

#[cfg(feature = "trace")]
const DEFAULT_FILTER: &str = "ym_core=debug,yukkuri_engine=debug";

/// JSON lines under `log_dir/yukkuri-trace.jsonl`. Only the first call
/// installs a subscriber.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) {
    INIT.call_once(|| {
        let file_appender = tracing_appender::rolling::never(log_dir, "yukkuri-trace.jsonl");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // the host keeps one engine for the life of the process
        std::mem::forget(guard);

        tracing_subscriber::fmt()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .with_env_filter(env_filter())
            .init();
    });
}

/// Human-readable events on stderr, for command-line tools.
#[cfg(feature = "trace")]
pub fn init_stderr_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(env_filter())
            .init();
    });
}

#[cfg(feature = "trace")]
fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &std::path::Path) {}

#[cfg(not(feature = "trace"))]
pub fn init_stderr_tracing() {}
