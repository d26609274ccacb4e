//! Logging setup for the coinswitch daemon.
//!
//! Library code only emits events through the `tracing` macros, pulled in
//! with `use crate::tracing::prelude::*`. Where the events end up is decided
//! once, at startup, by [`init_journald_or_stdout`].
//!
//! Refresh failures are reported at WARN with the coin symbol as a
//! structured `coin` field, so a single noisy pool is easy to filter out.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Variable holding filter directives, e.g. `coinswitch=debug`.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Install the global subscriber.
///
/// Under systemd (`JOURNAL_STREAM` set) events go to journald; otherwise,
/// or if journald is unreachable, to stdout.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_err() {
        use_stdout();
        return;
    }

    match tracing_journald::layer() {
        Ok(layer) => tracing_subscriber::registry()
            .with(env_filter())
            .with(layer)
            .init(),
        Err(e) => {
            use_stdout();
            error!(error = %e, "Failed to initialize journald logging, using stdout.");
        }
    }
}

// Default to INFO rather than the subscriber's ERROR.
fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

fn use_stdout() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(LocalTimer),
        )
        .init();
}

// Local time to the nearest second; the default is a long UTC timestamp.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now =
            OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second]"
            ))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", stamp)
    }
}

/// In-memory log sink for asserting on emitted events in unit tests.
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::subscriber::DefaultGuard;

    #[derive(Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        /// Route this thread's events into the buffer until the guard drops.
        pub(crate) fn install(&self) -> DefaultGuard {
            let logs = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || logs.clone())
                .with_ansi(false)
                .without_time()
                .with_max_level(tracing::Level::WARN)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub(crate) fn warnings(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .filter(|line| line.contains("WARN"))
                .map(str::to_string)
                .collect()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
