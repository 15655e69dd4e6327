//! Logging setup for carshare.
//!
//! Lifecycle decisions are logged as structured `tracing` events: successes at
//! `info`, refusals at `debug`, and server failures at `warn`/`error`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above, including refused lifecycle actions.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Pick a verbosity from `-q` and repeated `-v` flags.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Convert verbosity to a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// The filter used when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_filter(&self) -> String {
        format!("carshare={}", self.to_level_filter())
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `verbosity`. Output goes to stderr so
/// command output on stdout stays machine-readable.
///
/// # Examples
///
/// ```no_run
/// use carshare::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Already installed (tests, embedding) is fine.
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
