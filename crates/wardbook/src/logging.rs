//! Logging setup.
//!
//! Events from wardbook itself and from the HTTP stack go through one
//! `tracing` subscriber. Request access lines are emitted by actix's
//! `Logger` middleware and bridged from the `log` facade.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log targets of the HTTP server, kept one step quieter than wardbook's own.
const HTTP_TARGETS: [&str; 2] = ["actix_web", "actix_server"];

/// How much to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above; one access line per request.
    #[default]
    Normal,
    /// Debug and above, including storage queries and uploads.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// The level applied to wardbook's own events.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    fn http_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Trace => Level::DEBUG,
        }
    }

    /// The filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directive(&self) -> String {
        let mut directive = format!("wardbook={}", self.to_level_filter());
        for target in HTTP_TARGETS {
            directive.push_str(&format!(",{target}={}", self.http_level()));
        }
        // Access lines are info-level events of the logger middleware
        if *self != Self::Quiet {
            directive.push_str(",actix_web::middleware::logger=info");
        }
        directive
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbosity`. Calling this more than
/// once is harmless; only the first call installs anything.
///
/// ```no_run
/// use wardbook::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(verbosity != Verbosity::Normal))
        .try_init();
}
