//! Tracing initialization

use std::io;
use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `TABSTAT_LOG=tabstat=debug`
pub const LOG_ENV: &str = "TABSTAT_LOG";

const DEFAULT_FILTER: &str = "tabstat=warn";

/// Initialize logging to stderr so log lines never mix with results on stdout.
///
/// Falls back to `tabstat=warn` if `TABSTAT_LOG` is not set or is invalid.
/// Calling it more than once has no effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .with(filter)
            .try_init();
    });
}
