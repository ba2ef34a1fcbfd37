//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding per-crate log levels, e.g.
/// `NARRATIVE_LOG=narrative_core=debug,story_graph=trace`.
pub const LOG_ENV: &str = "NARRATIVE_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "narrative_core=info,story_graph=info";

static INIT: Once = Once::new();

/// Install a global fmt subscriber filtered by [`LOG_ENV`].
///
/// Idempotent. If the host application already installed a subscriber, that
/// one is kept.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .try_init();
    });
}
