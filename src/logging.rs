use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Ensure initialization happens only once
static INIT: Once = Once::new();

/// Initialize the logging system with sensible defaults.
///
/// Log level can be set using the RUST_LOG environment variable.
/// Example: RUST_LOG=debug,api_failover=trace
pub fn init() {
    init_with_default("info");
}

/// Same as [`init`], with an explicit filter used when RUST_LOG is unset.
pub fn init_with_default(default_filter: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .init();

        tracing::info!("Logging initialized");
    });
}

/// Macro for logging failover state transitions
#[macro_export]
macro_rules! failover_event {
    ($from:expr, $to:expr, $reason:expr) => {
        tracing::info!(
            from = %$from,
            to = %$to,
            reason = $reason,
            "Active server switched"
        )
    };
}

/// Logs one storage write: backend, key, outcome and duration
#[macro_export]
macro_rules! storage_op {
    ($backend:expr, $operation:expr, $key:expr, $result:expr, $elapsed_ms:expr) => {
        tracing::debug!(
            backend = $backend,
            op = $operation,
            key = $key,
            ok = $result.is_ok(),
            elapsed_ms = $elapsed_ms,
            "State storage write"
        )
    };
}
