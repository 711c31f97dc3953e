// library entry
pub mod client;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod failover;
pub mod logging;
pub mod state;
pub mod storage;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export key components for convenience
pub use client::ApiClient;
pub use config::{FailoverConfig, FileStorageConfig, ServerProfile};
pub use error::{FailoverError, Result, TransportError, TransportErrorKind};
pub use failover::FailoverInterceptor;
pub use logging::init as init_logging;
pub use state::{FailoverSnapshot, ServerKind, StateStore};
pub use transport::{ApiResponse, OutgoingRequest};
