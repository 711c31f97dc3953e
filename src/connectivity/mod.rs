// src/connectivity/mod.rs
//! Connectivity checks run before any request leaves the device.
//!
//! When the device itself is offline neither server can be reached, so the
//! interceptor refuses to attempt anything rather than burn two timeouts and
//! wrongly move the active server to the backup.

mod monitor;
mod probe;


pub use monitor::ConnectivityMonitor;
pub use probe::{RouteProbe, StaticProbe};

use async_trait::async_trait;
use std::fmt::Debug;

/// Answers whether the host currently has a usable network path
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + Debug {
    /// True iff an active interface with internet capability exists.
    /// Must not have side effects visible to either API server.
    async fn is_network_available(&self) -> bool;
}
